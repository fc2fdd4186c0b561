//! Session lifecycle states and notifications
//!
//! The handshake is an explicit state machine driven by discrete events:
//! the current phase is observable through a watch channel on the session,
//! and every transition (plus every surfaced fault) is emitted as a
//! [`SessionEvent`] on a broadcast channel.

use std::fmt;

use iroh::EndpointId;

/// Handshake state machine, per process
///
/// `Unregistered → Registering → Registered → ChannelPending → ChannelOpen`.
/// A channel close drops back to `Registered`; no reconnection is attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not yet started
    #[default]
    Unregistered,
    /// Waiting for the rendezvous network to assign an identity
    Registering,
    /// Registered, no active channel
    Registered,
    /// Dial issued (display) or inbound offer seen (controller)
    ChannelPending,
    /// One channel active; the mirror is live
    ChannelOpen,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Unregistered => write!(f, "Unregistered"),
            SessionPhase::Registering => write!(f, "Registering"),
            SessionPhase::Registered => write!(f, "Registered"),
            SessionPhase::ChannelPending => write!(f, "Channel pending"),
            SessionPhase::ChannelOpen => write!(f, "Channel open"),
        }
    }
}

/// Notifications emitted as the session progresses
///
/// Faults are surfaced here rather than swallowed (dial failures, malformed
/// frames, failed pushes); none of them carry a reply to the peer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The rendezvous network assigned this process its identity
    Registered {
        /// Our endpoint identity
        endpoint_id: EndpointId,
    },
    /// A channel is being established with a peer
    ChannelPending {
        /// The peer on the other end
        peer: EndpointId,
    },
    /// The active channel opened; on a controller this replaces any
    /// previously active channel
    ChannelOpen {
        /// The peer on the other end
        peer: EndpointId,
    },
    /// The active channel closed; no reconnection is attempted
    ChannelClosed {
        /// The peer that went away
        peer: EndpointId,
    },
    /// A display's dial failed (stale token, controller offline)
    DialFailed {
        /// Why the dial failed
        message: String,
    },
    /// An inbound frame failed the shape check and was dropped
    InvalidFrame {
        /// Why the frame was rejected
        message: String,
    },
    /// A push failed; the frame is not retried
    SessionError {
        /// What went wrong
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_unregistered() {
        let phase: SessionPhase = Default::default();
        assert_eq!(phase, SessionPhase::Unregistered);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", SessionPhase::Unregistered), "Unregistered");
        assert_eq!(format!("{}", SessionPhase::Registering), "Registering");
        assert_eq!(format!("{}", SessionPhase::Registered), "Registered");
        assert_eq!(format!("{}", SessionPhase::ChannelPending), "Channel pending");
        assert_eq!(format!("{}", SessionPhase::ChannelOpen), "Channel open");
    }
}
