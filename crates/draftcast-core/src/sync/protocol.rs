//! Mirror wire protocol
//!
//! Frames are serialized with postcard and sent one per uni-directional
//! stream on the active connection. A frame always carries the controller's
//! entire board; there is no incremental form and no acknowledgment.

use serde::{Deserialize, Serialize};

use crate::board::Slot;

/// ALPN protocol identifier for board mirroring
pub const MIRROR_ALPN: &[u8] = b"/draftcast/mirror/1";

/// Maximum accepted frame size in bytes
///
/// A full board frame is a few hundred bytes; anything approaching this cap
/// is not a board.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Messages sent from controller to display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MirrorMessage {
    /// The controller's entire board; the display replaces its mirror
    /// wholesale with the carried sequence
    Board(Vec<Slot>),
}

impl MirrorMessage {
    /// Encode message to bytes using postcard
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decode message from bytes using postcard
    pub fn decode(data: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(data)
    }
}

/// Wrapper for versioned frames (future-proofing)
///
/// Allows protocol evolution while maintaining backward compatibility.
/// New versions can be added as variants without breaking existing peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireMessage {
    /// Protocol version 1
    V1(MirrorMessage),
}

impl WireMessage {
    /// Create a new wire frame wrapping a mirror message
    pub fn new(msg: MirrorMessage) -> Self {
        WireMessage::V1(msg)
    }

    /// Encode frame to bytes using postcard
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decode frame from bytes using postcard
    pub fn decode(data: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(data)
    }

    /// Unwrap the inner message
    pub fn into_inner(self) -> MirrorMessage {
        match self {
            WireMessage::V1(msg) => msg,
        }
    }

    /// Get the protocol version
    pub fn version(&self) -> u8 {
        match self {
            WireMessage::V1(_) => 1,
        }
    }
}
