//! Mirror session and synchronization layer
//!
//! One controller accepts inbound channels and pushes its board on every
//! change; one or more displays dial in and mirror it read-only. Only the
//! most-recently-connected display is driven.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  MirrorSession                                                  │
//! │  ├── Endpoint (QUIC transport, NAT traversal)                   │
//! │  ├── Router + MirrorAcceptor (controller: inbound offers)       │
//! │  └── push pump / receive loop (background tasks)                │
//! │                                                                 │
//! │  BoardStore (crate::store)                                      │
//! │  ├── controller: mutations feed the push pump via watch         │
//! │  └── display: receive loop replaces the mirror wholesale        │
//! │                                                                 │
//! │  SessionPhase / SessionEvent                                    │
//! │  ├── explicit handshake state machine, observable via watch     │
//! │  └── lifecycle + fault notifications via broadcast              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Each push is one `WireMessage` frame on its own uni-directional stream:
//! the controller's entire board, postcard-encoded. No diffing, no acks, no
//! retries; the display replaces its mirror on every valid frame and drops
//! malformed ones without replying.

pub mod events;
pub mod protocol;
pub mod session;

pub use events::{SessionEvent, SessionPhase};
pub use protocol::{MirrorMessage, WireMessage, MAX_FRAME_SIZE, MIRROR_ALPN};
pub use session::MirrorSession;
