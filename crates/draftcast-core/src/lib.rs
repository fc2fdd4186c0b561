//! Draftcast Core Library
//!
//! Two-role real-time mirroring of a draft pick/ban board over a
//! peer-to-peer data channel.
//!
//! ## Overview
//!
//! One process (the controller) owns and edits a fixed-length selection
//! board; any number of displays may dial in, but only the
//! most-recently-connected one is driven. Discovery is out-of-band: the
//! controller publishes a share token (its endpoint identity plus dial
//! addresses) for embedding in a URL fragment, and a process that finds such
//! a token at launch becomes a display.
//!
//! ## Core Principles
//!
//! - **Single owner**: only the controller mutates; displays mirror
//! - **Whole-board frames**: no diffing, no merge, last frame wins
//! - **Fire-and-forget**: no acks, no retries, no reconnection
//!
//! ## Quick Start
//!
//! ```ignore
//! use draftcast_core::{BoardStore, MirrorSession, Side};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = BoardStore::with_slots(16);
//!     let session = MirrorSession::controller(store.clone()).await?;
//!
//!     // Share this with displays (out-of-band)
//!     let token = session.share_token().unwrap().encode()?;
//!     println!("join with: {}", token);
//!
//!     // Every mutation is pushed to the connected display
//!     store.toggle_pick(Side::A, 3)?;
//!     store.toggle_ban(5)?;
//!
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod error;
pub mod launch;
pub mod role;
pub mod store;
pub mod sync;
pub mod token;

// Re-exports
pub use board::{Board, OpponentRole, Side, Slot, SlotState, DEFAULT_SLOT_COUNT};
pub use error::{MirrorError, MirrorResult};
pub use launch::{Launch, SideLabels};
pub use role::Role;
pub use store::BoardStore;
pub use sync::{
    MirrorMessage, MirrorSession, SessionEvent, SessionPhase, WireMessage, MAX_FRAME_SIZE,
    MIRROR_ALPN,
};
pub use token::ShareToken;
