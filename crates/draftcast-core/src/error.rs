//! Error types for Draftcast

use thiserror::Error;

/// Main error type for Draftcast operations
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Slot index outside the fixed board range
    #[error("Slot {index} out of range (board has {len} slots)")]
    SlotOutOfRange {
        /// The offending index
        index: usize,
        /// The board's fixed length
        len: usize,
    },

    /// Mutation not allowed in the slot's current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Share token could not be decoded
    #[error("Invalid share token: {0}")]
    InvalidToken(String),

    /// Launch URL could not be parsed
    #[error("Invalid launch URL: {0}")]
    InvalidUrl(String),

    /// Inbound frame failed the shape check and was dropped
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related error
    #[error("Network error: {0}")]
    Network(String),
}

/// Result type alias using MirrorError
pub type MirrorResult<T> = Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MirrorError::SlotOutOfRange { index: 9, len: 8 };
        assert_eq!(format!("{}", err), "Slot 9 out of range (board has 8 slots)");

        let err = MirrorError::InvalidToken("bad prefix".to_string());
        assert_eq!(format!("{}", err), "Invalid share token: bad prefix");
    }
}
