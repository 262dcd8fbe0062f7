//! # Error Types
//!
//! Custom error types for PF Receiver using `thiserror`.

use thiserror::Error;

/// Main error type for PF Receiver
#[derive(Debug, Error)]
pub enum PfReceiverError {
    /// Packet addressed to a different logical channel than the decoder
    /// listens on. Expected in normal operation on a shared IR medium;
    /// the decoder leaves all state untouched.
    #[error("channel mismatch: listening on {listening}, packet addressed to {got}")]
    ChannelMismatch { listening: u8, got: u8 },

    /// Subchannel id outside the valid range (0 = RED, 1 = BLUE)
    #[error("invalid subchannel id {0}: valid ids are 0 (RED) and 1 (BLUE)")]
    InvalidSubchannel(u8),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PF Receiver
pub type Result<T> = std::result::Result<T, PfReceiverError>;
