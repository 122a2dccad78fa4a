//! Error types for the consistent hashing ring.

use thiserror::Error;

use crate::types::ServerId;

/// Result type alias for ring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ring.
///
/// The ring-level variants are sentinel conditions: callers are expected to
/// branch on the variant, not on the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The ring has no servers yet.
    #[error("ring has no servers")]
    EmptyRing,

    /// The server is already a member of the ring.
    #[error("server already exists in the ring: {0}")]
    AlreadyExists(ServerId),

    /// The server is not a member of the ring.
    #[error("server is not present in the ring: {0}")]
    NotFound(ServerId),

    /// Invalid construction-time configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error reports a membership conflict (`AlreadyExists` or `NotFound`).
    ///
    /// Duplicate or reordered membership notifications surface as these.
    pub fn is_membership_conflict(&self) -> bool {
        matches!(self, Error::AlreadyExists(_) | Error::NotFound(_))
    }
}
