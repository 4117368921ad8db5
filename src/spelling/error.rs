//! Custom error types for the spellpack crate.

use thiserror::Error;

/// The primary error type for all import, indexing and packing operations.
#[derive(Debug, Error)]
pub enum SpellingError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A storage root required for the operation is not configured
    /// (e.g. reading a bundled asset without an assets root).
    #[error("Storage context unavailable for this operation")]
    ContextUnavailable,

    /// A required member is absent from a recognized archive format.
    #[error("Required archive member missing: {member}")]
    ArchiveMemberMissing { member: String },

    /// The manifest was found but maps no dictionaries.
    #[error("Manifest contains an empty dictionary mapping")]
    EmptyManifest,

    /// A manifest or metadata record could not be parsed or encoded.
    #[error("Malformed metadata record: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A required metadata field was never populated before `build()`.
    #[error("Dictionary metadata incomplete: missing {field}")]
    MetadataIncomplete { field: &'static str },

    /// The inbound source exceeds the configured maximum size.
    #[error("Source exceeds the size limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    /// The source-format identifier does not name a known importer.
    #[error("Unsupported import source: {0:?}")]
    UnsupportedSource(String),

    /// The archive is structurally invalid or does not conform to the
    /// container format specification.
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// A member checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// A declared size does not match the actual number of bytes found.
    #[error("Size mismatch for {context}: expected {expected} bytes, but found {found} bytes")]
    SizeMismatch {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

/// A convenience `Result` type alias using the crate's `SpellingError` type.
pub type Result<T> = std::result::Result<T, SpellingError>;
