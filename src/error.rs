use std::io;
use thiserror::Error;

/// Main error type for assetfs operations
#[derive(Error, Debug)]
pub enum AssetFsError {
    /// The remote store has no asset or folder at the requested location.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote call failed for a reason other than the resource being absent.
    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Unable to check existence of {path}: {source}")]
    CheckExistenceFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to delete {path}: {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to delete directory {path}: {source}")]
    DeleteDirectoryFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to move {from} to {to}: {source}")]
    MoveFailed {
        from: String,
        to: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to copy {from} to {to}: {source}")]
    CopyFailed {
        from: String,
        to: String,
        #[source]
        source: Box<AssetFsError>,
    },

    #[error("Unable to list contents of {path}: {source}")]
    ListFailed {
        path: String,
        #[source]
        source: Box<AssetFsError>,
    },

    /// The descriptor came back without the one field the caller asked
    /// for, or could not be fetched at all.
    #[error("Metadata field {field} unavailable for {path}")]
    MetadataUnavailable {
        path: String,
        field: &'static str,
        #[source]
        source: Option<Box<AssetFsError>>,
    },

    #[error("Unable to compute checksum of {path}: {reason}")]
    ChecksumFailed { path: String, reason: String },

    #[error("Checksum algorithm not supported: {0}")]
    ChecksumAlgoNotSupported(String),

    #[error("Unable to generate URL for {path}: {reason}")]
    UrlGenerationFailed { path: String, reason: String },

    #[error("Invalid visibility: {0}")]
    InvalidVisibility(String),

    /// The remote API assigns access control at upload time only; there is
    /// no endpoint to change it afterwards.
    #[error("The remote store does not support changing visibility after upload")]
    VisibilityUnsupported,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging is enabled but no log sink is attached")]
    NoLoggerConfigured,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AssetFsError {
    /// Whether this error (at the top level) signals an absent resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetFsError::NotFound(_))
    }
}

/// Result type alias for assetfs operations
pub type Result<T> = std::result::Result<T, AssetFsError>;
