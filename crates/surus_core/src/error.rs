use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::content::CollectionKind;
use crate::id::ContentId;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Unified error type for surus operations
#[derive(Debug, Error)]
pub enum CmsError {
    // Validation errors (rejected before any persistence attempt)
    /// Input rejected; the message is shown verbatim
    #[error("{0}")]
    Validation(String),

    // Lookup errors
    #[error("{} not found", .kind.singular())]
    /// No entity with that id
    NotFound {
        /// Collection searched
        kind: CollectionKind,
        /// Id that was not found
        id: ContentId,
    },

    // Capacity errors
    /// Every degraded write failed; the operator has to free space
    #[error(
        "Failed to save {}: storage quota exceeded. Please publish existing content to the remote repository first to free up local space.",
        .kind.singular().to_lowercase()
    )]
    StorageFull {
        /// Collection that could not be saved
        kind: CollectionKind,
    },

    /// Backend failure other than running out of space
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // Remote errors
    /// Remote repository failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Remote publishing requested without settings
    #[error("No remote repository configured")]
    RemoteNotConfigured,

    // Serialization errors
    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    /// Filesystem failure without a known path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading a file failed
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Writing a file failed
    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        /// File being written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    // Config errors
    /// Config file is not valid TOML
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// No platform config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for surus operations
pub type Result<T> = std::result::Result<T, CmsError>;

impl CmsError {
    /// Shorthand for a validation failure with a message shown verbatim to the operator.
    pub fn validation(message: impl Into<String>) -> Self {
        CmsError::Validation(message.into())
    }

    /// Whether this error is the terminal capacity failure.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, CmsError::StorageFull { .. })
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of CmsError for IPC (e.g., the admin UI)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Remote HTTP status (if applicable)
    pub status: Option<u16>,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&CmsError> for SerializableError {
    fn from(err: &CmsError) -> Self {
        let kind = match err {
            CmsError::Validation(_) => "Validation",
            CmsError::NotFound { .. } => "NotFound",
            CmsError::StorageFull { .. } => "StorageFull",
            CmsError::Storage(_) => "Storage",
            CmsError::Remote(_) => "Remote",
            CmsError::RemoteNotConfigured => "RemoteNotConfigured",
            CmsError::Json(_) => "Json",
            CmsError::Io(_) => "Io",
            CmsError::FileRead { .. } => "FileRead",
            CmsError::FileWrite { .. } => "FileWrite",
            CmsError::ConfigParse(_) => "ConfigParse",
            CmsError::ConfigSerialize(_) => "ConfigSerialize",
            CmsError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let path = match err {
            CmsError::FileRead { path, .. } => Some(path.clone()),
            CmsError::FileWrite { path, .. } => Some(path.clone()),
            _ => None,
        };

        let status = match err {
            CmsError::Remote(remote) => remote.status(),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            status,
            path,
        }
    }
}

impl From<CmsError> for SerializableError {
    fn from(err: CmsError) -> Self {
        SerializableError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_collection() {
        let err = CmsError::NotFound {
            kind: CollectionKind::BlogPosts,
            id: ContentId::from("missing"),
        };
        assert_eq!(err.to_string(), "Blog post not found");
    }

    #[test]
    fn test_storage_full_message_tells_operator_to_publish() {
        let err = CmsError::StorageFull {
            kind: CollectionKind::TeamMembers,
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to save team member"));
        assert!(message.contains("publish existing content"));
        assert!(err.is_storage_full());
    }

    #[test]
    fn test_serializable_error_carries_remote_status() {
        let err = CmsError::Remote(RemoteError::Http {
            status: 401,
            message: "Bad credentials".to_string(),
        });
        let serializable = err.to_serializable();
        assert_eq!(serializable.kind, "Remote");
        assert_eq!(serializable.status, Some(401));
        assert!(serializable.message.contains("Bad credentials"));
    }
}
