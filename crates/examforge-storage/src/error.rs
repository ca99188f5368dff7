//! Storage error types.

use thiserror::Error;

/// Errors raised by document stores, blob stores, and the persistence service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No document with this id exists.
    #[error("test not found: {0}")]
    NotFound(String),

    /// An inline payload could not be decoded.
    #[error("invalid inline payload: {0}")]
    InvalidPayload(String),

    /// The URL does not belong to this blob store.
    #[error("URL is not owned by this blob store: {0}")]
    ForeignUrl(String),

    /// Uploading a blob failed.
    #[error("failed to upload blob {path}")]
    Upload {
        path: String,
        #[source]
        source: Box<StorageError>,
    },

    /// Writing a document failed.
    #[error("failed to write test {id}")]
    Write {
        id: String,
        #[source]
        source: Box<StorageError>,
    },

    /// Reading one or more documents failed.
    #[error("failed to read {what}")]
    Read {
        what: String,
        #[source]
        source: Box<StorageError>,
    },

    /// Deleting a document failed.
    #[error("failed to delete test {id}")]
    Delete {
        id: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn upload(path: &str, source: StorageError) -> Self {
        StorageError::Upload {
            path: path.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn write(id: &str, source: StorageError) -> Self {
        StorageError::Write {
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn read(what: impl Into<String>, source: StorageError) -> Self {
        StorageError::Read {
            what: what.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn delete(id: &str, source: StorageError) -> Self {
        StorageError::Delete {
            id: id.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wrapped_errors_keep_their_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = StorageError::upload("tests/t1/1/audio.wav", io.into());
        assert_eq!(err.to_string(), "failed to upload blob tests/t1/1/audio.wav");
        assert_eq!(err.source().unwrap().to_string(), "read-only");
    }
}
