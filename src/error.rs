use std::path::PathBuf;

/// Errors produced by indexing and searching
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR failed for {}: {message}", path.display())]
    Ocr { path: PathBuf, message: String },

    #[error("Index store {} is corrupt: {reason}", path.display())]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Index store {} is locked by another indexing pass", path.display())]
    StoreLocked { path: PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Indexing cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_helper() {
        let err = Error::io("/a.png", std::io::Error::other("boom"));
        assert!(matches!(err, Error::Io { ref path, .. } if path.as_os_str() == "/a.png"));
        assert_eq!(err.to_string(), "IO error on /a.png: boom");
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = Error::StoreCorrupt {
            path: "/scans/.ocrindex.json".into(),
            reason: "expected value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/scans/.ocrindex.json"));
        assert!(msg.contains("expected value"));
    }
}
