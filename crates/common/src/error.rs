//! Error types shared across KotakKata crates.

use std::path::PathBuf;

/// Top-level error type for KotakKata operations.
#[derive(Debug, thiserror::Error)]
pub enum KotakError {
    /// A capability the render pass cannot run without (text measurement,
    /// a font face, the drawing surface) is missing. Fatal for the pass.
    #[error("Dependency unavailable: {message}")]
    DependencyUnavailable { message: String },

    #[error("Image load error: {message}")]
    ImageLoad { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Clipboard error: {message}")]
    Clipboard { message: String },

    #[error("Share error: {message}")]
    Share { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using KotakError.
pub type KotakResult<T> = Result<T, KotakError>;

impl KotakError {
    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            message: msg.into(),
        }
    }

    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn clipboard(msg: impl Into<String>) -> Self {
        Self::Clipboard {
            message: msg.into(),
        }
    }

    pub fn share(msg: impl Into<String>) -> Self {
        Self::Share {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error means a required capability was missing rather
    /// than the operation itself going wrong.
    pub fn is_dependency_unavailable(&self) -> bool {
        matches!(self, Self::DependencyUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_format_message() {
        let err = KotakError::dependency("no font registered for \"Impact\"");
        assert_eq!(
            err.to_string(),
            "Dependency unavailable: no font registered for \"Impact\""
        );
        assert!(err.is_dependency_unavailable());
        assert!(!KotakError::export("boom").is_dependency_unavailable());
    }

    #[test]
    fn test_io_error_converts() {
        fn open_missing() -> KotakResult<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.json")?)
        }
        assert!(matches!(open_missing(), Err(KotakError::Io(_))));
    }
}
