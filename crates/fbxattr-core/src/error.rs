//! Unified error handling for fbxattr
//!
//! This module provides the error type shared by the import pipeline and
//! the command-line host. Parser-level failures are reported by
//! `fbxattr_parsers::ParseError` and surface here as [`Error::SceneRead`].

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all fbxattr operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Asset Errors ====================

    /// The target path already holds an asset that is not a compatible container
    #[error("A file of different type already exists on the path \"{path}\". Unable to generate an attribute file for the model \"{model}\"")]
    Conflict {
        path: String,
        model: String,
    },

    /// The source model could not be resolved by the asset database
    #[error("Model not found: {path}")]
    ModelNotFound {
        path: String,
    },

    /// No asset stored at the given path
    #[error("Asset not found: {path}")]
    AssetNotFound {
        path: String,
    },

    /// The FBX scene could not be read
    #[error("Failed to read scene {path}: {message}")]
    SceneRead {
        path: String,
        message: String,
    },

    /// Stored asset (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    /// A filter pattern failed to compile
    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern {
        pattern: String,
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create a scene read error
    pub fn scene_read(path: impl Into<String>, message: impl ToString) -> Self {
        Error::SceneRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::ModelNotFound { .. } | Error::AssetNotFound { .. }
        )
    }

    /// Check if this is a target path conflict, looking through context wrappers
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Conflict { .. } => true,
            Error::WithContext { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::FileNotFound(PathBuf::from("/test"));
        let contextualized = err.with_context("while loading config");

        assert!(contextualized.to_string().contains("while loading config"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::FileNotFound(PathBuf::from("/test")).is_not_found());
        assert!(Error::AssetNotFound { path: "a.asset".into() }.is_not_found());
        assert!(!Error::invalid_data("boom").is_not_found());
    }

    #[test]
    fn test_conflict_message_names_path_and_model() {
        let err = Error::Conflict {
            path: "Models/Car_Attributes.asset".into(),
            model: "Car".into(),
        };

        let message = err.to_string();
        assert!(message.contains("Models/Car_Attributes.asset"));
        assert!(message.contains("\"Car\""));
        assert!(err.with_context("materializing").is_conflict());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::ModelNotFound { path: "Car.fbx".into() });
        let with_context = result.context("loading model");

        assert!(with_context.is_err());
        assert!(with_context.unwrap_err().to_string().contains("loading model"));
    }
}
