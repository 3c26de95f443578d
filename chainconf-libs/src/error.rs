//! Error types for chainconf.
//!
//! This module provides the single error type shared by the document model,
//! the placement algorithm, the file provider and the action executor.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for chainconf.
///
/// Covers the failure modes of editing a chain configuration document:
/// - Path conflicts with an existing default chain
/// - Invalid documents or settings
/// - Load/persist failures of the backing file
/// - Failures inside one document of a multi-document run
#[derive(Error, Debug)]
pub enum ConfError {
    /// The requested path conflicts with the reader path of the existing
    /// default chain. The caller must name a chain explicitly.
    ///
    /// # Example
    /// ```
    /// use chainconf_libs::ConfError;
    /// let error = ConfError::PathMismatch {
    ///     transformation_type: "imports-cleaner".to_string(),
    ///     expected: "src".to_string(),
    ///     found: "other".to_string(),
    /// };
    /// assert!(error.to_string().contains("imports-cleaner"));
    /// ```
    #[error(
        "The user must specify a chain name (new or existing) where to add the transformation: [{transformation_type}] (default chain reads '{expected}', requested '{found}')"
    )]
    PathMismatch {
        transformation_type: String,
        expected: String,
        found: String,
    },

    /// Configuration error - invalid or missing configuration
    ///
    /// # Example
    /// ```
    /// use chainconf_libs::ConfError;
    /// let error = ConfError::ConfigError("default_path cannot be empty".to_string());
    /// ```
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The configuration document does not exist
    #[error("Configuration document not found: {0:?}")]
    NotFound(PathBuf),

    /// The configuration document exists but could not be parsed
    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The configuration document could not be written back
    #[error("Failed to persist {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error raised while editing one document, tagged with the document
    /// path and the transformation type involved
    #[error("{path:?} [{transformation_type}]: {source}")]
    Document {
        path: PathBuf,
        transformation_type: String,
        #[source]
        source: Box<ConfError>,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    ///
    /// Wraps serde_yaml errors for settings and document files
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    ///
    /// Wraps serde_json errors (transformation parameters)
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ConfError {
    /// Wrap an error with the document and transformation it belongs to.
    ///
    /// Errors that are already tagged are returned unchanged so that module
    /// recursion reports the innermost document.
    pub fn in_document(self, path: impl Into<PathBuf>, transformation_type: &str) -> Self {
        match self {
            ConfError::Document { .. } => self,
            other => ConfError::Document {
                path: path.into(),
                transformation_type: transformation_type.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Whether this error (or the error it wraps) is a path conflict
    pub fn is_path_mismatch(&self) -> bool {
        match self {
            ConfError::PathMismatch { .. } => true,
            ConfError::Document { source, .. } => source.is_path_mismatch(),
            _ => false,
        }
    }
}
