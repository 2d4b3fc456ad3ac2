//! CLI Error Types
//!
//! Comprehensive error handling with clear, actionable error messages.

use std::path::Path;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors with helpful messages and hints
#[derive(Debug, Error)]
pub enum CliError {
    /// The schema file passed on the command line does not exist
    #[error("Schema file not found: {path}\n  Hint: pass the path to a YAML or JSON resource schema")]
    SchemaNotFound { path: String },

    /// The schema file has an extension the CLI cannot dispatch on
    #[error("Unsupported schema extension: {path}\n  Hint: use a .yaml, .yml, or .json file")]
    UnsupportedExtension { path: String },

    /// Code generation failed
    #[error("Generation error: {0}")]
    Codegen(#[from] apidef_codegen::CodegenError),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a schema not found error
    pub fn schema_not_found(path: &Path) -> Self {
        Self::SchemaNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create an unsupported extension error
    pub fn unsupported_extension(path: &Path) -> Self {
        Self::UnsupportedExtension {
            path: path.display().to_string(),
        }
    }
}
