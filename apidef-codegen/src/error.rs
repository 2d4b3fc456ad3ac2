//! Compiler error types
//!
//! Everything after validation reports failure through [`CodegenError`]:
//! graph resolution, type mapping, and artifact serialization. Errors carry
//! the schema element that caused them so a bad definition can be pinpointed
//! without re-running anything.

use thiserror::Error;

/// Result type for resolution and generation operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// A fatal compilation error.
///
/// Validation problems are not represented here — they are collected as
/// [`crate::ValidationError`] values before resolution starts. Every variant
/// below aborts the stage that produced it.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A resource names a parent that is not declared in the service.
    #[error("parent {parent:?} for resource {resource:?} not found")]
    ParentNotFound { parent: String, resource: String },

    /// A property references a schema or resource kind that does not exist.
    #[error("could not find message {reference}, referenced by {referrer}")]
    UnknownReference { reference: String, referrer: String },

    /// A property type has no representation in the target output.
    #[error("unsupported type for property {property:?}: {detail}")]
    UnsupportedType { property: String, detail: String },

    /// The OpenAPI document failed to serialize.
    #[error("serializing OpenAPI document: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_not_found_names_both_sides() {
        let e = CodegenError::ParentNotFound {
            parent: "bookstore.example.com/publisher".to_string(),
            resource: "book".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bookstore.example.com/publisher"), "{msg}");
        assert!(msg.contains("\"book\""), "{msg}");
    }

    #[test]
    fn unknown_reference_names_referrer() {
        let e = CodegenError::UnknownReference {
            reference: "author".to_string(),
            referrer: "book.author".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "could not find message author, referenced by book.author"
        );
    }
}
