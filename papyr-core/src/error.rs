//! Error types for Papyr core operations

use thiserror::Error;

/// Errors produced by core type parsing and invariants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid value '{value}' for {enum_name}")]
    InvalidEnumValue {
        enum_name: &'static str,
        value: String,
    },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}
