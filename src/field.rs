//! Named-field capability for broadcast attribute access.
//!
//! Collections that read or write "the same field on every element" need a
//! uniform way to address fields by name without dynamic dispatch on the
//! element's shape. Elements opt in by implementing `FieldAccess`; values
//! cross the seam as `serde_json::Value`.

use serde_json::Value;

/// Named-field get/set capability.
///
/// Implementations decide which names exist. Reading an unknown name is
/// `FieldError::Missing`; whether writing an unknown name creates the field
/// or fails is up to the element type.
pub trait FieldAccess {
    /// Read the named field.
    fn field(&self, name: &str) -> Result<Value, FieldError>;

    /// Write the named field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;
}

/// Failure to address a named field on an element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The element has no field with this name.
    #[error("no field named `{name}`")]
    Missing {
        /// The requested field name.
        name: String,
    },
    /// The value cannot be converted to the field's type.
    #[error("invalid value for field `{name}`: {reason}")]
    Invalid {
        /// The requested field name.
        name: String,
        /// Conversion failure detail.
        reason: String,
    },
}

impl FieldError {
    /// Shorthand for a `Missing` error.
    pub fn missing(name: impl Into<String>) -> Self {
        FieldError::Missing { name: name.into() }
    }

    /// Shorthand for an `Invalid` error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::Invalid { name: name.into(), reason: reason.into() }
    }
}
