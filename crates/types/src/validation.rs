//! Input validation for domain fields.
//!
//! Used at the call-construction boundary (SDK) and at the HTTP boundary
//! (server). The mirror itself performs no schema validation beyond field
//! presence; anything stricter is a request-layer concern.

use crate::error::{MalformedArgumentsSnafu, RegistryError};

/// Requires a field to be non-empty after trimming.
///
/// # Errors
///
/// Returns [`RegistryError::MalformedArguments`] naming the offending field.
pub fn require_field(field: &str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return MalformedArgumentsSnafu { message: format!("{field} must not be empty") }.fail();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn accepts_non_empty_values() {
        assert!(require_field("studentId", "S100").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace_values() {
        let err = require_field("studentId", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedArguments);
        assert!(err.to_string().contains("studentId"));

        assert!(require_field("grade", "   ").is_err());
    }
}
