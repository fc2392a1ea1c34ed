//! Input validation helpers
//!
//! Text length limits shared by every entity that takes free text.

use crate::utils::{AppError, AppResult, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: menu item, stock item, staff member, category
pub const MAX_NAME_LEN: usize = 200;

/// Notes on orders and lines
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: unit, supplier, option label
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", field)
            .with_detail("reason", format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Margherita", "name", MAX_NAME_LEN).is_ok());
        assert_eq!(
            validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err().code,
            ErrorCode::RequiredField
        );
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            validate_required_text(&long, "name", MAX_NAME_LEN).unwrap_err().code,
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("no onions".into()), "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(501)), "notes", MAX_NOTE_LEN).is_err());
    }
}
