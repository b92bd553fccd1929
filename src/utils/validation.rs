use crate::utils::error::{LendingError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LendingError::validation(field_name, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(LendingError::validation(
            field_name,
            "Path contains null bytes",
        ));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LendingError::validation(
            field_name,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LendingError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_unique<'a>(field_name: &str, values: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(LendingError::validation(
                field_name,
                format!("Duplicate value: {}", value),
            ));
        }
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LendingError::validation(
            field_name,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.data_dir", "./data").is_ok());
        assert!(validate_path("storage.data_dir", "").is_err());
        assert!(validate_path("storage.data_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("policy.max_active_borrowings", 2, 1).is_ok());
        assert!(validate_positive_number("policy.max_active_borrowings", 0, 1).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("title", "Twilight").is_ok());
        assert!(validate_non_empty_string("title", "   ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("policy.penalty_days", 3, 0, 365).is_ok());
        assert!(validate_range("policy.penalty_days", -1, 0, 365).is_err());
        assert!(validate_range("policy.penalty_days", 366, 0, 365).is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("code", ["JK-45", "TW-11"]).is_ok());
        let err = validate_unique("code", ["JK-45", "JK-45"]).unwrap_err();
        assert_eq!(err.to_string(), "Validation error on code: Duplicate value: JK-45");
    }
}
