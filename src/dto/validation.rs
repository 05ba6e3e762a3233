//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a room's category list is non-empty and contains no blank
/// entries.
pub fn validate_categories(categories: &[String]) -> Result<(), ValidationError> {
    if categories.is_empty() {
        let mut err = ValidationError::new("categories_empty");
        err.message = Some("at least one category is required".into());
        return Err(err);
    }

    if categories.iter().any(|category| category.trim().is_empty()) {
        let mut err = ValidationError::new("categories_blank");
        err.message = Some("categories must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_categories() {
        assert!(validate_categories(&["history".into()]).is_ok());
        assert!(validate_categories(&["history".into(), "science".into()]).is_ok());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(validate_categories(&[]).is_err());
    }

    #[test]
    fn rejects_blank_entries() {
        assert!(validate_categories(&["history".into(), "   ".into()]).is_err());
        assert!(validate_categories(&["".into()]).is_err());
    }
}
