//! Common validation utilities.

use validator::ValidationError;

/// Longest redemption code accepted from a scanner or manual entry.
pub const MAX_REDEMPTION_CODE_LENGTH: usize = 128;

/// Longest category filter accepted on listing queries.
pub const MAX_CATEGORY_LENGTH: usize = 64;

/// Upper bound for proximity searches, in kilometers.
pub const MAX_SEARCH_RADIUS_KM: f64 = 50.0;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a proximity search radius (strictly positive, at most 50 km).
pub fn validate_radius_km(radius_km: f64) -> Result<(), ValidationError> {
    if radius_km > 0.0 && radius_km <= MAX_SEARCH_RADIUS_KM {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be greater than 0 and at most 50 km".into());
        Err(err)
    }
}

/// Normalizes a scanned or typed redemption code.
///
/// Surrounding whitespace is removed. Returns `None` when nothing usable is
/// left: an empty code, one longer than [`MAX_REDEMPTION_CODE_LENGTH`], or
/// one containing control characters.
pub fn normalize_redemption_code(raw: &str) -> Option<&str> {
    let code = raw.trim();
    if code.is_empty()
        || code.chars().count() > MAX_REDEMPTION_CODE_LENGTH
        || code.chars().any(char::is_control)
    {
        return None;
    }
    Some(code)
}

/// Validates an optional category filter.
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    let trimmed = category.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_CATEGORY_LENGTH {
        let mut err = ValidationError::new("category_length");
        err.message = Some("Category must be between 1 and 64 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(-33.4372).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(-70.6506).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_radius_km() {
        assert!(validate_radius_km(0.5).is_ok());
        assert!(validate_radius_km(50.0).is_ok());
        assert!(validate_radius_km(0.0).is_err());
        assert!(validate_radius_km(-1.0).is_err());
        assert!(validate_radius_km(50.1).is_err());
    }

    #[test]
    fn test_normalize_redemption_code_trims() {
        assert_eq!(
            normalize_redemption_code("  FLASHY-EMP-001\n"),
            Some("FLASHY-EMP-001")
        );
    }

    #[test]
    fn test_normalize_redemption_code_rejects_blank() {
        assert_eq!(normalize_redemption_code(""), None);
        assert_eq!(normalize_redemption_code("   "), None);
        assert_eq!(normalize_redemption_code("\t\n"), None);
    }

    #[test]
    fn test_normalize_redemption_code_rejects_control_chars() {
        assert_eq!(normalize_redemption_code("FLASHY\u{0}001"), None);
    }

    #[test]
    fn test_normalize_redemption_code_length_limit() {
        let at_limit = "A".repeat(MAX_REDEMPTION_CODE_LENGTH);
        let over_limit = "A".repeat(MAX_REDEMPTION_CODE_LENGTH + 1);
        assert!(normalize_redemption_code(&at_limit).is_some());
        assert!(normalize_redemption_code(&over_limit).is_none());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("Comida Rápida").is_ok());
        assert!(validate_category("  ").is_err());
        assert!(validate_category(&"x".repeat(65)).is_err());
    }
}
