//! Reusable field validators
//!
//! Plugged into `#[validate(custom(function = ...))]` on the input structs.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Largest unit weight accepted for a catalog material
pub const MAX_UNIT_WEIGHT_KG: f64 = 100_000.0;

/// Field must contain something other than whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Login names end up in order numbers, so they are restricted to ASCII
/// letters, digits, `_`, `.` and `-`
pub fn username(value: &str) -> Result<(), ValidationError> {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,31}$").expect("username pattern is valid")
    });
    if !regex.is_match(value) {
        let mut err = ValidationError::new("username");
        err.message = Some("must be 1-32 ASCII letters, digits, '_', '.' or '-'".into());
        return Err(err);
    }
    Ok(())
}

/// Unit weight must be finite, positive and within range
pub fn unit_weight(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be a positive number".into());
        return Err(err);
    }
    if value > MAX_UNIT_WEIGHT_KG {
        let mut err = ValidationError::new("range");
        err.message = Some(format!("must not exceed {}", MAX_UNIT_WEIGHT_KG).into());
        return Err(err);
    }
    Ok(())
}
