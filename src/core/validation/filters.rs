//! Input filters applied before validation
//!
//! Text fields arrive straight from form inputs: surrounding whitespace is
//! trimmed and blank optional fields are treated as absent.

/// Trim surrounding whitespace
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Trim an optional field, mapping blank input to `None`
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| trim(&v)).filter(|v| !v.is_empty())
}

/// Parse a quantity typed into a form field
///
/// Unparseable, non-finite and negative input yields 0. Fractions are
/// truncated and values above `u32::MAX` saturate.
pub fn quantity_from_text(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    if let Ok(whole) = text.parse::<i64>() {
        return clamp_quantity(whole);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => {
            if value >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                value.trunc() as u32
            }
        }
        _ => 0,
    }
}

/// Clamp a signed quantity into the non-negative `u32` range
pub fn clamp_quantity(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
