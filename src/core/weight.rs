//! Weight rounding and display formatting
//!
//! Every weight sum in the crate passes through [`round4`] before it is stored
//! or displayed. The formatting functions are pure and never produce
//! scientific notation.

/// Unit suffix appended to formatted weights
pub const WEIGHT_UNIT: &str = "kg";

/// Round a kilogram value to 4 decimal places
///
/// `round4(x) = round(x * 10000) / 10000`. Idempotent for every finite input.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Number of decimal places used for a value of this magnitude
fn decimals_for(kg: f64) -> usize {
    let magnitude = kg.abs();
    if magnitude < 0.01 {
        4
    } else if magnitude < 0.1 {
        3
    } else if magnitude < 1.0 {
        2
    } else if magnitude < 10.0 {
        1
    } else if magnitude.fract() == 0.0 {
        0
    } else {
        1
    }
}

/// Format a weight with magnitude-dependent precision, without the unit
///
/// | range | decimals |
/// |---|---|
/// | 0 | none (`"0"`) |
/// | < 0.01 | 4 |
/// | < 0.1 | 3 |
/// | < 1 | 2 |
/// | < 10 | 1 |
/// | ≥ 10 | 0 if integral, else 1 |
pub fn format_weight_number(kg: f64) -> String {
    if !kg.is_finite() || kg == 0.0 {
        return "0".to_string();
    }
    to_fixed(kg, decimals_for(kg))
}

/// Fixed-point text at `decimals` places, exact ties rounded away from zero
///
/// `format!` rounds exact ties to even (`1.25` becomes `"1.2"`); order
/// documents print them rounded up (`"1.3"`).
fn to_fixed(kg: f64, decimals: usize) -> String {
    if !is_exact_tie(kg, decimals) {
        return format!("{:.*}", decimals, kg);
    }

    // a tie is k + 0.5 after scaling, which f64 holds exactly
    let scaled = (kg.abs() * 10f64.powi(decimals as i32)).floor() as u64 + 1;
    let mut text = format!("{:0>width$}", scaled, width = decimals + 1);
    if decimals > 0 {
        text.insert(text.len() - decimals, '.');
    }
    if kg < 0.0 {
        text.insert(0, '-');
    }
    text
}

/// Whether the exact binary value of `kg` lies halfway between two values
/// at `decimals` places
fn is_exact_tie(kg: f64, decimals: usize) -> bool {
    let bits = kg.abs().to_bits();
    let biased_exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased_exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exponent - 1075)
    };

    // integers are never ties; below 2^-127 the scaled value cannot reach 1/2
    if mantissa == 0 || exponent >= 0 || exponent < -127 {
        return false;
    }

    // kg * 10^d = mantissa * 10^d / 2^shift; a tie doubles to an odd integer
    let shift = (-exponent) as u32;
    let doubled = 2 * mantissa as u128 * 10u128.pow(decimals as u32);
    let denominator = 1u128 << shift;
    doubled % denominator == 0 && (doubled / denominator) % 2 == 1
}

/// Format a weight with magnitude-dependent precision and the `kg` unit
///
/// ```
/// use material_order::core::weight::format_weight;
///
/// assert_eq!(format_weight(0.0), "0kg");
/// assert_eq!(format_weight(0.005), "0.0050kg");
/// assert_eq!(format_weight(19.48), "19.5kg");
/// assert_eq!(format_weight(100.0), "100kg");
/// ```
pub fn format_weight(kg: f64) -> String {
    format!("{}{}", format_weight_number(kg), WEIGHT_UNIT)
}

/// Format a weight at full 4-decimal precision with trailing zeros stripped
///
/// Used for totals, where precision must survive regardless of magnitude.
pub fn format_weight_full(kg: f64) -> String {
    if !kg.is_finite() {
        return format!("0{}", WEIGHT_UNIT);
    }

    let rounded = round4(kg);
    let fixed = format!("{:.4}", rounded);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

    match trimmed {
        "" | "-0" => format!("0{}", WEIGHT_UNIT),
        value => format!("{}{}", value, WEIGHT_UNIT),
    }
}
