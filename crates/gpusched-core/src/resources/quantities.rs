use crate::error::{GpuschedError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

const BINARY_SUFFIXES: [(&str, f64); 6] = [
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
];

const DECIMAL_SUFFIXES: [(char, f64); 9] = [
    ('n', 1e-9),
    ('u', 1e-6),
    ('m', 1e-3),
    ('k', 1e3),
    ('M', 1e6),
    ('G', 1e9),
    ('T', 1e12),
    ('P', 1e15),
    ('E', 1e18),
];

/// Parse a Kubernetes quantity string (e.g., "8", "16Gi", "1500m", "1e3")
/// into its integer value.
///
/// Fractional results are rounded up, the same way `Quantity.Value()` behaves
/// in the Kubernetes API machinery.
pub fn parse_quantity(value: &str) -> Result<i64> {
    let s = value.trim();
    if s.is_empty() {
        return Err(GpuschedError::invalid_quantity(value, "empty quantity"));
    }

    let (number, multiplier) = split_suffix(s);

    let parsed: f64 = number
        .parse()
        .map_err(|e| GpuschedError::invalid_quantity(value, format!("{}", e)))?;

    if !parsed.is_finite() {
        return Err(GpuschedError::invalid_quantity(value, "not a finite number"));
    }

    let scaled = parsed * multiplier;

    // Absorb float noise such as 1.1 * 1e9 before rounding up
    let nearest = scaled.round();
    let rounded = if (scaled - nearest).abs() < 1e-6 {
        nearest
    } else {
        scaled.ceil()
    };

    if rounded > i64::MAX as f64 || rounded < i64::MIN as f64 {
        return Err(GpuschedError::invalid_quantity(value, "out of range"));
    }

    Ok(rounded as i64)
}

/// Integer value of a k8s-openapi Quantity
pub fn quantity_value(quantity: &Quantity) -> Result<i64> {
    parse_quantity(&quantity.0)
}

fn split_suffix(s: &str) -> (&str, f64) {
    for (suffix, multiplier) in BINARY_SUFFIXES {
        if let Some(number) = s.strip_suffix(suffix) {
            return (number, multiplier);
        }
    }

    if let Some(last) = s.chars().last() {
        for (suffix, multiplier) in DECIMAL_SUFFIXES {
            if last == suffix {
                return (&s[..s.len() - 1], multiplier);
            }
        }
    }

    (s, 1.0)
}
