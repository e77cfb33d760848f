//! Shared numeric helpers used by the gauge, axis and KPI modules

use serde_json::Value;

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics when `min > max`; the lower bound
/// wins in that case.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Interpret a JSON value as a finite number.
///
/// Strings, booleans, nulls and non-finite numbers are all "not computed"
/// and map to `None`.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// Keep only finite values.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Format a value with fixed decimals, or "-" when it is absent
pub fn format_number(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:.*}", digits, v),
        None => "-".to_string(),
    }
}

/// Format a value with an optional unit suffix ("1.25 s")
pub fn format_metric_value(value: Option<f64>, digits: usize, unit: Option<&str>) -> String {
    let base = format_number(value, digits);
    if base == "-" {
        return base;
    }
    match unit {
        Some(u) if !u.is_empty() => format!("{} {}", base, u),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        // inverted bounds do not panic
        assert_eq!(clamp(0.5, 1.0, 0.0), 1.0);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(Some(&json!(1.5))), Some(1.5));
        assert_eq!(to_number(Some(&json!(3))), Some(3.0));
        assert_eq!(to_number(Some(&json!("1.5"))), None);
        assert_eq!(to_number(Some(&json!(null))), None);
        assert_eq!(to_number(Some(&json!(true))), None);
        assert_eq!(to_number(None), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_number(Some(1.23456), 2), "1.23");
        assert_eq!(format_number(Some(f64::NAN), 2), "-");
        assert_eq!(format_number(None, 0), "-");
        assert_eq!(format_metric_value(Some(1.5), 2, Some("s")), "1.50 s");
        assert_eq!(format_metric_value(Some(1.5), 1, None), "1.5");
        assert_eq!(format_metric_value(None, 2, Some("s")), "-");
    }
}
