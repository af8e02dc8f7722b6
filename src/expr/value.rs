//! Evaluated values and number formatting.

use std::fmt;

/// The result of evaluating an expression.
///
/// `Bool` only appears as an intermediate (a conditional's condition); a final
/// property value must be a `Dim` or a `Str`.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedValue {
    Dim(f64, Option<String>),
    Str(String),
    Bool(bool),
}

impl EvaluatedValue {
    pub fn dim(value: f64, unit: &str) -> Self {
        let unit = (!unit.is_empty()).then(|| unit.to_owned());
        EvaluatedValue::Dim(value, unit)
    }

    pub fn str(value: impl Into<String>) -> Self {
        EvaluatedValue::Str(value.into())
    }

    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            EvaluatedValue::Dim(..) => "dimension",
            EvaluatedValue::Str(_) => "string",
            EvaluatedValue::Bool(_) => "boolean",
        }
    }

    pub fn is_renderable(&self) -> bool {
        !matches!(self, EvaluatedValue::Bool(_))
    }
}

/// Format a number for CSS output.
///
/// Integral values print without a decimal point; others print with at most
/// four fractional digits, trailing zeros trimmed. Infinite values print as
/// `infinity` / `-infinity`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "infinity" } else { "-infinity" }.to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let fixed = format!("{value:.4}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_owned(),
        other => other.to_owned(),
    }
}

impl fmt::Display for EvaluatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatedValue::Dim(value, _) if value.is_infinite() || value.is_nan() => {
                f.write_str(&format_number(*value))
            }
            EvaluatedValue::Dim(value, unit) => {
                write!(f, "{}{}", format_number(*value), unit.as_deref().unwrap_or(""))
            }
            EvaluatedValue::Str(value) => f.write_str(value),
            EvaluatedValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_has_no_decimal_point() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn fractional_trimmed_to_four_digits() {
        assert_eq!(format_number(1.6), "1.6");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
        assert_eq!(format_number(2.0 / 3.0), "0.6667");
        assert_eq!(format_number(0.00001), "0");
    }

    #[test]
    fn infinity() {
        assert_eq!(format_number(f64::INFINITY), "infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-infinity");
        assert_eq!(EvaluatedValue::dim(f64::INFINITY, "px").to_string(), "infinity");
    }

    #[test]
    fn display() {
        assert_eq!(EvaluatedValue::dim(50.0, "px").to_string(), "50px");
        assert_eq!(EvaluatedValue::dim(1.6, "").to_string(), "1.6");
        assert_eq!(EvaluatedValue::str("red").to_string(), "red");
        assert_eq!(EvaluatedValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn renderable() {
        assert!(EvaluatedValue::str("x").is_renderable());
        assert!(!EvaluatedValue::Bool(false).is_renderable());
    }
}
