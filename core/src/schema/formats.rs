//! # Format Checkers
//!
//! Checks for `format` values the JSON Schema engine does not know about.
//! Checkers are looked up by format name in a [`FormatRegistry`], so new ones
//! can be registered without touching the validator.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value rejected by a format checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatViolation {
    /// Message key suffix (`format.base64.badLength`).
    pub key: String,
    /// Human readable explanation.
    pub message: String,
}

impl FormatViolation {
    /// Creates a violation.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A check for one `format` value.
///
/// Checkers only see instances of the types they understand; any other value
/// should be accepted.
pub trait FormatChecker: Send + Sync {
    /// Checks `value`.
    fn check(&self, value: &Value) -> Result<(), FormatViolation>;
}

impl<F> FormatChecker for F
where
    F: Fn(&Value) -> Result<(), FormatViolation> + Send + Sync,
{
    fn check(&self, value: &Value) -> Result<(), FormatViolation> {
        self(value)
    }
}

/// `format: byte` (standard base64 with padding).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Checker;

impl FormatChecker for Base64Checker {
    fn check(&self, value: &Value) -> Result<(), FormatViolation> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        let chars: Vec<char> = text.chars().collect();
        if chars.len() % 4 != 0 {
            return Err(FormatViolation::new(
                "format.base64.badLength",
                format!(
                    "Input length ({}) is not a multiple of 4 and is not valid base64",
                    chars.len()
                ),
            ));
        }

        let padding = chars
            .iter()
            .rev()
            .take(2)
            .take_while(|c| **c == '=')
            .count();
        for (index, c) in chars[..chars.len() - padding].iter().enumerate() {
            if !(c.is_ascii_alphanumeric() || *c == '+' || *c == '/') {
                return Err(FormatViolation::new(
                    "format.base64.illegalChars",
                    format!(
                        "Illegal character '{}' at index {} in base64 input",
                        c, index
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// `format: double`: the literal must survive conversion to `f64` unchanged.
///
/// Needs the number's original text, which `serde_json` keeps with the
/// `arbitrary_precision` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleChecker;

impl FormatChecker for DoubleChecker {
    fn check(&self, value: &Value) -> Result<(), FormatViolation> {
        let Value::Number(number) = value else {
            return Ok(());
        };
        let literal = number.to_string();
        let converted = literal.parse::<f64>().ok().filter(|f| f.is_finite());

        let representable = converted.is_some_and(|f| {
            let original = Decimal::parse(&literal);
            original.is_some() && original == Decimal::parse(&format!("{:e}", f))
        });
        if representable {
            return Ok(());
        }

        let converted = converted.map_or_else(|| "NaN".to_string(), |f| f.to_string());
        Err(FormatViolation::new(
            "format.double.notRepresentable",
            format!(
                "Numeric value '{}' is not representable as a double (converted value: {})",
                literal, converted
            ),
        ))
    }
}

/// A decimal as sign, significant digits and base-10 exponent.
#[derive(Debug, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Decimal {
    /// `None` for malformed text and for exponents outside the `i64` range.
    fn parse(text: &str) -> Option<Self> {
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if !int_part
            .chars()
            .chain(frac_part.chars())
            .all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let all_digits = format!("{}{}", int_part, frac_part);
        let significant = all_digits.trim_start_matches('0');
        if significant.is_empty() {
            return Some(Self {
                negative: false,
                digits: "0".to_string(),
                exponent: 0,
            });
        }
        let trimmed = significant.trim_end_matches('0');
        let trailing = i64::try_from(significant.len() - trimmed.len()).ok()?;
        let frac_len = i64::try_from(frac_part.len()).ok()?;
        let exponent = match exponent {
            Some(raw) => raw.parse::<i64>().ok()?,
            None => 0,
        };

        Some(Self {
            negative,
            digits: trimmed.to_string(),
            exponent: exponent.checked_sub(frac_len)?.checked_add(trailing)?,
        })
    }
}

/// Format checkers by name.
#[derive(Clone)]
pub struct FormatRegistry {
    checkers: HashMap<String, Arc<dyn FormatChecker>>,
}

impl FormatRegistry {
    /// A registry with no checkers.
    pub fn empty() -> Self {
        Self {
            checkers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the checker for `format`.
    pub fn with_checker(
        mut self,
        format: impl Into<String>,
        checker: impl FormatChecker + 'static,
    ) -> Self {
        self.checkers.insert(format.into(), Arc::new(checker));
        self
    }

    /// The checker for `format`.
    pub fn get(&self, format: &str) -> Option<&dyn FormatChecker> {
        self.checkers.get(format).map(|c| c.as_ref())
    }

    /// Whether no checkers are registered.
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

impl Default for FormatRegistry {
    /// `byte` and `double`.
    fn default() -> Self {
        Self::empty()
            .with_checker("byte", Base64Checker)
            .with_checker("double", DoubleChecker)
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.checkers.keys().collect();
        names.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(literal: &str) -> Value {
        serde_json::from_str(literal).unwrap()
    }

    #[test]
    fn test_base64_accepts_valid_input() {
        assert!(Base64Checker.check(&json!("")).is_ok());
        assert!(Base64Checker.check(&json!("QQ==")).is_ok());
        assert!(Base64Checker.check(&json!("QUJD")).is_ok());
        assert!(Base64Checker.check(&json!(42)).is_ok());
    }

    #[test]
    fn test_base64_bad_length() {
        let err = Base64Checker.check(&json!("QQ=")).unwrap_err();
        assert_eq!(err.key, "format.base64.badLength");
    }

    #[test]
    fn test_base64_illegal_char_reports_index() {
        let err = Base64Checker.check(&json!("QU$D")).unwrap_err();
        assert_eq!(err.key, "format.base64.illegalChars");
        assert!(err.message.contains("'$' at index 2"), "{}", err.message);
    }

    #[test]
    fn test_base64_padding_only_at_end() {
        let err = Base64Checker.check(&json!("Q=QQ")).unwrap_err();
        assert_eq!(err.key, "format.base64.illegalChars");
        assert!(Base64Checker.check(&json!("Q===")).is_err());
    }

    #[test]
    fn test_double_representable() {
        for literal in ["0.1", "1", "-2.5", "1e10", "1.0E-3", "0", "-0.0", "123456.789"] {
            assert!(DoubleChecker.check(&number(literal)).is_ok(), "{}", literal);
        }
    }

    #[test]
    fn test_double_not_representable() {
        let err = DoubleChecker
            .check(&number("3.14159265358979323846"))
            .unwrap_err();
        assert_eq!(err.key, "format.double.notRepresentable");
        assert!(err.message.contains("3.141592653589793"));
        assert!(DoubleChecker.check(&number("1e400")).is_err());
    }

    #[test]
    fn test_double_extreme_exponent_is_not_representable() {
        let err = DoubleChecker
            .check(&number("1.5e-9223372036854775808"))
            .unwrap_err();
        assert_eq!(err.key, "format.double.notRepresentable");
        let huge = DoubleChecker.check(&number("1e9223372036854775807"));
        assert!(huge.is_err());
        let zero = DoubleChecker.check(&number("0e-9223372036854775808"));
        assert!(zero.is_ok());
    }

    #[test]
    fn test_decimal_normalisation() {
        assert_eq!(Decimal::parse("1.50"), Decimal::parse("15e-1"));
        assert_eq!(Decimal::parse("-0"), Decimal::parse("0.000"));
        assert_ne!(Decimal::parse("1.5"), Decimal::parse("-1.5"));
    }

    #[test]
    fn test_registry_accepts_closures() {
        let registry = FormatRegistry::default().with_checker("even", |v: &Value| {
            match v.as_i64() {
                Some(n) if n % 2 != 0 => Err(FormatViolation::new("format.even.odd", "odd")),
                _ => Ok(()),
            }
        });
        assert!(registry.get("byte").is_some());
        assert!(registry.get("even").unwrap().check(&json!(3)).is_err());
        assert!(registry.get("uuid").is_none());
    }
}
