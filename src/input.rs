//! Parse-and-validate step for raw form text.
//!
//! Every number typed into the inventory or billing forms passes through
//! here before it can reach a calculation. Bounds are enforced by rejection,
//! never by clamping.

use std::fmt;
use thiserror::Error;

/// A form field, used to name the culprit in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Quantity,
    Price,
    Discount,
}

impl Field {
    pub fn parse(s: &str) -> Option<Field> {
        match s.to_ascii_lowercase().as_str() {
            "name" | "medicine" => Some(Field::Name),
            "quantity" | "qty" => Some(Field::Quantity),
            "price" => Some(Field::Price),
            "discount" => Some(Field::Discount),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Quantity => "quantity",
            Field::Price => "price",
            Field::Discount => "discount",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is missing")]
    Missing(Field),

    #[error("{field} '{value}' is not a number")]
    NotANumber { field: Field, value: String },

    #[error("{field} '{value}' must be a whole number")]
    NotAnInteger { field: Field, value: String },

    #[error("{field} '{value}' must not be negative")]
    Negative { field: Field, value: String },

    #[error("{field} '{value}' must be between {min} and {max}")]
    OutOfRange {
        field: Field,
        value: String,
        min: f64,
        max: f64,
    },
}

pub type Validated<T> = std::result::Result<T, ValidationError>;

/// Non-empty, trimmed text.
pub fn parse_name(raw: &str) -> Validated<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Missing(Field::Name));
    }
    Ok(name.to_string())
}

/// A whole, non-negative number of units.
pub fn parse_quantity(raw: &str) -> Validated<u32> {
    let value = parse_finite(Field::Quantity, raw)?;
    check_quantity(value).map_err(|e| with_value(e, raw.trim()))
}

/// A finite, non-negative unit price.
pub fn parse_price(raw: &str) -> Validated<f64> {
    let value = parse_finite(Field::Price, raw)?;
    check_price(value).map_err(|e| with_value(e, raw.trim()))
}

/// A percentage in `[0, 100]`. Blank means no discount.
pub fn parse_discount(raw: &str) -> Validated<f64> {
    if raw.trim().is_empty() {
        return Ok(0.0);
    }
    let value = parse_finite(Field::Discount, raw)?;
    check_discount(value).map_err(|e| with_value(e, raw.trim()))
}

/// Range check for a quantity that arrived already typed (e.g. from TOML).
pub fn check_quantity(value: f64) -> Validated<u32> {
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: Field::Quantity,
            value: value.to_string(),
        });
    }
    if value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(ValidationError::NotAnInteger {
            field: Field::Quantity,
            value: value.to_string(),
        });
    }
    Ok(value as u32)
}

pub fn check_price(value: f64) -> Validated<f64> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber {
            field: Field::Price,
            value: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: Field::Price,
            value: value.to_string(),
        });
    }
    Ok(value)
}

pub fn check_discount(value: f64) -> Validated<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: Field::Discount,
            value: value.to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(value)
}

fn parse_finite(field: Field, raw: &str) -> Validated<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::NotANumber {
            field,
            value: text.to_string(),
        }),
    }
}

// Report the value as the user typed it rather than its f64 rendering.
fn with_value(err: ValidationError, raw: &str) -> ValidationError {
    let value = raw.to_string();
    match err {
        ValidationError::NotANumber { field, .. } => ValidationError::NotANumber { field, value },
        ValidationError::NotAnInteger { field, .. } => {
            ValidationError::NotAnInteger { field, value }
        }
        ValidationError::Negative { field, .. } => ValidationError::Negative { field, value },
        ValidationError::OutOfRange { field, min, max, .. } => ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_whole_and_non_negative() {
        assert_eq!(parse_quantity(" 10 "), Ok(10));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert_eq!(
            parse_quantity("2.5"),
            Err(ValidationError::NotAnInteger {
                field: Field::Quantity,
                value: "2.5".into()
            })
        );
        assert_eq!(
            parse_quantity("-1"),
            Err(ValidationError::Negative {
                field: Field::Quantity,
                value: "-1".into()
            })
        );
        assert_eq!(
            parse_quantity(""),
            Err(ValidationError::Missing(Field::Quantity))
        );
    }

    #[test]
    fn price_rejects_text_and_non_finite() {
        assert_eq!(parse_price("5.00"), Ok(5.0));
        assert!(matches!(
            parse_price("abc"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_price("NaN"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_price("inf"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_price("-0.5"),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn discount_is_a_bounded_percentage() {
        assert_eq!(parse_discount(""), Ok(0.0));
        assert_eq!(parse_discount("12.5"), Ok(12.5));
        assert_eq!(parse_discount("100"), Ok(100.0));
        let err = parse_discount("101").unwrap_err();
        assert_eq!(err.to_string(), "discount '101' must be between 0 and 100");
        assert!(parse_discount("-5").is_err());
    }

    #[test]
    fn name_is_trimmed_and_required() {
        assert_eq!(parse_name("  Arnica 30C "), Ok("Arnica 30C".to_string()));
        assert_eq!(parse_name("   "), Err(ValidationError::Missing(Field::Name)));
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!(Field::parse("Qty"), Some(Field::Quantity));
        assert_eq!(Field::parse("DISCOUNT"), Some(Field::Discount));
        assert_eq!(Field::parse("colour"), None);
    }
}
