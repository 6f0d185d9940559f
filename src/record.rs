//! Traits every stored record type implements, plus the parse-and-validate
//! helpers used wherever user or file input becomes a field value.

use crate::error::ValidationError;

/// A uniquely keyed entry of a [`RecordStore`](crate::store::RecordStore).
///
/// Keys compare case-insensitively; see [`keys_match`].
pub trait Record {
    /// The identifying key: a product name, product id or student name.
    fn key(&self) -> &str;

    /// Check the field invariants of this record.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A record that can be partially updated.
///
/// `patched` only builds the candidate; the store validates it before
/// replacing the original, so a patch is applied completely or not at all.
pub trait Patchable: Record + Sized {
    type Patch;

    fn patched(&self, patch: &Self::Patch) -> Self;
}

/// A record with a unit price and a countable quantity.
///
/// Statistics and the CSV merge policy are defined over this trait.
pub trait Stocked: Record {
    fn price(&self) -> f64;
    fn quantity(&self) -> u32;
    fn set_price(&mut self, price: f64);
    fn add_quantity(&mut self, quantity: u32);

    /// `price × quantity`.
    fn value(&self) -> f64 {
        self.price() * f64::from(self.quantity())
    }
}

/// Case-insensitive key comparison, Unicode aware.
pub fn keys_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Trim `input` and reject it when nothing is left.
pub fn require_text<'a>(field: &'static str, input: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(trimmed)
    }
}

/// Stored text must be non-empty and already trimmed, the form
/// [`require_text`] produces and CSV load reads back.
pub fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = require_text(field, value)?;
    if trimmed.len() != value.len() {
        return Err(ValidationError::Padded {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Parse a non-negative, finite decimal such as a price.
pub fn parse_amount(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    let value: f64 = trimmed
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field,
            input: trimmed.to_string(),
        })?;
    check_non_negative(field, value)
}

/// Parse a non-negative whole number such as a quantity.
pub fn parse_count(field: &'static str, input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            input: trimmed.to_string(),
        })?;
    if value < 0 {
        return Err(ValidationError::Negative {
            field,
            value: value as f64,
        });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        min: 0.0,
        max: f64::from(u32::MAX),
        value: value as f64,
    })
}

pub fn check_non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber {
            field,
            input: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

pub fn check_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = check_non_negative(field, value)?;
    if value == 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_ignores_case_including_accents() {
        assert!(keys_match("Mouse", "mOUSE"));
        assert!(keys_match("Audífonos", "AUDÍFONOS"));
        assert!(!keys_match("Mouse", "Mouse "));
        assert!(!keys_match("Mouse", "Mice"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("price", " 10.5 "), Ok(10.5));
        assert_eq!(parse_amount("price", "0"), Ok(0.0));
        assert_eq!(
            parse_amount("price", "-1"),
            Err(ValidationError::Negative {
                field: "price",
                value: -1.0
            })
        );
        assert!(matches!(
            parse_amount("price", "abc"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_amount("price", "NaN"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_amount("price", "inf"),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("quantity", "7"), Ok(7));
        assert!(matches!(
            parse_count("quantity", "-3"),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            parse_count("quantity", "2.5"),
            Err(ValidationError::NotAnInteger { .. })
        ));
        assert!(matches!(
            parse_count("quantity", "99999999999"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Pera "), Ok("Pera"));
        assert_eq!(
            require_text("name", "   "),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn test_check_text_rejects_padding() {
        assert_eq!(check_text("name", "Mango"), Ok(()));
        assert_eq!(check_text("name", "Pera roja"), Ok(()));
        assert!(matches!(
            check_text("name", " Mango"),
            Err(ValidationError::Padded { field: "name", .. })
        ));
        assert!(matches!(
            check_text("name", "mango\t"),
            Err(ValidationError::Padded { .. })
        ));
        assert_eq!(
            check_text("name", "  "),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn test_check_positive_rejects_zero() {
        assert!(matches!(
            check_positive("price", 0.0),
            Err(ValidationError::NotPositive { .. })
        ));
        assert_eq!(check_positive("price", 0.01), Ok(0.01));
    }
}
