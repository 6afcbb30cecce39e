//! Comparison semantics
//!
//! Operands reach this module already reduced to concrete values. Plain
//! values order generically (numbers, strings, atoms); typed scalars only
//! compare within the same tag and dispatch on it. Every ill-typed
//! comparison is a fatal error, not a branch failure.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::CompareOp;
use crate::error::{Error, Result};
use crate::temporal::{parse_date, parse_datetime, parse_time, DateTimeValue, IsoDuration};
use crate::value::Value;

pub(crate) fn is_typed_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Date(_)
            | Value::DateTime(_)
            | Value::Time(_)
            | Value::Duration(_)
            | Value::Uri(_)
            | Value::Currency { .. }
            | Value::Unit { .. }
            | Value::Geo { .. }
    )
}

/// Evaluate `lhs op rhs` per the comparison rules.
pub(crate) fn compare_values(lhs: &Value, rhs: &Value, op: CompareOp) -> Result<bool> {
    if is_typed_scalar(lhs) && is_typed_scalar(rhs) {
        return compare_typed(lhs, rhs, op);
    }

    match op {
        CompareOp::Equal => Ok(lhs == rhs),
        CompareOp::NotEqual => Ok(lhs != rhs),
        _ => {
            let ordering = generic_ordering(lhs, rhs)?;
            Ok(apply_ordering(op, ordering))
        }
    }
}

/// Natural ordering used by min/max aggregation and the ordered
/// comparisons. Errs for values with no defined order.
pub(crate) fn value_ordering(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    if is_typed_scalar(lhs) && is_typed_scalar(rhs) {
        check_same_tag(lhs, rhs)?;
        return typed_ordering(lhs, rhs);
    }
    generic_ordering(lhs, rhs)
}

fn apply_ordering(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::LessThan => ordering == Ordering::Less,
        CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
        CompareOp::GreaterThan => ordering == Ordering::Greater,
        CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
        CompareOp::Equal => ordering == Ordering::Equal,
        CompareOp::NotEqual => ordering != Ordering::Equal,
    }
}

fn generic_ordering(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Bool(_), Value::Bool(_)) => Err(Error::TypeMismatch(
            "for booleans, only (in)equality comparisons are allowed".into(),
        )),
        (Value::List(_), Value::List(_)) => Err(Error::TypeMismatch(
            "for lists, only (in)equality comparisons are allowed".into(),
        )),
        (Value::Map(_), Value::Map(_)) => Err(Error::TypeMismatch(
            "for maps, only (in)equality comparisons are allowed".into(),
        )),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Atom(a), Value::Atom(b)) => Ok(a.cmp(b)),
        _ => {
            if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
                a.partial_cmp(&b).ok_or_else(|| {
                    Error::TypeMismatch(format!("cannot order {} and {}", lhs, rhs))
                })
            } else {
                Err(Error::TypeMismatch(format!(
                    "cannot order {} and {} values",
                    lhs.type_name(),
                    rhs.type_name()
                )))
            }
        }
    }
}

fn check_same_tag(lhs: &Value, rhs: &Value) -> Result<()> {
    if lhs.type_name() != rhs.type_name() {
        return Err(Error::TypeMismatch(format!(
            "cannot compare different types: {} vs {}",
            lhs.type_name(),
            rhs.type_name()
        )));
    }
    Ok(())
}

fn compare_typed(lhs: &Value, rhs: &Value, op: CompareOp) -> Result<bool> {
    check_same_tag(lhs, rhs)?;

    match (lhs, rhs) {
        (Value::Uri(a), Value::Uri(b)) => match op {
            CompareOp::Equal => Ok(a == b),
            CompareOp::NotEqual => Ok(a != b),
            _ => Err(Error::TypeMismatch(
                "only equality comparisons are allowed for URIs".into(),
            )),
        },
        (Value::Geo { lat: a, lon: b }, Value::Geo { lat: c, lon: d }) => match op {
            CompareOp::Equal => Ok(a == c && b == d),
            CompareOp::NotEqual => Ok(a != c || b != d),
            _ => Err(Error::TypeMismatch(
                "geolocation values can only be compared for equality or inequality".into(),
            )),
        },
        _ => {
            let ordering = typed_ordering(lhs, rhs)?;
            Ok(apply_ordering(op, ordering))
        }
    }
}

/// Chronological / numeric ordering for the orderable typed scalars.
fn typed_ordering(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Date(a), Value::Date(b)) => Ok(parse_date(a)?.cmp(&parse_date(b)?)),
        (Value::Time(a), Value::Time(b)) => Ok(parse_time(a)?.cmp(&parse_time(b)?)),
        (Value::DateTime(a), Value::DateTime(b)) => {
            match (parse_datetime(a)?, parse_datetime(b)?) {
                (DateTimeValue::Offset(x), DateTimeValue::Offset(y)) => Ok(x.cmp(&y)),
                (DateTimeValue::Naive(x), DateTimeValue::Naive(y)) => Ok(x.cmp(&y)),
                _ => Err(Error::TypeMismatch(
                    "cannot compare offset-aware and naive dateTimes".into(),
                )),
            }
        }
        (Value::Duration(a), Value::Duration(b)) => {
            let da = IsoDuration::parse(a)?;
            let db = IsoDuration::parse(b)?;
            if da.has_year_or_month() || db.has_year_or_month() {
                return Err(Error::TypeMismatch(
                    "cannot compare durations with years or months reliably".into(),
                ));
            }
            da.total_seconds()
                .partial_cmp(&db.total_seconds())
                .ok_or_else(|| Error::ParseValue(format!("ill-formed duration: '{}'", a)))
        }
        (
            Value::Currency {
                amount: a,
                code: ac,
            },
            Value::Currency {
                amount: b,
                code: bc,
            },
        ) => {
            if ac != bc {
                return Err(Error::TypeMismatch(format!(
                    "cannot compare currencies of different types: {} vs {}",
                    ac, bc
                )));
            }
            let left = parse_amount(a)?;
            let right = parse_amount(b)?;
            Ok(left.cmp(&right))
        }
        (Value::Unit { amount: a, unit: au }, Value::Unit { amount: b, unit: bu }) => {
            if au != bu {
                return Err(Error::TypeMismatch(format!(
                    "cannot compare unit values with different unit types: {} vs {}",
                    au, bu
                )));
            }
            // Non-numeric amounts fall back to lexicographic comparison
            match (Decimal::from_str(a.trim()), Decimal::from_str(b.trim())) {
                (Ok(left), Ok(right)) => Ok(left.cmp(&right)),
                _ => Ok(a.cmp(b)),
            }
        }
        (Value::Uri(_), Value::Uri(_)) | (Value::Geo { .. }, Value::Geo { .. }) => {
            Err(Error::TypeMismatch(
                "only equality comparisons are allowed for this type".into(),
            ))
        }
        _ => Err(Error::TypeMismatch(format!(
            "cannot compare different types: {} vs {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn parse_amount(text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|_| Error::ParseValue(format!("ill-formed currency amount: '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(amount: &str, code: &str) -> Value {
        Value::Currency {
            amount: amount.into(),
            code: code.into(),
        }
    }

    #[test]
    fn test_numeric_mixed_ordering() {
        assert!(compare_values(&Value::Int(42), &Value::Float(10.5), CompareOp::GreaterThan)
            .unwrap());
    }

    #[test]
    fn test_string_lexicographic() {
        assert!(compare_values(
            &Value::Str("apple".into()),
            &Value::Str("zebra".into()),
            CompareOp::LessThan
        )
        .unwrap());
    }

    #[test]
    fn test_bool_ordering_rejected() {
        let result = compare_values(&Value::Bool(true), &Value::Bool(false), CompareOp::LessThan);
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_date_chronological() {
        let a = Value::Date("2023-02-18".into());
        let b = Value::Date("2024-01-01".into());
        assert!(compare_values(&a, &b, CompareOp::LessThan).unwrap());
    }

    #[test]
    fn test_time_second_precision_equality() {
        let a = Value::Time("14:30".into());
        let b = Value::Time("14:30:00".into());
        assert!(compare_values(&a, &b, CompareOp::Equal).unwrap());
    }

    #[test]
    fn test_duration_with_months_rejected() {
        let a = Value::Duration("P3Y6M4DT12H30M5S".into());
        let b = Value::Duration("PT1H".into());
        let result = compare_values(&a, &b, CompareOp::GreaterThan);
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_duration_seconds_comparison() {
        let a = Value::Duration("PT1H30M".into());
        let b = Value::Duration("PT1H".into());
        assert!(compare_values(&a, &b, CompareOp::GreaterThanOrEqual).unwrap());
    }

    #[test]
    fn test_currency_code_mismatch_is_fatal() {
        let result = compare_values(
            &currency("10.00", "USD"),
            &currency("10.00", "EUR"),
            CompareOp::GreaterThan,
        );
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_currency_amounts() {
        assert!(compare_values(
            &currency("19.99", "USD"),
            &currency("10.00", "USD"),
            CompareOp::GreaterThan
        )
        .unwrap());
    }

    #[test]
    fn test_cross_tag_is_fatal() {
        let result = compare_values(
            &Value::Date("2023-02-18".into()),
            &Value::Uri("https://example.com".into()),
            CompareOp::Equal,
        );
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_ill_formed_date_is_parse_value() {
        let result = compare_values(
            &Value::Date("not-a-date".into()),
            &Value::Date("2024-01-01".into()),
            CompareOp::LessThan,
        );
        assert!(matches!(result, Err(Error::ParseValue(_))));
    }
}
