//! Scalar coercion primitives
//!
//! Pure text→value conversions shared by the scalar processors. Every
//! function reports failure as a located decode error naming the target
//! type and the offending text; callers decide which conversions a given
//! schema node permits.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::schema::EpochUnit;
use crate::tokens::Location;
use crate::{Error, Result};

pub(crate) fn parse_i64(text: &str, type_name: &str, location: Location) -> Result<i64> {
    text.parse::<i64>().map_err(|_| {
        Error::syntax(
            format!("cannot parse {text:?} as {type_name}"),
            location,
        )
    })
}

/// Narrow an i64 to a smaller integral width with a range check.
pub(crate) fn narrow<T: TryFrom<i64>>(
    value: i64,
    type_name: &str,
    location: Location,
) -> Result<T> {
    T::try_from(value).map_err(|_| {
        Error::syntax(
            format!("{value} out of range for {type_name}"),
            location,
        )
    })
}

pub(crate) fn parse_f64(text: &str, type_name: &str, location: Location) -> Result<f64> {
    text.parse::<f64>().map_err(|_| {
        Error::syntax(
            format!("cannot parse {text:?} as {type_name}"),
            location,
        )
    })
}

pub(crate) fn parse_f32(text: &str, type_name: &str, location: Location) -> Result<f32> {
    text.parse::<f32>().map_err(|_| {
        Error::syntax(
            format!("cannot parse {text:?} as {type_name}"),
            location,
        )
    })
}

pub(crate) fn parse_big_int(text: &str, location: Location) -> Result<BigInt> {
    BigInt::from_str(text)
        .map_err(|_| Error::syntax(format!("cannot parse {text:?} as biginteger"), location))
}

pub(crate) fn parse_big_decimal(text: &str, location: Location) -> Result<BigDecimal> {
    BigDecimal::from_str(text)
        .map_err(|_| Error::syntax(format!("cannot parse {text:?} as bigdecimal"), location))
}

/// Truncate a decimal toward zero to an arbitrary-precision integer.
pub(crate) fn truncate_to_big_int(value: &BigDecimal) -> BigInt {
    let (digits, _scale) = value
        .with_scale_round(0, RoundingMode::Down)
        .into_bigint_and_exponent();
    digits
}

/// Truncate a decimal toward zero and fit it into an i64.
pub(crate) fn truncate_to_i64(
    value: &BigDecimal,
    type_name: &str,
    location: Location,
) -> Result<i64> {
    truncate_to_big_int(value).to_i64().ok_or_else(|| {
        Error::syntax(
            format!("{value} out of range for {type_name}"),
            location,
        )
    })
}

/// `"true"` / `"false"`, exactly.
pub(crate) fn parse_bool_text(text: &str, location: Location) -> Result<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::syntax(
            format!("cannot parse {text:?} as bool"),
            location,
        )),
    }
}

pub(crate) fn parse_char(text: &str, location: Location) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::syntax(
            format!("expected a single-character string, got {text:?}"),
            location,
        )),
    }
}

/// Parse a timestamp string to epoch nanoseconds.
///
/// Without a format the text must be RFC 3339. With a format, an offset is
/// honored if the format captures one; otherwise the naive result is taken
/// as UTC.
pub(crate) fn parse_instant(
    text: &str,
    format: Option<&str>,
    location: Location,
) -> Result<i64> {
    let parsed = match format {
        None => DateTime::parse_from_rfc3339(text)
            .map_err(|e| {
                Error::syntax(format!("invalid RFC 3339 timestamp {text:?}: {e}"), location)
            })?
            .to_utc(),
        Some(fmt) => match DateTime::parse_from_str(text, fmt) {
            Ok(dt) => dt.to_utc(),
            Err(_) => NaiveDateTime::parse_from_str(text, fmt)
                .map_err(|e| {
                    Error::syntax(format!("invalid timestamp {text:?}: {e}"), location)
                })?
                .and_utc(),
        },
    };
    parsed.timestamp_nanos_opt().ok_or_else(|| {
        Error::syntax(
            format!("timestamp {text:?} out of epoch-nanosecond range"),
            location,
        )
    })
}

/// Scale an integral epoch value to nanoseconds.
pub(crate) fn epoch_to_nanos(value: i64, unit: EpochUnit, location: Location) -> Result<i64> {
    value.checked_mul(unit.nanos_multiplier()).ok_or_else(|| {
        Error::syntax(
            format!("epoch value {value} out of nanosecond range"),
            location,
        )
    })
}

/// Scale a fractional epoch value to nanoseconds, truncating sub-nanosecond
/// precision toward zero.
pub(crate) fn decimal_epoch_to_nanos(
    value: &BigDecimal,
    unit: EpochUnit,
    location: Location,
) -> Result<i64> {
    let scaled = value * BigDecimal::from(unit.nanos_multiplier());
    truncate_to_i64(&scaled, "epoch nanoseconds", location)
}

pub(crate) fn parse_local_date(
    text: &str,
    format: Option<&str>,
    location: Location,
) -> Result<NaiveDate> {
    let fmt = format.unwrap_or("%Y-%m-%d");
    NaiveDate::parse_from_str(text, fmt)
        .map_err(|e| Error::syntax(format!("invalid date {text:?}: {e}"), location))
}
