//! Built-in text to scalar conversions.
//!
//! Every function here receives text that is already trimmed and non-empty.

use crate::adapter::types::TypeKey;
use crate::adapter::value::Pattern;
use crate::adapter::value::Value;
use crate::adapter::AdapterError;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Utc;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;

/// Length of `YYYY-MM-DD`; longer date text is read as a date-time.
const ISO_LOCAL_DATE_LENGTH: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Converts non-empty, trimmed text into a value of type `key`.
pub(crate) fn convert(key: TypeKey, text: &str) -> Result<Value, AdapterError> {
    let value = match key {
        TypeKey::Text => Value::Text(text.to_owned()),
        TypeKey::Char => text
            .chars()
            .next()
            .map(Value::Char)
            .ok_or_else(|| AdapterError::parse(key, text, "empty text"))?,
        TypeKey::Bool => Value::Bool(parse_boolean(text)?),
        TypeKey::I8 => Value::I8(parse_integer(key, text)?),
        TypeKey::I16 => Value::I16(parse_integer(key, text)?),
        TypeKey::I32 => Value::I32(parse_integer(key, text)?),
        TypeKey::I64 => Value::I64(parse_integer(key, text)?),
        TypeKey::BigInt => Value::BigInt(parse_integer(key, text)?),
        TypeKey::F32 => Value::F32(parse_with(key, text)?),
        TypeKey::F64 => Value::F64(parse_with(key, text)?),
        TypeKey::Decimal => Value::Decimal(parse_decimal(text)?),
        TypeKey::Date => Value::Date(parse_local_date(text)?),
        TypeKey::Time => Value::Time(parse_local_time(text)?),
        TypeKey::DateTime => Value::DateTime(parse_local_datetime(text)?),
        TypeKey::Timestamp => Value::Timestamp(
            NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
                .map_err(|error| AdapterError::parse(key, text, error))?,
        ),
        TypeKey::Instant => Value::Instant(
            DateTime::parse_from_rfc3339(text)
                .map_err(|error| AdapterError::parse(key, text, error))?
                .with_timezone(&Utc),
        ),
        TypeKey::MonthDay => Value::MonthDay(text.parse()?),
        TypeKey::YearMonth => Value::YearMonth(text.parse()?),
        TypeKey::Pattern => Value::Pattern(Pattern::new(text).map_err(|error| AdapterError::parse(key, text, error))?),
        TypeKey::TypeRef => Value::TypeRef(TypeKey::parse(text)?),
        TypeKey::Enum(domain) => Value::Enum(
            domain
                .find(text)
                .ok_or_else(|| AdapterError::parse(key, text, "no constant with this name"))?,
        ),
    };
    Ok(value)
}

/// Reads TRUE/T/1/YES/Y and FALSE/F/0/NO/N, ignoring case.
pub(crate) fn parse_boolean(text: &str) -> Result<bool, AdapterError> {
    match text.to_ascii_uppercase().as_str() {
        "TRUE" | "T" | "1" | "YES" | "Y" => Ok(true),
        "FALSE" | "F" | "0" | "NO" | "N" => Ok(false),
        _ => Err(AdapterError::parse(TypeKey::Bool, text, "not a boolean literal")),
    }
}

/// Drops everything from the last `.` on, so `"100.75"` reads as `"100"`.
pub(crate) fn without_decimals(text: &str) -> &str {
    text.rfind('.').map(|index| &text[..index]).unwrap_or(text)
}

fn parse_integer<T>(key: TypeKey, text: &str) -> Result<T, AdapterError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_with(key, without_decimals(text))
}

fn parse_with<T>(key: TypeKey, text: &str) -> Result<T, AdapterError>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse::<T>().map_err(|error| AdapterError::parse(key, text, error))
}

/// Accepts plain (`12.50`) and scientific (`1.25e1`) notation.
/// Values need to fit 96 bits of mantissa (28 significant digits).
fn parse_decimal(text: &str) -> Result<Decimal, AdapterError> {
    let result = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    result.map_err(|error| AdapterError::parse(TypeKey::Decimal, text, error))
}

fn without_zulu(text: &str) -> &str {
    text.strip_suffix('Z').unwrap_or(text)
}

pub(crate) fn parse_local_date(text: &str) -> Result<NaiveDate, AdapterError> {
    if text.len() > ISO_LOCAL_DATE_LENGTH {
        parse_local_datetime(text).map(|datetime| datetime.date())
    } else {
        NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|error| AdapterError::parse(TypeKey::Date, text, error))
    }
}

/// A bare date reads as midnight; longer text is a date-time with an optional trailing `Z`.
pub(crate) fn parse_local_datetime(text: &str) -> Result<NaiveDateTime, AdapterError> {
    if text.len() > ISO_LOCAL_DATE_LENGTH {
        let text = without_zulu(text);
        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .ok_or_else(|| AdapterError::parse(TypeKey::DateTime, text, "expected YYYY-MM-DDTHH:MM[:SS[.f]]"))
    } else {
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(|date| date.and_time(NaiveTime::default()))
            .map_err(|error| AdapterError::parse(TypeKey::DateTime, text, error))
    }
}

fn parse_local_time(text: &str) -> Result<NaiveTime, AdapterError> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .ok_or_else(|| AdapterError::parse(TypeKey::Time, text, "expected HH:MM[:SS[.f]]"))
}
