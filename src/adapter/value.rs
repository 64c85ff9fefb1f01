use crate::adapter::types::ContainerKind;
use crate::adapter::types::TypeKey;
use crate::adapter::AdapterError;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Utc;
use num_bigint::BigInt;
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::collections::LinkedList;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::str::FromStr;

/// A converted cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No text, or text that was only whitespace
    Absent,
    Text(String),
    Char(char),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Integer of any size
    BigInt(BigInt),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(NaiveDateTime),
    Instant(DateTime<Utc>),
    MonthDay(MonthDay),
    YearMonth(YearMonth),
    Pattern(Pattern),
    TypeRef(TypeKey),
    /// Declared name of the matched enum constant
    Enum(&'static str),
    Array(Vec<Value>),
    Collection(ContainerKind, Vec<Value>),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Short name of the variant, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Text(_) => "text",
            Value::Char(_) => "char",
            Value::Bool(_) => "boolean",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::BigInt(_) => "biginteger",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Instant(_) => "instant",
            Value::MonthDay(_) => "monthday",
            Value::YearMonth(_) => "yearmonth",
            Value::Pattern(_) => "pattern",
            Value::TypeRef(_) => "type",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
            Value::Collection(_, _) => "collection",
        }
    }

    /// Returns the constant name of an enum value.
    pub fn as_enum(&self) -> Option<&'static str> {
        match self {
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn mismatch(self, expected: &'static str) -> AdapterError {
        AdapterError::Mismatch { expected, found: self.kind().to_owned() }
    }
}

impl PartialOrd for Value {
    /// Orders two values of the same scalar kind; anything else is unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::I8(a), Value::I8(b)) => a.partial_cmp(b),
            (Value::I16(a), Value::I16(b)) => a.partial_cmp(b),
            (Value::I32(a), Value::I32(b)) => a.partial_cmp(b),
            (Value::I64(a), Value::I64(b)) => a.partial_cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.partial_cmp(b),
            (Value::F32(a), Value::F32(b)) => a.partial_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Instant(a), Value::Instant(b)) => a.partial_cmp(b),
            (Value::MonthDay(a), Value::MonthDay(b)) => a.partial_cmp(b),
            (Value::YearMonth(a), Value::YearMonth(b)) => a.partial_cmp(b),
            (Value::Pattern(a), Value::Pattern(b)) => a.as_str().partial_cmp(b.as_str()),
            (Value::Enum(a), Value::Enum(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// A compiled regular expression, compared by its source text.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn into_inner(self) -> Regex {
        self.0
    }
}

impl Deref for Pattern {
    type Target = Regex;

    fn deref(&self) -> &Regex {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

/// A month and day of month without a year, written `--MM-DD`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Returns `None` unless the day exists in that month of a leap year.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| MonthDay { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl FromStr for MonthDay {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("--")
            .and_then(|rest| rest.split_once('-'))
            .filter(|(month, day)| month.len() == 2 && day.len() == 2)
            .and_then(|(month, day)| Some((month.parse().ok()?, day.parse().ok()?)))
            .and_then(|(month, day)| MonthDay::new(month, day))
            .ok_or_else(|| AdapterError::parse(TypeKey::MonthDay, s, "expected --MM-DD"))
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{:02}-{:02}", self.month, self.day)
    }
}

/// A year and month, written `YYYY-MM`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| YearMonth { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for YearMonth {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.rsplit_once('-')
            .filter(|(year, month)| year.trim_start_matches('-').len() >= 4 && month.len() == 2)
            .and_then(|(year, month)| Some((year.parse().ok()?, month.parse().ok()?)))
            .and_then(|(year, month)| YearMonth::new(year, month))
            .ok_or_else(|| AdapterError::parse(TypeKey::YearMonth, s, "expected YYYY-MM"))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Extracts a typed field value from a converted [`Value`].
///
/// Scalars with a natural default (numbers, booleans, text) read `Absent` as that
/// default, `Option<T>` reads it as `None`. Containers accept both arrays and
/// collections.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, AdapterError>;
}

macro_rules! impl_from_value {
    ($type:ty, $expected:literal, $($pattern:pat => $result:expr),+ $(,)?) => {
        impl FromValue for $type {
            fn from_value(value: Value) -> Result<Self, AdapterError> {
                match value {
                    $($pattern => Ok($result),)+
                    other => Err(other.mismatch($expected)),
                }
            }
        }
    };
}

impl_from_value!(String, "text", Value::Text(text) => text, Value::Absent => String::new());
impl_from_value!(char, "char", Value::Char(c) => c, Value::Absent => '\0');
impl_from_value!(bool, "boolean", Value::Bool(b) => b, Value::Absent => false);
impl_from_value!(i8, "i8", Value::I8(n) => n, Value::Absent => 0);
impl_from_value!(i16, "i16", Value::I16(n) => n, Value::Absent => 0);
impl_from_value!(i32, "i32", Value::I32(n) => n, Value::Absent => 0);
impl_from_value!(i64, "i64", Value::I64(n) => n, Value::Absent => 0);
impl_from_value!(BigInt, "biginteger", Value::BigInt(n) => n, Value::Absent => BigInt::default());

impl FromValue for i128 {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        match value {
            Value::BigInt(n) => i128::try_from(&n).map_err(|error| AdapterError::parse("i128", &n.to_string(), error)),
            Value::Absent => Ok(0),
            other => Err(other.mismatch("biginteger")),
        }
    }
}
impl_from_value!(f32, "f32", Value::F32(n) => n, Value::Absent => 0f32);
impl_from_value!(f64, "f64", Value::F64(n) => n, Value::Absent => 0f64);
impl_from_value!(Decimal, "decimal", Value::Decimal(n) => n, Value::Absent => Decimal::ZERO);
impl_from_value!(NaiveDate, "date", Value::Date(date) => date);
impl_from_value!(NaiveTime, "time", Value::Time(time) => time);
impl_from_value!(NaiveDateTime, "datetime", Value::DateTime(datetime) => datetime, Value::Timestamp(datetime) => datetime);
impl_from_value!(DateTime<Utc>, "instant", Value::Instant(instant) => instant);
impl_from_value!(MonthDay, "monthday", Value::MonthDay(month_day) => month_day);
impl_from_value!(YearMonth, "yearmonth", Value::YearMonth(year_month) => year_month);
impl_from_value!(Pattern, "pattern", Value::Pattern(pattern) => pattern);
impl_from_value!(Regex, "pattern", Value::Pattern(pattern) => pattern.into_inner());
impl_from_value!(TypeKey, "type", Value::TypeRef(key) => key);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        match value {
            Value::Absent => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

/// Elements of an array or collection, in order; `Absent` gives no elements.
fn elements(value: Value, expected: &'static str) -> Result<Vec<Value>, AdapterError> {
    match value {
        Value::Array(items) | Value::Collection(_, items) => Ok(items),
        Value::Absent => Ok(Vec::new()),
        other => Err(other.mismatch(expected)),
    }
}

fn collect_elements<T: FromValue, C: FromIterator<T>>(value: Value, expected: &'static str) -> Result<C, AdapterError> {
    elements(value, expected)?.into_iter().map(T::from_value).collect()
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        collect_elements(value, "array")
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        collect_elements(value, "deque")
    }
}

impl<T: FromValue> FromValue for LinkedList<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        collect_elements(value, "linked list")
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        collect_elements(value, "sorted set")
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> Result<Self, AdapterError> {
        collect_elements(value, "hash set")
    }
}
