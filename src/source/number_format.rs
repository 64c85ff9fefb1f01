//! Built-in spreadsheet number formats that render a numeric day count as a date or time.

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// Milliseconds in one day of a serial date.
const DAY_MILLISECONDS: f64 = 86_400_000f64;

/// First custom number-format id; everything below is built in.
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// The textual shape a date-formatted numeric cell is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM:SS`
    Time,
    /// `YYYY-MM-DDTHH:MM:SS`
    DateTime,
    /// `--MM-DD`
    MonthDay,
    /// `YYYY-MM`
    YearMonth,
}

impl DateShape {
    /// Maps a built-in number-format id to its date shape.
    /// Non-date built-ins and custom ids (164 and above) give `None`.
    pub fn from_builtin_id(id: u32) -> Option<Self> {
        match id {
            14 | 15 => Some(Self::Date),
            16 => Some(Self::MonthDay),
            17 => Some(Self::YearMonth),
            18..=21 | 45..=47 => Some(Self::Time),
            22 => Some(Self::DateTime),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::Date => "%Y-%m-%d",
            Self::Time => "%H:%M:%S",
            Self::DateTime => "%Y-%m-%dT%H:%M:%S",
            Self::MonthDay => "--%m-%d",
            Self::YearMonth => "%Y-%m",
        }
    }
}

/// Converts a serial day count into a calendar date-time.
///
/// The 1900 system counts 1900-01-01 as day 1 and keeps the phantom 1900-02-29
/// (day 60), so serials from 61 on are shifted back one day. The 1904 system
/// counts from 1904-01-01 as day 0. Negative and non-finite serials give `None`.
pub fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0f64 {
        return None;
    }

    let whole_days = serial.floor();
    let milliseconds = ((serial - whole_days) * DAY_MILLISECONDS).round() as i64;
    let base = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else if whole_days < 61f64 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    }
    .expect("NaiveDate Literal");

    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_days(whole_days as i64)?)?
        .checked_add_signed(Duration::try_milliseconds(milliseconds)?)
}

/// Renders a serial day count in the given shape, `None` when it is not a valid serial.
pub fn format_serial(shape: DateShape, serial: f64, is_1904: bool) -> Option<String> {
    serial_to_datetime(serial, is_1904).map(|datetime| datetime.format(shape.pattern()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_map_to_shapes() {
        assert_eq!(DateShape::from_builtin_id(14), Some(DateShape::Date));
        assert_eq!(DateShape::from_builtin_id(15), Some(DateShape::Date));
        assert_eq!(DateShape::from_builtin_id(16), Some(DateShape::MonthDay));
        assert_eq!(DateShape::from_builtin_id(17), Some(DateShape::YearMonth));
        for id in [18, 19, 20, 21, 45, 46, 47] {
            assert_eq!(DateShape::from_builtin_id(id), Some(DateShape::Time));
        }
        assert_eq!(DateShape::from_builtin_id(22), Some(DateShape::DateTime));
        for id in [0, 1, 2, 9, 13, 23, 44, 48, 49, FIRST_CUSTOM_FORMAT_ID, 200] {
            assert_eq!(DateShape::from_builtin_id(id), None);
        }
    }

    #[test]
    fn formats_1900_serials() {
        assert_eq!(format_serial(DateShape::Date, 45_000f64, false).as_deref(), Some("2023-03-15"));
        assert_eq!(format_serial(DateShape::Date, 1f64, false).as_deref(), Some("1900-01-01"));
        assert_eq!(format_serial(DateShape::Date, 59f64, false).as_deref(), Some("1900-02-28"));
        assert_eq!(format_serial(DateShape::Date, 61f64, false).as_deref(), Some("1900-03-01"));
        assert_eq!(format_serial(DateShape::MonthDay, 45_000f64, false).as_deref(), Some("--03-15"));
        assert_eq!(format_serial(DateShape::YearMonth, 45_000f64, false).as_deref(), Some("2023-03"));
    }

    #[test]
    fn formats_time_of_day() {
        assert_eq!(format_serial(DateShape::Time, 0.5, false).as_deref(), Some("12:00:00"));
        assert_eq!(format_serial(DateShape::Time, 0.75, false).as_deref(), Some("18:00:00"));
        assert_eq!(
            format_serial(DateShape::DateTime, 45_000.25, false).as_deref(),
            Some("2023-03-15T06:00:00")
        );
    }

    #[test]
    fn formats_1904_serials() {
        assert_eq!(format_serial(DateShape::Date, 0f64, true).as_deref(), Some("1904-01-01"));
        assert_eq!(format_serial(DateShape::Date, 43_538f64, true).as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn rejects_invalid_serials() {
        assert_eq!(format_serial(DateShape::Date, -1f64, false), None);
        assert_eq!(format_serial(DateShape::Date, f64::NAN, false), None);
        assert_eq!(format_serial(DateShape::Date, f64::INFINITY, false), None);
    }
}
