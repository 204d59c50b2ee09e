//! Device clock conversions.
//!
//! The device counts milliseconds from its own epoch, which sits
//! `DEVICE_EPOCH_MS` after the UNIX epoch. Human date and time strings only
//! exist at the presentation edge; everything on the wire is device ms.

use super::ValidationError;
use chrono::prelude::*;
use std::fmt::Display;

pub const DEVICE_EPOCH_MS: i64 = 946_684_800_000;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn to_datetime<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(timestamp.checked_add(DEVICE_EPOCH_MS)?)
        .single()
}

/// Splits a device timestamp into `(YYYY-MM-DD, HH:MM)` in the given zone.
pub fn to_date_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> (String, String)
where
    Tz::Offset: Display,
{
    match to_datetime(timestamp, tz) {
        Some(dt) => (
            dt.format(DATE_FORMAT).to_string(),
            dt.format(TIME_FORMAT).to_string(),
        ),
        None => (String::new(), String::new()),
    }
}

/// Inverse of [`to_date_time`]: `date + "T" + time` read in the given zone,
/// shifted to the device epoch.
pub fn from_date_time<Tz: TimeZone>(
    date: &str,
    time: &str,
    tz: &Tz,
) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::DateTime {
        date: date.to_string(),
        time: time.to_string(),
    };
    let joined = format!("{}T{}", date.trim(), time.trim());
    let naive = INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&joined, fmt).ok())
        .ok_or_else(invalid)?;
    let local = tz.from_local_datetime(&naive).earliest().ok_or_else(invalid)?;
    Ok(local.timestamp_millis() - DEVICE_EPOCH_MS)
}

/// Human readable `YYYY-MM-DD HH:MM`, as shown on the dashboard
pub fn display<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let (date, time) = to_date_time(timestamp, tz);
    format!("{date} {time}")
}
