//! Clock-string canonicalization and wall-clock stamping helpers.
//!
//! The two historical capture formats disagree on timestamps: the power
//! meter exports 12-hour strings with an AM/PM suffix, the datalogger
//! writes 24-hour strings. Everything downstream keys on the canonical
//! 24-hour form produced here.

use chrono::{DateTime, Local, NaiveTime, Timelike};

use crate::DaqError;

/// Canonicalize a clock string into a comparable 24-hour `HH:MM:SS` key.
///
/// Inputs without a meridiem marker are returned unchanged (already
/// canonical). `12:xx:xx AM` maps to hour `00`; `PM` adds 12 to any hour
/// other than 12. Output is always zero-padded. The function is pure and
/// idempotent: a canonical input passes through untouched.
///
/// # Errors
/// Returns `DaqError::MalformedTime` if a meridiem marker is present but
/// the string does not parse as `<h>:<m>:<s> <AM|PM>`.
pub fn normalize_time_key(raw: &str) -> Result<String, DaqError> {
    let upper = raw.to_ascii_uppercase();
    if !upper.contains("AM") && !upper.contains("PM") {
        return Ok(raw.to_string());
    }

    let mut parts = upper.split_whitespace();
    let (Some(clock), Some(period), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DaqError::malformed_time(raw));
    };
    if period != "AM" && period != "PM" {
        return Err(DaqError::malformed_time(raw));
    }

    let mut fields = clock.split(':');
    let (Some(h), Some(m), Some(s), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(DaqError::malformed_time(raw));
    };
    let parse = |f: &str| f.parse::<u32>().map_err(|_| DaqError::malformed_time(raw));
    let (mut hours, minutes, seconds) = (parse(h)?, parse(m)?, parse(s)?);
    if hours == 0 || hours > 12 || minutes > 59 || seconds > 59 {
        return Err(DaqError::malformed_time(raw));
    }

    if period == "PM" && hours != 12 {
        hours += 12;
    } else if period == "AM" && hours == 12 {
        hours = 0;
    }

    Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
}

/// Format the date column stamp (`%m/%d/%Y`) for an output record.
#[must_use]
pub fn date_stamp(t: &DateTime<Local>) -> String {
    t.format("%m/%d/%Y").to_string()
}

/// Format the canonical 24-hour time key for an output record.
#[must_use]
pub fn time_stamp(t: &DateTime<Local>) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Minutes elapsed between two times of day, fractional seconds included.
///
/// Mirrors how the acquisition runs track plot time: minutes since the
/// run's first cycle, derived purely from time-of-day. Runs are assumed
/// not to cross midnight.
#[must_use]
pub fn elapsed_minutes(start: NaiveTime, now: NaiveTime) -> f64 {
    let to_minutes = |t: NaiveTime| {
        f64::from(t.hour()) * 60.0 + f64::from(t.minute()) + f64::from(t.second()) / 60.0
    };
    to_minutes(now) - to_minutes(start)
}
