use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static START_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)\b").unwrap());

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("time slot '{label}' has no recognizable start time")]
    MissingTime { label: String },
    #[error("time slot '{label}' has an out-of-range start time")]
    InvalidTime { label: String },
}

/// Start time of a slot label such as "9:00 AM - 11:00 AM". Only the text
/// before the first '-' is scanned, so the end time can never win.
pub fn parse_start_time(label: &str) -> Result<NaiveTime, SlotParseError> {
    let start_part = label.split('-').next().unwrap_or(label);

    let caps = START_TIME_RE
        .captures(start_part)
        .ok_or_else(|| SlotParseError::MissingTime {
            label: label.to_string(),
        })?;

    let hour: u32 = caps[1].parse().map_err(|_| SlotParseError::InvalidTime {
        label: label.to_string(),
    })?;
    let minute: u32 = caps[2].parse().map_err(|_| SlotParseError::InvalidTime {
        label: label.to_string(),
    })?;
    let meridiem = caps[3].to_ascii_lowercase();

    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(SlotParseError::InvalidTime {
            label: label.to_string(),
        });
    }

    let hour_24 = match (hour, meridiem.as_str()) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "pm") => h + 12,
        (h, _) => h,
    };

    NaiveTime::from_hms_opt(hour_24, minute, 0).ok_or_else(|| SlotParseError::InvalidTime {
        label: label.to_string(),
    })
}

/// Absolute start of a slot on a given service date.
pub fn parse_slot_start(date: NaiveDate, label: &str) -> Result<NaiveDateTime, SlotParseError> {
    Ok(date.and_time(parse_start_time(label)?))
}
