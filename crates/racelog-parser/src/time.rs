//! Elapsed-time parsing and display formatting.
//!
//! Textual times are colon-separated: two fields read as `M:SS`, three as
//! `H:MM:SS`. Only the final field may carry a fractional part. The shape of
//! the input picks the interpretation; magnitudes never do.

use std::fmt;

use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// An elapsed time exactly as it arrived from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Text(String),
    Seconds(f64),
}

impl From<&str> for RawTime {
    fn from(value: &str) -> Self {
        RawTime::Text(value.to_string())
    }
}

impl From<f64> for RawTime {
    fn from(value: f64) -> Self {
        RawTime::Seconds(value)
    }
}

impl fmt::Display for RawTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTime::Text(text) => f.write_str(text),
            RawTime::Seconds(seconds) => write!(f, "{seconds}"),
        }
    }
}

/// Converts a raw time into canonical seconds. Numeric values pass through
/// when finite and non-negative. Anything unparseable yields `None`.
pub fn parse_time(value: &RawTime) -> Option<f64> {
    match value {
        RawTime::Seconds(seconds) => (seconds.is_finite() && *seconds >= 0.0).then_some(*seconds),
        RawTime::Text(text) => parse_time_text(text),
    }
}

/// Parses `M:SS[.f]` or `H:MM:SS[.f]`.
///
/// Seconds must be below 60 in both forms and minutes below 60 in the
/// three-field form; the leading field is unbounded, so `75:10` is 75 minutes.
pub fn parse_time_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let fields: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [minutes, seconds] => (0, parse_whole(minutes)?, parse_seconds(seconds)?),
        [hours, minutes, seconds] => {
            let minutes = parse_whole(minutes)?;
            if minutes >= 60 {
                return None;
            }
            (parse_whole(hours)?, minutes, parse_seconds(seconds)?)
        }
        _ => return None,
    };

    Some(hours as f64 * SECONDS_PER_HOUR + minutes as f64 * SECONDS_PER_MINUTE + seconds)
}

fn parse_whole(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_seconds(field: &str) -> Option<f64> {
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (field, None),
    };

    let whole = parse_whole(whole)?;
    if whole >= 60 {
        return None;
    }

    let fraction = match fraction {
        None => 0.0,
        Some(digits) => {
            parse_whole(digits)?;
            format!("0.{digits}").parse::<f64>().ok()?
        }
    };

    Some(whole as f64 + fraction)
}

/// Formats seconds as `H:MM:SS` when at least an hour, otherwise `M:SS`.
/// Hundredths are appended only when non-zero. Missing, negative, or
/// non-finite input has no display value.
pub fn format_seconds(seconds: Option<f64>) -> Option<String> {
    let seconds = seconds.filter(|value| value.is_finite() && *value >= 0.0)?;

    let hundredths = (seconds * 100.0).round() as u64;
    let whole = hundredths / 100;
    let fraction = hundredths % 100;

    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    let mut formatted = if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    };
    if fraction > 0 {
        formatted.push_str(&format!(".{fraction:02}"));
    }
    Some(formatted)
}
