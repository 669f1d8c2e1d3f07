//! Time conversion utilities for GPS samples
//!
//! GPMF GPS timestamps count whole days and seconds from 2000-01-01T00:00:00Z.

use crate::error::{GpmfError, Result};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// 2000-01-01T00:00:00Z as a Unix timestamp
pub const GPS_EPOCH_UNIX_SECONDS: i64 = 946_684_800;

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// The GPMF GPS epoch
pub fn gps_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(GPS_EPOCH_UNIX_SECONDS, 0).unwrap_or_default()
}

fn offset_from_epoch(micros: f64) -> Result<DateTime<Utc>> {
    if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
        return Err(GpmfError::MalformedPayload(format!(
            "timestamp offset {} us out of range",
            micros
        )));
    }
    gps_epoch()
        .checked_add_signed(TimeDelta::microseconds(micros.round() as i64))
        .ok_or_else(|| {
            GpmfError::MalformedPayload(format!("timestamp offset {} us out of range", micros))
        })
}

/// Absolute UTC time of a sample from its day count and seconds within the day
pub fn gps_timestamp(days: f64, seconds: f64) -> Result<DateTime<Utc>> {
    offset_from_epoch((days * SECONDS_PER_DAY + seconds) * MICROS_PER_SECOND)
}

/// Sample time moved back by the stream start offset
pub fn stream_start_time(days: f64, seconds: f64, offset_us: u64) -> Result<DateTime<Utc>> {
    let sample = gps_timestamp(days, seconds)?;
    i64::try_from(offset_us)
        .ok()
        .and_then(|us| sample.checked_sub_signed(TimeDelta::microseconds(us)))
        .ok_or_else(|| {
            GpmfError::MalformedPayload(format!("stream offset {} us out of range", offset_us))
        })
}

/// Format a timestamp for GPX `<time>` elements
pub fn format_gpx_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
