use crate::error::{GpmfError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decoded GPS samples from one GPS9 stream container
///
/// All per-sample vectors have exactly `npoints` entries. Fix codes are kept
/// as decoded; they are validated when points are assembled.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsSampleTable {
    /// STNM stream name
    pub description: String,
    /// Whole days since 2000-01-01
    pub days: Vec<f64>,
    /// Seconds within the day
    pub seconds: Vec<f64>,
    /// STMP stream start offset in microseconds, unscaled
    pub stream_offset_us: u64,
    /// Dilution of precision
    pub precision: Vec<f64>,
    pub fix: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    pub altitude: Vec<f64>,
    pub speed_2d: Vec<f64>,
    pub speed_3d: Vec<f64>,
    /// UNIT labels, one per payload column
    pub units: Vec<String>,
    pub npoints: usize,
}

impl GpsSampleTable {
    pub fn is_empty(&self) -> bool {
        self.npoints == 0
    }

    /// True when every per-sample vector has `npoints` entries
    pub fn is_consistent(&self) -> bool {
        [
            &self.days,
            &self.seconds,
            &self.precision,
            &self.fix,
            &self.latitude,
            &self.longitude,
            &self.altitude,
            &self.speed_2d,
            &self.speed_3d,
        ]
        .iter()
        .all(|column| column.len() == self.npoints)
    }
}

/// GPS fix type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GpsFix {
    NoFix,
    Fix2d,
    Fix3d,
}

impl GpsFix {
    /// Map a decoded fix code; only 0, 2 and 3 are defined
    pub fn from_code(code: f64) -> Result<Self> {
        if code == 0.0 {
            Ok(GpsFix::NoFix)
        } else if code == 2.0 {
            Ok(GpsFix::Fix2d)
        } else if code == 3.0 {
            Ok(GpsFix::Fix3d)
        } else {
            Err(GpmfError::UnknownFixCode(code))
        }
    }

    /// GPX `<fix>` label
    pub fn label(self) -> &'static str {
        match self {
            GpsFix::NoFix => "none",
            GpsFix::Fix2d => "2d",
            GpsFix::Fix3d => "3d",
        }
    }
}
