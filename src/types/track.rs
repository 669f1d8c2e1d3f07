use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named value attached to a track point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackExtension {
    /// Display name, e.g. "2D speed"
    pub name: String,
    /// XML element name used in GPX output
    pub tag: String,
    pub value: f64,
    pub unit: String,
}

impl TrackExtension {
    pub fn new(name: &str, tag: &str, value: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            value,
            unit: unit.to_string(),
        }
    }
}

/// One geo-referenced, timestamped GPS sample
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters
    pub elevation: f64,
    /// 3D speed in m/s
    pub speed: f64,
    pub position_dilution: f64,
    pub time: DateTime<Utc>,
    /// "none", "2d" or "3d"
    pub fix: String,
    pub symbol: String,
    pub extensions: Vec<TrackExtension>,
}

impl TrackPoint {
    pub fn extension(&self, name: &str) -> Option<&TrackExtension> {
        self.extensions.iter().find(|e| e.name == name)
    }
}

/// Ordered track points plus the derived segment start time
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
    /// Unset when no table passed the precision gate
    pub start_time: Option<DateTime<Utc>>,
}

impl TrackSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time between first and last point in seconds
    pub fn duration_seconds(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => {
                (last.time - first.time).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }
}
