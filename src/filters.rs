//! Sample quality gates
//!
//! GPS fixes with a high dilution of precision are unreliable. The segment
//! start time is only taken from tables whose first sample passes the gate;
//! individual points are never dropped by it.

use crate::types::GpsSampleTable;

/// First-sample DOP must be below this for the table to set the start time
pub const START_TIME_MAX_DOP: f64 = 10.0;

/// Whether a table may provide the segment start time
pub fn passes_precision_gate(table: &GpsSampleTable) -> bool {
    !table.is_empty()
        && table
            .precision
            .first()
            .map_or(false, |dop| *dop < START_TIME_MAX_DOP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_precision(precision: Vec<f64>) -> GpsSampleTable {
        let npoints = precision.len();
        GpsSampleTable {
            description: String::new(),
            days: vec![0.0; npoints],
            seconds: vec![0.0; npoints],
            stream_offset_us: 0,
            precision,
            fix: vec![3.0; npoints],
            latitude: vec![0.0; npoints],
            longitude: vec![0.0; npoints],
            altitude: vec![0.0; npoints],
            speed_2d: vec![0.0; npoints],
            speed_3d: vec![0.0; npoints],
            units: Vec::new(),
            npoints,
        }
    }

    #[test]
    fn test_gate_uses_first_sample_only() {
        assert!(passes_precision_gate(&table_with_precision(vec![9.99, 50.0])));
        assert!(!passes_precision_gate(&table_with_precision(vec![10.0, 1.0])));
    }

    #[test]
    fn test_empty_table_fails_gate() {
        assert!(!passes_precision_gate(&table_with_precision(Vec::new())));
    }
}
