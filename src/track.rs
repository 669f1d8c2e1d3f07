//! Track assembly from decoded GPS sample tables
//!
//! Tables are turned into [`TrackPoint`]s in order. The segment start time is
//! an explicit accumulator: the last table whose first sample passes the
//! precision gate sets it.

use crate::conversion::{gps_timestamp, stream_start_time};
use crate::error::{GpmfError, Result};
use crate::filters::passes_precision_gate;
use crate::types::{GpsFix, GpsSampleTable, TrackExtension, TrackPoint, TrackSegment};

pub const SPEED_UNIT: &str = "m/s";
pub const TRACK_POINT_SYMBOL: &str = "Square";

/// What to do with a GPS block that fails to decode or assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockErrorPolicy {
    /// Drop the block, print a warning, keep going
    #[default]
    Skip,
    /// Stop at the first failing block
    Abort,
}

/// Options for track assembly
#[derive(Debug, Clone)]
pub struct TrackOptions {
    /// Use only the first sample of each table
    pub first_only: bool,
    /// Attach 2D and 3D speed to every point as extensions
    pub speeds_as_extensions: bool,
    /// Take extension speeds from each point's own sample instead of sample 0
    pub per_sample_speeds: bool,
    pub block_error_policy: BlockErrorPolicy,
    pub debug: bool,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            first_only: false,
            speeds_as_extensions: true,
            per_sample_speeds: false,
            block_error_policy: BlockErrorPolicy::Skip,
            debug: false,
        }
    }
}

fn speed_extensions(table: &GpsSampleTable, i: usize) -> [TrackExtension; 2] {
    [
        TrackExtension::new("2D speed", "speed_2d", table.speed_2d[i], SPEED_UNIT),
        TrackExtension::new("3D speed", "speed_3d", table.speed_3d[i], SPEED_UNIT),
    ]
}

/// Build the track point for sample `i` of a table
pub fn make_track_point(
    table: &GpsSampleTable,
    i: usize,
    options: &TrackOptions,
) -> Result<TrackPoint> {
    let time = gps_timestamp(table.days[i], table.seconds[i])?;
    let fix = GpsFix::from_code(table.fix[i])?;

    let extensions = if options.speeds_as_extensions {
        let source = if options.per_sample_speeds { i } else { 0 };
        speed_extensions(table, source).to_vec()
    } else {
        Vec::new()
    };

    Ok(TrackPoint {
        latitude: table.latitude[i],
        longitude: table.longitude[i],
        elevation: table.altitude[i],
        speed: table.speed_3d[i],
        position_dilution: table.precision[i],
        time,
        fix: fix.label().to_string(),
        symbol: TRACK_POINT_SYMBOL.to_string(),
        extensions,
    })
}

/// Incremental segment builder
///
/// Each table is added atomically: if any of its points fails, neither its
/// points nor its start time reach the segment.
pub struct TrackAssembler<'a> {
    options: &'a TrackOptions,
    segment: TrackSegment,
    tables: usize,
}

impl<'a> TrackAssembler<'a> {
    pub fn new(options: &'a TrackOptions) -> Self {
        Self {
            options,
            segment: TrackSegment::new(),
            tables: 0,
        }
    }

    /// Append the points of one table, returning how many were added
    pub fn push_table(&mut self, table: &GpsSampleTable) -> Result<usize> {
        if !table.is_consistent() {
            return Err(GpmfError::MalformedPayload(format!(
                "table '{}' does not hold {} samples in every column",
                table.description, table.npoints
            )));
        }

        let stop = if self.options.first_only {
            table.npoints.min(1)
        } else {
            table.npoints
        };

        let start_time = if passes_precision_gate(table) {
            Some(stream_start_time(
                table.days[0],
                table.seconds[0],
                table.stream_offset_us,
            )?)
        } else {
            None
        };

        let points = (0..stop)
            .map(|i| make_track_point(table, i, self.options))
            .collect::<Result<Vec<TrackPoint>>>()?;

        if self.options.debug {
            println!(
                "DEBUG: table {} '{}': {} of {} samples, start time {}",
                self.tables,
                table.description,
                points.len(),
                table.npoints,
                start_time.map_or_else(|| "unchanged".to_string(), |t| t.to_rfc3339())
            );
        }

        if start_time.is_some() {
            self.segment.start_time = start_time;
        }
        let added = points.len();
        self.segment.points.extend(points);
        self.tables += 1;
        Ok(added)
    }

    pub fn finish(self) -> TrackSegment {
        self.segment
    }
}

/// Convert sample tables into one track segment
///
/// Fails on the first table that cannot be assembled; the error carries the
/// table's position in `tables`.
pub fn make_track_segment<I>(tables: I, options: &TrackOptions) -> Result<TrackSegment>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<GpsSampleTable>,
{
    use std::borrow::Borrow;

    let mut assembler = TrackAssembler::new(options);
    for (index, table) in tables.into_iter().enumerate() {
        assembler
            .push_table(table.borrow())
            .map_err(|e| e.in_block(index))?;
    }
    Ok(assembler.finish())
}
