//! GPS block extraction and decoding
//!
//! GPMF groups each telemetry channel into `STRM` containers. The helpers here
//! pick out the containers carrying a `GPS9` payload and turn them into
//! [`GpsSampleTable`]s with physical units.

use crate::error::{GpmfError, Result};
use crate::parser::klv::{filter_klv, KlvFilter};
use crate::types::{GpsSampleTable, KlvItem, NumericArray};

pub const STREAM_KEY: &str = "STRM";
pub const GPS_PAYLOAD_KEY: &str = "GPS9";
pub const SCALE_KEY: &str = "SCAL";
pub const DESCRIPTION_KEY: &str = "STNM";
pub const STREAM_OFFSET_KEY: &str = "STMP";
pub const UNITS_KEY: &str = "UNIT";

/// Raw GPS9 columns per sample
pub const GPS_PAYLOAD_COLUMNS: usize = 9;
/// Working columns after the packed time split
pub const GPS_WORKING_COLUMNS: usize = GPS_PAYLOAD_COLUMNS + 1;

const COL_LATITUDE: usize = 0;
const COL_LONGITUDE: usize = 1;
const COL_ALTITUDE: usize = 2;
const COL_SPEED_2D: usize = 3;
const COL_SPEED_3D: usize = 4;
const COL_TIME: usize = 5;
const COL_SECONDS_OF_DAY: usize = 6;
const COL_PRECISION: usize = 7;
const COL_FIX: usize = 8;
const COL_TIME_TICKS: usize = 9;

const TICKS_PER_DAY_WORD: i64 = 65_536;
const U32_WRAP: i64 = 1 << 32;

/// Children of one `STRM` container that carries a GPS9 payload
#[derive(Debug, Clone, Copy)]
pub struct GpsBlock<'a> {
    pub records: &'a [KlvItem],
}

/// Lazy sequence of GPS blocks in stream order
pub struct GpsBlocks<'a> {
    streams: KlvFilter<'a>,
}

impl<'a> Iterator for GpsBlocks<'a> {
    type Item = GpsBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for stream in self.streams.by_ref() {
            if let Some(records) = stream.children() {
                if records.iter().any(|r| r.key == GPS_PAYLOAD_KEY) {
                    return Some(GpsBlock { records });
                }
            }
        }
        None
    }
}

/// Yield every stream container that includes a GPS9 record
///
/// Streams without GPS data (accelerometer, gyro, ...) are skipped.
pub fn extract_gps_blocks(items: &[KlvItem]) -> GpsBlocks<'_> {
    GpsBlocks {
        streams: filter_klv(items, STREAM_KEY),
    }
}

/// Named records of a GPS block, resolved once
#[derive(Debug, Clone, Copy)]
pub struct GpsBlockIndex<'a> {
    pub payload: &'a KlvItem,
    pub scale: &'a KlvItem,
    pub description: &'a KlvItem,
    pub stream_offset: &'a KlvItem,
    pub units: &'a KlvItem,
}

impl<'a> GpsBlockIndex<'a> {
    /// Resolve all required records; a repeated key resolves to its last record
    pub fn from_block(block: GpsBlock<'a>) -> Result<Self> {
        let records = block.records;
        let find = move |key: &'static str| {
            records
                .iter()
                .rev()
                .find(|r| r.key == key)
                .ok_or(GpmfError::MissingField(key))
        };

        Ok(Self {
            payload: find(GPS_PAYLOAD_KEY)?,
            scale: find(SCALE_KEY)?,
            description: find(DESCRIPTION_KEY)?,
            stream_offset: find(STREAM_OFFSET_KEY)?,
            units: find(UNITS_KEY)?,
        })
    }
}

/// Split a packed time word into (days, sub-day ticks)
///
/// Days live above bit 16 and ticks in the low 16 bits of an unsigned 32-bit
/// word. Values read back as negative are moved up by 2^32 first.
pub fn split_packed_time(raw: i64) -> (i64, i64) {
    let word = if raw < 0 { raw + U32_WRAP } else { raw };
    (
        word.div_euclid(TICKS_PER_DAY_WORD),
        word.rem_euclid(TICKS_PER_DAY_WORD),
    )
}

/// Per-column divisors for the 10-column working row
fn working_scale(scale: &KlvItem) -> Result<[f64; GPS_WORKING_COLUMNS]> {
    let values = &scale
        .as_numeric()
        .ok_or_else(|| GpmfError::MalformedPayload("SCAL is not numeric".into()))?
        .values;

    let mut divisors = [0.0; GPS_WORKING_COLUMNS];
    match values.len() {
        1 => divisors = [values[0]; GPS_WORKING_COLUMNS],
        GPS_PAYLOAD_COLUMNS => {
            divisors[..GPS_PAYLOAD_COLUMNS].copy_from_slice(values);
            divisors[COL_TIME_TICKS] = values[COL_TIME];
        }
        n => {
            return Err(GpmfError::MalformedPayload(format!(
                "SCAL has {} entries, GPS9 has {} columns",
                n, GPS_PAYLOAD_COLUMNS
            )))
        }
    }

    if let Some(bad) = divisors.iter().find(|d| **d == 0.0 || !d.is_finite()) {
        return Err(GpmfError::MalformedPayload(format!(
            "invalid SCAL divisor {}",
            bad
        )));
    }
    Ok(divisors)
}

fn payload_matrix(payload: &KlvItem) -> Result<&NumericArray> {
    let matrix = payload
        .as_numeric()
        .ok_or_else(|| GpmfError::MalformedPayload("GPS9 is not numeric".into()))?;

    if matrix.columns != GPS_PAYLOAD_COLUMNS {
        return Err(GpmfError::MalformedPayload(format!(
            "GPS9 has {} columns, expected {}",
            matrix.columns, GPS_PAYLOAD_COLUMNS
        )));
    }
    if !matrix.is_rectangular() {
        return Err(GpmfError::MalformedPayload(format!(
            "GPS9 holds {} values, not a multiple of {}",
            matrix.values.len(),
            GPS_PAYLOAD_COLUMNS
        )));
    }
    Ok(matrix)
}

/// Raw GPS9 row with the time column split into days and appended ticks
fn working_row(row: &[f64]) -> [f64; GPS_WORKING_COLUMNS] {
    let mut working = [0.0; GPS_WORKING_COLUMNS];
    working[..GPS_PAYLOAD_COLUMNS].copy_from_slice(row);

    let (days, ticks) = split_packed_time(row[COL_TIME].floor() as i64);
    working[COL_TIME] = days as f64;
    working[COL_TIME_TICKS] = ticks as f64;
    working
}

/// Decode one GPS block into a sample table
pub fn parse_gps_block(block: GpsBlock<'_>) -> Result<GpsSampleTable> {
    let index = GpsBlockIndex::from_block(block)?;
    let matrix = payload_matrix(index.payload)?;
    let divisors = working_scale(index.scale)?;

    let description = index
        .description
        .text_value()
        .ok_or_else(|| GpmfError::MalformedPayload("STNM is not text".into()))?;
    let units = index
        .units
        .as_text()
        .ok_or_else(|| GpmfError::MalformedPayload("UNIT is not text".into()))?
        .to_vec();
    let stream_offset_us = index
        .stream_offset
        .as_numeric()
        .and_then(NumericArray::first)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| GpmfError::MalformedPayload("STMP is not a non-negative number".into()))?
        as u64;

    let npoints = matrix.rows();
    let mut table = GpsSampleTable {
        description,
        days: Vec::with_capacity(npoints),
        seconds: Vec::with_capacity(npoints),
        stream_offset_us,
        precision: Vec::with_capacity(npoints),
        fix: Vec::with_capacity(npoints),
        latitude: Vec::with_capacity(npoints),
        longitude: Vec::with_capacity(npoints),
        altitude: Vec::with_capacity(npoints),
        speed_2d: Vec::with_capacity(npoints),
        speed_3d: Vec::with_capacity(npoints),
        units,
        npoints,
    };

    for (i, row) in matrix.iter_rows().enumerate() {
        let mut scaled = working_row(row);
        for (value, divisor) in scaled.iter_mut().zip(divisors) {
            *value /= divisor;
        }

        let dop = scaled[COL_PRECISION];
        if !dop.is_finite() || dop < 0.0 {
            return Err(GpmfError::MalformedPayload(format!(
                "invalid dilution of precision {} at sample {}",
                dop, i
            )));
        }

        table.latitude.push(scaled[COL_LATITUDE]);
        table.longitude.push(scaled[COL_LONGITUDE]);
        table.altitude.push(scaled[COL_ALTITUDE]);
        table.speed_2d.push(scaled[COL_SPEED_2D]);
        table.speed_3d.push(scaled[COL_SPEED_3D]);
        table.days.push(scaled[COL_TIME]);
        table
            .seconds
            .push(scaled[COL_TIME_TICKS] + scaled[COL_SECONDS_OF_DAY]);
        table.precision.push(scaled[COL_PRECISION]);
        table.fix.push(scaled[COL_FIX]);
    }

    Ok(table)
}

/// Decode every GPS block lazily, tagging errors with the block index
pub fn parse_gps_tables(
    items: &[KlvItem],
) -> impl Iterator<Item = Result<GpsSampleTable>> + '_ {
    extract_gps_blocks(items)
        .enumerate()
        .map(|(index, block)| parse_gps_block(block).map_err(|e| e.in_block(index)))
}
