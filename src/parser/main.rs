use crate::error::GpmfError;
use crate::parser::gps::parse_gps_tables;
use crate::parser::klv::parse_klv_debug;
use crate::track::{BlockErrorPolicy, TrackAssembler, TrackOptions};
use crate::types::{KlvItem, TrackSegment};
use anyhow::Context;

/// A GPS block left out of the track
#[derive(Debug)]
pub struct SkippedBlock {
    pub index: usize,
    pub error: GpmfError,
}

/// Track extracted from a GPMF stream
#[derive(Debug, Default)]
pub struct GpsTrack {
    pub segment: TrackSegment,
    /// GPS blocks that contributed points
    pub blocks_decoded: usize,
    pub skipped_blocks: Vec<SkippedBlock>,
}

impl GpsTrack {
    pub fn has_points(&self) -> bool {
        !self.segment.is_empty()
    }

    pub fn total_blocks(&self) -> usize {
        self.blocks_decoded + self.skipped_blocks.len()
    }
}

fn block_index(err: &GpmfError, fallback: usize) -> usize {
    match err {
        GpmfError::Block { index, .. } => *index,
        _ => fallback,
    }
}

/// Decode and assemble every GPS block in already tokenized records
///
/// Blocks are processed one at a time. A failing block is skipped or aborts
/// the run depending on `options.block_error_policy`.
pub fn extract_track(items: &[KlvItem], options: &TrackOptions) -> crate::Result<GpsTrack> {
    let mut assembler = TrackAssembler::new(options);
    let mut track = GpsTrack::default();

    for (index, decoded) in parse_gps_tables(items).enumerate() {
        let outcome = decoded.and_then(|table| {
            if options.debug {
                println!(
                    "DEBUG: GPS block {}: {} samples, units {:?}",
                    index, table.npoints, table.units
                );
            }
            assembler
                .push_table(&table)
                .map_err(|e| e.in_block(index))
        });

        match outcome {
            Ok(_) => track.blocks_decoded += 1,
            Err(err) => match options.block_error_policy {
                BlockErrorPolicy::Abort => return Err(err),
                BlockErrorPolicy::Skip => {
                    eprintln!("Warning: skipping {}", err);
                    track.skipped_blocks.push(SkippedBlock {
                        index: block_index(&err, index),
                        error: err,
                    });
                }
            },
        }
    }

    track.segment = assembler.finish();

    if options.debug {
        println!(
            "DEBUG: {} GPS points from {} blocks ({} skipped)",
            track.segment.len(),
            track.blocks_decoded,
            track.skipped_blocks.len()
        );
    }

    Ok(track)
}

/// Tokenize a raw GPMF stream and extract its GPS track
pub fn parse_gpmf_bytes(data: &[u8], options: &TrackOptions) -> anyhow::Result<GpsTrack> {
    if options.debug {
        println!("=== PARSING GPMF DATA ===");
        println!("Data size: {} bytes", data.len());
    }

    let items = parse_klv_debug(data, options.debug).context("Failed to tokenize GPMF stream")?;
    let track = extract_track(&items, options).context("Failed to extract GPS track")?;
    Ok(track)
}
