//! GPMF GPS Library
//!
//! A Rust library for extracting GPS tracks from GoPro GPMF telemetry streams.
//! Raw GPMF bytes are tokenized into key-length-value records, the `STRM`
//! containers carrying `GPS9` payloads are decoded into sample tables, and the
//! tables are assembled into a timestamped track segment ready for export.
//!
//! # Features
//!
//! - **`csv`** (default): Enable CSV export
//! - **`json`**: Enable JSON export
//! - **`serde`**: Enable serialization/deserialization of types
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gpmf_gps::{parse_gpmf_bytes, write_gpx, GpxOptions, TrackOptions};
//!
//! let data = std::fs::read("GOPRO.gpmf").unwrap();
//! let track = parse_gpmf_bytes(&data, &TrackOptions::default()).unwrap();
//! println!("{} points, {} blocks skipped", track.segment.len(), track.skipped_blocks.len());
//!
//! let mut out = std::io::stdout();
//! write_gpx(&mut out, &track.segment, &GpxOptions::default()).unwrap();
//! ```
//!
//! # Public API
//!
//! ## Parsing Functions
//! - [`parse_gpmf_bytes`] - Tokenize raw GPMF data and extract the GPS track
//! - [`extract_track`] - Extract the GPS track from tokenized records
//! - [`parse_klv`] - Low-level KLV tokenizer
//! - [`filter_klv`] - Find records by key
//! - [`extract_gps_blocks`] - Lazily select stream containers with GPS data
//! - [`parse_gps_block`] - Decode one GPS block into a [`GpsSampleTable`]
//!
//! ## Track Assembly
//! - [`make_track_segment`] - Convert sample tables into a [`TrackSegment`]
//! - [`TrackAssembler`] - Incremental, per-table assembly
//! - [`TrackOptions`] - Assembly and error-policy configuration
//!
//! ## Export Functions
//! - [`write_gpx`] - GPX 1.0/1.1
//! - `write_csv` - CSV (feature `csv`)
//! - `write_json` - JSON (feature `json`)

// Module declarations
pub mod conversion;
pub mod error;
pub mod export;
pub mod filters;
pub mod parser;
pub mod track;
pub mod types;

// Re-export everything from modules for convenience
pub use conversion::*;
pub use error::*;
pub use export::*;
pub use filters::*;
#[allow(ambiguous_glob_reexports)]
pub use parser::*;
pub use track::*;
#[allow(ambiguous_glob_reexports)]
pub use types::*;
