//! Integration tests for the GPS extraction pipeline
//!
//! Covers the whole path from raw GPMF bytes to a track segment:
//! - Tokenizing nested DEVC/STRM containers with a complex GPS9 payload
//! - Skipping non-GPS streams
//! - Per-block error handling (skip vs abort)
//! - Start time selection across blocks

use gpmf_gps::*;

fn record(key: &[u8; 4], type_code: u8, size: u8, repeat: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(key);
    out.push(type_code);
    out.push(size);
    out.extend_from_slice(&repeat.to_be_bytes());
    out.extend_from_slice(payload);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn container(key: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let body = children.concat();
    let mut out = Vec::new();
    out.extend_from_slice(key);
    out.push(0);
    out.push(4);
    out.extend_from_slice(&((body.len() / 4) as u16).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// GPS9 row: seven i32 columns then DOP and fix as u16
fn gps9_row(row: [i64; 9]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in &row[..7] {
        out.extend_from_slice(&(*value as i32).to_be_bytes());
    }
    out.extend_from_slice(&(row[7] as u16).to_be_bytes());
    out.extend_from_slice(&(row[8] as u16).to_be_bytes());
    out
}

fn gps_stream(rows: &[[i64; 9]], scal: &[i32], stmp_us: u64) -> Vec<u8> {
    let scal_bytes: Vec<u8> = scal.iter().flat_map(|v| v.to_be_bytes()).collect();
    let payload: Vec<u8> = rows.iter().flat_map(|r| gps9_row(*r)).collect();
    container(
        b"STRM",
        &[
            record(b"STMP", b'J', 8, 1, &stmp_us.to_be_bytes()),
            record(b"STNM", b'c', 1, 3, b"GPS"),
            record(b"UNIT", b'c', 3, 3, b"degdegm\0\0"),
            record(b"SCAL", b'l', 4, scal.len() as u16, &scal_bytes),
            record(b"TYPE", b'c', 1, 9, b"lllllllSS"),
            record(b"GPS9", b'?', 32, rows.len() as u16, &payload),
        ],
    )
}

fn accl_stream() -> Vec<u8> {
    let samples: Vec<u8> = [1i16, 2, 3, 4, 5, 6]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    container(
        b"STRM",
        &[
            record(b"STNM", b'c', 1, 13, b"Accelerometer"),
            record(b"ACCL", b's', 6, 2, &samples),
        ],
    )
}

const UNIT_SCAL: [i32; 9] = [1; 9];

#[test]
fn test_two_point_block_end_to_end() {
    let stream = gps_stream(
        &[[10, 20, 5, 1, 2, 0, 100, 3, 3], [10, 20, 5, 1, 2, 0, 200, 3, 3]],
        &UNIT_SCAL,
        0,
    );
    let data = container(b"DEVC", &[accl_stream(), stream]);

    let track = parse_gpmf_bytes(&data, &TrackOptions::default()).unwrap();
    assert_eq!(track.blocks_decoded, 1);
    assert!(track.skipped_blocks.is_empty());

    let points = &track.segment.points;
    assert_eq!(points.len(), 2);
    for point in points {
        assert_eq!(point.latitude, 10.0);
        assert_eq!(point.longitude, 20.0);
        assert_eq!(point.fix, "3d");
    }
    assert_eq!(format_gpx_time(&points[0].time), "2000-01-01T00:01:40.000Z");
    assert_eq!(format_gpx_time(&points[1].time), "2000-01-01T00:03:20.000Z");
    assert_eq!(
        format_gpx_time(&track.segment.start_time.unwrap()),
        "2000-01-01T00:01:40.000Z"
    );
}

#[test]
fn test_real_scale_values() {
    // GoPro GPS9 scales: 1e7 deg, 1e3 m, 1e3 m/s, 1e2 m/s, 1 day, 1e3 s, 1e2 DOP, 1 fix
    let scal = [10_000_000, 10_000_000, 1_000, 1_000, 100, 1, 1_000, 100, 1];
    let row = [473_977_419, 85_455_938, 488_500, 1_250, 130, 0, 43_200_250, 155, 3];
    let data = container(b"DEVC", &[gps_stream(&[row], &scal, 500_000)]);

    let track = parse_gpmf_bytes(&data, &TrackOptions::default()).unwrap();
    let point = &track.segment.points[0];
    assert!((point.latitude - 47.3977419).abs() < 1e-9);
    assert!((point.longitude - 8.5455938).abs() < 1e-9);
    assert!((point.elevation - 488.5).abs() < 1e-9);
    assert!((point.speed - 1.3).abs() < 1e-9);
    assert!((point.position_dilution - 1.55).abs() < 1e-9);
    assert_eq!(format_gpx_time(&point.time), "2000-01-01T12:00:00.250Z");
    assert_eq!(
        format_gpx_time(&track.segment.start_time.unwrap()),
        "2000-01-01T11:59:59.750Z"
    );
    assert!((point.extension("2D speed").unwrap().value - 1.25).abs() < 1e-9);
}

#[test]
fn test_lazy_and_eager_pipelines_agree() {
    let data = container(
        b"DEVC",
        &[
            gps_stream(&[[1, 1, 0, 0, 0, 0, 10, 2, 3], [2, 2, 0, 0, 0, 0, 11, 2, 3]], &UNIT_SCAL, 0),
            accl_stream(),
            gps_stream(&[[3, 3, 0, 0, 0, 0, 12, 20, 2]], &UNIT_SCAL, 0),
        ],
    );
    let items = parse_klv(&data).unwrap();
    let options = TrackOptions::default();

    let eager_tables: Vec<GpsSampleTable> = extract_gps_blocks(&items)
        .map(|block| parse_gps_block(block).unwrap())
        .collect();
    let eager = make_track_segment(&eager_tables, &options).unwrap();
    let lazy = extract_track(&items, &options).unwrap();

    assert_eq!(eager, lazy.segment);
    assert_eq!(lazy.segment.len(), 3);
    assert_eq!(lazy.blocks_decoded, 2);
}

#[test]
fn test_missing_field_block_is_skipped() {
    let no_scal = container(
        b"STRM",
        &[
            record(b"STMP", b'J', 8, 1, &0u64.to_be_bytes()),
            record(b"STNM", b'c', 1, 3, b"GPS"),
            record(b"UNIT", b'c', 3, 1, b"deg"),
            record(b"TYPE", b'c', 1, 9, b"lllllllSS"),
            record(b"GPS9", b'?', 32, 1, &gps9_row([5, 5, 0, 0, 0, 0, 1, 1, 3])),
        ],
    );
    let good = gps_stream(&[[1, 1, 0, 0, 0, 0, 10, 1, 3]], &UNIT_SCAL, 0);
    let data = container(b"DEVC", &[no_scal, good]);

    let track = parse_gpmf_bytes(&data, &TrackOptions::default()).unwrap();
    assert_eq!(track.segment.len(), 1);
    assert_eq!(track.segment.points[0].latitude, 1.0);
    assert_eq!(track.skipped_blocks.len(), 1);
    assert_eq!(track.skipped_blocks[0].index, 0);
    assert!(matches!(
        track.skipped_blocks[0].error.kind(),
        GpmfError::MissingField("SCAL")
    ));
    assert_eq!(track.total_blocks(), 2);
}

#[test]
fn test_unknown_fix_block_skipped_or_aborts() {
    let bad = gps_stream(&[[1, 1, 0, 0, 0, 0, 10, 1, 7]], &UNIT_SCAL, 0);
    let good = gps_stream(&[[2, 2, 0, 0, 0, 0, 20, 1, 3]], &UNIT_SCAL, 0);
    let data = container(b"DEVC", &[good.clone(), bad, good]);
    let items = parse_klv(&data).unwrap();

    let skipped = extract_track(&items, &TrackOptions::default()).unwrap();
    assert_eq!(skipped.segment.len(), 2);
    assert_eq!(skipped.skipped_blocks[0].index, 1);
    assert!(matches!(
        skipped.skipped_blocks[0].error.kind(),
        GpmfError::UnknownFixCode(_)
    ));

    let abort = TrackOptions {
        block_error_policy: BlockErrorPolicy::Abort,
        ..TrackOptions::default()
    };
    match extract_track(&items, &abort) {
        Err(GpmfError::Block { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(*source, GpmfError::UnknownFixCode(c) if c == 7.0));
        }
        other => panic!("expected block error, got {:?}", other),
    }
}

#[test]
fn test_first_only_one_point_per_block() {
    let data = container(
        b"DEVC",
        &[
            gps_stream(&[[1, 1, 0, 0, 0, 0, 10, 1, 3], [9, 9, 0, 0, 0, 0, 11, 1, 3]], &UNIT_SCAL, 0),
            gps_stream(&[[2, 2, 0, 0, 0, 0, 12, 1, 3], [9, 9, 0, 0, 0, 0, 13, 1, 3]], &UNIT_SCAL, 0),
        ],
    );
    let options = TrackOptions {
        first_only: true,
        ..TrackOptions::default()
    };
    let track = parse_gpmf_bytes(&data, &options).unwrap();
    let lats: Vec<f64> = track.segment.points.iter().map(|p| p.latitude).collect();
    assert_eq!(lats, vec![1.0, 2.0]);
}

#[test]
fn test_no_gps_streams_gives_empty_track() {
    let data = container(b"DEVC", &[accl_stream()]);
    let track = parse_gpmf_bytes(&data, &TrackOptions::default()).unwrap();
    assert!(!track.has_points());
    assert!(track.segment.start_time.is_none());
    assert_eq!(track.total_blocks(), 0);
}

#[test]
fn test_truncated_stream_fails_to_tokenize() {
    let mut data = container(b"DEVC", &[gps_stream(&[[0; 9]], &UNIT_SCAL, 0)]);
    data.truncate(data.len() - 6);
    assert!(parse_gpmf_bytes(&data, &TrackOptions::default()).is_err());
}
