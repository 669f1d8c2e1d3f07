//! Export functionality for GPS tracks
//!
//! Serializes a [`TrackSegment`] to GPX, CSV or JSON. Every exporter writes
//! to a caller-supplied [`Write`]; opening files is left to the caller.

use crate::conversion::format_gpx_time;
use crate::error::Result;
use crate::types::{TrackPoint, TrackSegment};
use quick_xml::escape::escape;
use std::io::Write;

/// GPX schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpxVersion {
    /// Speed is a `<speed>` element
    V1_0,
    /// Speed only travels in `<extensions>`
    #[default]
    V1_1,
}

impl GpxVersion {
    fn version(self) -> &'static str {
        match self {
            GpxVersion::V1_0 => "1.0",
            GpxVersion::V1_1 => "1.1",
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            GpxVersion::V1_0 => "http://www.topografix.com/GPX/1/0",
            GpxVersion::V1_1 => "http://www.topografix.com/GPX/1/1",
        }
    }

    fn schema(self) -> &'static str {
        match self {
            GpxVersion::V1_0 => "http://www.topografix.com/GPX/1/0/gpx.xsd",
            GpxVersion::V1_1 => "http://www.topografix.com/GPX/1/1/gpx.xsd",
        }
    }
}

/// Options for GPX output
#[derive(Debug, Clone)]
pub struct GpxOptions {
    pub version: GpxVersion,
    pub creator: String,
    pub track_name: String,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            version: GpxVersion::V1_1,
            creator: "gpmf_gps (Rust)".to_string(),
            track_name: "GoPro GPS track".to_string(),
        }
    }
}

/// Namespace of the speed extension elements
pub const EXTENSION_NAMESPACE: &str = "https://github.com/gopro/gpmf-parser";
const EXTENSION_PREFIX: &str = "gpmf";

fn write_extension_elements<W: Write>(writer: &mut W, point: &TrackPoint) -> Result<()> {
    for ext in &point.extensions {
        write!(
            writer,
            "<{p}:{tag}><{p}:value>{}</{p}:value><{p}:unit>{}</{p}:unit></{p}:{tag}>",
            ext.value,
            escape(&ext.unit),
            p = EXTENSION_PREFIX,
            tag = ext.tag
        )?;
    }
    Ok(())
}

fn write_gpx_point<W: Write>(writer: &mut W, point: &TrackPoint, version: GpxVersion) -> Result<()> {
    write!(
        writer,
        r#"  <trkpt lat="{:.7}" lon="{:.7}"><ele>{:.2}</ele><time>{}</time>"#,
        point.latitude,
        point.longitude,
        point.elevation,
        format_gpx_time(&point.time)
    )?;
    if version == GpxVersion::V1_0 {
        write!(writer, "<speed>{}</speed>", point.speed)?;
    }
    write!(
        writer,
        "<sym>{}</sym><fix>{}</fix><pdop>{}</pdop>",
        escape(&point.symbol),
        escape(&point.fix),
        point.position_dilution
    )?;

    if !point.extensions.is_empty() {
        match version {
            GpxVersion::V1_0 => write_extension_elements(writer, point)?,
            GpxVersion::V1_1 => {
                write!(writer, "<extensions>")?;
                write_extension_elements(writer, point)?;
                write!(writer, "</extensions>")?;
            }
        }
    }
    writeln!(writer, "</trkpt>")?;
    Ok(())
}

/// Write a segment as a single-track GPX document
pub fn write_gpx<W: Write>(writer: &mut W, segment: &TrackSegment, options: &GpxOptions) -> Result<()> {
    let version = options.version;
    let name = escape(&options.track_name);

    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<gpx creator="{}" version="{}" xmlns="{}" xmlns:{}="{}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="{} {}">"#,
        escape(&options.creator),
        version.version(),
        version.namespace(),
        EXTENSION_PREFIX,
        EXTENSION_NAMESPACE,
        version.namespace(),
        version.schema()
    )?;

    match (version, segment.start_time) {
        (GpxVersion::V1_1, Some(start)) => writeln!(
            writer,
            "<metadata><name>{}</name><time>{}</time></metadata>",
            name,
            format_gpx_time(&start)
        )?,
        (GpxVersion::V1_1, None) => writeln!(writer, "<metadata><name>{}</name></metadata>", name)?,
        (GpxVersion::V1_0, Some(start)) => writeln!(
            writer,
            "<name>{}</name><time>{}</time>",
            name,
            format_gpx_time(&start)
        )?,
        (GpxVersion::V1_0, None) => writeln!(writer, "<name>{}</name>", name)?,
    }

    writeln!(writer, "<trk><name>{}</name><trkseg>", name)?;
    for point in &segment.points {
        write_gpx_point(writer, point, version)?;
    }
    writeln!(writer, "</trkseg></trk>")?;
    writeln!(writer, "</gpx>")?;
    writer.flush()?;
    Ok(())
}

/// GPX document as a string
pub fn to_gpx_string(segment: &TrackSegment, options: &GpxOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_gpx(&mut buffer, segment, options)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write one CSV row per point
#[cfg(feature = "csv")]
pub fn write_csv<W: Write>(writer: W, segment: &TrackSegment) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "time",
        "latitude",
        "longitude",
        "elevation",
        "speed",
        "pdop",
        "fix",
        "speed_2d",
        "speed_3d",
    ])?;

    for point in &segment.points {
        let extension = |name: &str| {
            point
                .extension(name)
                .map(|e| e.value.to_string())
                .unwrap_or_default()
        };
        csv_writer.write_record([
            format_gpx_time(&point.time),
            format!("{:.7}", point.latitude),
            format!("{:.7}", point.longitude),
            format!("{:.2}", point.elevation),
            point.speed.to_string(),
            point.position_dilution.to_string(),
            point.fix.clone(),
            extension("2D speed"),
            extension("3D speed"),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the segment as pretty-printed JSON
#[cfg(feature = "json")]
pub fn write_json<W: Write>(writer: W, segment: &TrackSegment) -> Result<()> {
    serde_json::to_writer_pretty(writer, segment)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::gps_timestamp;
    use crate::types::TrackExtension;

    fn point(with_extensions: bool) -> TrackPoint {
        TrackPoint {
            latitude: 47.3977419,
            longitude: 8.5455938,
            elevation: 488.5,
            speed: 1.25,
            position_dilution: 1.5,
            time: gps_timestamp(0.0, 100.0).unwrap(),
            fix: "3d".to_string(),
            symbol: "Square".to_string(),
            extensions: if with_extensions {
                vec![
                    TrackExtension::new("2D speed", "speed_2d", 1.0, "m/s"),
                    TrackExtension::new("3D speed", "speed_3d", 1.25, "m/s"),
                ]
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn test_names_are_escaped() {
        let options = GpxOptions {
            creator: "a<b>".to_string(),
            track_name: "\"c\" & d".to_string(),
            ..GpxOptions::default()
        };
        let gpx = to_gpx_string(&TrackSegment::new(), &options).unwrap();
        assert!(gpx.contains(r#"creator="a&lt;b&gt;""#));
        assert!(gpx.contains("<trk><name>&quot;c&quot; &amp; d</name>"));
    }

    #[test]
    fn test_gpx_1_1_puts_speeds_in_extensions() {
        let segment = TrackSegment {
            points: vec![point(true)],
            start_time: None,
        };
        let gpx = to_gpx_string(&segment, &GpxOptions::default()).unwrap();

        assert!(gpx.contains(r#"version="1.1""#));
        assert!(gpx.contains(r#"<trkpt lat="47.3977419" lon="8.5455938">"#));
        assert!(gpx.contains("<time>2000-01-01T00:01:40.000Z</time>"));
        assert!(gpx.contains("<fix>3d</fix><pdop>1.5</pdop>"));
        assert!(gpx.contains(r#"xmlns:gpmf="https://github.com/gopro/gpmf-parser""#));
        assert!(gpx.contains(
            "<extensions><gpmf:speed_2d><gpmf:value>1</gpmf:value><gpmf:unit>m/s</gpmf:unit></gpmf:speed_2d>"
        ));
        assert!(!gpx.contains("<speed>"));
    }

    #[test]
    fn test_gpx_1_0_has_speed_element() {
        let segment = TrackSegment {
            points: vec![point(true)],
            start_time: Some(gps_timestamp(0.0, 0.0).unwrap()),
        };
        let options = GpxOptions {
            version: GpxVersion::V1_0,
            track_name: "Ride & run".to_string(),
            ..GpxOptions::default()
        };
        let gpx = to_gpx_string(&segment, &options).unwrap();

        assert!(gpx.contains(r#"version="1.0""#));
        assert!(gpx.contains("<speed>1.25</speed>"));
        assert!(gpx.contains("<name>Ride &amp; run</name><time>2000-01-01T00:00:00.000Z</time>"));
        assert!(!gpx.contains("<extensions>"));
        // 1.0 takes foreign-namespace elements directly inside trkpt
        assert!(gpx.contains("</pdop><gpmf:speed_2d><gpmf:value>1</gpmf:value>"));
        assert!(!gpx.contains("<speed_2d>"));
    }

    #[test]
    fn test_empty_segment_is_valid_document() {
        let gpx = to_gpx_string(&TrackSegment::new(), &GpxOptions::default()).unwrap();
        assert!(gpx.contains("<trkseg>"));
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_csv_rows() {
        let segment = TrackSegment {
            points: vec![point(true), point(false)],
            start_time: None,
        };
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &segment).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "time,latitude,longitude,elevation,speed,pdop,fix,speed_2d,speed_3d"
        );
        assert_eq!(
            lines[1],
            "2000-01-01T00:01:40.000Z,47.3977419,8.5455938,488.50,1.25,1.5,3d,1,1.25"
        );
        assert!(lines[2].ends_with(",3d,,"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_output() {
        let segment = TrackSegment {
            points: vec![point(true)],
            start_time: None,
        };
        let mut buffer = Vec::new();
        write_json(&mut buffer, &segment).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["points"][0]["fix"], "3d");
        assert!(value["start_time"].is_null());
    }
}
