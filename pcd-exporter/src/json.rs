//! JSON documents consumed by the web viewer.
//!
//! Three shapes are produced:
//! - full: `{"metadata": {...}, "points": [...]}`
//! - batch: `{"points": [...]}`, used for streamed chunks
//! - metadata only: `{"metadata": {...}}`, sent ahead of streamed chunks
//!
//! Each point is `{"position": [x, y, z], "classification": c, "intensity": i}`.

use std::io::Write;

use pcd_core::{
    pointcloud::{bounds::BoundingBox, point::Point},
    PcdError, Result,
};
use serde::{Serialize, Serializer};

pub const FORMAT_VERSION: f64 = 1.0;
pub const DOCUMENT_TYPE: &str = "pointcloud";
pub const GENERATOR: &str = concat!("pcd-exporter LAS extractor v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct BoundsRecord {
    min: [f64; 3],
    max: [f64; 3],
    center: [f64; 3],
}

impl From<&BoundingBox> for BoundsRecord {
    fn from(bounds: &BoundingBox) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            center: bounds.center,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetadataRecord<'a> {
    version: f64,
    #[serde(rename = "type")]
    kind: &'static str,
    generator: &'static str,
    count: usize,
    original_file: &'a str,
    timestamp: i64,
    bounds: BoundsRecord,
}

impl<'a> MetadataRecord<'a> {
    fn new(count: usize, bounds: &BoundingBox, original_file: &'a str) -> Self {
        Self {
            version: FORMAT_VERSION,
            kind: DOCUMENT_TYPE,
            generator: GENERATOR,
            count,
            original_file,
            timestamp: chrono::Utc::now().timestamp_millis(),
            bounds: bounds.into(),
        }
    }
}

#[derive(Serialize)]
struct PointRecord {
    position: [f64; 3],
    classification: u8,
    intensity: u16,
}

// Serialized lazily so large point sets are never copied into records.
struct PointsSeq<'a> {
    points: &'a [Point],
    center: Option<[f64; 3]>,
}

impl Serialize for PointsSeq<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.points.iter().map(|p| PointRecord {
            position: match self.center {
                Some(center) => p.position_relative_to(center),
                None => p.position(),
            },
            classification: p.classification,
            intensity: p.intensity,
        }))
    }
}

#[derive(Serialize)]
struct FullDocument<'a> {
    metadata: MetadataRecord<'a>,
    points: PointsSeq<'a>,
}

#[derive(Serialize)]
struct BatchDocument<'a> {
    points: PointsSeq<'a>,
}

#[derive(Serialize)]
struct MetadataDocument<'a> {
    metadata: MetadataRecord<'a>,
}

fn full_document<'a>(
    points: &'a [Point],
    bounds: &BoundingBox,
    normalize: bool,
    original_file: &'a str,
) -> FullDocument<'a> {
    FullDocument {
        metadata: MetadataRecord::new(points.len(), bounds, original_file),
        points: PointsSeq {
            points,
            center: normalize.then_some(bounds.center),
        },
    }
}

fn json_error(err: serde_json::Error) -> PcdError {
    PcdError::Io(err.into())
}

/// Full document. With `normalize`, positions are relative to `bounds.center`.
pub fn encode_full(
    points: &[Point],
    bounds: &BoundingBox,
    normalize: bool,
    original_file: &str,
) -> Result<String> {
    serde_json::to_string(&full_document(points, bounds, normalize, original_file))
        .map_err(json_error)
}

/// Same document as [`encode_full`], written straight to `writer`.
pub fn write_full<W: Write>(
    writer: W,
    points: &[Point],
    bounds: &BoundingBox,
    normalize: bool,
    original_file: &str,
) -> Result<()> {
    serde_json::to_writer(
        writer,
        &full_document(points, bounds, normalize, original_file),
    )
    .map_err(json_error)
}

/// Points-only document. Positions are made relative to `center` when given.
pub fn encode_batch(points: &[Point], center: Option<[f64; 3]>) -> Result<String> {
    serde_json::to_string(&BatchDocument {
        points: PointsSeq { points, center },
    })
    .map_err(json_error)
}

/// Metadata-only document describing `count` points within `bounds`.
pub fn encode_metadata(count: usize, bounds: &BoundingBox, original_file: &str) -> Result<String> {
    serde_json::to_string(&MetadataDocument {
        metadata: MetadataRecord::new(count, bounds, original_file),
    })
    .map_err(json_error)
}
