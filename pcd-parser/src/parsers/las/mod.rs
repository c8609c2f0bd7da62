use std::path::{Path, PathBuf};

use pcd_core::{
    pointcloud::point::{Point, PointCloud},
    PcdError, Result,
};

use super::{Parser, ParserProvider};
use crate::reader::las::LasPointReader;

#[cfg(any(test, feature = "test-util"))]
pub mod fixture;
pub mod header;
pub mod point;

pub use header::LasHeader;

/// Interval between progress messages while decoding.
const PROGRESS_INTERVAL: usize = 100_000;

/// A LAS file held in memory together with its decoded header.
pub struct LasFile {
    header: LasHeader,
    data: Vec<u8>,
}

impl LasFile {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PcdError::FileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        let file = Self::from_bytes(data)?;
        log::debug!("{}: {}", path.display(), file.header);
        Ok(file)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let header = LasHeader::decode(&data)?;
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &LasHeader {
        &self.header
    }

    /// A fresh reader positioned at the first point record.
    pub fn reader(&self) -> LasPointReader<'_> {
        LasPointReader::new(&self.data, self.header)
    }

    /// Decodes every point record. A truncated record fails with an I/O error.
    pub fn read_points(&self) -> Result<Vec<Point>> {
        let total = self.header.point_count();
        // the declared count is untrusted, reserve no more than the data holds
        let available = self
            .data
            .len()
            .saturating_sub(self.header.offset_to_point_data as usize)
            / self.header.record_length();
        let mut points = Vec::with_capacity(total.min(available));
        for point in self.reader() {
            points.push(point?);
            if points.len() % PROGRESS_INTERVAL == 0 {
                log::debug!(
                    "decoded {} / {} points ({:.1}%)",
                    points.len(),
                    total,
                    points.len() as f64 / total as f64 * 100.0
                );
            }
        }
        Ok(points)
    }
}

pub struct LasParserProvider {
    pub filename: PathBuf,
}

impl ParserProvider for LasParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(LasParser {
            filename: self.filename.clone(),
        })
    }
}

pub struct LasParser {
    pub filename: PathBuf,
}

impl Parser for LasParser {
    fn parse(&self) -> Result<PointCloud> {
        let start = std::time::Instant::now();
        let file = LasFile::open(&self.filename)?;
        let points = file.read_points()?;
        log::info!(
            "read {} points from {} in {:?}",
            points.len(),
            self.filename.display(),
            start.elapsed()
        );
        Ok(PointCloud::new(points, file.header().metadata()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture::LasFixture;
    use pcd_core::ErrorKind;

    #[test]
    fn test_decode_scaled_points() {
        let scale = [0.01, 0.01, 0.01];
        let offset = [100.0, 200.0, 0.0];
        let raws = [[0, 0, 0], [150, -250, 1234], [i32::MAX, i32::MIN, -1]];
        let mut fixture = LasFixture::new(scale, offset);
        for (i, raw) in raws.iter().enumerate() {
            fixture = fixture.point(*raw, 1000 + i as u16, i as u8);
        }
        let file = LasFile::from_bytes(fixture.to_bytes()).unwrap();
        let points = file.read_points().unwrap();

        assert_eq!(points.len(), raws.len());
        for (i, (p, raw)) in points.iter().zip(raws.iter()).enumerate() {
            assert_eq!(p.x, raw[0] as f64 * scale[0] + offset[0]);
            assert_eq!(p.y, raw[1] as f64 * scale[1] + offset[1]);
            assert_eq!(p.z, raw[2] as f64 * scale[2] + offset[2]);
            assert_eq!(p.intensity, 1000 + i as u16);
            assert_eq!(p.classification, i as u8);
        }
    }

    #[test]
    fn test_extended_records_stay_aligned() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .record_length(34)
            .point([1, 2, 3], 7, 16)
            .point([4, 5, 6], 8, 0)
            .point([7, 8, 9], 9, 2)
            .to_bytes();
        let points = LasFile::from_bytes(bytes).unwrap().read_points().unwrap();

        let decoded: Vec<(f64, u16, u8)> = points
            .iter()
            .map(|p| (p.x, p.intensity, p.classification))
            .collect();
        assert_eq!(decoded, vec![(1.0, 7, 16), (4.0, 8, 0), (7.0, 9, 2)]);
    }

    #[test]
    fn test_truncated_point_data_is_io_error() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .point([1, 2, 3], 7, 16)
            .point([4, 5, 6], 8, 0)
            .to_bytes();
        let truncated = bytes[..bytes.len() - 5].to_vec();
        let err = LasFile::from_bytes(truncated)
            .unwrap()
            .read_points()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_declared_count_beyond_data_is_io_error() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .point([1, 2, 3], 7, 16)
            .declared_count(3)
            .to_bytes();
        let err = LasFile::from_bytes(bytes)
            .unwrap()
            .read_points()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_huge_declared_count_is_io_error() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .point([1, 2, 3], 7, 16)
            .declared_count(u32::MAX)
            .to_bytes();
        let err = LasFile::from_bytes(bytes)
            .unwrap()
            .read_points()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_parser_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.las");
        let bytes = LasFixture::new([0.5; 3], [10.0; 3])
            .declared_bounds([10.0; 3], [12.0; 3])
            .point([0, 2, 4], 1, 16)
            .to_bytes();
        std::fs::write(&path, bytes).unwrap();

        let provider = LasParserProvider {
            filename: path.clone(),
        };
        let pc = provider.get_parser().parse().unwrap();
        assert_eq!(pc.len(), 1);
        assert_eq!(pc.points[0].position(), [10.0, 11.0, 12.0]);
        assert_eq!(pc.metadata.point_count, 1);
        assert_eq!(pc.metadata.declared_bounds.max, [12.0; 3]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LasFile::open(&dir.path().join("missing.las")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
