use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use pcd_core::{pointcloud::point::Point, PcdError, Result};

use crate::parsers::las::{
    header::{LasHeader, HEADER_SIZE},
    point::decode_point,
};
use crate::reader::PointReader;

/// Reads point records one at a time from a seekable source, holding a
/// single record in memory.
pub struct LasFileReader<R> {
    source: R,
    header: LasHeader,
    record: Vec<u8>,
    next_index: usize,
}

impl LasFileReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PcdError::FileNotFound(path.to_path_buf()));
        }
        let reader = Self::new(BufReader::new(File::open(path)?))?;
        log::debug!("{}: {}", path.display(), reader.header);
        Ok(reader)
    }
}

impl<R: Read + Seek> LasFileReader<R> {
    /// Decodes the header and positions `source` at the first point record.
    pub fn new(mut source: R) -> Result<Self> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        source.by_ref().take(HEADER_SIZE as u64).read_to_end(&mut buf)?;
        let header = LasHeader::decode(&buf)?;
        source.seek(SeekFrom::Start(header.offset_to_point_data as u64))?;

        Ok(Self {
            source,
            record: vec![0; header.record_length()],
            header,
            next_index: 0,
        })
    }
}

impl<R: Read + Seek> PointReader for LasFileReader<R> {
    fn next_point(&mut self) -> io::Result<Option<Point>> {
        if self.next_index >= self.header.point_count() {
            return Ok(None);
        }

        self.source.read_exact(&mut self.record).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "point record {} of {} is truncated",
                        self.next_index,
                        self.header.point_count()
                    ),
                )
            } else {
                e
            }
        })?;

        self.next_index += 1;
        Ok(Some(decode_point(&self.record, &self.header)))
    }

    fn reset(&mut self) -> io::Result<()> {
        self.source
            .seek(SeekFrom::Start(self.header.offset_to_point_data as u64))?;
        self.next_index = 0;
        Ok(())
    }
}
