mod file;

use std::io;

use pcd_core::pointcloud::point::Point;

use super::PointReader;
use crate::parsers::las::{header::LasHeader, point::decode_point};

pub use file::LasFileReader;

/// Sequential cursor over the point records of an in-memory LAS file.
pub struct LasPointReader<'a> {
    data: &'a [u8],
    header: LasHeader,
    next_index: usize,
}

impl<'a> LasPointReader<'a> {
    pub fn new(data: &'a [u8], header: LasHeader) -> Self {
        Self {
            data,
            header,
            next_index: 0,
        }
    }

    /// Number of records decoded since the last reset.
    pub fn position(&self) -> usize {
        self.next_index
    }
}

impl PointReader for LasPointReader<'_> {
    fn next_point(&mut self) -> io::Result<Option<Point>> {
        if self.next_index >= self.header.point_count() {
            return Ok(None);
        }

        let start = self.header.record_start(self.next_index);
        let end = start + self.header.record_length();
        let record = self.data.get(start..end).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "point record {} spans bytes {}..{} but the file has {} bytes",
                    self.next_index,
                    start,
                    end,
                    self.data.len()
                ),
            )
        })?;

        self.next_index += 1;
        Ok(Some(decode_point(record, &self.header)))
    }

    fn reset(&mut self) -> io::Result<()> {
        self.next_index = 0;
        Ok(())
    }
}

impl Iterator for LasPointReader<'_> {
    type Item = io::Result<Point>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_point().transpose()
    }
}
