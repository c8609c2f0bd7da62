pub mod las;

use std::io;

use pcd_core::pointcloud::{filter::ClassificationFilter, point::Point};

pub trait PointReader {
    fn next_point(&mut self) -> io::Result<Option<Point>>;

    /// Moves back to the first point record.
    fn reset(&mut self) -> io::Result<()>;
}

/// Groups the points accepted by `filter` into batches of `batch_size`.
/// The last batch may be shorter. A read error ends the iteration.
pub struct PointIterator<R: PointReader> {
    reader: R,
    batch_size: usize,
    filter: ClassificationFilter,
    finished: bool,
}

impl<R: PointReader> PointIterator<R> {
    pub fn new(reader: R, batch_size: usize, filter: ClassificationFilter) -> Self {
        Self {
            reader,
            batch_size: batch_size.max(1),
            filter,
            finished: false,
        }
    }
}

impl<R: PointReader> Iterator for PointIterator<R> {
    type Item = io::Result<Vec<Point>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut buffer = Vec::with_capacity(self.batch_size);

        while buffer.len() < self.batch_size {
            match self.reader.next_point() {
                Ok(Some(p)) => {
                    if self.filter.accepts(&p) {
                        buffer.push(p);
                    }
                }
                Ok(None) => {
                    self.finished = true;
                    break;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        if buffer.is_empty() {
            None
        } else {
            Some(Ok(buffer))
        }
    }
}
