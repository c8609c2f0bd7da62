use std::io::Write as _;

use byteorder::{LittleEndian, WriteBytesExt as _};

use super::header::HEADER_SIZE;

/// Builds minimal LAS files in memory for tests.
///
/// Available to other crates through the `test-util` feature.
pub struct LasFixture {
    scale: [f64; 3],
    offset: [f64; 3],
    min: [f64; 3],
    max: [f64; 3],
    record_length: u16,
    point_data_offset: u32,
    declared_count: Option<u32>,
    points: Vec<([i32; 3], u16, u8)>,
}

impl LasFixture {
    pub fn new(scale: [f64; 3], offset: [f64; 3]) -> Self {
        Self {
            scale,
            offset,
            min: [0.0; 3],
            max: [0.0; 3],
            record_length: 20,
            point_data_offset: HEADER_SIZE as u32,
            declared_count: None,
            points: Vec::new(),
        }
    }

    pub fn point(mut self, raw: [i32; 3], intensity: u16, classification: u8) -> Self {
        self.points.push((raw, intensity, classification));
        self
    }

    pub fn points<I>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = ([i32; 3], u16, u8)>,
    {
        self.points.extend(points);
        self
    }

    pub fn record_length(mut self, record_length: u16) -> Self {
        self.record_length = record_length;
        self
    }

    pub fn declared_bounds(mut self, min: [f64; 3], max: [f64; 3]) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Point records start here. Offsets past the header are zero padded.
    pub fn point_data_offset(mut self, offset: u32) -> Self {
        self.point_data_offset = offset;
        self
    }

    pub fn declared_count(mut self, count: u32) -> Self {
        self.declared_count = Some(count);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(b"LASF");
        (&mut buf[96..100])
            .write_u32::<LittleEndian>(self.point_data_offset)
            .unwrap();
        buf[104] = 0;
        (&mut buf[105..107])
            .write_u16::<LittleEndian>(self.record_length)
            .unwrap();
        let count = self.declared_count.unwrap_or(self.points.len() as u32);
        (&mut buf[107..111]).write_u32::<LittleEndian>(count).unwrap();

        let mut cursor = &mut buf[131..];
        for value in self.scale.iter().chain(self.offset.iter()) {
            cursor.write_f64::<LittleEndian>(*value).unwrap();
        }
        for axis in 0..3 {
            cursor.write_f64::<LittleEndian>(self.max[axis]).unwrap();
            cursor.write_f64::<LittleEndian>(self.min[axis]).unwrap();
        }

        if (self.point_data_offset as usize) > buf.len() {
            buf.resize(self.point_data_offset as usize, 0);
        }

        for (raw, intensity, classification) in &self.points {
            let start = buf.len();
            for value in raw {
                buf.write_i32::<LittleEndian>(*value).unwrap();
            }
            buf.write_u16::<LittleEndian>(*intensity).unwrap();
            buf.write_u8(0).unwrap();
            buf.write_u8(*classification).unwrap();
            let padding = (self.record_length as usize).saturating_sub(buf.len() - start);
            buf.write_all(&vec![0xAB; padding]).unwrap();
        }
        buf
    }
}
