//! Fixed-layout LAS public header block.
//!
//! Only the fields needed to locate and reconstruct point records are read.
//! All values are little-endian.
//!
//! ```text
//! offset  size  field
//!      0     4  file signature "LASF"
//!     96     4  offset to point data (u32)
//!    104     1  point data record format (u8)
//!    105     2  point data record length (u16)
//!    107     4  number of point records (u32)
//!    131    48  x/y/z scale factor, x/y/z offset (f64 x 6)
//!    179    48  max x, min x, max y, min y, max z, min z (f64 x 6)
//! ```

use byteorder::{ByteOrder as _, LittleEndian};
use pcd_core::{
    pointcloud::{bounds::BoundingBox, point::Metadata},
    PcdError, Result,
};

pub const LAS_SIGNATURE: &[u8; 4] = b"LASF";

const OFFSET_TO_POINT_DATA: usize = 96;
const POINT_DATA_FORMAT: usize = 104;
const POINT_DATA_RECORD_LENGTH: usize = 105;
const NUMBER_OF_POINT_RECORDS: usize = 107;
const SCALE_AND_OFFSET: usize = 131;
const DECLARED_BOUNDS: usize = 179;

/// Bytes needed to decode every field above.
pub const HEADER_SIZE: usize = DECLARED_BOUNDS + 6 * 8;

/// Bytes of a point record interpreted by the decoder. Every record format
/// starts with these fields; anything after them is skipped.
pub const MIN_RECORD_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LasHeader {
    pub offset_to_point_data: u32,
    pub point_data_format: u8,
    pub point_data_record_length: u16,
    pub number_of_point_records: u32,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl LasHeader {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < LAS_SIGNATURE.len() {
            return Err(PcdError::format(format!(
                "file is too short for a LAS signature ({} bytes)",
                buf.len()
            )));
        }
        let signature = &buf[..LAS_SIGNATURE.len()];
        if signature != LAS_SIGNATURE {
            return Err(PcdError::format(format!(
                "invalid LAS file signature: {:?}",
                String::from_utf8_lossy(signature)
            )));
        }
        if buf.len() < HEADER_SIZE {
            return Err(PcdError::format(format!(
                "truncated LAS header: {} bytes, expected at least {}",
                buf.len(),
                HEADER_SIZE
            )));
        }

        let point_data_record_length =
            LittleEndian::read_u16(&buf[POINT_DATA_RECORD_LENGTH..POINT_DATA_RECORD_LENGTH + 2]);
        if (point_data_record_length as usize) < MIN_RECORD_LENGTH {
            return Err(PcdError::format(format!(
                "point data record length {} is shorter than {} bytes",
                point_data_record_length, MIN_RECORD_LENGTH
            )));
        }

        let offset_to_point_data =
            LittleEndian::read_u32(&buf[OFFSET_TO_POINT_DATA..OFFSET_TO_POINT_DATA + 4]);
        if (offset_to_point_data as usize) < HEADER_SIZE {
            return Err(PcdError::format(format!(
                "point data offset {} lies inside the {}-byte header",
                offset_to_point_data, HEADER_SIZE
            )));
        }

        let mut scale_and_offset = [0.0; 6];
        LittleEndian::read_f64_into(
            &buf[SCALE_AND_OFFSET..SCALE_AND_OFFSET + 48],
            &mut scale_and_offset,
        );
        let mut bounds = [0.0; 6];
        LittleEndian::read_f64_into(&buf[DECLARED_BOUNDS..DECLARED_BOUNDS + 48], &mut bounds);

        Ok(Self {
            offset_to_point_data,
            point_data_format: buf[POINT_DATA_FORMAT],
            point_data_record_length,
            number_of_point_records: LittleEndian::read_u32(
                &buf[NUMBER_OF_POINT_RECORDS..NUMBER_OF_POINT_RECORDS + 4],
            ),
            scale: [scale_and_offset[0], scale_and_offset[1], scale_and_offset[2]],
            offset: [scale_and_offset[3], scale_and_offset[4], scale_and_offset[5]],
            min: [bounds[1], bounds[3], bounds[5]],
            max: [bounds[0], bounds[2], bounds[4]],
        })
    }

    pub fn record_length(&self) -> usize {
        self.point_data_record_length as usize
    }

    pub fn point_count(&self) -> usize {
        self.number_of_point_records as usize
    }

    /// Byte position of record `index`.
    pub fn record_start(&self, index: usize) -> usize {
        self.offset_to_point_data as usize + index * self.record_length()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            point_count: self.point_count(),
            point_format: self.point_data_format,
            declared_bounds: BoundingBox::new(self.min, self.max),
            scale: self.scale,
            offset: self.offset,
        }
    }
}

impl std::fmt::Display for LasHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LAS header: {} points, format {}, record length {}, scale({:.6}, {:.6}, {:.6})",
            self.number_of_point_records,
            self.point_data_format,
            self.point_data_record_length,
            self.scale[0],
            self.scale[1],
            self.scale[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::las::fixture::LasFixture;
    use pcd_core::ErrorKind;

    #[test]
    fn test_decode_header() {
        let bytes = LasFixture::new([0.01, 0.01, 0.01], [100.0, 200.0, 0.0])
            .declared_bounds([100.5, 200.25, -1.0], [101.5, 210.75, 4.0])
            .point([1, 2, 3], 10, 2)
            .point([4, 5, 6], 20, 16)
            .to_bytes();
        let header = LasHeader::decode(&bytes).unwrap();

        assert_eq!(header.offset_to_point_data as usize, HEADER_SIZE);
        assert_eq!(header.point_data_format, 0);
        assert_eq!(header.point_data_record_length, 20);
        assert_eq!(header.number_of_point_records, 2);
        assert_eq!(header.scale, [0.01, 0.01, 0.01]);
        assert_eq!(header.offset, [100.0, 200.0, 0.0]);
        assert_eq!(header.min, [100.5, 200.25, -1.0]);
        assert_eq!(header.max, [101.5, 210.75, 4.0]);
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = LasFixture::new([1.0; 3], [0.0; 3]).to_bytes();
        bytes[..4].copy_from_slice(b"LASX");
        let err = LasHeader::decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("LASX"));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3]).to_bytes();
        let err = LasHeader::decode(&bytes[..150]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let err = LasHeader::decode(b"LA").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_short_record_length() {
        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .record_length(16)
            .to_bytes();
        let err = LasHeader::decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_point_data_offset_inside_header() {
        for offset in [0, 100, HEADER_SIZE as u32 - 1] {
            let bytes = LasFixture::new([1.0; 3], [0.0; 3])
                .point_data_offset(offset)
                .point([1, 2, 3], 0, 16)
                .to_bytes();
            let err = LasHeader::decode(&bytes).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "offset {}", offset);
        }

        let bytes = LasFixture::new([1.0; 3], [0.0; 3])
            .point_data_offset(HEADER_SIZE as u32 + 30)
            .to_bytes();
        assert_eq!(
            LasHeader::decode(&bytes).unwrap().offset_to_point_data as usize,
            HEADER_SIZE + 30
        );
    }
}
