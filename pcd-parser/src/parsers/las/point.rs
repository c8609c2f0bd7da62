use byteorder::{ByteOrder as _, LittleEndian};
use pcd_core::pointcloud::point::Point;

use super::header::{LasHeader, MIN_RECORD_LENGTH};

/// Decodes the leading fields of one point record.
///
/// ```text
/// offset  size  field
///      0    12  raw x/y/z (i32 x 3)
///     12     2  intensity (u16)
///     14     1  return / flag bits (skipped)
///     15     1  classification (u8)
///     16     -  remaining fields of the record format (skipped)
/// ```
///
/// `record` must hold at least [`MIN_RECORD_LENGTH`] bytes.
pub fn decode_point(record: &[u8], header: &LasHeader) -> Point {
    debug_assert!(record.len() >= MIN_RECORD_LENGTH);

    let mut raw = [0i32; 3];
    LittleEndian::read_i32_into(&record[0..12], &mut raw);

    Point {
        x: raw[0] as f64 * header.scale[0] + header.offset[0],
        y: raw[1] as f64 * header.scale[1] + header.offset[1],
        z: raw[2] as f64 * header.scale[2] + header.offset[2],
        intensity: LittleEndian::read_u16(&record[12..14]),
        classification: record[15],
    }
}
