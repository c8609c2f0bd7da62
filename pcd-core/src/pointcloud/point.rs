use super::bounds::BoundingBox;

// LAS data coordinates are stored as i32 raw values.
// The actual coordinates are reconstructed from the header scale and offset:
// x = (raw_x * scale[0]) + offset[0]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: u16,
    pub classification: u8,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, intensity: u16, classification: u8) -> Self {
        Self {
            x,
            y,
            z,
            intensity,
            classification,
        }
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Position relative to `center`.
    pub fn position_relative_to(&self, center: [f64; 3]) -> [f64; 3] {
        [
            self.x - center[0],
            self.y - center[1],
            self.z - center[2],
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub metadata: Metadata,
}

impl PointCloud {
    pub fn new(points: Vec<Point>, metadata: Metadata) -> Self {
        PointCloud { points, metadata }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounds of the decoded points, as opposed to the ones declared in the header.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }
}

// Values declared by the file header. They describe the file, not the decoded points.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub point_count: usize,
    pub point_format: u8,
    pub declared_bounds: BoundingBox,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_relative_to() {
        let p = Point::new(10.0, 20.0, 30.0, 100, 2);
        assert_eq!(p.position(), [10.0, 20.0, 30.0]);
        assert_eq!(p.position_relative_to([1.0, 2.0, 3.0]), [9.0, 18.0, 27.0]);
    }

    #[test]
    fn test_point_cloud_bounds() {
        let pc = PointCloud::new(
            vec![
                Point::new(0.0, 5.0, -1.0, 0, 0),
                Point::new(2.0, 1.0, 3.0, 0, 0),
            ],
            Metadata::default(),
        );
        let bounds = pc.bounds();
        assert_eq!(pc.len(), 2);
        assert_eq!(bounds.min, [0.0, 1.0, -1.0]);
        assert_eq!(bounds.max, [2.0, 5.0, 3.0]);
        assert_eq!(bounds.center, [1.0, 3.0, 1.0]);
    }
}
