use super::point::Point;

/// Axis-aligned extent of a point collection and its midpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub center: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        let center = [
            (min[0] + max[0]) / 2.0,
            (min[1] + max[1]) / 2.0,
            (min[2] + max[2]) / 2.0,
        ];
        Self { min, max, center }
    }

    /// Bounds of `points`. An empty slice yields the all-zero box, so callers
    /// have to check for emptiness themselves.
    pub fn from_points(points: &[Point]) -> Self {
        let mut acc = BoundsAccumulator::new();
        for point in points {
            acc.add(point);
        }
        acc.finish().unwrap_or_default()
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min[0]..=self.max[0]).contains(&point.x)
            && (self.min[1]..=self.max[1]).contains(&point.y)
            && (self.min[2]..=self.max[2]).contains(&point.z)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "X[{:.2}, {:.2}], Y[{:.2}, {:.2}], Z[{:.2}, {:.2}]",
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2]
        )
    }
}

/// Running min/max over a stream of points, O(1) memory.
#[derive(Debug, Clone)]
pub struct BoundsAccumulator {
    min: [f64; 3],
    max: [f64; 3],
    count: usize,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
            count: 0,
        }
    }

    pub fn add(&mut self, point: &Point) {
        self.max[0] = self.max[0].max(point.x);
        self.max[1] = self.max[1].max(point.y);
        self.max[2] = self.max[2].max(point.z);
        self.min[0] = self.min[0].min(point.x);
        self.min[1] = self.min[1].min(point.y);
        self.min[2] = self.min[2].min(point.z);
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` when no point was added.
    pub fn finish(&self) -> Option<BoundingBox> {
        if self.count == 0 {
            return None;
        }
        Some(BoundingBox::new(self.min, self.max))
    }
}
