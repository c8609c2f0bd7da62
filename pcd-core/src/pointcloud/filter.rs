use std::collections::{BTreeMap, BTreeSet};

use super::point::Point;

/// Target classes used when the caller does not name any.
pub const DEFAULT_CLASSIFICATIONS: [u8; 2] = [16, 0];

/// Number of points per classification code.
pub type ClassificationHistogram = BTreeMap<u8, usize>;

/// Keeps points whose classification is in a target set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationFilter {
    // `None` keeps every point
    targets: Option<BTreeSet<u8>>,
}

impl Default for ClassificationFilter {
    fn default() -> Self {
        Self::new(&DEFAULT_CLASSIFICATIONS)
    }
}

impl ClassificationFilter {
    /// An empty list falls back to [`DEFAULT_CLASSIFICATIONS`].
    pub fn new(classifications: &[u8]) -> Self {
        if classifications.is_empty() {
            return Self::default();
        }
        Self {
            targets: Some(classifications.iter().copied().collect()),
        }
    }

    pub fn from_option(classifications: Option<&[u8]>) -> Self {
        Self::new(classifications.unwrap_or_default())
    }

    pub fn accept_all() -> Self {
        Self { targets: None }
    }

    pub fn accepts(&self, point: &Point) -> bool {
        match &self.targets {
            Some(targets) => targets.contains(&point.classification),
            None => true,
        }
    }

    /// Target classes in ascending order, empty when every point is kept.
    pub fn classifications(&self) -> Vec<u8> {
        self.targets
            .as_ref()
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Retained points in input order, with a histogram of what was kept.
    pub fn apply<I>(&self, points: I) -> FilteredPoints
    where
        I: IntoIterator<Item = Point>,
    {
        let mut retained = Vec::new();
        let mut histogram = ClassificationHistogram::new();
        for point in points {
            if self.accepts(&point) {
                *histogram.entry(point.classification).or_default() += 1;
                retained.push(point);
            }
        }
        FilteredPoints {
            points: retained,
            histogram,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilteredPoints {
    pub points: Vec<Point>,
    pub histogram: ClassificationHistogram,
}

impl FilteredPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
