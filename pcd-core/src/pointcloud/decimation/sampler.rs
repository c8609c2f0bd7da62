use std::collections::{hash_map::Entry, HashMap};

use rand::{rngs::StdRng, seq::SliceRandom as _, SeedableRng as _};
use serde::{Deserialize, Serialize};

use crate::pointcloud::{bounds::BoundingBox, point::Point};

/// Reduces a point collection to a bounded number of points.
///
/// Inputs at or below the sampler's limit are returned unchanged.
pub trait PointSampler {
    fn sample(&self, points: &[Point]) -> Vec<Point>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    #[default]
    Uniform,
    Random,
    #[serde(alias = "grid_based")]
    Grid,
    Intensity,
}

impl SamplingStrategy {
    /// Builds the sampler for this strategy. `seed` only affects [`SamplingStrategy::Random`].
    pub fn sampler(self, max_points: usize, seed: Option<u64>) -> Box<dyn PointSampler> {
        match self {
            Self::Uniform => Box::new(UniformSampler { max_points }),
            Self::Random => Box::new(RandomSampler { max_points, seed }),
            Self::Grid => Box::new(GridSampler { max_points }),
            Self::Intensity => Box::new(IntensitySampler { max_points }),
        }
    }
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uniform => "uniform",
            Self::Random => "random",
            Self::Grid => "grid",
            Self::Intensity => "intensity",
        };
        f.write_str(name)
    }
}

/// Picks input index `floor(i * n / max_points)` for every output slot `i`.
pub struct UniformSampler {
    pub max_points: usize,
}

impl PointSampler for UniformSampler {
    fn sample(&self, points: &[Point]) -> Vec<Point> {
        let n = points.len();
        if n <= self.max_points {
            return points.to_vec();
        }
        (0..self.max_points)
            .map(|i| points[i * n / self.max_points])
            .collect()
    }
}

/// Uniform random subset. Unseeded samplers draw from OS entropy.
pub struct RandomSampler {
    pub max_points: usize,
    pub seed: Option<u64>,
}

impl PointSampler for RandomSampler {
    fn sample(&self, points: &[Point]) -> Vec<Point> {
        if points.len() <= self.max_points {
            return points.to_vec();
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut shuffled = points.to_vec();
        let (chosen, _) = shuffled.partial_shuffle(&mut rng, self.max_points);
        chosen.to_vec()
    }
}

/// Keeps the most intense point of each occupied cell of an XY grid of
/// `ceil(sqrt(max_points))` cells per side.
pub struct GridSampler {
    pub max_points: usize,
}

impl PointSampler for GridSampler {
    fn sample(&self, points: &[Point]) -> Vec<Point> {
        if points.len() <= self.max_points {
            return points.to_vec();
        }
        if self.max_points == 0 {
            return Vec::new();
        }

        let bounds = BoundingBox::from_points(points);
        let mut cells: HashMap<(usize, usize), Point> = HashMap::new();
        for point in points {
            match cells.entry(self.cell_of(&bounds, point)) {
                Entry::Occupied(mut cell) => {
                    if point.intensity > cell.get().intensity {
                        cell.insert(*point);
                    }
                }
                Entry::Vacant(cell) => {
                    cell.insert(*point);
                }
            }
        }
        log::debug!("grid sampling: {} occupied cells", cells.len());

        // row-major cell order keeps the output deterministic
        let mut occupied: Vec<((usize, usize), Point)> = cells.into_iter().collect();
        occupied.sort_by_key(|&((gx, gy), _)| (gy, gx));
        let selected: Vec<Point> = occupied.into_iter().map(|(_, point)| point).collect();

        // a non-square limit can leave more occupied cells than allowed points
        if selected.len() > self.max_points {
            UniformSampler {
                max_points: self.max_points,
            }
            .sample(&selected)
        } else {
            selected
        }
    }
}

impl GridSampler {
    pub fn grid_size(&self) -> usize {
        (self.max_points as f64).sqrt().ceil() as usize
    }

    /// Grid cell of `point` within the XY extent of `bounds`.
    pub fn cell_of(&self, bounds: &BoundingBox, point: &Point) -> (usize, usize) {
        let grid_size = self.grid_size().max(1);
        let cell_width = (bounds.max[0] - bounds.min[0]) / grid_size as f64;
        let cell_height = (bounds.max[1] - bounds.min[1]) / grid_size as f64;
        (
            Self::axis_index(point.x, bounds.min[0], cell_width, grid_size),
            Self::axis_index(point.y, bounds.min[1], cell_height, grid_size),
        )
    }

    fn axis_index(value: f64, min: f64, cell_size: f64, grid_size: usize) -> usize {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return 0;
        }
        let index = ((value - min) / cell_size).floor() as usize;
        // points on the max edge belong to the last cell
        index.min(grid_size - 1)
    }
}

/// Keeps the `max_points` most intense points.
pub struct IntensitySampler {
    pub max_points: usize,
}

impl PointSampler for IntensitySampler {
    fn sample(&self, points: &[Point]) -> Vec<Point> {
        if points.len() <= self.max_points {
            return points.to_vec();
        }
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| b.intensity.cmp(&a.intensity));
        sorted.truncate(self.max_points);
        sorted
    }
}
