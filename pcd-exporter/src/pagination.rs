use std::path::{Path, PathBuf};

use pcd_core::{
    pointcloud::{bounds::BoundingBox, point::Point},
    PcdError, Result,
};

use crate::{json, output};

/// One contiguous slice of a paginated point collection.
///
/// Every page carries the bounds of its own points only, so normalized
/// positions of different pages are relative to different centers.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub points: &'a [Point],
    pub bounds: BoundingBox,
}

impl Page<'_> {
    pub fn encode(&self, normalize: bool, original_file: &str) -> Result<String> {
        json::encode_full(self.points, &self.bounds, normalize, original_file)
    }
}

pub fn total_pages(point_count: usize, page_size: usize) -> usize {
    point_count.div_ceil(page_size)
}

pub fn paginate(points: &[Point], page_size: usize) -> Result<Vec<Page<'_>>> {
    if page_size == 0 {
        return Err(PcdError::invalid_argument("page size must be positive"));
    }
    let total = total_pages(points.len(), page_size);
    Ok(points
        .chunks(page_size)
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            total,
            points: chunk,
            bounds: BoundingBox::from_points(chunk),
        })
        .collect())
}

/// Writes every page to `<base>_page_<n>_of_<total>.json` and returns the paths in page order.
pub fn write_pages(
    points: &[Point],
    page_size: usize,
    base: &Path,
    normalize: bool,
    original_file: &str,
) -> Result<Vec<PathBuf>> {
    let pages = paginate(points, page_size)?;
    let mut paths = Vec::with_capacity(pages.len());
    for page in &pages {
        let path = output::page_file_path(base, page.number, page.total);
        output::write_json_file(&path, |writer| {
            json::write_full(
                writer,
                page.points,
                &page.bounds,
                normalize,
                original_file,
            )
        })?;
        log::debug!(
            "page {}/{}: {} points",
            page.number,
            page.total,
            page.points.len()
        );
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_core::ErrorKind;

    fn points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(i as f64, (i % 100) as f64, 0.0, i as u16, (i % 2) as u8 * 16))
            .collect()
    }

    #[test]
    fn test_pages_cover_all_points() {
        let points = points(25_000);
        let pages = paginate(&points, 10_000).unwrap();

        assert_eq!(total_pages(points.len(), 10_000), 3);
        let sizes: Vec<usize> = pages.iter().map(|p| p.points.len()).collect();
        assert_eq!(sizes, vec![10_000, 10_000, 5_000]);
        assert!(pages.iter().all(|p| p.total == 3));
        assert_eq!(pages[2].number, 3);

        let rejoined: Vec<Point> = pages.iter().flat_map(|p| p.points.iter().copied()).collect();
        assert_eq!(rejoined, points);
    }

    #[test]
    fn test_page_bounds_are_local() {
        let points = points(30);
        let pages = paginate(&points, 10).unwrap();
        assert_eq!(pages[1].bounds.min[0], 10.0);
        assert_eq!(pages[1].bounds.max[0], 19.0);
        assert_eq!(pages[1].bounds.center[0], 14.5);
    }

    #[test]
    fn test_zero_page_size() {
        let err = paginate(&points(3), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_write_pages() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("line_analysis.json");
        let points = points(25);
        let paths = write_pages(&points, 10, &base, true, "line.las").unwrap();

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "line_analysis_page_1_of_3.json",
                "line_analysis_page_2_of_3.json",
                "line_analysis_page_3_of_3.json",
            ]
        );

        let last: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths[2]).unwrap()).unwrap();
        assert_eq!(last["metadata"]["count"], 5);
        assert_eq!(last["points"].as_array().unwrap().len(), 5);
    }
}
