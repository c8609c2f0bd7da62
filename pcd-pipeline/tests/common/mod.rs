#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pcd_parser::parsers::las::fixture::LasFixture;

pub fn write_las(
    dir: &Path,
    name: &str,
    scale: [f64; 3],
    offset: [f64; 3],
    points: &[([i32; 3], u16, u8)],
) -> PathBuf {
    write_fixture(dir, name, LasFixture::new(scale, offset).points(points.iter().copied()))
}

pub fn write_las_with_count(
    dir: &Path,
    name: &str,
    scale: [f64; 3],
    offset: [f64; 3],
    points: &[([i32; 3], u16, u8)],
    declared_count: u32,
) -> PathBuf {
    let fixture = LasFixture::new(scale, offset)
        .points(points.iter().copied())
        .declared_count(declared_count);
    write_fixture(dir, name, fixture)
}

pub fn write_fixture(dir: &Path, name: &str, fixture: LasFixture) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, fixture.to_bytes()).unwrap();
    path
}

/// `n` points on a line, alternating between classes 16 and 0, with a
/// class 2 point every tenth record.
pub fn line_points(n: usize) -> Vec<([i32; 3], u16, u8)> {
    (0..n)
        .map(|i| {
            let class = if i % 10 == 9 {
                2
            } else if i % 2 == 0 {
                16
            } else {
                0
            };
            (
                [i as i32, (i % 50) as i32, (i % 7) as i32],
                (i % 65_536) as u16,
                class,
            )
        })
        .collect()
}

pub fn positions(doc: &serde_json::Value) -> Vec<[f64; 3]> {
    doc["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            let pos = p["position"].as_array().unwrap();
            [
                pos[0].as_f64().unwrap(),
                pos[1].as_f64().unwrap(),
                pos[2].as_f64().unwrap(),
            ]
        })
        .collect()
}
