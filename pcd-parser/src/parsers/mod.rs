use pcd_core::{pointcloud::point::PointCloud, Result};

pub mod las;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<PointCloud>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Las,
}

pub fn get_extension(extension: &str) -> Option<Extension> {
    match extension.to_ascii_lowercase().as_str() {
        "las" => Some(Extension::Las),
        _ => None,
    }
}
