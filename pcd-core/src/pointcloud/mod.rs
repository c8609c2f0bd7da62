pub mod bounds;
pub mod decimation;
pub mod filter;
pub mod point;
