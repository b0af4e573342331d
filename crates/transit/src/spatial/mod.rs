//! Spatial indexing and query utilities.

pub mod index;
pub mod queries;

pub use queries::{bounds_of, haversine_distance, pad_bounds, within_radius_km};
