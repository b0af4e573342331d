//! Network abstractions.

pub mod traits;

pub use traits::{LocationService, ServiceFuture};
