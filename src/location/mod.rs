//! Campus location subsystem.
//!
//! Holds the landmark catalog (built-in or loaded from the client's JSON
//! file) and the GPS proximity estimator that scores a fix against it.

pub mod catalog;
pub mod proximity;
pub mod types;

pub use catalog::{builtin_catalog, BoundingBox, Catalog};
pub use proximity::{nearest, nearest_with_cutoff, ProximityResult, DEFAULT_MAX_DISTANCE_M};
pub use types::{CatalogError, LocationCatalogEntry};
