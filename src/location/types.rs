//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::geo::Coordinate;

/// One named landmark. Field names match the client's map data (`lat`, `lng`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCatalogEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl LocationCatalogEntry {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Catalog loading and validation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate location name '{0}'")]
    DuplicateName(String),
    #[error("location name at index {0} is empty")]
    EmptyName(usize),
    #[error("location '{name}' has out-of-range coordinates ({lat}, {lng})")]
    InvalidCoordinate { name: String, lat: f64, lng: f64 },
}
