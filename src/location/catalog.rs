//! The landmark catalog: built-in campus dataset and external JSON loading.
//!
//! The catalog is shared with the client-side map, so names are matched
//! exactly (case and spelling). Values are taken as given; nothing here
//! rewrites a name or a coordinate.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::types::{CatalogError, LocationCatalogEntry};
use crate::geo::Coordinate;

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinLandmark {
    name: &'static str,
    lat: f64,
    lng: f64,
}

const BUILTIN_LANDMARKS: &[BuiltinLandmark] = &[
    BuiltinLandmark { name: "Main Gate", lat: 12.863788, lng: 77.434897 },
    BuiltinLandmark { name: "Cross Road", lat: 12.862790, lng: 77.437411 },
    BuiltinLandmark { name: "Block 1", lat: 12.863154, lng: 77.437718 },
    BuiltinLandmark { name: "Students Square", lat: 12.862314, lng: 77.438240 },
    BuiltinLandmark { name: "Open Auditorium", lat: 12.862787, lng: 77.438580 },
    BuiltinLandmark { name: "Block 4", lat: 12.862211, lng: 77.438860 },
    BuiltinLandmark { name: "Xpress Cafe", lat: 12.862045, lng: 77.439374 },
    BuiltinLandmark { name: "Block 6", lat: 12.862103, lng: 77.439809 },
    BuiltinLandmark { name: "Amphi theater", lat: 12.861424, lng: 77.438057 },
    BuiltinLandmark { name: "PU Block", lat: 12.860511, lng: 77.437249 },
    BuiltinLandmark { name: "Architecture Block", lat: 12.860132, lng: 77.438592 },
];

/// The campus catalog compiled into the binary.
pub fn builtin_catalog() -> Catalog {
    Catalog {
        entries: BUILTIN_LANDMARKS
            .iter()
            .map(|b| LocationCatalogEntry::new(b.name, b.lat, b.lng))
            .collect(),
    }
}

// ─── Catalog ────────────────────────────────────────────────────

/// An immutable, validated, ordered list of landmarks.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<LocationCatalogEntry>,
}

impl Catalog {
    /// Validate and wrap a list of entries. An empty list is legal.
    pub fn new(entries: Vec<LocationCatalogEntry>) -> Result<Self, CatalogError> {
        validate(&entries)?;
        Ok(Self { entries })
    }

    /// Parse the client's `[{name, lat, lng}, ...]` format.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<LocationCatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn entries(&self) -> &[LocationCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&LocationCatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Smallest box enclosing every landmark, or `None` for an empty catalog.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let first = self.entries.first()?;
        let init = BoundingBox {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        Some(self.entries.iter().skip(1).fold(init, |b, e| BoundingBox {
            north: b.north.max(e.lat),
            south: b.south.min(e.lat),
            east: b.east.max(e.lng),
            west: b.west.min(e.lng),
        }))
    }
}

fn validate(entries: &[LocationCatalogEntry]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for (i, e) in entries.iter().enumerate() {
        if e.name.trim().is_empty() {
            return Err(CatalogError::EmptyName(i));
        }
        if !e.coordinate().is_valid() {
            return Err(CatalogError::InvalidCoordinate {
                name: e.name.clone(),
                lat: e.lat,
                lng: e.lng,
            });
        }
        if !seen.insert(e.name.as_str()) {
            return Err(CatalogError::DuplicateName(e.name.clone()));
        }
    }
    Ok(())
}

/// Axis-aligned lat/lng box. Does not handle the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.south..=self.north).contains(&c.lat) && (self.west..=self.east).contains(&c.lng)
    }
}
