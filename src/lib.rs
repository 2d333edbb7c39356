//! Campus locator: fuses a landmark image classifier with GPS proximity.
//!
//! The pipeline for one request is
//! [`inference::VisualClassifier::classify`] and/or
//! [`location::nearest`], then [`fusion::fuse`], then [`outcome::assemble`]
//! ([`outcome::locate`] runs the last two). Every step is a pure function of
//! its inputs; the only shared resource is the injected classifier handle.

pub mod config;
pub mod fusion;
pub mod geo;
pub mod inference;
pub mod location;
pub mod outcome;
pub mod server;
