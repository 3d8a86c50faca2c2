//! Band graph for the parafilt equalizer.
//!
//! Owns the ordered collection of filter bands plus the master section,
//! sums the enabled bands' responses into the curve a UI would plot, maps
//! port writes onto band updates, and loads/saves band presets as JSON.

pub mod controller;
pub mod graph;
pub mod preset;

pub use controller::EqController;
pub use graph::{Band, BandId, FilterGraph, GraphError, default_grid, log_grid};
pub use preset::{BandPreset, GraphPreset};
