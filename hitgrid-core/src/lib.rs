//! hitgrid-core: Core types for spatio-temporal binning of simulated
//! detector hits.
//!
//! This crate provides the hit data model, classified events, binning and plane
//! configuration, detector geometry, and the sparse time-series types
//! produced by the algorithms crate.
//!

pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod grid;
pub mod hit;
pub mod plane;
pub mod timeseries;

pub use config::{BinningConfig, GridMode};
pub use error::{Error, ErrorKind, Result};
pub use event::ClassifiedEvent;
pub use geometry::{DetectorGeometry, GridDimensions, GridExtents};
pub use grid::{Axis, CellKey, TimeWindows};
pub use hit::{Hit, HitSet, Point3};
pub use plane::Plane;
pub use timeseries::{CellMap, CellValue, CrossingRecord, CrossingSeries, GridSeries, TimeSeries};
