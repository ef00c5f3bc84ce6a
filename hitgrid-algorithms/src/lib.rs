//! hitgrid-algorithms: Binning and plane-crossing algorithms for simulated
//! detector hits.
//!
//! - **Binning** - hits to sparse time-indexed grids, 2D sum or 3D listing
//! - **Crossing** - straight-segment interpolation of tracks through a plane
//! - **Assembly** - both of the above applied to a classified event
//!
#![warn(missing_docs)]

mod assembly;
mod binning;
mod crossing;

pub use assembly::{AssembledEvent, EventAssembler, EventMetadata};
pub use binning::SpatioTemporalBinner;
pub use crossing::{PlaneCrossingDetector, SegmentCrossing, PLANE_TOLERANCE};
