//! Detection of tracks crossing a plane.
//!
//! Each track is treated as straight segments between consecutive hits
//! (time ordered). A segment that straddles the plane yields a crossing at
//! the linearly interpolated time; a segment lying in the plane yields a
//! crossing at its first hit.

use hitgrid_core::{
    CrossingRecord, CrossingSeries, Error, Hit, HitSet, Plane, Result, TimeSeries, TimeWindows,
};
use log::trace;
use std::collections::BTreeMap;

/// Distances below this (cm) count as zero.
pub const PLANE_TOLERANCE: f64 = 0.001;

/// How a single segment relates to the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentCrossing {
    /// The segment lies in the plane.
    OnPlane,
    /// The segment pierces the plane at fraction `rho` of its length.
    Crosses { rho: f64 },
    /// The segment runs parallel to the plane without touching it.
    Parallel,
    /// The segment stays on one side of the plane.
    Misses,
}

/// Finds the time windows in which tracks cross a plane.
#[derive(Debug, Clone)]
pub struct PlaneCrossingDetector {
    plane: Plane,
    dt: f64,
}

impl PlaneCrossingDetector {
    /// Create a detector for `plane` with windows of width `dt`.
    ///
    /// Degenerate normals are rejected when the [`Plane`] is built.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinWidth`] if `dt` is not a positive finite
    /// number.
    pub fn new(plane: Plane, dt: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::InvalidBinWidth {
                axis: "dt",
                value: dt,
            });
        }
        Ok(Self { plane, dt })
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "SegmentInterpolation"
    }

    /// The plane being watched.
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Classify the segment from `h0` to `h1`.
    #[must_use]
    pub fn classify_segment(&self, h0: &Hit, h1: &Hit) -> SegmentCrossing {
        let p0 = h0.position();
        let pdis = self.plane.offset_from(&p0);
        let alpha = self.plane.normal().dot(&(h1.position() - p0));

        if alpha.abs() < PLANE_TOLERANCE {
            return if pdis.abs() < PLANE_TOLERANCE {
                SegmentCrossing::OnPlane
            } else {
                SegmentCrossing::Parallel
            };
        }

        let rho = (pdis / alpha).abs();
        if (0.0..=1.0).contains(&rho) {
            SegmentCrossing::Crosses { rho }
        } else {
            SegmentCrossing::Misses
        }
    }

    /// Detect crossings for every track in `hits`.
    ///
    /// Returns `Ok(None)` for an empty hit set. Crossings are filed into
    /// the same half-open windows the binner uses; a track contributes at
    /// most one record (its earliest crossing) per window, and records in a
    /// window are ordered by track id.
    ///
    /// # Errors
    /// Infallible today; the `Result` mirrors [`crate::SpatioTemporalBinner::bin`].
    pub fn detect(&self, hits: &HitSet) -> Result<Option<CrossingSeries>> {
        if hits.is_empty() {
            return Ok(None);
        }

        let windows = TimeWindows::new(self.dt, hits.max_time());
        let mut series: CrossingSeries = TimeSeries::new(self.dt);

        for (track_id, track) in group_tracks(hits) {
            let mut last_window = None;
            for pair in track.windows(2) {
                let (h0, h1) = (pair[0], pair[1]);
                let crossing_time = match self.classify_segment(h0, h1) {
                    SegmentCrossing::OnPlane => h0.t,
                    SegmentCrossing::Crosses { rho } => (1.0 - rho) * h0.t + rho * h1.t,
                    SegmentCrossing::Parallel => {
                        trace!(
                            "track {track_id}: segment {}-{} parallel to plane",
                            h0.hit_id,
                            h1.hit_id
                        );
                        continue;
                    }
                    SegmentCrossing::Misses => continue,
                };

                let Some(k) = windows.locate(crossing_time) else {
                    continue;
                };
                // Track hits are time ordered, so a repeat window is always
                // the most recent one.
                if last_window == Some(k) {
                    continue;
                }
                last_window = Some(k);

                series.entry_or_default(k).push(CrossingRecord {
                    track_id,
                    track_energy: h0.track_energy,
                    crossing_time,
                    particle_id: h0.particle_id,
                });
            }
        }

        Ok(Some(series))
    }
}

/// Hits grouped by track id, each track sorted by time (stable).
fn group_tracks(hits: &HitSet) -> BTreeMap<i64, Vec<&Hit>> {
    let mut tracks: BTreeMap<i64, Vec<&Hit>> = BTreeMap::new();
    for hit in hits {
        tracks.entry(hit.track_id).or_default().push(hit);
    }
    for track in tracks.values_mut() {
        track.sort_by(|a, b| a.t.total_cmp(&b.t));
    }
    tracks
}
