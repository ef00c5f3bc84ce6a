//! Spatio-temporal binning of hits into sparse occupancy grids.
//!
//! Hits are grouped by time window in a single forward pass and then
//! discretized onto a 2D (sum) or 3D (per-hit listing) grid. The caller's
//! hit set is never modified.

use hitgrid_core::{
    Axis, BinningConfig, CellKey, CellMap, CellValue, Error, GridExtents, GridMode, GridSeries,
    Hit, HitSet, Result, TimeSeries, TimeWindows,
};
use log::debug;
use std::collections::BTreeMap;

/// Bins hit sets onto a fixed grid and time step.
#[derive(Debug, Clone)]
pub struct SpatioTemporalBinner {
    config: BinningConfig,
    x_axis: Axis,
    y_axis: Axis,
    z_axis: Option<Axis>,
}

impl SpatioTemporalBinner {
    /// Create a binner for the given extents and bin widths.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinWidth`] if any width is not a positive
    /// finite number. Validation happens here, before any binning.
    pub fn new(extents: GridExtents, config: BinningConfig) -> Result<Self> {
        config.validate()?;
        let z_axis = match config.mode() {
            GridMode::Volumetric { dz } => Some(Axis::new(extents.half_z, dz)),
            GridMode::Planar => None,
        };
        Ok(Self {
            config,
            x_axis: Axis::new(extents.half_x, config.dx),
            y_axis: Axis::new(extents.half_y, config.dy),
            z_axis,
        })
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.z_axis {
            Some(_) => "VolumetricListing",
            None => "PlanarAggregate",
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &BinningConfig {
        &self.config
    }

    /// Bin a hit set.
    ///
    /// Returns `Ok(None)` for an empty hit set. Otherwise every hit with
    /// `k * dt <= t < (k + 1) * dt` and `k * dt < max_t` contributes to
    /// exactly one cell of window `k`; windows without hits are absent.
    ///
    /// # Errors
    /// Returns [`Error::HitOutsideGrid`] when a hit of an active window
    /// lies outside the configured extents.
    pub fn bin(&self, hits: &HitSet) -> Result<Option<GridSeries>> {
        if hits.is_empty() {
            return Ok(None);
        }

        let windows = TimeWindows::new(self.config.dt, hits.max_time());
        let mut grouped: BTreeMap<u64, Vec<&Hit>> = BTreeMap::new();
        let mut outside_windows = 0usize;
        for hit in hits {
            match windows.locate(hit.t) {
                Some(k) => grouped.entry(k).or_default().push(hit),
                None => outside_windows += 1,
            }
        }
        if outside_windows > 0 {
            debug!(
                "{outside_windows} of {} hits fall outside [0, {}) and were not binned",
                hits.len(),
                hits.max_time()
            );
        }

        let mut series = TimeSeries::new(self.config.dt);
        for (k, window_hits) in grouped {
            let mut cells = CellMap::new();
            // Later hits are visited first; listing order follows from this.
            for hit in window_hits.into_iter().rev() {
                let key = self.cell_of(hit)?;
                self.accumulate(&mut cells, key, hit);
            }
            series.insert(k, cells);
        }
        Ok(Some(series))
    }

    /// Grid cell containing `hit`.
    ///
    /// # Errors
    /// Returns [`Error::HitOutsideGrid`] if any binned coordinate lies
    /// outside `[-half, +half)`.
    pub fn cell_of(&self, hit: &Hit) -> Result<CellKey> {
        let col = locate(&self.x_axis, "x", hit.x, hit)?;
        let row = locate(&self.y_axis, "y", hit.y, hit)?;
        match &self.z_axis {
            Some(z_axis) => Ok(CellKey::volumetric(col, row, locate(z_axis, "z", hit.z, hit)?)),
            None => Ok(CellKey::planar(col, row)),
        }
    }

    fn accumulate(&self, cells: &mut CellMap, key: CellKey, hit: &Hit) {
        if self.z_axis.is_some() {
            let cell = cells
                .entry(key)
                .or_insert_with(|| CellValue::Listing(Vec::new()));
            if let CellValue::Listing(entries) = cell {
                entries.push((hit.particle_id, hit.energy_deposited));
            }
        } else {
            let cell = cells.entry(key).or_insert(CellValue::Aggregate {
                energy: 0.0,
                hits: 0,
            });
            if let CellValue::Aggregate { energy, hits } = cell {
                *energy += hit.energy_deposited;
                *hits += 1;
            }
        }
    }
}

fn locate(axis: &Axis, name: &'static str, coordinate: f64, hit: &Hit) -> Result<usize> {
    axis.locate(coordinate).ok_or(Error::HitOutsideGrid {
        hit_id: hit.hit_id,
        axis: name,
        coordinate,
        half_extent: axis.half(),
    })
}
