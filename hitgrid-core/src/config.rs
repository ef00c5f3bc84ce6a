//! Binning configuration.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid dimensionality, derived from the presence of a depth bin width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridMode {
    /// 2D grid; cells sum deposited energy and count hits.
    Planar,
    /// 3D grid with depth bins of width `dz`; cells list every hit.
    Volumetric { dz: f64 },
}

/// Bin widths for the time axis and the spatial grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinningConfig {
    /// Time window width (ns).
    pub dt: f64,
    /// Column width (cm).
    pub dx: f64,
    /// Row width (cm).
    pub dy: f64,
    /// Depth width (cm). `None` disables depth binning.
    pub dz: Option<f64>,
}

impl BinningConfig {
    /// Creates a planar configuration. Call [`Self::validate`] before use.
    #[must_use]
    pub fn new(dt: f64, dx: f64, dy: f64) -> Self {
        Self {
            dt,
            dx,
            dy,
            dz: None,
        }
    }

    /// Sets the depth bin width. A NaN width leaves depth binning disabled.
    #[must_use]
    pub fn with_dz(mut self, dz: f64) -> Self {
        self.dz = if dz.is_nan() { None } else { Some(dz) };
        self
    }

    /// Sets an optional depth bin width.
    #[must_use]
    pub fn with_optional_dz(self, dz: Option<f64>) -> Self {
        match dz {
            Some(dz) => self.with_dz(dz),
            None => Self { dz: None, ..self },
        }
    }

    /// Checks every width is finite and strictly positive.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinWidth`] naming the first bad axis.
    pub fn validate(&self) -> Result<()> {
        check_width("dt", self.dt)?;
        check_width("dx", self.dx)?;
        check_width("dy", self.dy)?;
        if let Some(dz) = self.dz {
            check_width("dz", dz)?;
        }
        Ok(())
    }

    /// Grid mode implied by `dz`.
    #[must_use]
    pub fn mode(&self) -> GridMode {
        match self.dz {
            Some(dz) if dz.is_finite() => GridMode::Volumetric { dz },
            _ => GridMode::Planar,
        }
    }
}

fn check_width(axis: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidBinWidth { axis, value })
    }
}
