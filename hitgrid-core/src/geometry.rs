//! Detector geometry and the grid extents derived from it.

use crate::config::{BinningConfig, GridMode};
use crate::grid::Axis;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-widths of the binned volume around the detector centre (cm).
///
/// The valid range along each axis is `[-half, +half)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridExtents {
    pub half_x: f64,
    pub half_y: f64,
    pub half_z: f64,
}

impl GridExtents {
    /// Creates extents from explicit half-widths.
    #[must_use]
    pub fn new(half_x: f64, half_y: f64, half_z: f64) -> Self {
        Self {
            half_x,
            half_y,
            half_z,
        }
    }

    /// Number of cells along each axis for the given bin widths.
    #[must_use]
    pub fn dimensions(&self, config: &BinningConfig) -> GridDimensions {
        GridDimensions {
            ncols: Axis::new(self.half_x, config.dx).cells(),
            nrows: Axis::new(self.half_y, config.dy).cells(),
            ndepth: match config.mode() {
                GridMode::Volumetric { dz } => Some(Axis::new(self.half_z, dz).cells()),
                GridMode::Planar => None,
            },
        }
    }
}

/// Cell counts of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridDimensions {
    pub ncols: usize,
    pub nrows: usize,
    pub ndepth: Option<usize>,
}

/// Geometry of a hexagonally packed scintillating-fiber array.
///
/// Columns are laid side by side, rows are stacked with triangular
/// packing, and fibers run along z.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorGeometry {
    /// Fiber strip radius (cm).
    pub strip_radius: f64,
    /// Fiber rows in the simulation.
    pub nrows: u32,
    /// Fiber columns in the simulation.
    pub ncols: u32,
    /// Half-length of the fibers along z (cm).
    pub half_extent_z: f64,
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        Self {
            strip_radius: 0.050,
            nrows: 1,
            ncols: 1,
            half_extent_z: 1.0,
        }
    }
}

impl DetectorGeometry {
    /// Creates the default fiber geometry for `nrows` x `ncols` fibers.
    #[must_use]
    pub fn new(nrows: u32, ncols: u32) -> Self {
        Self {
            nrows,
            ncols,
            ..Self::default()
        }
    }

    /// Set the strip radius.
    #[must_use]
    pub fn with_strip_radius(mut self, radius: f64) -> Self {
        self.strip_radius = radius;
        self
    }

    /// Set the fiber half-length.
    #[must_use]
    pub fn with_half_extent_z(mut self, half: f64) -> Self {
        self.half_extent_z = half;
        self
    }

    /// Set row and column counts.
    #[must_use]
    pub fn with_rows_cols(mut self, nrows: u32, ncols: u32) -> Self {
        self.nrows = nrows;
        self.ncols = ncols;
        self
    }

    /// Half-width along x: `r * ncols`.
    #[must_use]
    pub fn half_extent_x(&self) -> f64 {
        self.strip_radius * f64::from(self.ncols)
    }

    /// Half-width along y: `(2r + r(sqrt(3) + 1)(nrows - 1)) / 2`.
    #[must_use]
    pub fn half_extent_y(&self) -> f64 {
        let r = self.strip_radius;
        let stacked = f64::from(self.nrows.saturating_sub(1));
        (2.0 * r + r * (3.0_f64.sqrt() + 1.0) * stacked) / 2.0
    }

    /// Checks the geometry can produce a non-empty grid.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] describing the bad parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.strip_radius.is_finite() && self.strip_radius > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "strip radius {} must be > 0",
                self.strip_radius
            )));
        }
        if self.nrows == 0 || self.ncols == 0 {
            return Err(Error::InvalidGeometry(format!(
                "{} rows x {} columns leaves no detector area",
                self.nrows, self.ncols
            )));
        }
        if !(self.half_extent_z.is_finite() && self.half_extent_z > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "fiber half-length {} must be > 0",
                self.half_extent_z
            )));
        }
        Ok(())
    }

    /// Grid extents for the binner and crossing detector.
    #[must_use]
    pub fn extents(&self) -> GridExtents {
        GridExtents::new(self.half_extent_x(), self.half_extent_y(), self.half_extent_z)
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::DetectorGeometry;
    use crate::{Error, Result};
    use serde::Deserialize;
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    #[derive(Deserialize)]
    struct JsonConfig {
        #[serde(default)]
        detector: JsonDetector,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct JsonDetector {
        strip_radius: Option<f64>,
        nrows: Option<u32>,
        ncols: Option<u32>,
        half_extent_z: Option<f64>,
    }

    impl DetectorGeometry {
        /// Load geometry from a JSON file.
        ///
        /// Fields missing from the file keep the values in `base`, so a file
        /// can carry only the detector constants and leave rows/columns to
        /// the command line or the input file name.
        ///
        /// # Errors
        /// Returns an error if the file cannot be read or parsed.
        pub fn from_file<P: AsRef<Path>>(path: P, base: &DetectorGeometry) -> Result<Self> {
            let reader = BufReader::new(File::open(path)?);
            let config: JsonConfig =
                serde_json::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?;
            Ok(Self::from_json_config(config, base))
        }

        /// Load geometry from a JSON string.
        ///
        /// # Errors
        /// Returns an error if the string is not a valid configuration.
        pub fn from_json(json: &str, base: &DetectorGeometry) -> Result<Self> {
            let config: JsonConfig =
                serde_json::from_str(json).map_err(|e| Error::ConfigParse(e.to_string()))?;
            Ok(Self::from_json_config(config, base))
        }

        fn from_json_config(config: JsonConfig, base: &DetectorGeometry) -> Self {
            let detector = config.detector;
            Self {
                strip_radius: detector.strip_radius.unwrap_or(base.strip_radius),
                nrows: detector.nrows.unwrap_or(base.nrows),
                ncols: detector.ncols.unwrap_or(base.ncols),
                half_extent_z: detector.half_extent_z.unwrap_or(base.half_extent_z),
            }
        }
    }
}
