//! Error types for hitgrid-core.

use thiserror::Error;

/// Result type alias for hitgrid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of a failure, used to tell operators what to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bin widths, plane definition or detector geometry were set wrong.
    Configuration,
    /// The input hits are inconsistent with the configured grid.
    Data,
    /// The plane definition cannot describe a plane.
    Geometry,
}

impl ErrorKind {
    /// Short operator-facing label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "bad configuration",
            ErrorKind::Data => "bad or inconsistent input data",
            ErrorKind::Geometry => "degenerate plane geometry",
        }
    }
}

/// Core error types for hitgrid operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A bin width is missing, not finite or not positive.
    #[error("invalid {axis} bin width: {value} (must be finite and > 0)")]
    InvalidBinWidth { axis: &'static str, value: f64 },

    /// Only one of plane vertex and plane normal was supplied.
    #[error("plane must be given as both a vertex and a normal, or not at all")]
    PartialPlane,

    /// Detector geometry parameters cannot produce a grid.
    #[error("invalid detector geometry: {0}")]
    InvalidGeometry(String),

    /// A hit lies outside every bin of the configured grid.
    #[error(
        "hit {hit_id} has {axis} = {coordinate} outside the grid [-{half_extent}, {half_extent}); \
         the input data is inconsistent or, more likely, the detector rows/columns are set wrong"
    )]
    HitOutsideGrid {
        hit_id: u64,
        axis: &'static str,
        coordinate: f64,
        half_extent: f64,
    },

    /// A hit with no deposited energy was offered to a hit set.
    #[error("hit {0} has zero deposited energy")]
    ZeroEnergyHit(u64),

    /// Plane normal is the zero vector or not finite.
    #[error("plane normal ({0}, {1}, {2}) has no direction")]
    DegenerateNormal(f64, f64, f64),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read.
    #[error("configuration read error: {0}")]
    ConfigRead(#[from] std::io::Error),
}

impl Error {
    /// Classifies the error for reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::HitOutsideGrid { .. } | Error::ZeroEnergyHit(_) => ErrorKind::Data,
            Error::DegenerateNormal(..) => ErrorKind::Geometry,
            _ => ErrorKind::Configuration,
        }
    }
}
