//! Half-open discretization of a symmetric axis and grid cell keys.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// One discretized axis covering `[-half, +half)` with bins of `width`.
///
/// Bin `i` is `[edge(i), edge(i + 1))` with `edge(i) = -half + i * width`.
/// Index lookups are computed directly and then refined against those
/// edges, so a coordinate equal to an edge always lands in the bin whose
/// lower edge it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    half: f64,
    width: f64,
    cells: usize,
}

impl Axis {
    /// Creates an axis. A non-finite `half` or a width that is not a
    /// positive finite number yields an axis with no bins.
    #[must_use]
    pub fn new(half: f64, width: f64) -> Self {
        if !half.is_finite() || !width.is_finite() || width <= 0.0 {
            return Self {
                half,
                width,
                cells: 0,
            };
        }
        let mut cells = (2.0 * half / width).ceil().max(0.0) as usize;
        while cells > 0 && edge(half, width, cells - 1) >= half {
            cells -= 1;
        }
        while edge(half, width, cells) < half {
            cells += 1;
        }
        Self { half, width, cells }
    }

    /// Number of bins.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Half-width of the axis.
    #[must_use]
    pub fn half(&self) -> f64 {
        self.half
    }

    /// Lower edge of bin `index`.
    #[inline]
    #[must_use]
    pub fn edge(&self, index: usize) -> f64 {
        edge(self.half, self.width, index)
    }

    /// Bin containing `coordinate`, or `None` outside `[-half, +half)`.
    #[must_use]
    pub fn locate(&self, coordinate: f64) -> Option<usize> {
        if coordinate.is_nan() || coordinate < -self.half || coordinate >= self.half || self.cells == 0
        {
            return None;
        }
        let estimate = ((coordinate + self.half) / self.width).floor().max(0.0) as usize;
        let mut index = estimate.min(self.cells - 1);
        while index > 0 && self.edge(index) > coordinate {
            index -= 1;
        }
        while index + 1 < self.cells && self.edge(index + 1) <= coordinate {
            index += 1;
        }
        Some(index)
    }
}

#[inline]
fn edge(half: f64, width: f64, index: usize) -> f64 {
    -half + index as f64 * width
}

/// Half-open time windows `[k * dt, (k + 1) * dt)` for `k * dt < max_t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindows {
    dt: f64,
    max_t: f64,
}

impl TimeWindows {
    /// Windows of width `dt` covering `[0, max_t)`.
    #[must_use]
    pub fn new(dt: f64, max_t: f64) -> Self {
        Self { dt, max_t }
    }

    /// Window width.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Start time of window `k`.
    #[inline]
    #[must_use]
    pub fn start(&self, k: u64) -> f64 {
        k as f64 * self.dt
    }

    /// Window containing `t`.
    ///
    /// Returns `None` for negative times and for a time that sits exactly on
    /// the start of a window that begins at or after `max_t`.
    #[must_use]
    pub fn locate(&self, t: f64) -> Option<u64> {
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        let mut k = (t / self.dt).floor() as u64;
        while k > 0 && self.start(k) > t {
            k -= 1;
        }
        while k < u64::MAX && self.start(k + 1) <= t {
            k += 1;
        }
        (self.start(k) < self.max_t).then_some(k)
    }
}

/// Discretized spatial bin within one time window: column, row and,
/// for volumetric grids, depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub col: usize,
    pub row: usize,
    pub depth: Option<usize>,
}

impl CellKey {
    /// Key of a planar cell.
    #[must_use]
    pub fn planar(col: usize, row: usize) -> Self {
        Self {
            col,
            row,
            depth: None,
        }
    }

    /// Key of a volumetric cell.
    #[must_use]
    pub fn volumetric(col: usize, row: usize, depth: usize) -> Self {
        Self {
            col,
            row,
            depth: Some(depth),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.depth {
            Some(depth) => write!(f, "{},{},{}", self.col, self.row, depth),
            None => write!(f, "{},{}", self.col, self.row),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
