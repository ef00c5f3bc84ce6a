//! Sparse time series of per-window results.
#![allow(clippy::cast_precision_loss)]

use crate::grid::CellKey;
use std::collections::btree_map::{self, BTreeMap};

#[cfg(feature = "serde")]
use serde::ser::SerializeMap;
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// Sparse map from time window to value.
///
/// Window `k` covers `[k * dt, (k + 1) * dt)`. Windows without activity
/// are absent; absence means "no activity", never a malformed record.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<V> {
    dt: f64,
    windows: BTreeMap<u64, V>,
}

impl<V> TimeSeries<V> {
    /// Creates an empty series with window width `dt`.
    #[must_use]
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            windows: BTreeMap::new(),
        }
    }

    /// Window width.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Start time of window `k`.
    #[inline]
    #[must_use]
    pub fn window_start(&self, k: u64) -> f64 {
        k as f64 * self.dt
    }

    /// Export key of window `k`: its start time, always with a fractional
    /// part (`0.0`, `1.0`, `0.05`).
    #[must_use]
    pub fn window_key(&self, k: u64) -> String {
        float_key(self.window_start(k))
    }

    /// Stores the value of window `k`, replacing any previous one.
    pub fn insert(&mut self, k: u64, value: V) {
        self.windows.insert(k, value);
    }

    /// Value of window `k`, creating it with `V::default()` if absent.
    pub fn entry_or_default(&mut self, k: u64) -> &mut V
    where
        V: Default,
    {
        self.windows.entry(k).or_default()
    }

    /// Value of window `k`, if it had activity.
    #[must_use]
    pub fn get(&self, k: u64) -> Option<&V> {
        self.windows.get(&k)
    }

    /// Number of active windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns true if no window had activity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Active window indices in increasing order.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.windows.keys().copied()
    }

    /// Iterates `(window_start, value)` in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &V)> + '_ {
        self.windows
            .iter()
            .map(move |(&k, v)| (self.window_start(k), v))
    }

    /// Iterates `(window_index, value)` in time order.
    pub fn iter_indexed(&self) -> btree_map::Iter<'_, u64, V> {
        self.windows.iter()
    }
}

#[cfg(feature = "serde")]
impl<V: Serialize> Serialize for TimeSeries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.windows.len()))?;
        for (&k, value) in &self.windows {
            map.serialize_entry(&self.window_key(k), value)?;
        }
        map.end()
    }
}

fn float_key(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{text}.0")
    } else {
        text
    }
}

/// Contents of one grid cell within one time window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CellValue {
    /// Planar mode: summed deposited energy and hit count.
    Aggregate { energy: f64, hits: u32 },
    /// Volumetric mode: `(particle_id, energy)` of every hit, unaggregated.
    Listing(Vec<(i32, f64)>),
}

impl CellValue {
    /// Total deposited energy in the cell.
    #[must_use]
    pub fn energy(&self) -> f64 {
        match self {
            CellValue::Aggregate { energy, .. } => *energy,
            CellValue::Listing(entries) => entries.iter().map(|(_, e)| e).sum(),
        }
    }

    /// Number of hits in the cell.
    #[must_use]
    pub fn hits(&self) -> usize {
        match self {
            CellValue::Aggregate { hits, .. } => *hits as usize,
            CellValue::Listing(entries) => entries.len(),
        }
    }
}

/// Occupancy of one time window: cell key to cell contents.
pub type CellMap = BTreeMap<CellKey, CellValue>;

/// Sparse occupancy grids over time.
pub type GridSeries = TimeSeries<CellMap>;

/// A track judged to pierce the detection plane within a time window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CrossingRecord {
    pub track_id: i64,
    pub track_energy: f64,
    pub crossing_time: f64,
    pub particle_id: i32,
}

/// Plane crossings over time.
pub type CrossingSeries = TimeSeries<Vec<CrossingRecord>>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sparse_windows() {
        let mut series: TimeSeries<u32> = TimeSeries::new(0.5);
        series.insert(3, 7);
        *series.entry_or_default(1) += 2;
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(0), None);
        assert_eq!(series.indices().collect::<Vec<_>>(), vec![1, 3]);

        let starts: Vec<f64> = series.iter().map(|(start, _)| start).collect();
        assert_relative_eq!(starts[0], 0.5);
        assert_relative_eq!(starts[1], 1.5);
    }

    #[test]
    fn test_window_keys_keep_fraction() {
        let series: TimeSeries<u32> = TimeSeries::new(0.25);
        assert_eq!(series.window_key(0), "0.0");
        assert_eq!(series.window_key(1), "0.25");
        assert_eq!(series.window_key(4), "1.0");

        let coarse: TimeSeries<u32> = TimeSeries::new(2.0);
        assert_eq!(coarse.window_key(3), "6.0");
        assert_eq!(float_key(f64::INFINITY), "inf");
    }

    #[test]
    fn test_cell_value_totals() {
        let aggregate = CellValue::Aggregate {
            energy: 4.5,
            hits: 3,
        };
        assert_relative_eq!(aggregate.energy(), 4.5);
        assert_eq!(aggregate.hits(), 3);

        let listing = CellValue::Listing(vec![(0, 1.0), (13, 2.5)]);
        assert_relative_eq!(listing.energy(), 3.5);
        assert_eq!(listing.hits(), 2);
    }
}
