//! Hit records and classified hit sets.

use crate::{Error, Result};
use std::ops::Sub;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point or displacement in detector-local coordinates (cm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Multiplies every component by `factor`.
    #[inline]
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Returns true if every component is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Point3 {
    type Output = Point3;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// A single simulated particle interaction.
///
/// Positions are in cm with the origin at the detector centre, times in ns
/// from the start of the event. `energy_deposited` and `track_energy` share
/// one energy unit across a run (eV when produced by the classifier).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Opaque identifier, carried through for traceability.
    pub hit_id: u64,
    /// Trajectory this hit belongs to.
    pub track_id: i64,
    /// Particle species code.
    pub particle_id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Time since event start.
    pub t: f64,
    /// Energy lost by the particle at this hit.
    pub energy_deposited: f64,
    /// Kinetic energy of the track at this hit.
    pub track_energy: f64,
}

impl Hit {
    /// Creates a hit with no track information (track 0, zero track energy).
    #[must_use]
    pub fn new(hit_id: u64, particle_id: i32, x: f64, y: f64, z: f64, t: f64, energy: f64) -> Self {
        Self {
            hit_id,
            track_id: 0,
            particle_id,
            x,
            y,
            z,
            t,
            energy_deposited: energy,
            track_energy: 0.0,
        }
    }

    /// Sets the track this hit belongs to and the track's kinetic energy.
    #[must_use]
    pub fn with_track(mut self, track_id: i64, track_energy: f64) -> Self {
        self.track_id = track_id;
        self.track_energy = track_energy;
        self
    }

    /// Position of the hit.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

/// A classified, homogeneous collection of hits from one event.
///
/// Every admitted hit carries non-zero deposited energy. Consumers only get
/// shared access; algorithms that need to reorder or partition the hits
/// work on their own copies.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HitSet {
    hits: Vec<Hit>,
}

impl HitSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self { hits: Vec::new() }
    }

    /// Creates an empty set with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
        }
    }

    /// Builds a set from hits, rejecting any with zero deposited energy.
    ///
    /// # Errors
    /// Returns [`Error::ZeroEnergyHit`] for the first offending hit.
    pub fn from_hits<I: IntoIterator<Item = Hit>>(hits: I) -> Result<Self> {
        let mut set = Self::new();
        for hit in hits {
            set.push(hit)?;
        }
        Ok(set)
    }

    /// Adds a hit to the set.
    ///
    /// # Errors
    /// Returns [`Error::ZeroEnergyHit`] if the hit deposited no energy.
    pub fn push(&mut self, hit: Hit) -> Result<()> {
        if hit.energy_deposited == 0.0 {
            return Err(Error::ZeroEnergyHit(hit.hit_id));
        }
        self.hits.push(hit);
        Ok(())
    }

    /// Appends every hit of `other`.
    pub fn extend_from(&mut self, other: &HitSet) {
        self.hits.extend_from_slice(&other.hits);
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the set holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits in insertion order.
    #[must_use]
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Iterates over hits in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Hit> {
        self.hits.iter()
    }

    /// Latest hit time, or 0 if no hit is later than 0.
    #[must_use]
    pub fn max_time(&self) -> f64 {
        self.hits.iter().map(|h| h.t).fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a HitSet {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_ops() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(0.5, 0.0, 1.0);
        assert_eq!(a - b, Point3::new(0.5, 2.0, 2.0));
        assert_relative_eq!(a.dot(&b), 3.5);
        assert_relative_eq!(Point3::new(3.0, 4.0, 0.0).norm(), 5.0);
        assert!(!Point3::new(f64::NAN, 0.0, 0.0).is_finite());
    }

    #[test]
    fn test_hit_set_rejects_zero_energy() {
        let mut set = HitSet::new();
        assert!(set.push(Hit::new(1, 0, 0.0, 0.0, 0.0, 1.0, 2.0)).is_ok());
        let err = set.push(Hit::new(2, 0, 0.0, 0.0, 0.0, 1.0, 0.0));
        assert!(matches!(err, Err(Error::ZeroEnergyHit(2))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_max_time() {
        let set = HitSet::from_hits([
            Hit::new(1, 0, 0.0, 0.0, 0.0, 0.02, 1.0),
            Hit::new(2, 0, 0.0, 0.0, 0.0, 0.09, 1.0),
            Hit::new(3, 0, 0.0, 0.0, 0.0, 0.06, 1.0),
        ])
        .unwrap();
        assert_relative_eq!(set.max_time(), 0.09);

        let negative = HitSet::from_hits([Hit::new(1, 0, 0.0, 0.0, 0.0, -4.0, 1.0)]).unwrap();
        assert_relative_eq!(negative.max_time(), 0.0);
        assert_relative_eq!(HitSet::new().max_time(), 0.0);
    }

    #[test]
    fn test_with_track() {
        let hit = Hit::new(9, 13, 1.0, 2.0, 3.0, 4.0, 5.0).with_track(2, 1e8);
        assert_eq!(hit.track_id, 2);
        assert_relative_eq!(hit.track_energy, 1e8);
        assert_eq!(hit.position(), Point3::new(1.0, 2.0, 3.0));
    }
}
