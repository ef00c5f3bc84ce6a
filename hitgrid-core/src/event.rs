//! Per-event hit sets as produced by the classifier.

use crate::hit::HitSet;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The hits of one event, split by detector region.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ClassifiedEvent {
    /// 1-based position of the event in its log.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub number: u64,
    /// Photons reaching the side 1 sensor plates.
    #[cfg_attr(feature = "serde", serde(rename = "gemc hits - side 1"))]
    pub side1: HitSet,
    /// Photons reaching the side 2 sensor plates.
    #[cfg_attr(feature = "serde", serde(rename = "gemc hits - side 2"))]
    pub side2: HitSet,
    /// Every non-photon hit, wherever it happened.
    #[cfg_attr(feature = "serde", serde(rename = "gemc hits - particles"))]
    pub massive: HitSet,
    /// Particle id of the first generated particle, when the log lists one.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub generated_particle: Option<i32>,
    /// Set when the log carried no track ids, so every hit reads as track 0
    /// and hits cannot be linked into trajectories.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub untracked: bool,
}

impl ClassifiedEvent {
    /// Creates an event with no hits.
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Records the first generated particle of the event.
    #[must_use]
    pub fn with_generated_particle(mut self, particle_id: i32) -> Self {
        self.generated_particle = Some(particle_id);
        self
    }

    /// Marks the hits as lacking track ids.
    #[must_use]
    pub fn with_untracked(mut self) -> Self {
        self.untracked = true;
        self
    }

    /// Returns true if no region holds a hit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.side1.is_empty() && self.side2.is_empty() && self.massive.is_empty()
    }

    /// Total hits across all regions.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.side1.len() + self.side2.len() + self.massive.len()
    }

    /// Particle that started the event.
    ///
    /// The generated particle wins; otherwise the earliest hit of track 1
    /// among the massive-particle hits.
    #[must_use]
    pub fn primary_particle(&self) -> Option<i32> {
        self.generated_particle.or_else(|| {
            self.massive
                .iter()
                .filter(|hit| hit.track_id == 1)
                .min_by(|a, b| a.t.total_cmp(&b.t))
                .map(|hit| hit.particle_id)
        })
    }

    /// Massive-particle hits followed by both photon sets.
    #[must_use]
    pub fn tracked_hits(&self) -> HitSet {
        let mut all = HitSet::with_capacity(self.hit_count());
        all.extend_from(&self.massive);
        all.extend_from(&self.side1);
        all.extend_from(&self.side2);
        all
    }
}
