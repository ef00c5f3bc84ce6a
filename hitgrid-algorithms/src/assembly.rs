//! Assembly of per-event output records.

use crate::binning::SpatioTemporalBinner;
use crate::crossing::PlaneCrossingDetector;
use hitgrid_core::{
    BinningConfig, ClassifiedEvent, CrossingSeries, GridDimensions, GridExtents, GridSeries, Plane,
    Result,
};
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Binning parameters and grid shape recorded with every event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventMetadata {
    /// Time window width (ns).
    pub dt: f64,
    /// Column width (cm).
    pub dx: f64,
    /// Row width (cm).
    pub dy: f64,
    /// Depth width (cm), volumetric mode only.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub dz: Option<f64>,
    /// Grid rows.
    pub nrows: usize,
    /// Grid columns.
    pub ncols: usize,
    /// Grid depth bins, volumetric mode only.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub ndepth: Option<usize>,
    /// Whether a detection plane was configured.
    pub plane: bool,
    /// Particle that started the event, if known.
    #[cfg_attr(feature = "serde", serde(rename = "primary pid"))]
    pub primary_particle: Option<i32>,
}

/// Binned output of one event.
///
/// A region with no hits is `None`, which is distinct from a series with no
/// active windows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AssembledEvent {
    #[cfg_attr(feature = "serde", serde(skip))]
    pub number: u64,
    /// Binning parameters and grid shape.
    #[cfg_attr(feature = "serde", serde(rename = "event metadata"))]
    pub metadata: EventMetadata,
    /// Binned side 1 photons.
    #[cfg_attr(feature = "serde", serde(rename = "grid hits - side 1"))]
    pub side1: Option<GridSeries>,
    /// Binned side 2 photons.
    #[cfg_attr(feature = "serde", serde(rename = "grid hits - side 2"))]
    pub side2: Option<GridSeries>,
    /// Binned massive-particle hits.
    #[cfg_attr(feature = "serde", serde(rename = "grid hits - body"))]
    pub body: Option<GridSeries>,
    /// Plane crossings, when a plane is configured and tracks are known.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "plane crossings", skip_serializing_if = "Option::is_none")
    )]
    pub crossings: Option<CrossingSeries>,
}

impl AssembledEvent {
    /// Key of this event in an export file.
    #[must_use]
    pub fn key(&self) -> String {
        format!("event {}", self.number)
    }
}

/// Runs binning and crossing detection over classified events.
#[derive(Debug, Clone)]
pub struct EventAssembler {
    binner: SpatioTemporalBinner,
    detector: Option<PlaneCrossingDetector>,
    dimensions: GridDimensions,
}

impl EventAssembler {
    /// Create an assembler. All configuration is validated here.
    ///
    /// # Errors
    /// Returns a configuration error for invalid bin widths.
    pub fn new(extents: GridExtents, config: BinningConfig, plane: Option<Plane>) -> Result<Self> {
        let binner = SpatioTemporalBinner::new(extents, config)?;
        let detector = plane
            .map(|plane| PlaneCrossingDetector::new(plane, config.dt))
            .transpose()?;
        Ok(Self {
            binner,
            detector,
            dimensions: extents.dimensions(&config),
        })
    }

    /// Shape of the output grids.
    #[must_use]
    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Bin one event.
    ///
    /// Returns `Ok(None)` when the event has no hits in any region.
    ///
    /// # Errors
    /// Propagates [`hitgrid_core::Error::HitOutsideGrid`] from the binner.
    pub fn assemble(&self, event: &ClassifiedEvent) -> Result<Option<AssembledEvent>> {
        if event.is_empty() {
            warn!("event {} has no usable hits, skipping", event.number);
            return Ok(None);
        }

        let config = self.binner.config();
        let metadata = EventMetadata {
            dt: config.dt,
            dx: config.dx,
            dy: config.dy,
            dz: config.dz,
            nrows: self.dimensions.nrows,
            ncols: self.dimensions.ncols,
            ndepth: self.dimensions.ndepth,
            plane: self.detector.is_some(),
            primary_particle: event.primary_particle(),
        };

        let side1 = self.binner.bin(&event.side1)?;
        let side2 = self.binner.bin(&event.side2)?;
        let body = self.binner.bin(&event.massive)?;
        let crossings = match &self.detector {
            Some(_) if event.untracked => {
                warn!(
                    "event {} has no track ids, skipping plane crossings",
                    event.number
                );
                None
            }
            Some(detector) => detector.detect(&event.tracked_hits())?,
            None => None,
        };

        debug!(
            "event {}: {} side 1, {} side 2, {} massive hits; {} crossing windows",
            event.number,
            event.side1.len(),
            event.side2.len(),
            event.massive.len(),
            crossings.as_ref().map_or(0, CrossingSeries::len)
        );

        Ok(Some(AssembledEvent {
            number: event.number,
            metadata,
            side1,
            side2,
            body,
            crossings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitgrid_core::{Error, Hit, Point3};

    fn extents() -> GridExtents {
        GridExtents::new(1.0, 1.0, 1.0)
    }

    #[test]
    fn test_empty_event_skipped() {
        let assembler =
            EventAssembler::new(extents(), BinningConfig::new(0.05, 0.1, 0.1), None).unwrap();
        assert!(assembler
            .assemble(&ClassifiedEvent::new(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_metadata_and_regions() {
        let assembler =
            EventAssembler::new(extents(), BinningConfig::new(0.05, 0.1, 0.1), None).unwrap();
        let mut event = ClassifiedEvent::new(4);
        event
            .side1
            .push(Hit::new(1, 0, 0.0, 0.0, 0.0, 0.02, 3.0))
            .unwrap();
        event
            .massive
            .push(Hit::new(2, 13, 0.1, 0.1, 0.0, 0.01, 8.0).with_track(1, 1.0e9))
            .unwrap();

        let assembled = assembler.assemble(&event).unwrap().unwrap();
        assert_eq!(assembled.key(), "event 4");
        assert_eq!(assembled.metadata.nrows, 20);
        assert_eq!(assembled.metadata.ncols, 20);
        assert_eq!(assembled.metadata.ndepth, None);
        assert!(!assembled.metadata.plane);
        assert_eq!(assembled.metadata.primary_particle, Some(13));
        assert!(assembled.side1.is_some());
        assert!(assembled.side2.is_none());
        assert!(assembled.body.is_some());
        assert!(assembled.crossings.is_none());
    }

    #[test]
    fn test_crossings_use_all_hits() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Point3::new(0.0, 0.0, 1.0)).unwrap();
        let assembler =
            EventAssembler::new(extents(), BinningConfig::new(1.0, 0.1, 0.1), Some(plane))
                .unwrap();
        let mut event = ClassifiedEvent::new(1);
        event
            .side2
            .push(Hit::new(1, 0, 0.0, 0.0, 0.0, 0.0, 1.0).with_track(7, 3.0))
            .unwrap();
        event
            .side2
            .push(Hit::new(2, 0, 0.0, 0.0, 0.9, 4.0, 1.0).with_track(7, 3.0))
            .unwrap();

        let assembled = assembler.assemble(&event).unwrap().unwrap();
        assert!(assembled.metadata.plane);
        let crossings = assembled.crossings.unwrap();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings.iter().next().unwrap().1[0].track_id, 7);
    }

    #[test]
    fn test_untracked_event_has_no_crossings() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Point3::new(0.0, 0.0, 1.0)).unwrap();
        let assembler =
            EventAssembler::new(extents(), BinningConfig::new(1.0, 0.1, 0.1), Some(plane))
                .unwrap();
        // A muon and an electron that would join into one fake track 0.
        let mut event = ClassifiedEvent::new(3).with_untracked();
        event
            .massive
            .push(Hit::new(1, 13, 0.0, 0.0, 0.0, 0.0, 1.0))
            .unwrap();
        event
            .massive
            .push(Hit::new(2, 11, 0.0, 0.0, 0.9, 1.0, 1.0))
            .unwrap();

        let assembled = assembler.assemble(&event).unwrap().unwrap();
        assert!(assembled.metadata.plane);
        assert!(assembled.body.is_some());
        assert!(assembled.crossings.is_none());
    }

    #[test]
    fn test_bad_config_rejected_before_events() {
        let result = EventAssembler::new(extents(), BinningConfig::new(-1.0, 0.1, 0.1), None);
        assert!(matches!(result, Err(Error::InvalidBinWidth { axis: "dt", .. })));
    }
}
