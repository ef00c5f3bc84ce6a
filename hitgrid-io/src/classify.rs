//! Classification of raw event banks into hit sets.

use crate::gemc::{parse_value, EventRecord};
use crate::{Error, Result};
use hitgrid_core::{ClassifiedEvent, Hit};
use log::trace;

/// Sensor layout and unit conversions for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Volume ids of the side 1 sensor plates.
    pub side1_volumes: Vec<u64>,
    /// Volume ids of the side 2 sensor plates.
    pub side2_volumes: Vec<u64>,
    /// Particle id GEMC uses for optical photons.
    pub photon_pid: i32,
    /// Divisor turning a digitized `id` into a volume id.
    pub volume_divisor: u64,
    /// Factor from log lengths to cm (log lengths are mm).
    pub length_scale: f64,
    /// Factor from log energies to eV (log energies are MeV).
    pub energy_scale: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            side1_volumes: vec![4, 14],
            side2_volumes: vec![5, 15],
            photon_pid: 0,
            volume_divisor: 100_000_000,
            length_scale: 0.1,
            energy_scale: 1.0e6,
        }
    }
}

impl ClassifierConfig {
    /// Set the side 1 sensor volumes.
    #[must_use]
    pub fn with_side1_volumes(mut self, volumes: Vec<u64>) -> Self {
        self.side1_volumes = volumes;
        self
    }

    /// Set the side 2 sensor volumes.
    #[must_use]
    pub fn with_side2_volumes(mut self, volumes: Vec<u64>) -> Self {
        self.side2_volumes = volumes;
        self
    }

    /// Set the photon particle id.
    #[must_use]
    pub fn with_photon_pid(mut self, pid: i32) -> Self {
        self.photon_pid = pid;
        self
    }
}

/// Columns read from the true-info bank.
struct TrueInfo<'a> {
    pid: &'a [String],
    tid: Option<&'a [String]>,
    track_energy: Option<&'a [String]>,
    edep: &'a [String],
    x: &'a [String],
    y: &'a [String],
    z: Option<&'a [String]>,
    t: &'a [String],
}

/// Sorts the hits of an event into side 1, side 2 and massive-particle sets.
#[derive(Debug, Clone, Default)]
pub struct HitClassifier {
    config: ClassifierConfig,
}

impl HitClassifier {
    /// Create a classifier.
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the hits of event `number`.
    ///
    /// An event without a digitized `hitn` column has no hits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if a required column is missing or
    /// shorter than `hitn`, or a value cannot be parsed.
    pub fn classify(&self, number: u64, record: &EventRecord) -> Result<ClassifiedEvent> {
        let mut event = ClassifiedEvent::new(number);
        event.generated_particle = record.generated_pid();

        let Some(hitn) = record.digitized_column("hitn") else {
            return Ok(event);
        };
        let n = hitn.len();
        let ids = digitized(record, "id", n)?;
        let columns = TrueInfo {
            pid: true_info(record, "pid", n)?,
            tid: optional_true_info(record, "tid", n)?,
            track_energy: optional_true_info(record, "trackE", n)?,
            edep: true_info(record, "totEdep", n)?,
            x: true_info(record, "avg_x", n)?,
            y: true_info(record, "avg_y", n)?,
            z: optional_true_info(record, "avg_z", n)?,
            t: true_info(record, "avg_t", n)?,
        };

        event.untracked = columns.tid.is_none();

        let mut dropped = 0usize;
        for i in 0..n {
            let edep: f64 = parse_value("totEdep", i, &columns.edep[i])?;
            if edep == 0.0 {
                continue;
            }
            let pid: i32 = parse_value("pid", i, &columns.pid[i])?;
            let volume = parse_value::<u64>("id", i, &ids[i])? / self.config.volume_divisor;

            let target = if pid == self.config.photon_pid {
                if self.config.side1_volumes.contains(&volume) {
                    &mut event.side1
                } else if self.config.side2_volumes.contains(&volume) {
                    &mut event.side2
                } else {
                    dropped += 1;
                    continue;
                }
            } else {
                &mut event.massive
            };

            let hit = self.build_hit(&columns, parse_value("hitn", i, &hitn[i])?, pid, edep, i)?;
            target.push(hit)?;
        }

        if dropped > 0 {
            trace!("event {number}: {dropped} photons outside the sensor plates");
        }
        Ok(event)
    }

    fn build_hit(
        &self,
        columns: &TrueInfo<'_>,
        hit_id: u64,
        pid: i32,
        edep: f64,
        i: usize,
    ) -> Result<Hit> {
        let length = self.config.length_scale;
        let energy = self.config.energy_scale;
        let z = match columns.z {
            Some(z) => parse_value::<f64>("avg_z", i, &z[i])?,
            None => 0.0,
        };
        let track_id = match columns.tid {
            Some(tid) => parse_value("tid", i, &tid[i])?,
            None => 0,
        };
        let track_energy = match columns.track_energy {
            Some(e) => parse_value::<f64>("trackE", i, &e[i])?,
            None => 0.0,
        };

        Ok(Hit::new(
            hit_id,
            pid,
            parse_value::<f64>("avg_x", i, &columns.x[i])? * length,
            parse_value::<f64>("avg_y", i, &columns.y[i])? * length,
            z * length,
            parse_value("avg_t", i, &columns.t[i])?,
            edep * energy,
        )
        .with_track(track_id, track_energy * energy))
    }
}

fn checked<'a>(column: &'a [String], name: &str, n: usize) -> Result<&'a [String]> {
    if column.len() < n {
        return Err(Error::InvalidFormat(format!(
            "column '{name}' has {} values but hitn has {n}",
            column.len()
        )));
    }
    Ok(column)
}

fn true_info<'a>(record: &'a EventRecord, name: &str, n: usize) -> Result<&'a [String]> {
    let column = record
        .true_info_column(name)
        .ok_or_else(|| Error::InvalidFormat(format!("true-info bank has no '{name}' column")))?;
    checked(column, name, n)
}

fn optional_true_info<'a>(
    record: &'a EventRecord,
    name: &str,
    n: usize,
) -> Result<Option<&'a [String]>> {
    record
        .true_info_column(name)
        .map(|column| checked(column, name, n))
        .transpose()
}

fn digitized<'a>(record: &'a EventRecord, name: &str, n: usize) -> Result<&'a [String]> {
    let column = record
        .digitized_column(name)
        .ok_or_else(|| Error::InvalidFormat(format!("digitized bank has no '{name}' column")))?;
    checked(column, name, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn column(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn record() -> EventRecord {
        let mut record = EventRecord::default();
        record.digitized.insert("hitn".into(), column(&["1", "2", "3", "4", "5"]));
        record.digitized.insert(
            "id".into(),
            column(&["400000012", "1500000000", "700000000", "100000000", "500000001"]),
        );
        record.true_info.insert("pid".into(), column(&["0", "0", "0", "13", "0"]));
        record.true_info.insert("tid".into(), column(&["5", "6", "7", "1", "8"]));
        record.true_info.insert("trackE".into(), column(&["0.1", "0.2", "0.3", "1000", "0"]));
        record.true_info.insert("totEdep".into(), column(&["0.002", "0.001", "0.5", "1.5", "0"]));
        record.true_info.insert("avg_x".into(), column(&["1.0", "2.0", "3.0", "-4.0", "0"]));
        record.true_info.insert("avg_y".into(), column(&["-1.0", "0.5", "3.0", "2.0", "0"]));
        record.true_info.insert("avg_z".into(), column(&["10", "-10", "0", "5", "0"]));
        record.true_info.insert("avg_t".into(), column(&["0.3", "0.4", "0.5", "0.1", "0.9"]));
        record
    }

    #[test]
    fn test_classification_and_units() {
        let event = HitClassifier::default().classify(7, &record()).unwrap();
        assert_eq!(event.number, 7);

        // Volume 4 -> side 1, volume 15 -> side 2, volume 7 dropped.
        assert_eq!(event.side1.len(), 1);
        assert_eq!(event.side2.len(), 1);
        assert_eq!(event.massive.len(), 1);

        let photon = &event.side1.hits()[0];
        assert_eq!(photon.hit_id, 1);
        assert_relative_eq!(photon.x, 0.1);
        assert_relative_eq!(photon.y, -0.1);
        assert_relative_eq!(photon.z, 1.0);
        assert_relative_eq!(photon.energy_deposited, 2000.0, epsilon = 1e-9);

        let muon = &event.massive.hits()[0];
        assert_eq!(muon.particle_id, 13);
        assert_eq!(muon.track_id, 1);
        assert_relative_eq!(muon.track_energy, 1.0e9);
        assert_eq!(event.primary_particle(), Some(13));
    }

    #[test]
    fn test_zero_energy_hits_skipped() {
        let event = HitClassifier::default().classify(1, &record()).unwrap();
        assert!(event
            .side2
            .iter()
            .chain(event.side1.iter())
            .all(|hit| hit.hit_id != 5));
    }

    #[test]
    fn test_missing_optional_columns_default() {
        let mut record = record();
        record.true_info.remove("avg_z");
        record.true_info.remove("tid");
        record.true_info.remove("trackE");
        let event = HitClassifier::default().classify(1, &record).unwrap();
        let muon = &event.massive.hits()[0];
        assert_relative_eq!(muon.z, 0.0);
        assert_eq!(muon.track_id, 0);
        assert_relative_eq!(muon.track_energy, 0.0);
        assert!(event.untracked);
    }

    #[test]
    fn test_tid_column_marks_event_tracked() {
        let event = HitClassifier::default().classify(1, &record()).unwrap();
        assert!(!event.untracked);
    }

    #[test]
    fn test_no_digitized_bank_is_empty_event() {
        let event = HitClassifier::default()
            .classify(2, &EventRecord::default())
            .unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_short_column_rejected() {
        let mut record = record();
        record.true_info.insert("avg_t".into(), column(&["0.3"]));
        let err = HitClassifier::default().classify(1, &record).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        assert!(err.to_string().contains("avg_t"));
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let mut record = record();
        record.true_info.insert("avg_x".into(), column(&["x", "2", "3", "4", "5"]));
        assert!(HitClassifier::default().classify(1, &record).is_err());
    }

    #[test]
    fn test_custom_volumes() {
        let classifier =
            HitClassifier::new(ClassifierConfig::default().with_side2_volumes(vec![7]));
        let event = classifier.classify(1, &record()).unwrap();
        assert_eq!(event.side2.len(), 1);
        assert_eq!(event.side2.hits()[0].hit_id, 3);
    }
}
