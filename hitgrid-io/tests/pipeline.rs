use hitgrid_algorithms::EventAssembler;
use hitgrid_core::{BinningConfig, DetectorGeometry, Plane, Point3};
use hitgrid_io::{
    decode_rows_cols, EventWriter, ExportMode, GemcFileReader, HitClassifier, OUTPUT_PREFIX,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

const LOG: &str = "GEMC run log
 ##########
   > option N 3
   > option SEED 42
 --- Header Bank --
      evn:\t1
   -- integrated true infos bank  (51, 0) --
      pid:\t0\t0\t13
      tid:\t3\t4\t1
      trackE:\t0\t0\t1000
      totEdep:\t0.001\t0.002\t1.5
      avg_x:\t0\t0\t1
      avg_y:\t0\t0\t1
      avg_z:\t0\t0\t0
      avg_t:\t0.02\t0.06\t0.01
   -- integrated digitized bank  (52, 0) --
      hitn:\t1\t2\t3
      id:\t400000000\t1500000000\t100000000
 --- Generated Particles Bank --
   > Particle Number: 1 pid: 13 momentum: 1000
 ---- End of Event  ----
 --- Header Bank --
      evn:\t2
 ---- End of Event  ----
";

fn write_log(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("bcal_20210311122138_r11c11.txt");
    fs::write(&path, LOG).unwrap();
    path
}

#[test]
fn test_log_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_log(dir.path());
    let out_dir = dir.path().join("out");

    let (rows, cols) = decode_rows_cols(&input).unwrap();
    let extents = DetectorGeometry::new(rows, cols).extents();
    let assembler =
        EventAssembler::new(extents, BinningConfig::new(0.05, 0.1, 0.1), None).unwrap();
    let classifier = HitClassifier::default();

    let log = GemcFileReader::open(&input).unwrap().read().unwrap();
    assert_eq!(log.events.len(), 2);

    let mut classified = Vec::new();
    let mut assembled = Vec::new();
    for (number, record) in &log.events {
        let event = classifier.classify(*number, record).unwrap();
        if let Some(out) = assembler.assemble(&event).unwrap() {
            assembled.push(out);
        }
        classified.push(event);
    }
    // Event 2 has no hits and is skipped.
    assert_eq!(assembled.len(), 1);

    let writer = EventWriter::new(ExportMode::EventsWithMetadata, &out_dir);
    let path = writer
        .write(&input, &assembled, &classified, &log.metadata)
        .unwrap()
        .unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("{OUTPUT_PREFIX}bcal_20210311122138_1-1.json")
    );

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["gemc metadata"]["SEED"], "42");

    let event = &json["event 1"];
    let metadata = &event["event metadata"];
    assert_eq!(metadata["ncols"], 11);
    assert_eq!(metadata["nrows"], 15);
    assert_eq!(metadata["primary pid"], 13);
    assert_eq!(metadata["plane"], false);
    assert!(metadata.get("dz").is_none());

    // Side 1: one photon in window 0 at the detector centre.
    let side1 = event["grid hits - side 1"].as_object().unwrap();
    assert_eq!(side1.keys().collect::<Vec<_>>(), vec!["0.0"]);
    assert_eq!(side1["0.0"]["5,7"]["hits"], 1);

    // Side 2: the other photon lands in the second window.
    let side2 = event["grid hits - side 2"].as_object().unwrap();
    assert_eq!(side2.keys().collect::<Vec<_>>(), vec!["0.05"]);

    assert!(event["grid hits - body"].is_object());
    assert!(event.get("plane crossings").is_none());
    assert_eq!(event["gemc hits - particles"].as_array().unwrap().len(), 1);
    assert!(json.get("event 2").is_none());
}

#[test]
fn test_events_mode_omits_hits() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_log(dir.path());
    let log = GemcFileReader::open(&input).unwrap().read().unwrap();
    let classifier = HitClassifier::default();
    let assembler = EventAssembler::new(
        DetectorGeometry::new(11, 11).extents(),
        BinningConfig::new(0.05, 0.1, 0.1).with_dz(0.5),
        None,
    )
    .unwrap();

    let (number, record) = &log.events[0];
    let event = classifier.classify(*number, record).unwrap();
    let assembled = vec![assembler.assemble(&event).unwrap().unwrap()];

    let document = EventWriter::new(ExportMode::Events, dir.path())
        .document(&assembled, &[event], &log.metadata)
        .unwrap();
    assert!(document.get("gemc metadata").is_none());
    let event = &document["event 1"];
    assert!(event.get("gemc hits - side 1").is_none());
    assert_eq!(event["event metadata"]["ndepth"], 4);

    // Listing cells hold [particle id, energy] pairs.
    let cell = &event["grid hits - side 1"]["0.0"]["5,7,2"];
    assert_eq!(cell[0][0], 0);
    assert!((cell[0][1].as_f64().unwrap() - 1000.0).abs() < 1e-6);
}

const UNTRACKED_LOG: &str = "GEMC run log
 ##########
   > option N 1
 --- Header Bank --
      evn:\t1
   -- integrated true infos bank  (51, 0) --
      pid:\t13\t11
      trackE:\t1000\t5
      totEdep:\t1.5\t0.2
      avg_x:\t0\t0
      avg_y:\t0\t0
      avg_z:\t0\t20
      avg_t:\t0\t1
   -- integrated digitized bank  (52, 0) --
      hitn:\t1\t2
      id:\t100000000\t100000000
 ---- End of Event  ----
";

#[test]
fn test_log_without_track_ids_skips_crossings() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bcal_notid_r11c11.txt");
    fs::write(&input, UNTRACKED_LOG).unwrap();

    let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 1.0)).unwrap();
    let assembler = EventAssembler::new(
        DetectorGeometry::new(11, 11).extents(),
        BinningConfig::new(0.5, 0.1, 0.1),
        Some(plane),
    )
    .unwrap();

    let log = GemcFileReader::open(&input).unwrap().read().unwrap();
    let (number, record) = &log.events[0];
    let event = HitClassifier::default().classify(*number, record).unwrap();
    assert!(event.untracked);
    assert_eq!(event.massive.len(), 2);

    let assembled = assembler.assemble(&event).unwrap().unwrap();
    let document = EventWriter::new(ExportMode::Events, dir.path())
        .document(&[assembled], &[event], &log.metadata)
        .unwrap();
    let event = &document["event 1"];
    assert_eq!(event["event metadata"]["plane"], true);
    assert!(event["grid hits - body"].is_object());
    assert!(event.get("plane crossings").is_none());
}
