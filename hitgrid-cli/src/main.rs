//! hitgrid CLI
//!
//! Bins the hits of GEMC simulation logs into sparse time-indexed grids
//! and optional plane crossings, and exports them as JSON.
#![allow(clippy::cast_precision_loss)]

use clap::{Parser, Subcommand, ValueEnum};
use hitgrid_algorithms::EventAssembler;
use hitgrid_core::{BinningConfig, DetectorGeometry, Plane};
use hitgrid_io::{
    decode_rows_cols, ClassifierConfig, EventWriter, ExportMode, GemcFileReader, HitClassifier,
};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    HitgridIo(#[from] hitgrid_io::Error),

    #[error("{0}")]
    Core(#[from] hitgrid_core::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    fn label(&self) -> &'static str {
        match self {
            CliError::Io(_) => "I/O failure",
            CliError::HitgridIo(e) => e.label(),
            CliError::Core(e) => e.kind().label(),
            CliError::Usage(_) => hitgrid_core::ErrorKind::Configuration.label(),
        }
    }
}

/// Export selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Export {
    /// Print binned events to stdout
    Stdout,
    /// Write binned events to a file
    Events,
    /// Also write the classified hits of each event
    Hits,
    /// Also write hits and the log's option metadata
    Metadata,
}

impl From<Export> for ExportMode {
    fn from(export: Export) -> Self {
        match export {
            Export::Stdout => ExportMode::Stdout,
            Export::Events => ExportMode::Events,
            Export::Hits => ExportMode::EventsWithHits,
            Export::Metadata => ExportMode::EventsWithMetadata,
        }
    }
}

/// Spatio-temporal binning of detector simulation hits.
#[derive(Parser)]
#[command(name = "hitgrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin the events of a GEMC log
    Process {
        /// Input GEMC text log
        input: PathBuf,

        /// Time window width (ns)
        #[arg(long)]
        dt: f64,

        /// Column width (cm)
        #[arg(long)]
        dx: f64,

        /// Row width (cm)
        #[arg(long)]
        dy: f64,

        /// Depth width (cm); switches to per-hit 3D listing
        #[arg(long)]
        dz: Option<f64>,

        /// Point on the detection plane (cm)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        plane_vertex: Option<Vec<f64>>,

        /// Normal of the detection plane
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        plane_normal: Option<Vec<f64>>,

        /// Fiber rows in the simulation (default: decoded from the file name)
        #[arg(long)]
        rows: Option<u32>,

        /// Fiber columns in the simulation (default: decoded from the file name)
        #[arg(long)]
        cols: Option<u32>,

        /// Detector geometry JSON file
        #[arg(long)]
        geometry: Option<PathBuf>,

        /// First event to read (1-based)
        #[arg(short, long, default_value = "1")]
        first_event: u64,

        /// Number of events to read (0 = all)
        #[arg(short, long, default_value = "0")]
        num_events: u64,

        /// What to export
        #[arg(short, long, value_enum, default_value = "events")]
        export: Export,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output_dir: PathBuf,
    },

    /// Show information about a GEMC log
    Info {
        /// Input GEMC text log
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}: {e}", e.label());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Process {
            input,
            dt,
            dx,
            dy,
            dz,
            plane_vertex,
            plane_normal,
            rows,
            cols,
            geometry,
            first_event,
            num_events,
            export,
            output_dir,
        } => {
            let start = Instant::now();

            // Every configuration check happens before the log is read.
            let config = BinningConfig::new(dt, dx, dy).with_optional_dz(dz);
            config.validate()?;
            let plane = Plane::from_parts(to_triple(plane_vertex)?, to_triple(plane_normal)?)?;
            let geometry = resolve_geometry(&input, rows, cols, geometry.as_deref())?;
            let assembler = EventAssembler::new(geometry.extents(), config, plane)?;
            let dimensions = assembler.dimensions();
            info!(
                "{}x{} fibers -> {} rows x {} cols grid{}",
                geometry.nrows,
                geometry.ncols,
                dimensions.nrows,
                dimensions.ncols,
                dimensions
                    .ndepth
                    .map_or(String::new(), |d| format!(" x {d} depth bins"))
            );

            let log = GemcFileReader::open(&input)?
                .with_first_event(first_event)
                .with_num_events(num_events)
                .read()?;
            let classifier = HitClassifier::new(ClassifierConfig::default());

            let mut classified = Vec::with_capacity(log.events.len());
            let mut assembled = Vec::with_capacity(log.events.len());
            for (number, record) in &log.events {
                let event = classifier.classify(*number, record)?;
                if let Some(out) = assembler.assemble(&event)? {
                    assembled.push(out);
                }
                classified.push(event);
            }

            let writer = EventWriter::new(export.into(), &output_dir);
            let written = writer.write(&input, &assembled, &classified, &log.metadata)?;

            info!(
                "processed {} events ({} kept) in {:.2}s",
                log.events.len(),
                assembled.len(),
                start.elapsed().as_secs_f64()
            );
            if let Some(path) = written {
                println!("Wrote {} events to {}", assembled.len(), path.display());
            }
        }

        Commands::Info { input } => {
            let reader = GemcFileReader::open(&input)?;
            let file_size = reader.file_size();
            let log = reader.read()?;

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );
            if let Some((rows, cols)) = decode_rows_cols(&input) {
                println!("Fibers: {rows} rows x {cols} columns");
            }
            println!("Options: {}", log.metadata.len());
            for (key, value) in &log.metadata {
                println!("  {key} = {value}");
            }
            println!("Events: {}", log.events.len());

            let classifier = HitClassifier::default();
            let (mut side1, mut side2, mut massive, mut empty) = (0usize, 0usize, 0usize, 0usize);
            for (number, record) in &log.events {
                let event = classifier.classify(*number, record)?;
                side1 += event.side1.len();
                side2 += event.side2.len();
                massive += event.massive.len();
                if event.is_empty() {
                    empty += 1;
                }
            }
            println!("Side 1 photon hits: {side1}");
            println!("Side 2 photon hits: {side2}");
            println!("Massive particle hits: {massive}");
            println!("Events without hits: {empty}");
        }
    }

    Ok(())
}

fn to_triple(values: Option<Vec<f64>>) -> Result<Option<[f64; 3]>> {
    values
        .map(|v| {
            <[f64; 3]>::try_from(v.as_slice())
                .map_err(|_| CliError::Usage(format!("expected 3 coordinates, got {}", v.len())))
        })
        .transpose()
}

/// Geometry from, in increasing precedence: the input file name, the
/// geometry file, `--rows`/`--cols`.
fn resolve_geometry(
    input: &Path,
    rows: Option<u32>,
    cols: Option<u32>,
    geometry_file: Option<&Path>,
) -> Result<DetectorGeometry> {
    let decoded = decode_rows_cols(input);
    let mut geometry = match decoded {
        Some((nrows, ncols)) => DetectorGeometry::new(nrows, ncols),
        None => DetectorGeometry::default(),
    };
    if let Some(path) = geometry_file {
        geometry = DetectorGeometry::from_file(path, &geometry)?;
    }
    match (rows, cols) {
        (Some(nrows), Some(ncols)) => geometry = geometry.with_rows_cols(nrows, ncols),
        (None, None) => {
            if decoded.is_none() && geometry_file.is_none() {
                warn!(
                    "no rows/columns in {} and none given; assuming {}x{}",
                    input.display(),
                    geometry.nrows,
                    geometry.ncols
                );
            }
        }
        _ => {
            return Err(CliError::Usage(
                "--rows and --cols must be given together".to_string(),
            ))
        }
    }
    geometry.validate()?;
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process_with_plane() {
        let cli = Cli::try_parse_from([
            "hitgrid",
            "process",
            "run_r3c5.txt",
            "--dt",
            "0.05",
            "--dx",
            "0.1",
            "--dy",
            "0.1",
            "--plane-vertex",
            "0",
            "0",
            "-1.5",
            "--plane-normal",
            "0",
            "0",
            "1",
        ])
        .unwrap();
        let Commands::Process {
            plane_vertex,
            export,
            first_event,
            ..
        } = cli.command
        else {
            panic!("expected process");
        };
        assert_eq!(plane_vertex, Some(vec![0.0, 0.0, -1.5]));
        assert!(matches!(export, Export::Events));
        assert_eq!(first_event, 1);
    }

    #[test]
    fn test_geometry_precedence() {
        let geometry = resolve_geometry(Path::new("bcal_r11c9.txt"), None, None, None).unwrap();
        assert_eq!((geometry.nrows, geometry.ncols), (11, 9));

        let geometry =
            resolve_geometry(Path::new("bcal_r11c9.txt"), Some(3), Some(4), None).unwrap();
        assert_eq!((geometry.nrows, geometry.ncols), (3, 4));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "detector": {{ "ncols": 2, "half_extent_z": 5.0 }} }}"#).unwrap();
        file.flush().unwrap();
        let geometry =
            resolve_geometry(Path::new("bcal_r11c9.txt"), None, None, Some(file.path())).unwrap();
        assert_eq!((geometry.nrows, geometry.ncols), (11, 2));
    }

    #[test]
    fn test_partial_rows_cols_rejected() {
        let err = resolve_geometry(Path::new("x_r1c1.txt"), Some(3), None, None).unwrap_err();
        assert_eq!(err.label(), "bad configuration");
    }

    #[test]
    fn test_partial_plane_is_configuration_error() {
        let err: CliError = Plane::from_parts(Some([0.0, 0.0, 0.0]), None)
            .unwrap_err()
            .into();
        assert_eq!(err.label(), "bad configuration");
    }

    #[test]
    fn test_to_triple() {
        assert_eq!(
            to_triple(Some(vec![1.0, 2.0, 3.0])).unwrap(),
            Some([1.0, 2.0, 3.0])
        );
        assert!(to_triple(None).unwrap().is_none());
        assert!(to_triple(Some(vec![1.0])).is_err());
    }
}
