//! JSON export of assembled events.

use crate::gemc::Metadata;
use crate::{Error, Result};
use hitgrid_algorithms::AssembledEvent;
use hitgrid_core::ClassifiedEvent;
use log::{info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Prefix of every output file name.
pub const OUTPUT_PREFIX: &str = "out_";

const METADATA_KEY: &str = "gemc metadata";

/// What to export and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Binned events, pretty printed to stdout.
    Stdout,
    /// Binned events, to a file.
    #[default]
    Events,
    /// Binned events and their classified hits, to a file.
    EventsWithHits,
    /// As `EventsWithHits`, plus the log's option metadata.
    EventsWithMetadata,
}

impl ExportMode {
    /// Whether this mode writes a file rather than stdout.
    #[must_use]
    pub fn writes_file(self) -> bool {
        self != ExportMode::Stdout
    }

    fn includes_hits(self) -> bool {
        matches!(
            self,
            ExportMode::EventsWithHits | ExportMode::EventsWithMetadata
        )
    }
}

/// Rows and columns encoded as the last two integers of a file stem,
/// e.g. `bcal_20210311_r11c9.txt` -> `(11, 9)`.
#[must_use]
pub fn decode_rows_cols(path: &Path) -> Option<(u32, u32)> {
    let name = path.file_stem()?.to_string_lossy();
    let runs: Vec<&str> = name
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();
    match runs.as_slice() {
        [.., rows, cols] => Some((rows.parse().ok()?, cols.parse().ok()?)),
        _ => None,
    }
}

/// Output file name for events `first..=last` read from `input`.
///
/// The input's extension and its last `_`-separated segment are dropped:
/// `run_2021_r11c11.txt` -> `out_run_2021_1-5.json`. A stem without `_`
/// is kept whole.
#[must_use]
pub fn output_file_name(input: &Path, first: u64, last: u64) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = stem.rsplit_once('_').map_or(stem.as_str(), |(head, _)| head);
    format!("{OUTPUT_PREFIX}{base}_{first}-{last}.json")
}

/// Writes assembled events as JSON.
#[derive(Debug, Clone)]
pub struct EventWriter {
    mode: ExportMode,
    output_dir: PathBuf,
}

impl EventWriter {
    /// Create a writer placing files in `output_dir`.
    #[must_use]
    pub fn new(mode: ExportMode, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            output_dir: output_dir.into(),
        }
    }

    /// Export mode in use.
    #[must_use]
    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Builds the JSON document for `events`.
    ///
    /// `classified` supplies the hits for modes that include them, matched
    /// to events by event number.
    ///
    /// # Errors
    /// Returns an error if a value cannot be represented as JSON.
    pub fn document(
        &self,
        events: &[AssembledEvent],
        classified: &[ClassifiedEvent],
        metadata: &Metadata,
    ) -> Result<Value> {
        let mut root = Map::new();
        if self.mode == ExportMode::EventsWithMetadata {
            root.insert(METADATA_KEY.to_string(), serde_json::to_value(metadata)?);
        }

        for event in events {
            let mut value = serde_json::to_value(event)?;
            if self.mode.includes_hits() {
                let hits = classified
                    .iter()
                    .find(|c| c.number == event.number)
                    .map(serde_json::to_value)
                    .transpose()?;
                if let (Value::Object(target), Some(Value::Object(hits))) = (&mut value, hits) {
                    target.extend(hits);
                }
            }
            root.insert(event.key(), value);
        }
        Ok(Value::Object(root))
    }

    /// Export `events` read from `input`.
    ///
    /// Returns the path written, or `None` for stdout or when there were no
    /// events to write.
    ///
    /// # Errors
    /// Returns an error if the output directory or file cannot be written.
    pub fn write(
        &self,
        input: &Path,
        events: &[AssembledEvent],
        classified: &[ClassifiedEvent],
        metadata: &Metadata,
    ) -> Result<Option<PathBuf>> {
        let document = self.document(events, classified, metadata)?;

        if !self.mode.writes_file() {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_pretty(&mut lock, &document)?;
            writeln!(lock)?;
            return Ok(None);
        }

        let (Some(first), Some(last)) = (
            events.iter().map(|e| e.number).min(),
            events.iter().map(|e| e.number).max(),
        ) else {
            warn!("no events to export from {}", input.display());
            return Ok(None);
        };

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(output_file_name(input, first, last));
        let mut writer = BufWriter::new(File::create(&path)?);
        write_pretty(&mut writer, &document)?;
        writer.flush()?;
        info!("wrote {} events to {}", events.len(), path.display());
        Ok(Some(path))
    }
}

/// Pretty JSON with four-space indentation. Object keys come out sorted.
pub fn write_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer).map_err(Error::Json)
}
