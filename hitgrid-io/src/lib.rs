//! hitgrid-io: GEMC event-log input and JSON output for hitgrid.
//!
//! This crate reads GEMC text logs through memory-mapped files via
//! memmap2, classifies their hits into the sets the binning engine
//! consumes, and exports assembled events as JSON.
//!

mod classify;
mod error;
pub mod gemc;
mod reader;
mod writer;

pub use classify::{ClassifierConfig, HitClassifier};
pub use error::{Error, Result};
pub use gemc::{EventRecord, GemcParser, Metadata};
pub use reader::{GemcFileReader, GemcLog, MappedFileReader};
pub use writer::{
    decode_rows_cols, output_file_name, write_pretty, EventWriter, ExportMode, OUTPUT_PREFIX,
};
