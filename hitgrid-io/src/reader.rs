//! Memory-mapped file readers.

use crate::gemc::{EventRecord, GemcParser, Metadata};
use crate::{Error, Result};
use log::debug;
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Option<Mmap>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let path = path.as_ref().to_path_buf();
        // Mapping a zero-length file fails on some platforms.
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None, path });
        }
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::MmapError(format!("{}: {e}", path.display())))?;
        Ok(Self {
            mmap: Some(mmap),
            path,
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Returns the file contents as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The selected slice of a GEMC log.
#[derive(Debug, Clone, Default)]
pub struct GemcLog {
    /// Option metadata from the top of the file.
    pub metadata: Metadata,
    /// `(event number, record)` pairs; numbers are 1-based positions in
    /// the file.
    pub events: Vec<(u64, EventRecord)>,
}

/// A GEMC event-log reader with memory-mapped I/O.
pub struct GemcFileReader {
    reader: MappedFileReader,
    first_event: u64,
    num_events: u64,
}

impl GemcFileReader {
    /// Opens a log that will be read from its first event to its end.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            reader: MappedFileReader::open(path)?,
            first_event: 1,
            num_events: 0,
        })
    }

    /// Sets the 1-based number of the first event to keep. Zero is read as 1.
    #[must_use]
    pub fn with_first_event(mut self, first_event: u64) -> Self {
        self.first_event = first_event.max(1);
        self
    }

    /// Sets how many events to keep; 0 keeps every remaining event.
    #[must_use]
    pub fn with_num_events(mut self, num_events: u64) -> Self {
        self.num_events = num_events;
        self
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Path of the log.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Reads the metadata and the selected events.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for an empty file.
    pub fn read(&self) -> Result<GemcLog> {
        if self.reader.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "{} is empty",
                self.reader.path().display()
            )));
        }

        let text = self.reader.text();
        let mut parser = GemcParser::new(&text);
        let mut events = Vec::new();

        for number in 1.. {
            if number < self.first_event {
                if !parser.skip_event() {
                    break;
                }
                continue;
            }
            let Some(event) = parser.next_event() else {
                break;
            };
            events.push((number, event));
            if self.num_events != 0 && events.len() as u64 >= self.num_events {
                break;
            }
        }

        debug!(
            "read {} events from {} (first event {})",
            events.len(),
            self.reader.path().display(),
            self.first_event
        );
        Ok(GemcLog {
            metadata: parser.into_metadata(),
            events,
        })
    }

    /// Counts the complete events in the log, ignoring the selection.
    #[must_use]
    pub fn count_events(&self) -> u64 {
        let text = self.reader.text();
        let mut parser = GemcParser::new(&text);
        let mut count = 0;
        while parser.skip_event() {
            count += 1;
        }
        count
    }
}
