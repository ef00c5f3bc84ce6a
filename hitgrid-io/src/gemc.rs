//! GEMC text event-log parsing.
//!
//! A log starts with two preamble lines and a block of option lines
//! (`... > ... key value`), optionally followed by an embedded JSON
//! description of the detector. Events follow, each a sequence of banks
//! closed by an end-of-event marker.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Lines;

/// Option metadata of a log, keyed by option name.
pub type Metadata = BTreeMap<String, String>;

const HEADER_BANK: &str = " --- Header Bank --";
const USER_HEADER_BANK: &str = " --- User Header Bank --";
const TRUE_INFO_BANK: &str = "   -- integrated true infos bank  (51, 0) --";
const DIGITIZED_BANK: &str = "   -- integrated digitized bank  (52, 0) --";
const GENERATED_BANK: &str = " --- Generated Particles Bank --";
const END_OF_EVENT: &str = " ---- End of Event  ----";

const PREAMBLE_LINES: usize = 2;
const OPTION_FIELDS: usize = 7;

/// Banks of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Header,
    UserHeader,
    TrueInfo,
    Digitized,
    Generated,
}

impl Bank {
    /// Bank introduced by a title line, if any.
    #[must_use]
    pub fn from_title(line: &str) -> Option<Self> {
        match line {
            HEADER_BANK => Some(Bank::Header),
            USER_HEADER_BANK => Some(Bank::UserHeader),
            TRUE_INFO_BANK => Some(Bank::TrueInfo),
            DIGITIZED_BANK => Some(Bank::Digitized),
            GENERATED_BANK => Some(Bank::Generated),
            _ => None,
        }
    }
}

/// Raw contents of one event, still as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub header: BTreeMap<String, String>,
    pub user_header: BTreeMap<String, String>,
    /// Integrated true-info columns (bank 51).
    pub true_info: BTreeMap<String, Vec<String>>,
    /// Integrated digitized columns (bank 52).
    pub digitized: BTreeMap<String, Vec<String>>,
    /// Generated particles, in log order.
    pub generated: Vec<BTreeMap<String, String>>,
}

impl EventRecord {
    /// Column `name` of the true-info bank.
    #[must_use]
    pub fn true_info_column(&self, name: &str) -> Option<&[String]> {
        self.true_info.get(name).map(Vec::as_slice)
    }

    /// Column `name` of the digitized bank.
    #[must_use]
    pub fn digitized_column(&self, name: &str) -> Option<&[String]> {
        self.digitized.get(name).map(Vec::as_slice)
    }

    /// Particle id of the first generated particle.
    #[must_use]
    pub fn generated_pid(&self) -> Option<i32> {
        self.generated
            .first()
            .and_then(|particle| particle.get("pid"))
            .and_then(|pid| pid.parse().ok())
    }

    fn add_line(&mut self, bank: Bank, line: &str) {
        if bank == Bank::Generated {
            self.add_generated(line);
            return;
        }
        // Lines without a tab are bank titles or decoration.
        let Some((name, rest)) = line.split_once('\t') else {
            return;
        };
        let key = field_name(name);
        match bank {
            Bank::Header => {
                self.header.insert(key, first_value(rest));
            }
            Bank::UserHeader => {
                self.user_header.insert(key, first_value(rest));
            }
            Bank::TrueInfo => {
                self.true_info.insert(key, column_values(rest));
            }
            Bank::Digitized => {
                self.digitized.insert(key, column_values(rest));
            }
            Bank::Generated => {}
        }
    }

    fn add_generated(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.get(1) == Some(&"Particle") || self.generated.is_empty() {
            if tokens.is_empty() {
                return;
            }
            self.generated.push(BTreeMap::new());
        }
        let Some(particle) = self.generated.last_mut() else {
            return;
        };
        for pair in tokens.windows(2) {
            if let Some(key) = pair[0].strip_suffix(':') {
                if !key.is_empty() && !pair[1].ends_with(':') {
                    particle.insert(key.to_string(), pair[1].to_string());
                }
            }
        }
    }
}

/// `"    avg_x:"` -> `"avg_x"`.
fn field_name(name: &str) -> String {
    let last = name.split(' ').next_back().unwrap_or(name);
    last.strip_suffix(':').unwrap_or(last).to_string()
}

fn first_value(rest: &str) -> String {
    rest.split('\t').next().unwrap_or("").trim().to_string()
}

fn column_values(rest: &str) -> Vec<String> {
    rest.split('\t')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Streaming parser over the text of a log.
pub struct GemcParser<'a> {
    lines: Peekable<Lines<'a>>,
    metadata: Metadata,
}

impl<'a> GemcParser<'a> {
    /// Parses the preamble and option block, leaving the parser at the
    /// first event.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let mut lines = text.lines().peekable();
        for _ in 0..PREAMBLE_LINES {
            lines.next();
        }
        let metadata = read_metadata(&mut lines);
        Self { lines, metadata }
    }

    /// Option metadata of the log.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Consumes the parser, returning the metadata.
    #[must_use]
    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }

    /// Reads the next complete event.
    ///
    /// Returns `None` at end of input; an event cut off by end of input is
    /// discarded.
    pub fn next_event(&mut self) -> Option<EventRecord> {
        let mut event = EventRecord::default();
        let mut bank = None;
        let mut seen_any = false;

        for raw in self.lines.by_ref() {
            let line = raw.trim_end();
            if line == END_OF_EVENT {
                return Some(event);
            }
            if line.is_empty() {
                continue;
            }
            seen_any = true;
            if let Some(next) = Bank::from_title(line) {
                bank = Some(next);
                continue;
            }
            if let Some(current) = bank {
                event.add_line(current, line);
            }
        }

        if seen_any {
            log::warn!("log ends inside an event; discarding the partial event");
        }
        None
    }

    /// Skips one event without keeping its contents.
    ///
    /// Returns false if no complete event remained.
    pub fn skip_event(&mut self) -> bool {
        self.lines.by_ref().any(|line| line.trim_end() == END_OF_EVENT)
    }
}

impl Iterator for GemcParser<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

fn is_option_line(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b'>')
}

fn read_metadata(lines: &mut Peekable<Lines<'_>>) -> Metadata {
    let mut metadata = Metadata::new();
    let mut embedded_json = false;

    while let Some(&line) = lines.peek() {
        if line.len() < 4 {
            embedded_json = true;
            lines.next();
            break;
        }
        if !is_option_line(line) {
            break;
        }
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() == OPTION_FIELDS {
            metadata.insert(fields[5].to_string(), fields[6].trim_end().to_string());
        }
        lines.next();
    }

    if embedded_json {
        // The detector description runs until the first bank title.
        while let Some(&line) = lines.peek() {
            if line.len() >= 4 && line.as_bytes().get(1) == Some(&b'-') {
                break;
            }
            lines.next();
        }
    }
    metadata
}

/// Parses a column value, naming the column and row on failure.
pub(crate) fn parse_value<T: std::str::FromStr>(
    column: &str,
    index: usize,
    raw: &str,
) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::InvalidFormat(format!("column '{column}' row {index}: cannot parse '{raw}'")))
}
