//! Heuristic locator for record arrays embedded in serialized blobs.
//!
//! The blobs carry no framing for the array we want, so its position is
//! inferred from the layout that surrounds it in practice.
//!
//! ## Algorithm Overview
//!
//! 1. Look for a run of at least 21 zero bytes
//! 2. Treat the first non-zero byte after it as the first record, and read
//!    the little-endian record count 53 bytes before that position
//! 3. Accept the start only if the count is within `1..=max_records` and the
//!    first identifier belongs to the [`IdentifierDomain`]
//! 4. Parse 8-byte records until the count is reached, dropping the
//!    candidate at the first unknown identifier
//!
//! Because the first identifier may itself begin with zero bytes, the whole
//! scan is repeated with the array start shifted 0 to 3 bytes to the left.
//! Each shift is an independent [`Pass`].
//!
//! ## Extensibility
//!
//! The [`ArrayStrategy`] trait allows custom locators to reuse the candidate
//! selection step:
//!
//! ```no_run
//! use brickscan_core::scanner::{ArrayStrategy, CandidateArray};
//! use brickscan_core::{IdentifierDomain, Result};
//!
//! struct FixedOffset;
//!
//! impl ArrayStrategy for FixedOffset {
//!     fn scan(&self, data: &[u8], domain: &IdentifierDomain) -> Result<Vec<CandidateArray>> {
//!         // Custom locating logic
//!         Ok(vec![])
//!     }
//! }
//! ```

mod pass;
mod reader;

use crate::domain::IdentifierDomain;
use crate::error::{Error, Result};
use crate::select::select;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

pub use pass::{Pass, ScanState, Transition, LENGTH_FIELD_DISTANCE, SENTINEL_MIN_ZEROS};
pub use reader::{read_record, read_u32_le, Record, FIELD_SIZE, RECORD_SIZE};

/// Default ceiling for the record count read from a length field
pub const DEFAULT_MAX_RECORDS: u32 = 10_000;

/// A complete, domain-valid record array found by one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArray {
    records: Vec<Record>,
    start: usize,
    declared_length: u32,
    alignment: usize,
}

impl CandidateArray {
    /// Creates a new candidate
    pub fn new(records: Vec<Record>, start: usize, declared_length: u32, alignment: usize) -> Self {
        Self {
            records,
            start,
            declared_length,
            alignment,
        }
    }

    /// The records in stream order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the candidate, returning its records
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Records as `(identifier, auxiliary)` pairs
    pub fn pairs(&self) -> Vec<(u32, u32)> {
        self.records.iter().map(Record::as_pair).collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the candidate holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Offset of the first record in the stream
    pub fn start(&self) -> usize {
        self.start
    }

    /// Record count read from the length field
    pub fn declared_length(&self) -> u32 {
        self.declared_length
    }

    /// Alignment offset of the pass that found this candidate
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Byte range covered by the records
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.records.len() * RECORD_SIZE
    }
}

/// The selected candidate of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The winning candidate
    pub candidate: CandidateArray,
    /// How many complete candidates all passes produced
    pub candidates_found: usize,
}

impl Extraction {
    /// The extracted records in stream order
    pub fn records(&self) -> &[Record] {
        self.candidate.records()
    }

    /// Consumes the extraction, returning its records
    pub fn into_records(self) -> Vec<Record> {
        self.candidate.into_records()
    }

    /// Returns true if more than one candidate competed for selection
    pub fn was_ambiguous(&self) -> bool {
        self.candidates_found > 1
    }
}

/// Configuration for the scanner
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Largest record count accepted from a length field
    pub max_records: u32,
    /// Array start shifts to try, one pass each, in this order
    pub alignment_offsets: Vec<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            alignment_offsets: (0..=3).collect(),
        }
    }
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest accepted record count
    pub fn max_records(mut self, max: u32) -> Self {
        self.max_records = max;
        self
    }

    /// Sets the alignment offsets to try
    pub fn alignment_offsets(mut self, offsets: impl IntoIterator<Item = usize>) -> Self {
        self.alignment_offsets = offsets.into_iter().collect();
        self
    }
}

/// Trait for implementing custom array locators
///
/// Implementors only produce candidates; [`ArrayStrategy::extract`] applies
/// the shared selection rule on top.
pub trait ArrayStrategy: Send + Sync {
    /// Scan the provided data for complete candidate arrays
    fn scan(&self, data: &[u8], domain: &IdentifierDomain) -> Result<Vec<CandidateArray>>;

    /// Scan the data and select a single array
    fn extract(&self, data: &[u8], domain: &IdentifierDomain) -> Result<Extraction> {
        select(self.scan(data, domain)?)
    }
}

/// Primary array locator
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    /// Creates a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Creates a new scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run a single pass at the given alignment offset
    pub fn scan_pass(
        &self,
        data: &[u8],
        domain: &IdentifierDomain,
        alignment: usize,
    ) -> Vec<CandidateArray> {
        Pass::new(data, domain, alignment, self.config.max_records).run()
    }
}

impl ArrayStrategy for Scanner {
    fn scan(&self, data: &[u8], domain: &IdentifierDomain) -> Result<Vec<CandidateArray>> {
        debug!(
            "Starting scan of {} bytes against {} identifiers",
            data.len(),
            domain.len()
        );

        let candidates: Vec<_> = self
            .config
            .alignment_offsets
            .iter()
            .flat_map(|&alignment| self.scan_pass(data, domain, alignment))
            .collect();

        debug!("Scan complete: found {} candidates", candidates.len());
        Ok(candidates)
    }
}

/// Extract the record array from a blob with the default configuration
pub fn extract(data: &[u8], domain: &IdentifierDomain) -> Result<Extraction> {
    Scanner::new().extract(data, domain)
}

/// Read a blob from disk and extract its record array
pub fn extract_file(path: impl AsRef<Path>, domain: &IdentifierDomain) -> Result<Extraction> {
    extract_file_with_config(path, domain, ScannerConfig::default())
}

/// Read a blob from disk and extract its record array with custom configuration
pub fn extract_file_with_config(
    path: impl AsRef<Path>,
    domain: &IdentifierDomain,
    config: ScannerConfig,
) -> Result<Extraction> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Scanner::with_config(config).extract(&data, domain)
}
