//! One left-to-right pass of the array locator at a fixed alignment offset.
//!
//! The pass is a two-state machine. While seeking, it counts zero bytes; the
//! first non-zero byte after a long enough run is tested as the start of an
//! array (length field 53 bytes earlier, first identifier in the domain).
//! While parsing, every completed 8-byte record is validated and the first
//! unknown identifier drops the candidate and returns to seeking. Bytes
//! consumed by a dropped candidate are never revisited.

use super::reader::{read_record, read_u32_le, Record, RECORD_SIZE};
use super::CandidateArray;
use crate::domain::IdentifierDomain;
use crate::error::Result;
use tracing::{debug, trace};

/// Minimum number of consecutive zero bytes that may precede an array
pub const SENTINEL_MIN_ZEROS: usize = 21;

/// Distance from the length field to the first record of the array
pub const LENGTH_FIELD_DISTANCE: usize = 53;

/// Where a pass currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Counting zero bytes, waiting for a plausible array start
    SeekingSentinel {
        /// Consecutive zero bytes seen so far
        zero_run: usize,
    },
    /// Reading records of a candidate array
    ParsingArray {
        /// Offset of the first record
        start: usize,
        /// Record count announced by the length field
        length: u32,
        /// Records validated so far
        records: Vec<Record>,
    },
}

impl ScanState {
    fn seeking() -> Self {
        Self::SeekingSentinel { zero_run: 0 }
    }
}

/// Outcome of feeding one byte to a [`Pass`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed state
    Stay,
    /// A sentinel matched and a candidate array was opened
    Entered {
        /// Offset of the first record
        start: usize,
        /// Announced record count
        length: u32,
    },
    /// A record was validated and appended to the open candidate
    Appended(Record),
    /// The open candidate reached its announced length
    Completed(CandidateArray),
    /// The open candidate hit an identifier outside the domain and was dropped
    Rejected {
        /// Offset of the dropped candidate's first record
        start: usize,
        /// Offset of the offending record
        offset: usize,
        /// The unknown identifier
        identifier: u32,
        /// Records that had been validated before the failure
        parsed: usize,
    },
    /// The open candidate was dropped because its next record could not be read
    Truncated {
        /// Offset of the dropped candidate's first record
        start: usize,
        /// Offset of the unreadable record
        offset: usize,
    },
}

/// A single scan over the stream with a fixed alignment offset
#[derive(Debug)]
pub struct Pass<'a> {
    data: &'a [u8],
    domain: &'a IdentifierDomain,
    alignment: usize,
    max_records: u32,
    state: ScanState,
}

impl<'a> Pass<'a> {
    /// Creates a pass in the seeking state
    pub fn new(
        data: &'a [u8],
        domain: &'a IdentifierDomain,
        alignment: usize,
        max_records: u32,
    ) -> Self {
        Self {
            data,
            domain,
            alignment,
            max_records,
            state: ScanState::seeking(),
        }
    }

    /// Current state of the machine
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Feed the byte found at `position`
    pub fn step(&mut self, position: usize, byte: u8) -> Transition {
        match self.state {
            ScanState::SeekingSentinel { ref mut zero_run } => {
                if byte == 0 {
                    *zero_run += 1;
                    return Transition::Stay;
                }
                let run = std::mem::take(zero_run);
                self.probe(position, run)
            }
            ScanState::ParsingArray { .. } => self.parse(position),
        }
    }

    /// Run the pass to the end of the stream and collect complete candidates
    pub fn run(mut self) -> Vec<CandidateArray> {
        let data = self.data;
        let mut found = Vec::new();

        for (position, &byte) in data.iter().enumerate() {
            if let Transition::Completed(candidate) = self.step(position, byte) {
                found.push(candidate);
            }
        }

        if let ScanState::ParsingArray {
            start,
            length,
            records,
        } = &self.state
        {
            trace!(
                "Candidate at {:#x} truncated by end of stream after {}/{} records",
                start,
                records.len(),
                length
            );
        }

        found
    }

    /// Test whether the non-zero byte at `position` opens an array
    fn probe(&mut self, position: usize, zero_run: usize) -> Transition {
        if zero_run < SENTINEL_MIN_ZEROS {
            return Transition::Stay;
        }

        let Some(start) = position
            .checked_sub(self.alignment)
            .filter(|&start| start >= LENGTH_FIELD_DISTANCE)
        else {
            return Transition::Stay;
        };

        match self.check_sentinel(start) {
            Ok(Some(length)) => {
                debug!(
                    "Found potential array of {} records at {:#x} (alignment {})",
                    length, start, self.alignment
                );
                let capacity = (length as usize).min((self.data.len() - start) / RECORD_SIZE);
                self.state = ScanState::ParsingArray {
                    start,
                    length,
                    records: Vec::with_capacity(capacity),
                };
                Transition::Entered { start, length }
            }
            Ok(None) => Transition::Stay,
            Err(e) => {
                trace!("Abandoning sentinel at {:#x}: {}", start, e);
                Transition::Stay
            }
        }
    }

    /// Returns the announced length when the array start at `start` is plausible
    fn check_sentinel(&self, start: usize) -> Result<Option<u32>> {
        let length = read_u32_le(self.data, start - LENGTH_FIELD_DISTANCE)?;
        if length == 0 || length > self.max_records {
            trace!(
                "Length field {} before {:#x} outside 1..={}",
                length,
                start,
                self.max_records
            );
            return Ok(None);
        }

        let first = read_u32_le(self.data, start)?;
        if !self.domain.contains(first) {
            trace!("Leading identifier {} at {:#x} is unknown", first, start);
            return Ok(None);
        }

        Ok(Some(length))
    }

    /// Validate the record that ends at `position`, if one does
    fn parse(&mut self, position: usize) -> Transition {
        let ScanState::ParsingArray {
            start,
            length,
            ref mut records,
        } = self.state
        else {
            return Transition::Stay;
        };

        if (position - start) % RECORD_SIZE != RECORD_SIZE - 1 {
            return Transition::Stay;
        }

        let offset = position + 1 - RECORD_SIZE;
        let record = match read_record(self.data, offset) {
            Ok(record) => record,
            Err(e) => {
                trace!("Record read at {:#x} failed: {}", offset, e);
                self.state = ScanState::seeking();
                return Transition::Truncated { start, offset };
            }
        };

        if !self.domain.contains(record.identifier) {
            debug!(
                "Identifier {} at {:#x} is unknown, aborting candidate at {:#x} after {} records",
                record.identifier,
                offset,
                start,
                records.len()
            );
            let parsed = records.len();
            self.state = ScanState::seeking();
            return Transition::Rejected {
                start,
                offset,
                identifier: record.identifier,
                parsed,
            };
        }

        trace!(" | {} {}", record.identifier, record.auxiliary);
        records.push(record);

        if records.len() == length as usize {
            let records = std::mem::take(records);
            self.state = ScanState::seeking();
            debug!(
                "Completed candidate of {} records at {:#x}",
                records.len(),
                start
            );
            return Transition::Completed(CandidateArray::new(
                records,
                start,
                length,
                self.alignment,
            ));
        }

        Transition::Appended(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Length field, 28 filler bytes, 21 zero bytes, then the records
    fn segment(length: u32, records: &[(u32, u32)]) -> Vec<u8> {
        let mut data = length.to_le_bytes().to_vec();
        data.extend([0xAB; 28]);
        data.extend([0x00; SENTINEL_MIN_ZEROS]);
        for &(identifier, auxiliary) in records {
            data.extend(identifier.to_le_bytes());
            data.extend(auxiliary.to_le_bytes());
        }
        data
    }

    fn feed(pass: &mut Pass<'_>, data: &[u8]) -> Vec<Transition> {
        data.iter()
            .enumerate()
            .map(|(position, &byte)| pass.step(position, byte))
            .filter(|t| *t != Transition::Stay)
            .collect()
    }

    #[test]
    fn test_transitions_for_complete_array() {
        let data = segment(2, &[(5, 3), (7, 0)]);
        let domain: IdentifierDomain = [5, 7].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);

        let transitions = feed(&mut pass, &data);
        assert_eq!(
            transitions,
            vec![
                Transition::Entered {
                    start: 53,
                    length: 2
                },
                Transition::Appended(Record::new(5, 3)),
                Transition::Completed(CandidateArray::new(
                    vec![Record::new(5, 3), Record::new(7, 0)],
                    53,
                    2,
                    0
                )),
            ]
        );
        assert_eq!(pass.state(), &ScanState::SeekingSentinel { zero_run: 0 });
    }

    #[test]
    fn test_unknown_identifier_rejects_candidate() {
        let data = segment(2, &[(5, 3), (7, 0)]);
        let domain: IdentifierDomain = [5].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);

        let transitions = feed(&mut pass, &data);
        assert_eq!(
            transitions.last(),
            Some(&Transition::Rejected {
                start: 53,
                offset: 61,
                identifier: 7,
                parsed: 1
            })
        );
        assert!(matches!(pass.state(), ScanState::SeekingSentinel { .. }));
    }

    #[test]
    fn test_rejected_bytes_never_count_as_sentinel() {
        // Second record is all zeros and gets rejected; with the 13 zeros
        // after it, a rescan of those bytes would see a 21-byte run
        // before the trailing id 5, whose length field (offset 29) reads 1.
        let mut data = segment(2, &[(5, 1), (0, 0)]);
        data[29..32].copy_from_slice(&[0x01, 0x00, 0x00]);
        data.extend([0x00; 13]);
        data.extend(5u32.to_le_bytes());
        data.extend(9u32.to_le_bytes());
        let domain: IdentifierDomain = [5].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);

        let transitions = feed(&mut pass, &data[..69]);
        assert_eq!(
            transitions,
            vec![
                Transition::Entered {
                    start: 53,
                    length: 2
                },
                Transition::Appended(Record::new(5, 1)),
                Transition::Rejected {
                    start: 53,
                    offset: 61,
                    identifier: 0,
                    parsed: 1
                },
            ]
        );
        assert_eq!(pass.state(), &ScanState::SeekingSentinel { zero_run: 0 });

        let rest: Vec<Transition> = data
            .iter()
            .enumerate()
            .skip(69)
            .map(|(position, &byte)| pass.step(position, byte))
            .filter(|t| *t != Transition::Stay)
            .collect();
        assert!(rest.is_empty());
        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());
    }

    #[test]
    fn test_unreadable_record_truncates_candidate() {
        let data = segment(2, &[(5, 3)]);
        let domain: IdentifierDomain = [5].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);
        feed(&mut pass, &data);

        // The next record would end at 68, past the 61-byte stream
        assert_eq!(
            pass.step(68, 0x00),
            Transition::Truncated {
                start: 53,
                offset: 61
            }
        );
        assert_eq!(pass.state(), &ScanState::SeekingSentinel { zero_run: 0 });
    }

    #[test]
    fn test_short_zero_run_is_ignored() {
        let mut data = segment(1, &[(5, 3)]);
        // Break the run so only 20 zeros precede the first record
        data[32] = 0xCD;
        let domain: IdentifierDomain = [5].into_iter().collect();

        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());
    }

    #[test]
    fn test_length_ceiling() {
        let data = segment(20_000, &[(5, 3)]);
        let domain: IdentifierDomain = [5].into_iter().collect();

        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());
        assert_eq!(Pass::new(&data, &domain, 0, 20_000).run().len(), 0);
    }

    #[test]
    fn test_zero_length_rejected() {
        let data = segment(0, &[(5, 3)]);
        let domain: IdentifierDomain = [5].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);

        assert!(feed(&mut pass, &data).is_empty());
    }

    #[test]
    fn test_sentinel_too_close_to_stream_start() {
        // 21 zeros then a known identifier, but no room for a length field
        let mut data = vec![0u8; 30];
        data.extend(5u32.to_le_bytes());
        data.extend(1u32.to_le_bytes());
        let domain: IdentifierDomain = [5].into_iter().collect();

        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());
    }

    #[test]
    fn test_identifier_past_end_abandons_sentinel() {
        // First record cut short: only two bytes after the zero run
        let mut data = segment(1, &[]);
        data.extend([0x05, 0x00]);
        let domain: IdentifierDomain = [5].into_iter().collect();
        let mut pass = Pass::new(&data, &domain, 0, 10_000);

        assert!(feed(&mut pass, &data).is_empty());
        assert!(matches!(pass.state(), ScanState::SeekingSentinel { .. }));
    }

    #[test]
    fn test_truncated_candidate_is_discarded() {
        let mut data = segment(3, &[(5, 3), (5, 4)]);
        data.extend([0x05, 0x00, 0x00]);
        let domain: IdentifierDomain = [5].into_iter().collect();

        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());
    }

    #[test]
    fn test_alignment_shifts_array_start() {
        // Identifier 0x0500 encodes as 00 05 00 00, extending the zero run by one
        let data = segment(1, &[(0x0500, 9)]);
        let domain: IdentifierDomain = [0x0500].into_iter().collect();

        assert!(Pass::new(&data, &domain, 0, 10_000).run().is_empty());

        let found = Pass::new(&data, &domain, 1, 10_000).run();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start(), 53);
        assert_eq!(found[0].alignment(), 1);
        assert_eq!(found[0].records(), &[Record::new(0x0500, 9)]);
    }
}
