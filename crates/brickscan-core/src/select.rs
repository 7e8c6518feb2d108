//! Choosing one array among the candidates produced by every pass.

use crate::error::{Error, Result};
use crate::scanner::{CandidateArray, Extraction};
use tracing::{debug, warn};

/// Pick the candidate with the most records.
///
/// Candidates are expected in discovery order (pass by pass, left to right
/// within a pass). On equal lengths the earliest one wins. An empty list
/// yields [`Error::NoCandidateFound`].
pub fn select(candidates: Vec<CandidateArray>) -> Result<Extraction> {
    let candidates_found = candidates.len();
    if candidates_found > 1 {
        warn!(
            "Found {} record array candidates, returning the biggest",
            candidates_found
        );
    }

    let mut best: Option<CandidateArray> = None;
    for candidate in candidates {
        let longer = best
            .as_ref()
            .map_or(true, |current| candidate.len() > current.len());
        if longer {
            best = Some(candidate);
        } else {
            debug!(
                "Dropping candidate of {} records at {:#x}",
                candidate.len(),
                candidate.start()
            );
        }
    }

    let candidate = best.ok_or(Error::NoCandidateFound)?;
    Ok(Extraction {
        candidate,
        candidates_found,
    })
}
