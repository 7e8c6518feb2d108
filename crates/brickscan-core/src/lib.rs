//! # brickscan-core
//!
//! A library for locating record arrays embedded at unknown offsets inside
//! undocumented serialized blobs, such as the part/color list of a
//! brick-graph `.uexp` export.
//!
//! This crate provides the core functionality for:
//! - Describing the set of acceptable identifiers (with aliases)
//! - Scanning a blob for zero-padded, length-prefixed record arrays
//! - Picking one array when several candidates are found
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`domain`]: The identifier domain used to validate records
//! - [`scanner`]: Byte-level scanning state machine and extraction
//! - [`select`]: Candidate selection
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use brickscan_core::{ArrayStrategy, IdentifierDomain, Scanner};
//! use std::fs;
//!
//! // Identifiers are normally loaded from part descriptors
//! let domain = IdentifierDomain::builder()
//!     .primary(3001)
//!     .primary(3020)
//!     .alias(3003, 3001)
//!     .build();
//!
//! let data = fs::read("./GreenMachine_VC000.uexp")?;
//! let extraction = Scanner::new().extract(&data, &domain)?;
//!
//! for record in extraction.records() {
//!     println!("{} {}", record.identifier, record.auxiliary);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod domain;
pub mod error;
pub mod scanner;
pub mod select;

// Re-export primary types for convenience
pub use domain::{DomainBuilder, IdentifierDomain};
pub use error::{Error, Result};
pub use scanner::{
    extract, extract_file, extract_file_with_config, ArrayStrategy, CandidateArray, Extraction,
    Record, Scanner, ScannerConfig,
};
pub use select::select;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
