//! The flat template record format and its scan engine.
//!
//! A template packages one biometric feature vector together with its
//! provenance metadata in a single self-describing binary record.
//!
//! ## Record Format
//!
//! ```text
//! | image_id (16) | algorithm_id (4) | x (4) | y (4) | width (4) | height (4)
//! | label (4) | url_size (4) | fv_size (4) | url (url_size) | fv (fv_size) |
//! ```
//!
//! Integers are little-endian. The URL segment, when present, is a
//! null-terminated string with the terminator counted inside `url_size`.
//! The feature vector is opaque bytes whose interpretation is keyed by
//! `algorithm_id`.
//!
//! A stream is a boundary-aligned concatenation of zero or more records
//! with no outer framing: no magic number, no record count, no trailer.
//! End of valid data is simply end of stream, and each record's size fields
//! are the sole mechanism by which the next record's offset is located.
//!
//! ## Scan Policy
//!
//! Because there is no outer framing, size fields are untrusted input.
//! Decoding checks every declared size against the bytes actually available
//! before touching them, and a mismatch is always a fatal
//! [`Corruption`](crate::CoreError::Corruption): a malformed record is never
//! skipped, clamped, or partially decoded. Silently dropping or miscounting
//! enrolled templates would be a correctness failure for the matching
//! system consuming them.
//!
//! ## Invariants
//!
//! - `total_size == HEADER_SIZE + url_size + fv_size` for every valid record
//! - Sequential scans deliver records in file order, exactly once each
//! - Parallel scans deliver exactly once with no ordering guarantee, and
//!   indexing fully precedes any dispatch

mod builder;
mod iterator;
mod record;
mod scanner;
mod writer;

pub use builder::TemplateBuilder;
pub use iterator::{scan_buffer, TemplateIter};
pub use record::{Template, TemplateView, HEADER_SIZE};
pub use writer::TemplateFile;
