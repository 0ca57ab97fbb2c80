//! # fvbank Core
//!
//! Flat biometric template records: a self-describing, variable-length
//! binary format packaging a feature vector with provenance metadata, plus
//! the machinery to build records, append them to a stream, and scan
//! sequences of them - from a buffer or a file, sequentially or with
//! worker-parallel dispatch.
//!
//! This crate provides:
//! - [`Template`] / [`TemplateView`] - owned records and zero-copy views
//! - [`TemplateBuilder`] - validated record construction
//! - [`TemplateFile`] - append and scan over a storage backend
//! - [`TemplateIter`] / [`scan_buffer`] - lazy iteration over a buffer
//! - [`DiagnosticSink`] - lifecycle-scoped timestamped diagnostics
//!
//! ## Example
//!
//! ```rust
//! use fvbank_core::{ImageId, Roi, TemplateBuilder, TemplateFile};
//! use fvbank_storage::InMemoryBackend;
//!
//! let template = TemplateBuilder::new(ImageId::ZERO, 1)
//!     .roi(Roi::new(0, 0, 100, 100))
//!     .label(7)
//!     .url("foo.jpg")
//!     .feature_vector(&[0x01, 0x02, 0x03])
//!     .build()
//!     .unwrap();
//!
//! let file = TemplateFile::new(Box::new(InMemoryBackend::new()), false);
//! file.append(&template).unwrap();
//!
//! let count = file
//!     .scan(|_offset, view| {
//!         assert_eq!(view.url(), Some("foo.jpg"));
//!         assert_eq!(view.feature_vector(), &[0x01, 0x02, 0x03]);
//!     })
//!     .unwrap();
//! assert_eq!(count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod diag;
mod error;
pub mod template;
mod types;

pub use config::ScanOptions;
pub use diag::DiagnosticSink;
pub use error::{CoreError, CoreResult};
pub use template::{
    scan_buffer, Template, TemplateBuilder, TemplateFile, TemplateIter, TemplateView, HEADER_SIZE,
};
pub use types::{ImageId, Roi};
