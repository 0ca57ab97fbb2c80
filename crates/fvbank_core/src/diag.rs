//! Timestamped diagnostic output.

use crate::error::CoreResult;
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};

/// A lifecycle-scoped diagnostic sink.
///
/// Writes each message on its own line, prefixed with the current UTC time.
/// The sink is chosen at construction and flushed when the value is dropped;
/// there is no ambient process-wide global.
///
/// Diagnostics are informational only: they carry no delivery guarantee
/// beyond what the underlying writer provides and are never used for control
/// flow or error signaling.
///
/// # Example
///
/// ```rust
/// use fvbank_core::DiagnosticSink;
///
/// let diag = DiagnosticSink::stderr();
/// diag.log("enrollment batch complete").unwrap();
/// ```
pub struct DiagnosticSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DiagnosticSink {
    /// Creates a sink over an arbitrary writer.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(sink),
        }
    }

    /// Creates a sink over standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Writes `message` prefixed with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer rejects the write.
    pub fn log(&self, message: &str) -> CoreResult<()> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let mut out = self.out.lock();
        writeln!(out, "{timestamp} {message}")?;
        Ok(())
    }
}

impl Drop for DiagnosticSink {
    fn drop(&mut self) {
        let _ = self.out.lock().flush();
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink").finish_non_exhaustive()
    }
}
