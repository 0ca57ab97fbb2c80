//! Template file management: append and sequential scanning.

use crate::config::ScanOptions;
use crate::error::{CoreError, CoreResult};
use crate::template::record::{self, Template, TemplateView, HEADER_SIZE};
use crate::template::scanner;
use fvbank_storage::{FileBackend, StorageBackend};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A stream of concatenated template records over a storage backend.
///
/// Records are appended with no framing: no count, no index, no trailer.
/// Record boundaries are re-derived on scan purely from each record's own
/// header fields, in file order.
///
/// The backend is locked for the duration of each operation, scans
/// included; calling back into the same `TemplateFile` from inside a scan
/// callback deadlocks.
pub struct TemplateFile {
    /// Storage backend holding the record stream.
    backend: Arc<Mutex<Box<dyn StorageBackend>>>,
    /// Whether to flush after each append.
    sync_on_write: bool,
}

impl TemplateFile {
    /// Creates a template file over an arbitrary backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_write: bool) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            sync_on_write,
        }
    }

    /// Opens or creates a template file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let backend = FileBackend::open(path)?;
        Ok(Self::new(Box::new(backend), false))
    }

    /// Appends a record's full byte image to the stream.
    ///
    /// Returns the offset the record starts at. Durability beyond what the
    /// backend guarantees is the caller's responsibility; no retry is
    /// performed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn append(&self, template: &Template) -> CoreResult<u64> {
        let mut backend = self.backend.lock();
        let offset = backend.append(template.as_bytes())?;

        if self.sync_on_write {
            backend.flush()?;
        }

        Ok(offset)
    }

    /// Flushes pending writes to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.backend.lock().flush()?;
        Ok(())
    }

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend.lock().sync()?;
        Ok(())
    }

    /// Returns the current stream size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Sequentially scans the stream, invoking `callback` once per record in
    /// file order. Returns the number of records visited.
    ///
    /// Streams one record at a time, so memory use is bounded by the largest
    /// record rather than the file size.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] as soon as a record's declared size
    /// disagrees with the bytes remaining in the file; the callback is not
    /// invoked for that record. Backend read failures surface as
    /// [`CoreError::Storage`].
    pub fn scan<F>(&self, mut callback: F) -> CoreResult<u64>
    where
        F: FnMut(u64, TemplateView<'_>),
    {
        let backend = self.backend.lock();
        let size = backend.size()?;
        debug!(size, "sequential template scan");

        let mut offset = 0u64;
        let mut count = 0u64;

        while offset < size {
            let remaining = size - offset;
            if remaining < HEADER_SIZE as u64 {
                return Err(CoreError::corruption(
                    offset,
                    format!("truncated header: {remaining} bytes remain, {HEADER_SIZE} required"),
                ));
            }

            let header = backend.read_at(offset, HEADER_SIZE)?;
            let total = HEADER_SIZE as u64 + record::declared_payload_len(&header);
            if total > remaining {
                return Err(CoreError::corruption(
                    offset,
                    format!("record of {total} bytes overruns end of file: {remaining} bytes remain"),
                ));
            }

            let bytes = backend.read_at(offset, total as usize)?;
            callback(offset, TemplateView::from_trusted(&bytes));

            offset += total;
            count += 1;
        }

        debug!(count, "sequential template scan complete");
        Ok(count)
    }

    /// Scans the stream with parallel callback dispatch.
    ///
    /// Runs in two non-overlapping phases: a sequential indexing pass that
    /// locates every record boundary (and aborts the whole operation on any
    /// corruption, before a single callback runs), then dispatch of one
    /// callback invocation per record from a bounded worker pool. Every
    /// record is delivered exactly once; invocation order is unconstrained.
    ///
    /// The engine performs no locking around state the callback captures;
    /// synchronizing shared mutable state across workers is the caller's
    /// responsibility.
    ///
    /// The whole file image is held in memory for the duration so workers
    /// can share one immutable buffer; for memory-bounded scanning use
    /// [`scan`](Self::scan).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if the indexing pass finds a
    /// malformed record, or [`CoreError::Storage`] if the file cannot be
    /// read.
    pub fn scan_parallel<F>(&self, options: &ScanOptions, callback: F) -> CoreResult<u64>
    where
        F: Fn(u64, TemplateView<'_>) + Sync,
    {
        let backend = self.backend.lock();
        scanner::scan_backend_parallel(&**backend, options, callback)
    }

    /// Reads every record into an owned copy.
    ///
    /// Convenient for small files and tests; prefer [`scan`](Self::scan)
    /// when the stream may be large.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`scan`](Self::scan).
    pub fn read_all(&self) -> CoreResult<Vec<(u64, Template)>> {
        let mut records = Vec::new();
        self.scan(|offset, view| records.push((offset, view.to_template())))?;
        Ok(records)
    }
}

impl std::fmt::Debug for TemplateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFile")
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}
