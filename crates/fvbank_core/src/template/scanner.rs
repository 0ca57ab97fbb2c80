//! Two-phase parallel scan engine.
//!
//! Record boundaries are data-dependent: each record's size lives in its own
//! header, so offsets cannot be known without a sequential pass. The engine
//! therefore indexes the whole stream sequentially first, and only when that
//! pass has fully succeeded hands the discovered records to a bounded worker
//! pool. The two phases never overlap, and a corrupt stream is rejected
//! before a single callback runs.

use crate::config::ScanOptions;
use crate::error::CoreResult;
use crate::template::iterator::TemplateIter;
use crate::template::record::TemplateView;
use fvbank_storage::StorageBackend;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, warn};

/// Scans every record in `backend` with parallel callback dispatch.
///
/// Phase 1 loads the full stream image and indexes record boundaries with
/// the sequential decoder, aborting on any corruption. Phase 2 dispatches
/// one callback invocation per record across `options.worker_count()`
/// threads, each worker pulling the next record index from a shared atomic
/// cursor until the index is drained.
///
/// Exactly-once delivery, no inter-record ordering guarantee, no locking
/// around caller-captured state.
pub(crate) fn scan_backend_parallel<F>(
    backend: &dyn StorageBackend,
    options: &ScanOptions,
    callback: F,
) -> CoreResult<u64>
where
    F: Fn(u64, TemplateView<'_>) + Sync,
{
    let size = backend.size()?;
    let image = backend.read_at(0, size as usize)?;

    // Phase 1: sequential indexing
    let mut index: Vec<(u64, TemplateView<'_>)> = Vec::new();
    for entry in TemplateIter::new(&image) {
        match entry {
            Ok(record) => index.push(record),
            Err(err) => {
                warn!(%err, "aborting parallel scan: corrupt record during indexing");
                return Err(err);
            }
        }
    }

    if index.is_empty() {
        return Ok(0);
    }

    // Phase 2: bounded worker-pool dispatch
    let workers = options.worker_count().min(index.len());
    debug!(records = index.len(), workers, "parallel template dispatch");

    let cursor = AtomicUsize::new(0);
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(&(offset, view)) = index.get(i) else {
                    break;
                };
                callback(offset, view);
            });
        }
    });

    Ok(index.len() as u64)
}
