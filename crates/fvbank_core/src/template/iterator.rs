//! Sequential template iteration over an in-memory buffer.

use crate::error::CoreResult;
use crate::template::record::TemplateView;
use std::iter::FusedIterator;

/// A lazy iterator over concatenated template records in a buffer.
///
/// Starts at offset 0 and locates each record boundary purely from the
/// record's own size fields. Yields `(offset, view)` pairs in buffer order,
/// each record exactly once.
///
/// Termination is exact: the iterator ends cleanly only when the final
/// record's end coincides with the end of the buffer. Anything else - a
/// short header, or a declared size running past the end - yields one
/// `Err(Corruption)` and then fuses. A malformed record is never silently
/// skipped or truncated.
///
/// Iteration is restartable: constructing a new iterator over the same
/// unmodified buffer yields an identical sequence.
///
/// # Example
///
/// ```rust
/// use fvbank_core::{ImageId, TemplateBuilder, TemplateIter};
///
/// let a = TemplateBuilder::new(ImageId::ZERO, 1).build().unwrap();
/// let b = TemplateBuilder::new(ImageId::ZERO, 2).build().unwrap();
/// let mut buf = a.as_bytes().to_vec();
/// buf.extend_from_slice(b.as_bytes());
///
/// let ids: Vec<i32> = TemplateIter::new(&buf)
///     .map(|r| r.unwrap().1.algorithm_id())
///     .collect();
/// assert_eq!(ids, [1, 2]);
/// ```
#[derive(Debug)]
pub struct TemplateIter<'a> {
    buf: &'a [u8],
    offset: usize,
    finished: bool,
}

impl<'a> TemplateIter<'a> {
    /// Creates an iterator positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            finished: false,
        }
    }

    /// The offset the next decode would start at.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }
}

impl<'a> Iterator for TemplateIter<'a> {
    type Item = CoreResult<(u64, TemplateView<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.offset == self.buf.len() {
            self.finished = true;
            return None;
        }

        match TemplateView::parse_at(self.buf, self.offset) {
            Ok(view) => {
                let offset = self.offset as u64;
                self.offset += view.total_size();
                Some(Ok((offset, view)))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for TemplateIter<'_> {}

/// Sequentially scans `buf`, invoking `callback` once per record in buffer
/// order. Returns the number of records visited.
///
/// # Errors
///
/// Returns [`Corruption`](crate::CoreError::Corruption) if any record is
/// malformed; the callback is not invoked for that record and the scan
/// stops.
pub fn scan_buffer<F>(buf: &[u8], mut callback: F) -> CoreResult<u64>
where
    F: FnMut(u64, TemplateView<'_>),
{
    let mut count = 0;
    for entry in TemplateIter::new(buf) {
        let (offset, view) = entry?;
        callback(offset, view);
        count += 1;
    }
    Ok(count)
}
