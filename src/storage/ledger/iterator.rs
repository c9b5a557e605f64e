use super::{LedgerError, LedgerResult, ResultsIterator};
use std::collections::VecDeque;

/// Iterator over results that were fully materialized when the query ran.
pub struct BufferedIterator<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BufferedIterator<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            closed: false,
        }
    }
}

impl<T: Send> ResultsIterator<T> for BufferedIterator<T> {
    fn has_next(&self) -> bool {
        !self.closed && !self.items.is_empty()
    }

    fn next(&mut self) -> LedgerResult<T> {
        if self.closed {
            return Err(LedgerError::IteratorClosed);
        }
        self.items.pop_front().ok_or(LedgerError::IteratorExhausted)
    }

    fn close(&mut self) -> LedgerResult<()> {
        self.closed = true;
        self.items.clear();
        Ok(())
    }
}

/// Owns a ledger iterator and closes it when dropped, including on early
/// returns through `?`.
pub struct IteratorGuard<T> {
    inner: Box<dyn ResultsIterator<T>>,
}

impl<T> IteratorGuard<T> {
    pub fn new(inner: Box<dyn ResultsIterator<T>>) -> Self {
        Self { inner }
    }

    pub fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    pub fn next(&mut self) -> LedgerResult<T> {
        self.inner.next()
    }
}

impl<T> Drop for IteratorGuard<T> {
    fn drop(&mut self) {
        if let Err(e) = self.inner.close() {
            tracing::warn!(error = %e, "failed to close ledger iterator");
        }
    }
}
