use super::session::Session;
use crate::record::{Batch, Record};
use std::collections::VecDeque;

/// Newly detected records waiting for the user to commit them, newest-first.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    records: VecDeque<Record>,
}

impl PendingBuffer {
    /// Puts a newer batch in front of everything already buffered.
    pub(crate) fn prepend(&mut self, batch: Batch) {
        for record in batch.into_records().into_iter().rev() {
            self.records.push_front(record);
        }
    }

    pub(crate) fn take(&mut self) -> Vec<Record> {
        self.records.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

impl Session {
    /// Flushes the pending buffer to the top of the rendered feed.
    ///
    /// Returns the number of records moved, or `None` when busy or empty.
    pub(crate) fn commit_pending(&mut self) -> Option<usize> {
        if self.pending.is_empty() {
            return None;
        }
        let _busy = self.cursor.loading.guard()?;

        let records = self.pending.take();
        let count = records.len();
        self.rendered.prepend_top(records);
        Some(count)
    }
}
