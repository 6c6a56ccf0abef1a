use super::pending::PendingBuffer;
use crate::{record::Record, view_state::ViewState};
use chrono::{DateTime, Utc};
use std::{cell::Cell, collections::VecDeque, fmt};

/// Identifies one view-state session; strictly increasing across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub const fn first() -> Self {
        Self(1)
    }

    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The single busy flag shared by backward loads, forward polls and commit.
///
/// Mutual exclusion only: a caller that finds it set is dropped, not queued.
#[derive(Debug, Default)]
pub struct LoadingFlag(Cell<bool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.get()
    }

    /// Marks the session busy until [`release`](Self::release); false if already busy.
    pub(crate) fn acquire(&self) -> bool {
        !self.0.replace(true)
    }

    pub(crate) fn release(&self) {
        self.0.set(false);
    }

    /// Scoped acquisition; the flag clears when the guard drops.
    pub(crate) fn guard(&self) -> Option<LoadingGuard<'_>> {
        self.acquire().then_some(LoadingGuard(self))
    }
}

pub(crate) struct LoadingGuard<'a>(&'a LoadingFlag);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Cursor bookkeeping for one session.
#[derive(Debug)]
pub struct PageCursor {
    pub(crate) oldest_seen: Option<DateTime<Utc>>,
    pub(crate) newest_seen: Option<DateTime<Utc>>,
    pub(crate) has_more: bool,
    pub(crate) loading: LoadingFlag,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            oldest_seen: None,
            newest_seen: None,
            has_more: true,
            loading: LoadingFlag::default(),
        }
    }
}

impl PageCursor {
    pub fn oldest_seen(&self) -> Option<DateTime<Utc>> {
        self.oldest_seen
    }

    pub fn newest_seen(&self) -> Option<DateTime<Utc>> {
        self.newest_seen
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }
}

/// Records currently shown in the feed, topmost first.
#[derive(Debug, Default)]
pub struct FeedView {
    records: VecDeque<Record>,
}

impl FeedView {
    pub(crate) fn append_bottom(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    /// Inserts `records` as one block above everything rendered so far,
    /// keeping their order (first element ends up topmost).
    pub(crate) fn prepend_top(&mut self, records: Vec<Record>) {
        for record in records.into_iter().rev() {
            self.records.push_front(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

/// Everything that lives for exactly one view-state selection.
///
/// A reset never mutates a session; the engine replaces it wholesale.
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    view: ViewState,
    pub(crate) cursor: PageCursor,
    pub(crate) pending: PendingBuffer,
    pub(crate) rendered: FeedView,
}

impl Session {
    pub fn new(token: SessionToken, view: ViewState) -> Self {
        Self {
            token,
            view,
            cursor: PageCursor::default(),
            pending: PendingBuffer::default(),
            rendered: FeedView::default(),
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn pending(&self) -> &PendingBuffer {
        &self.pending
    }

    pub fn rendered(&self) -> &FeedView {
        &self.rendered
    }
}
