use super::session::Session;
use crate::{
    record::{Batch, Record},
    source::{Bound, FetchError, FetchRequest, MessageQuery},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollApplied {
    /// this many records were added to the pending buffer
    Buffered(usize),
    NothingNew,
    Failed,
}

/// Detects records newer than anything the session has seen.
///
/// New records are only buffered; they reach the feed on commit.
#[derive(Debug, Clone)]
pub struct PollWatcher {
    limit: usize,
}

impl PollWatcher {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Issues a forward poll, or `None` when the session is busy.
    pub fn request(&self, session: &mut Session) -> Option<FetchRequest> {
        if !session.cursor.loading.acquire() {
            log::debug!("Session {} busy, skipping poll", session.token());
            return None;
        }

        let bound = session.cursor.newest_seen.map(Bound::After);
        Some(FetchRequest::Newer {
            session: session.token(),
            query: MessageQuery::new(session.view(), self.limit, bound),
        })
    }

    /// Folds a forward poll into the pending buffer. The caller checks the token.
    pub fn apply(
        &self,
        session: &mut Session,
        result: Result<Vec<Record>, FetchError>,
    ) -> PollApplied {
        session.cursor.loading.release();

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Polling for new records failed: {}", e);
                return PollApplied::Failed;
            }
        };

        let batch = Batch::newest_first(records).newer_than(session.cursor.newest_seen);
        let Some(newest) = batch.newest().map(|r| r.timestamp) else {
            return PollApplied::NothingNew;
        };

        let count = batch.len();
        session.cursor.newest_seen = Some(newest);
        session.pending.prepend(batch);
        log::info!(
            "{} new records detected, {} pending",
            count,
            session.pending.len()
        );
        PollApplied::Buffered(count)
    }
}
