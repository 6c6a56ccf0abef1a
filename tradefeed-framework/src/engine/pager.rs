use super::session::Session;
use crate::{
    record::{Batch, Record},
    source::{Bound, FetchError, FetchRequest, MessageQuery},
};

/// What happened to the rendered feed after a backward page came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageApplied {
    /// this many records were appended below the oldest one
    Rendered(usize),
    /// nothing older exists; pagination is over for the session
    Exhausted,
    Failed,
}

/// Walks backward through history one page at a time.
#[derive(Debug, Clone)]
pub struct CursorPager {
    page_size: usize,
}

impl CursorPager {
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Issues the next older page, or `None` when history is exhausted or
    /// the session is busy.
    pub fn request(&self, session: &mut Session) -> Option<FetchRequest> {
        if !session.cursor.has_more {
            log::debug!("Session {} has no more history", session.token());
            return None;
        }
        if !session.cursor.loading.acquire() {
            log::debug!("Session {} busy, dropping older page trigger", session.token());
            return None;
        }

        let bound = session.cursor.oldest_seen.map(Bound::Before);
        Some(FetchRequest::Older {
            session: session.token(),
            query: MessageQuery::new(session.view(), self.page_size, bound),
        })
    }

    /// Folds an older page into `session`. The caller checks the token.
    pub fn apply(
        &self,
        session: &mut Session,
        result: Result<Vec<Record>, FetchError>,
    ) -> PageApplied {
        session.cursor.loading.release();

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                log::error!("Loading older records failed, stopping pagination: {}", e);
                session.cursor.has_more = false;
                return PageApplied::Failed;
            }
        };

        let batch = Batch::newest_first(records).older_than(session.cursor.oldest_seen);
        let (Some(newest), Some(oldest)) = (
            batch.newest().map(|r| r.timestamp),
            batch.oldest().map(|r| r.timestamp),
        ) else {
            log::info!("Reached the end of history for {}", session.view().to_query());
            session.cursor.has_more = false;
            return PageApplied::Exhausted;
        };

        session.cursor.oldest_seen = Some(oldest);
        session.cursor.newest_seen.get_or_insert(newest);

        let count = batch.len();
        session.rendered.append_bottom(batch.into_records());
        log::debug!("Rendered {} older records, oldest now {}", count, oldest);
        PageApplied::Rendered(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::SessionToken, record::RecordKind, view_state::ViewState};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n * 60, 0).unwrap()
    }

    fn records(stamps: impl IntoIterator<Item = i64>) -> Vec<Record> {
        stamps
            .into_iter()
            .map(|n| Record::new(ts(n), RecordKind::Trade, format!("T{}", n)))
            .collect()
    }

    fn session() -> Session {
        Session::new(SessionToken::first(), ViewState::default())
    }

    #[test]
    fn test_first_request_is_unbounded() {
        let pager = CursorPager::new(20);
        let mut session = session();
        match pager.request(&mut session) {
            Some(FetchRequest::Older { query, .. }) => {
                assert_eq!(query.limit, 20);
                assert_eq!(query.bound, None);
            }
            other => panic!("unexpected request: {:?}", other),
        }
        assert!(session.cursor().is_loading());
        assert_eq!(pager.request(&mut session), None);
    }

    #[test]
    fn test_first_page_sets_both_cursors() {
        let pager = CursorPager::new(20);
        let mut session = session();
        pager.request(&mut session);

        let applied = pager.apply(&mut session, Ok(records((1..=20).rev())));
        assert_eq!(applied, PageApplied::Rendered(20));
        assert_eq!(session.cursor().oldest_seen(), Some(ts(1)));
        assert_eq!(session.cursor().newest_seen(), Some(ts(20)));
        assert!(!session.cursor().is_loading());
        assert_eq!(session.rendered().get(0).map(|r| r.timestamp), Some(ts(20)));
    }

    #[test]
    fn test_next_request_is_before_oldest() {
        let pager = CursorPager::new(20);
        let mut session = session();
        pager.request(&mut session);
        pager.apply(&mut session, Ok(records((1..=20).rev())));

        match pager.request(&mut session) {
            Some(FetchRequest::Older { query, .. }) => {
                assert_eq!(query.bound, Some(Bound::Before(ts(1))));
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_later_pages_leave_newest_alone() {
        let pager = CursorPager::new(3);
        let mut session = session();
        pager.request(&mut session);
        pager.apply(&mut session, Ok(records([9, 8, 7])));
        pager.request(&mut session);
        pager.apply(&mut session, Ok(records([6, 5, 4])));

        assert_eq!(session.cursor().newest_seen(), Some(ts(9)));
        assert_eq!(session.cursor().oldest_seen(), Some(ts(4)));
        assert_eq!(session.rendered().len(), 6);
    }

    #[test]
    fn test_overlapping_records_are_dropped() {
        let pager = CursorPager::new(3);
        let mut session = session();
        pager.request(&mut session);
        pager.apply(&mut session, Ok(records([9, 8, 7])));
        pager.request(&mut session);

        let applied = pager.apply(&mut session, Ok(records([7, 6, 5])));
        assert_eq!(applied, PageApplied::Rendered(2));
        assert_eq!(session.rendered().len(), 5);
    }

    #[test]
    fn test_empty_page_ends_history() {
        let pager = CursorPager::new(20);
        let mut session = session();
        pager.request(&mut session);

        assert_eq!(pager.apply(&mut session, Ok(Vec::new())), PageApplied::Exhausted);
        assert!(!session.cursor().has_more());
        assert!(!session.cursor().is_loading());
        assert_eq!(pager.request(&mut session), None);
    }

    #[test]
    fn test_error_ends_history_and_clears_loading() {
        let pager = CursorPager::new(20);
        let mut session = session();
        pager.request(&mut session);

        let applied = pager.apply(&mut session, Err(FetchError::Status { code: 500 }));
        assert_eq!(applied, PageApplied::Failed);
        assert!(!session.cursor().has_more());
        assert!(!session.cursor().is_loading());
        assert!(session.rendered().is_empty());
    }
}
