//! The feed engine: an explicit state machine over [`FeedEvent`]s.
//!
//! The engine owns every piece of session state and is only ever driven from
//! one thread. It never performs I/O; instead each call to
//! [`Engine::handle`] returns the [`Effect`]s the front-end should carry out
//! (usually a [`FetchRequest`] for the [`FetchWorker`](crate::FetchWorker)).
//!
//! ```text
//!  scroll / pull / wheel / timer / filter / commit
//!                      │
//!                      ▼
//!   ┌─────────────── Engine ───────────────┐
//!   │ Session (token, cursors, loading)    │
//!   │  ├─ CursorPager  → rendered feed     │
//!   │  ├─ PollWatcher  → pending buffer    │
//!   │  └─ commit       → rendered feed     │
//!   │ LiveRecordMirror → live slot         │
//!   └──────────────────┬───────────────────┘
//!                      ▼
//!           Vec<Effect> (fetches, scroll)
//! ```

mod live;
mod pager;
mod pending;
mod poll;
mod session;


pub use live::{LiveRecordMirror, LiveSlot};
pub use pager::{CursorPager, PageApplied};
pub use pending::PendingBuffer;
pub use poll::{PollApplied, PollWatcher};
pub use session::{FeedView, PageCursor, Session, SessionToken};

use crate::{
    source::{FetchOutcome, FetchRequest},
    view_state::{Granularity, MessageType, QueryStore, ViewState, ViewStateController},
};

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_POLL_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDesc {
    /// records per backward page
    pub page_size: usize,
    /// upper bound on records returned by one forward poll
    pub poll_limit: usize,
}

impl Default for EngineDesc {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_limit: DEFAULT_POLL_LIMIT,
        }
    }
}

/// A requested change to the view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    MessageType(MessageType),
    Granularity(Granularity),
    /// a whole query string, e.g. `type=trade&granularity=1h`
    Query(String),
}

/// Everything that can happen to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// the viewport came within the trigger margin of the oldest record
    ScrollNearBottom,
    /// a pull-to-refresh drag past the threshold was released
    PullReleased { distance: i32 },
    /// wheel-up at the origin, already throttled by the gesture detector
    WheelUp,
    /// keyboard refresh; same forward-poll signal as a pull release
    RefreshRequested,
    /// the periodic forward-poll timer fired
    TimerTick,
    /// the periodic in-progress timer fired
    LiveTick,
    FilterChanged(FilterChange),
    CommitRequested,
    Fetched(FetchOutcome),
}

/// Work the front-end must do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    /// bring the feed back to its newest record
    ScrollToOrigin,
    /// restart the forward-poll timer from zero
    RearmPollTimer,
}

pub struct Engine<S: QueryStore> {
    controller: ViewStateController<S>,
    session: Session,
    pager: CursorPager,
    watcher: PollWatcher,
    live: LiveRecordMirror,
}

impl<S: QueryStore> Engine<S> {
    pub fn new(controller: ViewStateController<S>, desc: EngineDesc) -> Self {
        let view = controller.state();
        Self {
            session: Session::new(SessionToken::first(), view),
            live: LiveRecordMirror::new(view.granularity),
            pager: CursorPager::new(desc.page_size),
            watcher: PollWatcher::new(desc.poll_limit),
            controller,
        }
    }

    /// Kicks off the first page and the first in-progress lookup.
    pub fn start(&mut self) -> Vec<Effect> {
        log::info!(
            "Starting feed for {} (session {})",
            self.session.view().to_query(),
            self.session.token()
        );
        let mut effects = vec![Effect::RearmPollTimer];
        effects.extend(self.load_older());
        effects.push(Effect::Fetch(self.live.request()));
        effects
    }

    pub fn handle(&mut self, event: FeedEvent) -> Vec<Effect> {
        match event {
            FeedEvent::ScrollNearBottom => self.load_older().into_iter().collect(),
            FeedEvent::PullReleased { distance } => {
                log::debug!("Pull released at {} units", distance);
                self.poll_newer()
            }
            FeedEvent::WheelUp | FeedEvent::TimerTick | FeedEvent::RefreshRequested => {
                self.poll_newer()
            }
            FeedEvent::LiveTick => vec![Effect::Fetch(self.live.request())],
            FeedEvent::FilterChanged(change) => self.change_filter(change),
            FeedEvent::CommitRequested => self.commit(),
            FeedEvent::Fetched(outcome) => self.on_fetched(outcome),
        }
    }

    fn load_older(&mut self) -> Option<Effect> {
        self.pager.request(&mut self.session).map(Effect::Fetch)
    }

    fn poll_newer(&mut self) -> Vec<Effect> {
        self.watcher
            .request(&mut self.session)
            .map(Effect::Fetch)
            .into_iter()
            .collect()
    }

    /// Replaces the session with an empty one for the current view state.
    ///
    /// Outstanding fetches of the old session are answered later and then
    /// discarded by token, so the new session starts idle.
    fn reset(&mut self) -> Vec<Effect> {
        let token = self.session.token().next();
        let view = self.controller.state();
        log::info!("Resetting feed for {} (session {})", view.to_query(), token);

        self.session = Session::new(token, view);
        let mut effects = vec![Effect::RearmPollTimer];
        effects.extend(self.load_older());
        effects
    }

    fn change_filter(&mut self, change: FilterChange) -> Vec<Effect> {
        let view = match change {
            FilterChange::MessageType(message_type) => {
                self.controller.set_message_type(message_type)
            }
            FilterChange::Granularity(granularity) => self.controller.set_granularity(granularity),
            FilterChange::Query(query) => self.controller.apply_query(&query),
        };

        let mut effects = self.reset();
        if self.live.retarget(view.granularity) {
            effects.push(Effect::Fetch(self.live.request()));
        }
        effects
    }

    fn commit(&mut self) -> Vec<Effect> {
        match self.session.commit_pending() {
            Some(count) => {
                log::info!("Showing {} new records", count);
                vec![Effect::ScrollToOrigin]
            }
            None => {
                log::debug!("Nothing to commit");
                Vec::new()
            }
        }
    }

    fn on_fetched(&mut self, outcome: FetchOutcome) -> Vec<Effect> {
        match outcome {
            FetchOutcome::Older { session, result } => {
                if !self.is_current(session) {
                    return Vec::new();
                }
                match self.pager.apply(&mut self.session, result) {
                    PageApplied::Rendered(_) => vec![Effect::Fetch(self.live.request())],
                    PageApplied::Exhausted | PageApplied::Failed => Vec::new(),
                }
            }
            FetchOutcome::Newer { session, result } => {
                if self.is_current(session) {
                    self.watcher.apply(&mut self.session, result);
                }
                Vec::new()
            }
            FetchOutcome::InProgress { generation, result } => {
                self.live.apply(generation, result);
                Vec::new()
            }
        }
    }

    fn is_current(&self, token: SessionToken) -> bool {
        let current = self.session.token();
        if token != current {
            log::debug!("Discarding answer for session {} (current {})", token, current);
        }
        token == current
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view_state(&self) -> ViewState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ViewStateController<S> {
        &self.controller
    }

    pub fn rendered(&self) -> &FeedView {
        self.session.rendered()
    }

    pub fn live_slot(&self) -> &LiveSlot {
        self.live.slot()
    }

    pub fn pending_count(&self) -> usize {
        self.session.pending().len()
    }

    /// Whether the "show new records" affordance should be visible.
    pub fn has_pending(&self) -> bool {
        !self.session.pending().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.session.cursor().is_loading()
    }

    pub fn has_more(&self) -> bool {
        self.session.cursor().has_more()
    }
}
