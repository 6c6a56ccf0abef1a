//! Feed sources and the requests the engine sends to them.
//!
//! This module defines the boundary between the engine and the backend:
//!
//! - [`FeedSource`]: answers page queries and in-progress lookups
//! - [`MessageQuery`]: one page request, bounded on at most one side
//! - [`FetchRequest`] / [`FetchOutcome`]: what the engine asks for and what comes back
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  Effect::Fetch(req)  ┌─────────────┐  fetch_*()  ┌────────────┐
//! │  Engine  │ ───────────────────> │ FetchWorker │ ──────────> │ FeedSource │
//! └────▲─────┘                      └──────┬──────┘             └────────────┘
//!      │      FeedEvent::Fetched(outcome)  │
//!      └───────────────────────────────────┘
//! ```
//!
//! The engine never awaits a fetch itself. Every request carries the token
//! of the session (or live generation) that issued it, so the engine can
//! drop answers that arrive after a reset.

mod worker;

pub use worker::FetchWorker;

use crate::{
    engine::SessionToken,
    record::Record,
    view_state::{Granularity, MessageType, ViewState},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures reported by a [`FeedSource`].
///
/// The engine decides how to react based on which fetch failed, not on the
/// variant: a failed backward page ends pagination, anything else is retried
/// by its next trigger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend answered with HTTP {code}")]
    Status { code: u16 },
    #[error("backend reported an error: {0}")]
    Server(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("fetch aborted: {0}")]
    Aborted(String),
}

/// Which side of the timeline a page query is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// strictly older than the cursor (backward pagination)
    Before(DateTime<Utc>),
    /// strictly newer than the cursor (forward detection)
    After(DateTime<Utc>),
}

/// A single `/api/messages` request. No bound means "the most recent page".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub message_type: MessageType,
    pub granularity: Granularity,
    pub limit: usize,
    pub bound: Option<Bound>,
}

impl MessageQuery {
    pub fn new(view: ViewState, limit: usize, bound: Option<Bound>) -> Self {
        Self {
            message_type: view.message_type,
            granularity: view.granularity,
            limit,
            bound,
        }
    }
}

/// Trait for answering the engine's read-only queries.
///
/// Implement this to plug a backend into the engine. Both methods are
/// called from the [`FetchWorker`]'s runtime, never from the UI thread.
///
/// # Contract
///
/// - `fetch_messages` returns matching records ordered newest-first. Pages
///   that aren't are re-sorted at the boundary, with a warning.
/// - `fetch_in_progress` returns `Ok(None)` when nothing is currently being
///   produced for that granularity.
/// - Implementations should bound their own latency (timeouts); the engine
///   stays busy until the page outcome arrives.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use tradefeed_framework::{FeedSource, FetchError, Granularity, MessageQuery, Record};
///
/// struct EmptySource;
///
/// #[async_trait]
/// impl FeedSource for EmptySource {
///     async fn fetch_messages(&self, _query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
///         Ok(Vec::new())
///     }
///
///     async fn fetch_in_progress(
///         &self,
///         _granularity: Granularity,
///     ) -> Result<Option<Record>, FetchError> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one page of records matching `query`.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding failure.
    async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<Record>, FetchError>;

    /// Fetch the singleton in-progress record for `granularity`.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding failure.
    async fn fetch_in_progress(&self, granularity: Granularity)
    -> Result<Option<Record>, FetchError>;
}

/// A fetch the engine wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Older {
        session: SessionToken,
        query: MessageQuery,
    },
    Newer {
        session: SessionToken,
        query: MessageQuery,
    },
    InProgress {
        generation: u64,
        granularity: Granularity,
    },
}

impl FetchRequest {
    /// Runs the request against `source`.
    pub async fn execute(self, source: &dyn FeedSource) -> FetchOutcome {
        match self {
            Self::Older { session, query } => FetchOutcome::Older {
                session,
                result: source.fetch_messages(&query).await,
            },
            Self::Newer { session, query } => FetchOutcome::Newer {
                session,
                result: source.fetch_messages(&query).await,
            },
            Self::InProgress {
                generation,
                granularity,
            } => FetchOutcome::InProgress {
                generation,
                result: source.fetch_in_progress(granularity).await,
            },
        }
    }

    /// The outcome to report when the request never produced an answer.
    pub fn failed(&self, error: FetchError) -> FetchOutcome {
        match self {
            Self::Older { session, .. } => FetchOutcome::Older {
                session: *session,
                result: Err(error),
            },
            Self::Newer { session, .. } => FetchOutcome::Newer {
                session: *session,
                result: Err(error),
            },
            Self::InProgress { generation, .. } => FetchOutcome::InProgress {
                generation: *generation,
                result: Err(error),
            },
        }
    }
}

/// The answer to a [`FetchRequest`], routed back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Older {
        session: SessionToken,
        result: Result<Vec<Record>, FetchError>,
    },
    Newer {
        session: SessionToken,
        result: Result<Vec<Record>, FetchError>,
    },
    InProgress {
        generation: u64,
        result: Result<Option<Record>, FetchError>,
    },
}
