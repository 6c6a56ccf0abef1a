//! # tradefeed-framework
//!
//! A feed synchronisation engine and terminal viewer for append-only
//! trade/portfolio notification logs served by a paginated query API.
//!
//! ## Overview
//!
//! The framework keeps an infinite-scroll feed consistent with a backend
//! that only answers "records older than X" and "records newer than Y":
//!
//! - older records are paged in as the user scrolls toward the bottom
//! - newer records are detected in the background and buffered, never
//!   shown until the user commits them
//! - the current in-progress record is mirrored in its own slot
//! - changing the message type or granularity starts a fresh session
//!
//! ## Core Concepts
//!
//! ### Engine
//!
//! [`Engine`] is an explicit state machine. The front-end feeds it
//! [`FeedEvent`]s (scroll, pull, timer ticks, fetch outcomes) and performs
//! the [`Effect`]s it returns. The engine never touches the network itself,
//! which is what makes every scenario testable without one.
//!
//! ### Sources
//!
//! A [`FeedSource`] answers the engine's queries. Requests run on a
//! [`FetchWorker`] (a background tokio runtime); outcomes come back tagged
//! with the [`SessionToken`] that asked for them, so answers for a filter the
//! user already left are dropped.
//!
//! ### View state
//!
//! The selected message type and granularity live in a
//! [`ViewStateController`], persisted as a query string through a
//! [`QueryStore`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use tradefeed_framework::{
//!     FeedSource, FetchError, Granularity, MemoryQueryStore, MessageQuery, Record,
//!     start_with_source,
//! };
//!
//! struct EmptySource;
//!
//! #[async_trait]
//! impl FeedSource for EmptySource {
//!     async fn fetch_messages(&self, _query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn fetch_in_progress(
//!         &self,
//!         _granularity: Granularity,
//!     ) -> Result<Option<Record>, FetchError> {
//!         Ok(None)
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     use ratatui::{Terminal, backend::CrosstermBackend};
//!     use std::io;
//!
//!     let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
//!     start_with_source(&mut terminal, Arc::new(EmptySource), MemoryQueryStore::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Advanced Configuration
//!
//! Use [`FeedDesc`] to tune timers, page sizes and gesture thresholds:
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//! use tradefeed_framework::{FeedDesc, FileQueryStore, start_with_desc};
//! # use tradefeed_framework::{FeedSource, FetchError, Granularity, MessageQuery, Record};
//! # use async_trait::async_trait;
//! # struct EmptySource;
//! # #[async_trait]
//! # impl FeedSource for EmptySource {
//! #     async fn fetch_messages(&self, _: &MessageQuery) -> Result<Vec<Record>, FetchError> {
//! #         Ok(vec![])
//! #     }
//! #     async fn fetch_in_progress(&self, _: Granularity) -> Result<Option<Record>, FetchError> {
//! #         Ok(None)
//! #     }
//! # }
//! # fn main() -> anyhow::Result<()> {
//! # use ratatui::{Terminal, backend::CrosstermBackend};
//! # use std::io;
//! # let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
//!
//! let desc = FeedDesc {
//!     poll_interval: Duration::from_secs(5),
//!     page_size: 50,
//!     show_debug_logs: true,
//!     initial_query: Some("type=trade&granularity=1h".to_string()),
//!     ..FeedDesc::default()
//! };
//!
//! let store = FileQueryStore::new("/tmp/tradefeed/view.query");
//! start_with_desc(&mut terminal, Arc::new(EmptySource), store, desc)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Built-in Features
//!
//! - `j`/`k`, `↓`/`↑`: move through the feed, older records load on demand
//! - drag down at the top, wheel up at the top, or `r`: check for new records
//! - `n`/`Enter` or a click on the footer badge: show buffered new records
//! - `Tab`/`g`: cycle message type / granularity
//! - `y`: copy the selected record, `w`: toggle wrapping, `?`: help

pub mod engine;
pub mod formatter;
pub mod gesture;
pub mod record;
pub mod source;
pub mod view_state;

// internal modules (not part of public API but needed for app)
pub(crate) mod app;
pub(crate) mod app_block;
pub(crate) mod content_line_maker;
pub(crate) mod feed_list;
pub(crate) mod theme;
pub(crate) mod ui_logger;
pub mod status_bar;

// re-export commonly used types
pub use engine::{
    Effect, Engine, EngineDesc, FeedEvent, FilterChange, LiveSlot, PageCursor, Session,
    SessionToken,
};
pub use formatter::{DisplayFragment, Emphasis, Segment, format_record, sanitize_control_chars};
pub use gesture::{GestureDetector, PointerSample};
pub use record::{
    Batch, Record, RecordError, RecordKind, RecordStatus, format_cursor, parse_timestamp,
};
pub use source::{
    Bound, FeedSource, FetchError, FetchOutcome, FetchRequest, FetchWorker, MessageQuery,
};
pub use view_state::{
    FileQueryStore, Granularity, MemoryQueryStore, MessageType, QueryStore, StoreError, ViewState,
    ViewStateController,
};

// public API for running the application
pub use app::{FeedDesc, install_error_hooks, start_with_desc, start_with_source};
pub use ui_logger::{DebugLogs, init_logging};
