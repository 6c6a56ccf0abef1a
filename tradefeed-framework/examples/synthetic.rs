//! Synthetic example: an in-process source that invents a trade every few seconds.
//!
//! This demonstrates the bare minimum needed to run the feed viewer:
//! - Implement FeedSource to answer page and in-progress queries
//! - Pick a QueryStore for the view state
//! - Call start_with_source() to launch the TUI
//!
//! Run with: cargo run --example synthetic

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use tradefeed_framework::{
    Bound, FeedSource, FetchError, Granularity, MemoryQueryStore, MessageQuery, MessageType,
    Record, RecordKind, RecordStatus, start_with_source,
};

const TICKERS: [&str; 5] = ["$AAPL", "$TSLA", "$NVDA", "$MSFT", "$BRK.B"];
const SPACING_SECS: i64 = 7;

// one record every SPACING_SECS seconds, going back a day
struct SyntheticSource {
    origin: DateTime<Utc>,
}

impl SyntheticSource {
    fn new() -> Self {
        Self {
            origin: Utc::now() - ChronoDuration::days(1),
        }
    }

    fn record_at(&self, n: i64) -> Record {
        let ts = self.origin + ChronoDuration::seconds(n * SPACING_SECS);
        let ticker = TICKERS[n as usize % TICKERS.len()];
        let (kind, content) = if n % 4 == 0 {
            (
                RecordKind::Portfolio,
                format!("Rebalanced: trimmed {}\nCash now {}%", ticker, n % 30),
            )
        } else if n % 2 == 0 {
            (RecordKind::Trade, format!("Sold 10 {} @ {}", ticker, 100 + n % 50))
        } else {
            (RecordKind::Trade, format!("Bought 25 {} @ {}", ticker, 100 + n % 50))
        };
        Record::new(ts, kind, content).with_id(n.to_string())
    }

    fn index_of(&self, ts: DateTime<Utc>) -> i64 {
        (ts - self.origin).num_seconds() / SPACING_SECS
    }

    fn matches(record: &Record, message_type: MessageType) -> bool {
        match message_type {
            MessageType::All => true,
            MessageType::Trade => record.kind == RecordKind::Trade,
            MessageType::Portfolio => record.kind == RecordKind::Portfolio,
        }
    }
}

#[async_trait]
impl FeedSource for SyntheticSource {
    async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<Record>, FetchError> {
        let newest = self.index_of(Utc::now());
        let (from, to) = match query.bound {
            Some(Bound::Before(ts)) => (0, (self.index_of(ts) - 1).min(newest)),
            Some(Bound::After(ts)) => (self.index_of(ts) + 1, newest),
            None => (0, newest),
        };

        let mut records: Vec<Record> = (from.max(0)..=to)
            .rev()
            .map(|n| self.record_at(n))
            .filter(|r| Self::matches(r, query.message_type))
            .collect();

        match query.bound {
            // forward polls keep the records closest to the cursor
            Some(Bound::After(_)) => {
                let skip = records.len().saturating_sub(query.limit);
                records = records.split_off(skip);
            }
            _ => records.truncate(query.limit),
        }
        Ok(records)
    }

    async fn fetch_in_progress(
        &self,
        granularity: Granularity,
    ) -> Result<Option<Record>, FetchError> {
        let now = Utc::now();
        Ok(Some(
            Record::new(
                now,
                RecordKind::Trade,
                format!("Building {} bucket: 3 fills on $NVDA so far", granularity),
            )
            .with_status(RecordStatus::InProgress),
        ))
    }
}

fn main() -> Result<()> {
    // setup terminal
    let mut stdout = io::stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // run the application
    let result = start_with_source(
        &mut terminal,
        Arc::new(SyntheticSource::new()),
        MemoryQueryStore::default(),
    );

    // restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
