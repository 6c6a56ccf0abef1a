use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event;
use log::LevelFilter;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        style::{Color, ResetColor, SetBackgroundColor},
        terminal::{
            Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
            enable_raw_mode,
        },
    },
};
use std::{io, panic, path::PathBuf, sync::Arc, time::Duration};
use tradefeed_framework::{
    FeedDesc, FileQueryStore, init_logging, install_error_hooks, start_with_desc,
};
use tradefeed_http::HttpFeedSource;
use url::Url;

const STATE_DIR_NAME: &str = "tradefeed";
const STATE_FILE_NAME: &str = "view.query";

/// Terminal viewer for trade and portfolio notification feeds
#[derive(Debug, Parser)]
#[command(name = "tradefeed", version, about)]
struct Cli {
    /// Backend root URL
    #[arg(long, env = "TRADEFEED_URL", default_value = "http://127.0.0.1:8000")]
    base_url: Url,

    /// Where the selected type and granularity are remembered
    #[arg(long, env = "TRADEFEED_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Initial view, e.g. "type=trade&granularity=1h"; overrides the remembered one
    #[arg(long)]
    query: Option<String>,

    /// Seconds between checks for new records
    #[arg(long, default_value_t = 15)]
    poll_interval: u64,

    /// Seconds between in-progress record refreshes
    #[arg(long, default_value_t = 15)]
    live_interval: u64,

    /// Records per older page
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=500))]
    page_size: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Also write logs to this file
    #[arg(long, env = "TRADEFEED_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Show the debug log panel at start
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn state_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_file {
            return Ok(path.clone());
        }
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join(STATE_DIR_NAME).join(STATE_FILE_NAME))
    }

    fn feed_desc(&self) -> FeedDesc {
        FeedDesc {
            poll_interval: Duration::from_secs(self.poll_interval.max(1)),
            live_interval: Duration::from_secs(self.live_interval.max(1)),
            page_size: self.page_size as usize,
            show_debug_logs: self.debug,
            initial_query: self.query.clone(),
            log_file: self.log_file.clone(),
            ..FeedDesc::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug_logs = init_logging(cli.log_file.as_deref(), LevelFilter::Debug)?;
    let source = HttpFeedSource::new(cli.base_url.clone(), Duration::from_secs(cli.timeout))
        .context("Invalid backend URL")?;
    let state_path = cli.state_path()?;
    log::info!(
        "Using backend {} with view state at {}",
        source.base_url(),
        state_path.display()
    );

    let desc = FeedDesc {
        debug_logs: Some(debug_logs),
        ..cli.feed_desc()
    };

    // Ensure we restore the terminal on panic, ahead of the eyre report
    panic::set_hook(Box::new(|_| {
        let _ = restore_terminal();
    }));
    install_error_hooks()?;

    let mut terminal = setup_terminal()?;

    let app_result = start_with_desc(
        &mut terminal,
        Arc::new(source),
        FileQueryStore::new(state_path),
        desc,
    );

    // Always restore terminal before printing or exiting
    restore_terminal()?;

    if let Err(err) = app_result {
        eprintln!("Application Error: {:?}", err);
    }

    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    // alternate screen keeps the shell history clean, mouse capture feeds gestures
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    execute!(
        stdout,
        SetBackgroundColor(Color::Reset),
        Clear(ClearType::All)
    )?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();

    let _ = execute!(stdout, ResetColor);
    let _ = execute!(stdout, DisableMouseCapture);
    let _ = execute!(stdout, LeaveAlternateScreen);

    // Drain pending events so they don't leak to the shell
    while event::poll(Duration::from_millis(0)).unwrap_or(false) {
        let _ = event::read();
    }

    let _ = disable_raw_mode();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tradefeed"]).unwrap();
        assert_eq!(cli.poll_interval, 15);
        assert_eq!(cli.page_size, 20);
        assert!(!cli.debug);

        let desc = cli.feed_desc();
        assert_eq!(desc.poll_interval, Duration::from_secs(15));
        assert_eq!(desc.page_size, 20);
        assert_eq!(desc.initial_query, None);
    }

    #[test]
    fn test_flags_flow_into_desc() {
        let cli = Cli::try_parse_from([
            "tradefeed",
            "--base-url",
            "http://feed.internal:9000/",
            "--query",
            "type=portfolio&granularity=1d",
            "--poll-interval",
            "5",
            "--page-size",
            "50",
            "--state-file",
            "/tmp/view.query",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_str(), "http://feed.internal:9000/");
        assert_eq!(cli.state_path().unwrap(), PathBuf::from("/tmp/view.query"));

        let desc = cli.feed_desc();
        assert_eq!(desc.poll_interval, Duration::from_secs(5));
        assert_eq!(desc.page_size, 50);
        assert!(desc.show_debug_logs);
        assert_eq!(
            desc.initial_query.as_deref(),
            Some("type=portfolio&granularity=1d")
        );
    }

    #[test]
    fn test_rejects_bad_url_and_page_size() {
        assert!(Cli::try_parse_from(["tradefeed", "--base-url", "not a url"]).is_err());
        assert!(Cli::try_parse_from(["tradefeed", "--page-size", "0"]).is_err());
    }
}
