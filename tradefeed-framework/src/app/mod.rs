use crate::{
    app_block::AppBlock,
    engine::{Effect, Engine, EngineDesc, FeedEvent},
    feed_list::FeedList,
    gesture::{DEFAULT_PULL_THRESHOLD, DEFAULT_WHEEL_COOLDOWN, GestureDetector},
    source::{FeedSource, FetchOutcome, FetchWorker},
    status_bar::DisplayEvent,
    theme,
    ui_logger::{self, DebugLogs},
    view_state::{QueryStore, ViewStateController},
};
use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, MouseEvent};
use log::LevelFilter;
use ratatui::{Terminal, backend::CrosstermBackend, prelude::*, widgets::Widget};
use std::{
    io,
    ops::Range,
    panic,
    path::PathBuf,
    sync::{Arc, Once},
    time::{Duration, Instant},
};

mod events;
mod render;
mod scrolling;

// constants
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_LIVE_INTERVAL_SECS: u64 = 15;
const DEFAULT_EVENT_POLL_INTERVAL_MS: u64 = 16;
const DEFAULT_NEAR_BOTTOM_MARGIN: usize = 5;
const DEFAULT_UNITS_PER_ROW: i32 = 16;
const HELP_POPUP_WIDTH: u16 = 56;
const SCROLL_PAD: usize = 1;
const HORIZONTAL_SCROLL_STEP: usize = 5;
const DISPLAY_EVENT_DURATION_MS: u64 = 1200;
const LIVE_PANEL_HEIGHT: u16 = 3;
const DEBUG_PANEL_HEIGHT: u16 = 6;

#[derive(Clone)]
pub struct FeedDesc {
    /// forward-poll timer period
    pub poll_interval: Duration,
    /// in-progress record timer period
    pub live_interval: Duration,
    pub event_poll_interval: Duration,
    pub page_size: usize,
    pub poll_limit: usize,
    /// rows from the end of the feed that trigger an older page
    pub near_bottom_margin: usize,
    pub pull_threshold: i32,
    pub wheel_cooldown: Duration,
    /// gesture units per terminal row
    pub units_per_row: i32,
    pub show_debug_logs: bool,
    /// query string applied over the persisted view state at start
    pub initial_query: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
    /// buffer of an already installed logger; `None` installs one at start
    pub debug_logs: Option<DebugLogs>,
}

impl Default for FeedDesc {
    fn default() -> Self {
        let engine = EngineDesc::default();
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            live_interval: Duration::from_secs(DEFAULT_LIVE_INTERVAL_SECS),
            event_poll_interval: Duration::from_millis(DEFAULT_EVENT_POLL_INTERVAL_MS),
            page_size: engine.page_size,
            poll_limit: engine.poll_limit,
            near_bottom_margin: DEFAULT_NEAR_BOTTOM_MARGIN,
            pull_threshold: DEFAULT_PULL_THRESHOLD,
            wheel_cooldown: DEFAULT_WHEEL_COOLDOWN,
            units_per_row: DEFAULT_UNITS_PER_ROW,
            show_debug_logs: false,
            initial_query: None,
            log_file: None,
            log_level: LevelFilter::Debug,
            debug_logs: None,
        }
    }
}

impl FeedDesc {
    pub fn engine_desc(&self) -> EngineDesc {
        EngineDesc {
            page_size: self.page_size,
            poll_limit: self.poll_limit,
        }
    }
}

/// Start the feed with default configuration
pub fn start_with_source<S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    source: Arc<dyn FeedSource>,
    store: S,
) -> Result<()>
where
    S: QueryStore + 'static,
{
    start_with_desc(terminal, source, store, FeedDesc::default())
}

/// Start the feed with custom configuration
pub fn start_with_desc<S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    source: Arc<dyn FeedSource>,
    store: S,
    desc: FeedDesc,
) -> Result<()>
where
    S: QueryStore + 'static,
{
    install_error_hooks()?;

    let app = App::new(source, store, desc)?;
    app.run(terminal)
}

static ERROR_HOOKS: Once = Once::new();

/// Installs color-eyre's report and panic hooks, once per process.
///
/// The panic hook that was in place before the first call keeps running ahead
/// of the eyre panic report, so a terminal-restoring hook installed by the
/// caller still fires. Later calls leave the current hook alone.
pub fn install_error_hooks() -> Result<()> {
    let mut installed = Ok(());
    ERROR_HOOKS.call_once(|| {
        let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
        if let Err(e) = eyre_hook.install() {
            installed = Err(anyhow!("Error installing color_eyre: {}", e));
            return;
        }

        let eyre_panic_hook = panic_hook.into_panic_hook();
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            previous(info);
            eyre_panic_hook(info);
        }));
    });
    installed
}

struct App<S: QueryStore> {
    is_exiting: bool,
    desc: FeedDesc,
    engine: Engine<S>,
    worker: FetchWorker,
    gesture: GestureDetector,
    feed_list: FeedList,
    debug_logs: DebugLogs,
    hard_focused_block_id: uuid::Uuid,
    live_block: AppBlock,
    feed_block: AppBlock,
    details_block: AppBlock,
    debug_block: AppBlock,
    prev_selected_index: Option<usize>,
    last_feed_area: Option<Rect>,
    last_feed_content_area: Option<Rect>,
    last_details_area: Option<Rect>,
    last_debug_area: Option<Rect>,
    last_footer_area: Option<Rect>,
    affordance_columns: Option<Range<u16>>,
    mouse_down_row: Option<u16>,
    text_wrapping_enabled: bool,
    show_debug_logs: bool,
    show_help_popup: bool,
    display_event: Option<DisplayEvent>,
    last_poll_tick: Instant,
    last_live_tick: Instant,
}

#[derive(Copy, Clone)]
pub(super) enum ScrollableBlockType {
    Details,
    Debug,
}

// ============================================================================
// Initialization
// ============================================================================
impl<S: QueryStore> App<S> {
    fn new(source: Arc<dyn FeedSource>, store: S, desc: FeedDesc) -> Result<Self> {
        let debug_logs = match &desc.debug_logs {
            Some(lines) => Arc::clone(lines),
            None => ui_logger::init_logging(desc.log_file.as_deref(), desc.log_level)?,
        };

        let mut controller = ViewStateController::restore(store);
        if let Some(query) = &desc.initial_query {
            controller.apply_query(query);
        }

        let worker = FetchWorker::spawn(source)?;
        let engine = Engine::new(controller, desc.engine_desc());

        let live_block = AppBlock::new()
            .set_title("[0]─In progress")
            .set_accent(theme::LIVE_BORDER_COLOR);
        let feed_block = AppBlock::new().set_title("[1]─Feed");
        let details_block = AppBlock::new()
            .set_title("[2]─Details")
            .set_padding(ratatui::widgets::Padding::horizontal(1));
        let debug_block = AppBlock::new()
            .set_title("[3]─Debug Logs")
            .set_padding(ratatui::widgets::Padding::horizontal(1));

        let feed_block_id = feed_block.id();
        let now = Instant::now();

        Ok(Self {
            is_exiting: false,
            gesture: GestureDetector::new(desc.pull_threshold, desc.wheel_cooldown),
            show_debug_logs: desc.show_debug_logs,
            desc,
            engine,
            worker,
            feed_list: FeedList::new(),
            debug_logs,
            hard_focused_block_id: feed_block_id,
            live_block,
            feed_block,
            details_block,
            debug_block,
            prev_selected_index: None,
            last_feed_area: None,
            last_feed_content_area: None,
            last_details_area: None,
            last_debug_area: None,
            last_footer_area: None,
            affordance_columns: None,
            mouse_down_row: None,
            text_wrapping_enabled: true,
            show_help_popup: false,
            display_event: None,
            last_poll_tick: now,
            last_live_tick: now,
        })
    }
}

// ============================================================================
// Lifecycle
// ============================================================================
impl<S: QueryStore> App<S> {
    fn run(mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let effects = self.engine.start();
        self.apply_effects(effects);

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| -> Result<()> {
            while !self.is_exiting {
                self.poll_event(self.desc.event_poll_interval)?;
                self.drain_outcomes();
                self.fire_timers();
                self.check_and_clear_expired_event();
                terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            }
            Ok(())
        }));

        // stop the fetch worker before returning
        self.cleanup();

        match result {
            Ok(r) => r,
            Err(_) => Err(anyhow!("Application panicked")),
        }
    }

    fn cleanup(&mut self) {
        self.worker.stop();
    }

    fn poll_event(&mut self, poll_interval: Duration) -> Result<()> {
        if event::poll(poll_interval)? {
            match event::read()? {
                Event::Key(key) => self.handle_key(key)?,
                Event::Mouse(mouse) => self.handle_mouse_event(&mouse)?,
                Event::Resize(width, height) => {
                    log::debug!("Terminal resized to {}x{}", width, height);
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn fire_timers(&mut self) {
        if self.last_poll_tick.elapsed() >= self.desc.poll_interval {
            self.last_poll_tick = Instant::now();
            log::debug!("Poll timer fired");
            self.dispatch(FeedEvent::TimerTick);
        }

        if self.last_live_tick.elapsed() >= self.desc.live_interval {
            self.last_live_tick = Instant::now();
            self.dispatch(FeedEvent::LiveTick);
        }
    }
}

// ============================================================================
// Engine plumbing
// ============================================================================
impl<S: QueryStore> App<S> {
    fn dispatch(&mut self, event: FeedEvent) {
        let token = self.engine.session().token();
        let effects = self.engine.handle(event);

        if self.engine.session().token() != token {
            // a new session starts with an empty feed
            self.feed_list.reset();
            self.feed_block.reset_scroll();
            self.details_block.reset_scroll();
        }

        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(request) => self.worker.submit(request),
                Effect::ScrollToOrigin => self.scroll_to_origin(),
                Effect::RearmPollTimer => {
                    log::debug!("Poll timer re-armed");
                    self.last_poll_tick = Instant::now();
                }
            }
        }
    }

    fn drain_outcomes(&mut self) {
        while let Some(outcome) = self.worker.try_recv() {
            let is_page = matches!(outcome, FetchOutcome::Older { .. });
            let before = self.engine.rendered().len();

            self.dispatch(FeedEvent::Fetched(outcome));

            // keep paging while the viewport is not filled
            if is_page && self.engine.rendered().len() > before {
                self.check_near_bottom();
            }
        }
    }

    fn is_at_origin(&self) -> bool {
        self.feed_block.get_scroll_position() == 0
    }
}

// ============================================================================
// Focus management
// ============================================================================
impl<S: QueryStore> App<S> {
    fn set_hard_focused_block(&mut self, block_id: uuid::Uuid) {
        self.hard_focused_block_id = block_id;
    }

    fn is_mouse_in_area(mouse: &MouseEvent, area: Rect) -> bool {
        area.contains(Position::new(mouse.column, mouse.row))
    }

    fn get_block_under_mouse(&self, mouse: &MouseEvent) -> Option<uuid::Uuid> {
        [
            (self.last_feed_area, self.feed_block.id()),
            (self.last_details_area, self.details_block.id()),
            (self.last_debug_area, self.debug_block.id()),
        ]
        .into_iter()
        .find_map(|(area, id)| area.filter(|a| Self::is_mouse_in_area(mouse, *a)).map(|_| id))
    }
}

// ============================================================================
// Display events
// ============================================================================
impl<S: QueryStore> App<S> {
    /// Set a display event to show in the footer for a given duration
    fn set_display_event(&mut self, text: String) {
        self.display_event = Some(DisplayEvent::new(
            text,
            Duration::from_millis(DISPLAY_EVENT_DURATION_MS),
            theme::DISPLAY_EVENT_STYLE,
        ));
    }

    fn check_and_clear_expired_event(&mut self) {
        self.display_event = DisplayEvent::check_and_clear(self.display_event.take());
    }
}

// ============================================================================
// Widget implementation
// ============================================================================
impl<S: QueryStore> Widget for &mut App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (main_area, debug_area, footer_area) = if self.show_debug_logs {
            let [main, debug_area, footer_area] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(DEBUG_PANEL_HEIGHT),
                Constraint::Length(1),
            ])
            .areas(area);
            (main, Some(debug_area), footer_area)
        } else {
            let [main, footer_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
            (main, None, footer_area)
        };

        let [live_area, feed_area, details_area] = Layout::vertical([
            Constraint::Length(LIVE_PANEL_HEIGHT),
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .areas(main_area);

        self.render_live(live_area, buf);
        self.render_feed(feed_area, buf);
        self.render_details(details_area, buf);
        if let Some(debug_area) = debug_area {
            self.render_debug_logs(debug_area, buf);
        }
        self.render_footer(footer_area, buf);

        if self.show_help_popup {
            self.render_help_popup(area, buf);
        }
    }
}
