//! Logging for a full-screen UI: records go to the debug panel instead of
//! stderr, and optionally to a file.

use anyhow::Result;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{CombinedLogger, Config, ConfigBuilder, SharedLogger, WriteLogger};
use std::{
    collections::VecDeque,
    fs::File,
    path::Path,
    sync::{Arc, Mutex},
};

pub const DEFAULT_DEBUG_LOG_CAPACITY: usize = 1000;

/// Lines shown in the debug panel, oldest first.
pub type DebugLogs = Arc<Mutex<VecDeque<String>>>;

pub struct UiLogger {
    lines: DebugLogs,
    capacity: usize,
    level: LevelFilter,
    config: Config,
}

impl UiLogger {
    pub fn new(lines: DebugLogs, capacity: usize, level: LevelFilter) -> Self {
        Self {
            lines,
            capacity,
            level,
            config: Config::default(),
        }
    }

    fn format(record: &Record) -> String {
        format!(
            "{} [{}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    }
}

impl Log for UiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(Self::format(record));
        }
    }

    fn flush(&self) {}
}

impl SharedLogger for UiLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

/// Installs the process-wide logger: the debug panel, plus `log_file` when given.
///
/// Returns the panel's line buffer. If a logger is already installed the
/// buffer stays empty.
pub fn init_logging(log_file: Option<&Path>, level: LevelFilter) -> Result<DebugLogs> {
    let lines: DebugLogs = Arc::new(Mutex::new(VecDeque::new()));
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![Box::new(UiLogger::new(
        lines.clone(),
        DEFAULT_DEBUG_LOG_CAPACITY,
        level,
    ))];

    if let Some(path) = log_file {
        let config = ConfigBuilder::new().set_time_format_rfc3339().build();
        loggers.push(WriteLogger::new(level, config, File::create(path)?));
    }

    if CombinedLogger::init(loggers).is_err() {
        log::debug!("Logger already installed, debug panel stays empty");
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn emit(logger: &UiLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn test_lines_are_bounded() {
        let lines: DebugLogs = Arc::default();
        let logger = UiLogger::new(lines.clone(), 2, LevelFilter::Debug);
        emit(&logger, Level::Info, "one");
        emit(&logger, Level::Warn, "two");
        emit(&logger, Level::Error, "three");

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[WARN] two"));
        assert!(lines[1].ends_with("[ERROR] three"));
    }

    #[test]
    fn test_level_filter() {
        let lines: DebugLogs = Arc::default();
        let logger = UiLogger::new(lines.clone(), 10, LevelFilter::Info);
        emit(&logger, Level::Debug, "hidden");
        emit(&logger, Level::Info, "shown");
        assert_eq!(lines.lock().unwrap().len(), 1);
    }
}
