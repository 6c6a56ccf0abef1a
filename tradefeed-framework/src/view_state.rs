use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use url::form_urlencoded;

pub const TYPE_PARAM: &str = "type";
pub const GRANULARITY_PARAM: &str = "granularity";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {axis} '{value}'")]
pub struct UnknownValue {
    pub axis: &'static str,
    pub value: String,
}

/// Record filter applied to every page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    #[default]
    All,
    Trade,
    Portfolio,
}

impl MessageType {
    pub const VARIANTS: [MessageType; 3] = [Self::All, Self::Trade, Self::Portfolio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Trade => "trade",
            Self::Portfolio => "portfolio",
        }
    }

    /// next filter in display order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::VARIANTS.iter().position(|v| *v == self).unwrap_or(0);
        Self::VARIANTS[(idx + 1) % Self::VARIANTS.len()]
    }
}

impl FromStr for MessageType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VARIANTS
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownValue {
                axis: TYPE_PARAM,
                value: s.to_string(),
            })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time bucket the backend aggregates trades into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    #[default]
    FifteenMinutes,
    OneHour,
    OneDay,
}

impl Granularity {
    pub const VARIANTS: [Granularity; 3] = [Self::FifteenMinutes, Self::OneHour, Self::OneDay];

    pub fn token(&self) -> &'static str {
        match self {
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::VARIANTS.iter().position(|v| *v == self).unwrap_or(0);
        Self::VARIANTS[(idx + 1) % Self::VARIANTS.len()]
    }
}

impl FromStr for Granularity {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VARIANTS
            .into_iter()
            .find(|v| v.token().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownValue {
                axis: GRANULARITY_PARAM,
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The active filter and time bucket. One value per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub message_type: MessageType,
    pub granularity: Granularity,
}

impl ViewState {
    /// Reads `type` and `granularity` from a query string.
    ///
    /// Missing or unknown values fall back to the defaults; unrelated
    /// parameters are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        let query = query.trim().trim_start_matches('?');

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                TYPE_PARAM => match value.parse() {
                    Ok(message_type) => state.message_type = message_type,
                    Err(e) => log::warn!("Ignoring persisted view state: {}", e),
                },
                GRANULARITY_PARAM => match value.parse() {
                    Ok(granularity) => state.granularity = granularity,
                    Err(e) => log::warn!("Ignoring persisted view state: {}", e),
                },
                _ => {}
            }
        }

        state
    }

    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(TYPE_PARAM, self.message_type.as_str())
            .append_pair(GRANULARITY_PARAM, self.granularity.token())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read view state from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write view state to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Where the query-string form of the view state is persisted.
pub trait QueryStore: Send {
    /// Returns `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&mut self, query: &str) -> Result<(), StoreError>;
}

/// Persists the query string to a small text file.
pub struct FileQueryStore {
    path: PathBuf,
}

impl FileQueryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueryStore for FileQueryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&mut self, query: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, format!("{}\n", query)).map_err(write_err)
    }
}

/// Keeps the query string in memory; used when nothing should touch disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryStore {
    query: Option<String>,
    saves: usize,
}

impl MemoryQueryStore {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            saves: 0,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl QueryStore for MemoryQueryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.query.clone())
    }

    fn save(&mut self, query: &str) -> Result<(), StoreError> {
        self.query = Some(query.to_string());
        self.saves += 1;
        Ok(())
    }
}

/// Owns the active [`ViewState`] and keeps its persisted form in sync.
pub struct ViewStateController<S: QueryStore> {
    state: ViewState,
    store: S,
}

impl<S: QueryStore> ViewStateController<S> {
    /// Restores the view state from `store`, writing the defaults back when
    /// nothing was persisted.
    pub fn restore(store: S) -> Self {
        let persisted = match store.load() {
            Ok(query) => query,
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        let state = persisted
            .as_deref()
            .map(ViewState::from_query)
            .unwrap_or_default();

        let mut controller = Self { state, store };
        if persisted.is_none() {
            log::debug!("No persisted view state, writing defaults");
            controller.persist();
        }

        log::debug!("Restored view state: {}", controller.state.to_query());
        controller
    }

    /// Replaces the whole state from a query string, as if opened from a link.
    pub fn apply_query(&mut self, query: &str) -> ViewState {
        self.state = ViewState::from_query(query);
        self.persist();
        self.state
    }

    pub fn set_message_type(&mut self, message_type: MessageType) -> ViewState {
        self.state.message_type = message_type;
        self.persist();
        self.state
    }

    pub fn set_granularity(&mut self, granularity: Granularity) -> ViewState {
        self.state.granularity = granularity;
        self.persist();
        self.state
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.state.to_query()) {
            log::warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_defaults() {
        let state = ViewState::from_query("");
        assert_eq!(state.message_type, MessageType::All);
        assert_eq!(state.granularity, Granularity::FifteenMinutes);
    }

    #[test]
    fn test_from_query_reads_both_axes() {
        let state = ViewState::from_query("?type=portfolio&granularity=1d&page=3");
        assert_eq!(state.message_type, MessageType::Portfolio);
        assert_eq!(state.granularity, Granularity::OneDay);
    }

    #[test]
    fn test_from_query_unknown_values_fall_back() {
        let state = ViewState::from_query("type=dividends&granularity=5m");
        assert_eq!(state, ViewState::default());
    }

    #[test]
    fn test_to_query() {
        let state = ViewState {
            message_type: MessageType::Trade,
            granularity: Granularity::OneHour,
        };
        assert_eq!(state.to_query(), "type=trade&granularity=1h");
    }

    #[test]
    fn test_cycling_wraps() {
        assert_eq!(MessageType::Portfolio.next(), MessageType::All);
        assert_eq!(Granularity::OneDay.next(), Granularity::FifteenMinutes);
    }

    #[test]
    fn test_restore_writes_defaults_when_nothing_persisted() {
        let controller = ViewStateController::restore(MemoryQueryStore::default());
        assert_eq!(controller.state(), ViewState::default());
        assert_eq!(
            controller.store().query(),
            Some("type=all&granularity=15m")
        );
        assert_eq!(controller.store().saves(), 1);
    }

    #[test]
    fn test_restore_keeps_persisted_query_verbatim() {
        let store = MemoryQueryStore::with_query("type=trade&granularity=1h");
        let controller = ViewStateController::restore(store);
        assert_eq!(controller.state().message_type, MessageType::Trade);
        assert_eq!(controller.state().granularity, Granularity::OneHour);
        assert_eq!(controller.store().saves(), 0);
    }

    #[test]
    fn test_setters_persist() {
        let mut controller = ViewStateController::restore(MemoryQueryStore::default());
        controller.set_granularity(Granularity::OneDay);
        controller.set_message_type(MessageType::Portfolio);
        assert_eq!(
            controller.store().query(),
            Some("type=portfolio&granularity=1d")
        );
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("tradefeed-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("view.query");
        let mut store = FileQueryStore::new(&path);
        assert!(store.load().unwrap().is_none());

        store.save("type=trade&granularity=1h").unwrap();
        assert_eq!(
            store.load().unwrap().as_deref(),
            Some("type=trade&granularity=1h")
        );

        let _ = fs::remove_dir_all(dir);
    }
}
