//! Pure record → display transform.

use crate::record::{Record, RecordKind};
use lazy_static::lazy_static;
use regex::Regex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref MARKUP_RE: Regex = Regex::new(
        r"(?P<ticker>\$[A-Z][A-Z0-9]{0,5}(?:\.[A-Z]{1,2})?)|(?i:\b(?P<buy>buy|bought)\b)|(?i:\b(?P<sell>sell|sold)\b)"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    None,
    Ticker,
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Segment {
    fn new(text: &str, emphasis: Emphasis) -> Self {
        Self {
            text: text.to_string(),
            emphasis,
        }
    }
}

/// A record ready for display. Building one never touches the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFragment {
    pub label: String,
    pub timestamp: String,
    pub in_progress: bool,
    /// one entry per visual line
    pub lines: Vec<Vec<Segment>>,
}

impl DisplayFragment {
    /// The body without markup, lines joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First line only, for single-row list entries.
    pub fn headline(&self) -> String {
        self.lines
            .first()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect())
            .unwrap_or_default()
    }
}

pub fn display_label(kind: &RecordKind) -> String {
    match kind {
        RecordKind::Trade => "trade".to_string(),
        RecordKind::Portfolio => "portfolio".to_string(),
        RecordKind::Other(code) => code.to_lowercase(),
    }
}

pub fn format_record(record: &Record) -> DisplayFragment {
    let body = sanitize_control_chars(&record.content);
    DisplayFragment {
        label: display_label(&record.kind),
        timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        in_progress: record.is_in_progress(),
        lines: body.split('\n').map(markup_line).collect(),
    }
}

fn markup_line(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MARKUP_RE.captures_iter(line) {
        let (m, emphasis) = if let Some(m) = caps.name("ticker") {
            (m, Emphasis::Ticker)
        } else if let Some(m) = caps.name("buy") {
            (m, Emphasis::Buy)
        } else if let Some(m) = caps.name("sell") {
            (m, Emphasis::Sell)
        } else {
            continue;
        };

        if m.start() > last {
            segments.push(Segment::new(&line[last..m.start()], Emphasis::None));
        }
        segments.push(Segment::new(m.as_str(), emphasis));
        last = m.end();
    }

    if last < line.len() || segments.is_empty() {
        segments.push(Segment::new(&line[last..], Emphasis::None));
    }
    segments
}

/// Drops ANSI CSI sequences and control characters except newlines; tabs
/// become a single space.
pub fn sanitize_control_chars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&ch) = chars.peek() {
                    chars.next();
                    if ch.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        match c {
            '\n' => result.push(c),
            '\t' => result.push(' '),
            c if c.is_control() => {}
            c => result.push(c),
        }
    }

    result
}
