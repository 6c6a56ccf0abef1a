use ratatui::{
    prelude::*,
    widgets::{Paragraph, Widget},
};
use std::{
    ops::Range,
    time::{Duration, Instant},
};

/// A transient footer message (e.g. "copied to clipboard").
pub struct DisplayEvent {
    pub text: String,
    pub duration: Duration,
    pub start_time: Instant,
    pub style: Style,
}

impl DisplayEvent {
    pub fn new(text: String, duration: Duration, style: Style) -> Self {
        Self {
            text,
            duration,
            start_time: Instant::now(),
            style,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.start_time.elapsed() >= self.duration
    }

    pub fn check_and_clear(event: Option<Self>) -> Option<Self> {
        match event {
            Some(e) if e.is_expired() => None,
            other => other,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StatusGravity {
    Left,
    Mid,
    Right,
}

struct StatusSegment {
    text: String,
    style: Style,
}

const SEPARATOR: &str = " | ";

/// One-line footer with left, centered and right-aligned segments.
pub struct StatusBar {
    left_segments: Vec<StatusSegment>,
    mid_segments: Vec<StatusSegment>,
    right_segments: Vec<StatusSegment>,
    style: Option<Style>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            left_segments: Vec::new(),
            mid_segments: Vec::new(),
            right_segments: Vec::new(),
            style: None,
        }
    }

    pub fn add_status(
        mut self,
        gravity: StatusGravity,
        text: impl Into<String>,
        style: Style,
    ) -> Self {
        let segment = StatusSegment {
            text: text.into(),
            style,
        };
        match gravity {
            StatusGravity::Left => self.left_segments.push(segment),
            StatusGravity::Mid => self.mid_segments.push(segment),
            StatusGravity::Right => self.right_segments.push(segment),
        }
        self
    }

    pub fn add_status_plain(self, gravity: StatusGravity, text: impl Into<String>) -> Self {
        self.add_status(gravity, text, Style::new())
    }

    pub fn set_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    fn segments_len(segments: &[StatusSegment]) -> usize {
        let text: usize = segments.iter().map(|s| s.text.chars().count()).sum();
        text + SEPARATOR.len() * segments.len().saturating_sub(1)
    }

    fn mid_start(&self, total_width: usize) -> usize {
        total_width.saturating_sub(Self::segments_len(&self.mid_segments)) / 2
    }

    /// Columns covered by the centered segments when drawn into `area`.
    pub fn mid_columns(&self, area: Rect) -> Option<Range<u16>> {
        let mid_len = Self::segments_len(&self.mid_segments);
        if mid_len == 0 {
            return None;
        }
        let start = area.x as usize + self.mid_start(area.width as usize);
        let end = (start + mid_len).min(area.x as usize + area.width as usize);
        Some(start as u16..end as u16)
    }

    fn build_gravity_spans(segments: &[StatusSegment]) -> Vec<Span<'_>> {
        let mut spans = Vec::new();
        for (i, seg) in segments.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(SEPARATOR));
            }
            spans.push(Span::styled(seg.text.as_str(), seg.style));
        }
        spans
    }

    pub fn render(self, area: Rect, buf: &mut Buffer) {
        let total_width = area.width as usize;

        let left_len = Self::segments_len(&self.left_segments);
        let mid_len = Self::segments_len(&self.mid_segments);
        let right_len = Self::segments_len(&self.right_segments);

        let mid_center_start = self.mid_start(total_width);
        let left_to_mid_padding = mid_center_start.saturating_sub(left_len);

        let right_start = total_width.saturating_sub(right_len);
        let mid_end = mid_center_start.max(left_len) + mid_len;
        let mid_to_right_padding = right_start.saturating_sub(mid_end);

        let mut spans = Self::build_gravity_spans(&self.left_segments);
        spans.push(Span::raw(" ".repeat(left_to_mid_padding)));
        spans.extend(Self::build_gravity_spans(&self.mid_segments));
        spans.push(Span::raw(" ".repeat(mid_to_right_padding)));
        spans.extend(Self::build_gravity_spans(&self.right_segments));

        let paragraph = Paragraph::new(Line::from(spans)).style(self.style.unwrap_or_default());
        paragraph.render(area, buf);
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_row(bar: StatusBar, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_segments_are_placed_by_gravity() {
        let bar = StatusBar::new()
            .add_status_plain(StatusGravity::Left, "L")
            .add_status_plain(StatusGravity::Mid, "MID")
            .add_status_plain(StatusGravity::Right, "R");
        assert_eq!(rendered_row(bar, 11), "L   MID   R");
    }

    #[test]
    fn test_mid_columns_match_rendered_position() {
        let bar = StatusBar::new().add_status_plain(StatusGravity::Mid, "▲ 2 new");
        let columns = bar.mid_columns(Rect::new(0, 5, 21, 1)).unwrap();
        assert_eq!(columns, 7..14);
    }

    #[test]
    fn test_no_mid_columns_without_mid_segments() {
        let bar = StatusBar::new().add_status_plain(StatusGravity::Left, "x");
        assert_eq!(bar.mid_columns(Rect::new(0, 0, 10, 1)), None);
    }

    #[test]
    fn test_display_event_expiry() {
        let event = DisplayEvent::new("hi".into(), Duration::ZERO, Style::new());
        assert!(DisplayEvent::check_and_clear(Some(event)).is_none());

        let event = DisplayEvent::new("hi".into(), Duration::from_secs(60), Style::new());
        assert!(DisplayEvent::check_and_clear(Some(event)).is_some());
    }
}
