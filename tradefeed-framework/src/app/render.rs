use super::{App, HELP_POPUP_WIDTH, ScrollableBlockType};
use crate::{
    content_line_maker::{
        WrappingMode, calculate_content_width, fragment_into_lines, styled_line, truncate_line,
    },
    formatter::format_record,
    status_bar::{StatusBar, StatusGravity},
    theme,
    view_state::QueryStore,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

const KIND_LABEL_WIDTH: usize = 9;

fn debug_line_style(line: &str) -> Style {
    if line.contains("[ERROR]") {
        theme::ERROR_STYLE
    } else if line.contains("[WARN]") {
        theme::WARN_STYLE
    } else if line.contains("[DEBUG]") || line.contains("[TRACE]") {
        theme::DEBUG_STYLE
    } else {
        theme::INFO_STYLE
    }
}

impl<S: QueryStore> App<S> {
    pub(super) fn render_live(&mut self, area: Rect, buf: &mut Buffer) {
        let slot = self.engine.live_slot();
        self.live_block
            .update_title(format!("[0]─In progress ({})", slot.granularity().token()));

        let line = match slot.record() {
            Some(record) => {
                let fragment = format_record(record);
                let mut spans = vec![
                    Span::styled("● ", theme::LIVE_STYLE),
                    Span::styled(format!("{} ", fragment.timestamp), theme::MUTED_FG_COLOR),
                    Span::styled(
                        format!("{:<width$} ", fragment.label, width = KIND_LABEL_WIDTH),
                        theme::kind_color(&record.kind),
                    ),
                ];
                if let Some(first) = fragment.lines.first() {
                    spans.extend(styled_line(first).spans);
                }
                Line::from(spans)
            }
            None => Line::from(Span::styled("nothing in progress", theme::MUTED_FG_COLOR)),
        };

        let block = self.live_block.build(false);
        let content_rect = block.inner(area);
        Paragraph::new(truncate_line(line, content_rect.width))
            .block(block)
            .fg(theme::TEXT_FG_COLOR)
            .render(area, buf);
    }

    fn feed_title(&self) -> String {
        let mut title = format!("[1]─Feed ({})", self.engine.rendered().len());
        if let Some(distance) = self.gesture.pull_distance() {
            if self.gesture.is_armed() {
                title.push_str(" ─ release to refresh");
            } else if distance > 0 {
                title.push_str(&format!(
                    " ─ pull {}/{}",
                    distance,
                    self.desc.pull_threshold
                ));
            }
        }
        title
    }

    pub(super) fn render_feed(&mut self, area: Rect, buf: &mut Buffer) {
        self.last_feed_area = Some(area);

        let title = self.feed_title();
        self.feed_block.update_title(title);
        let is_focused = self.hard_focused_block_id == self.feed_block.id();

        let [content_area, scrollbar_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let content_rect = self.feed_block.get_content_rect(content_area, is_focused);
        self.last_feed_content_area = Some(content_rect);

        let total = self.engine.rendered().len();
        let viewport = content_rect.height as usize;
        self.feed_list.clamp(total);

        // keep the viewport inside the list after a resize
        let max_position = total.saturating_sub(viewport);
        let scroll_position = self.feed_block.get_scroll_position().min(max_position);
        self.feed_block.set_scroll_position(scroll_position);
        self.feed_block.set_lines_count(total);
        self.feed_block.update_scrollbar_state(total, scroll_position);

        let selected = self.feed_list.selected();
        let lines: Vec<Line> = self
            .engine
            .rendered()
            .iter()
            .enumerate()
            .skip(scroll_position)
            .take(viewport)
            .map(|(i, record)| {
                let fragment = format_record(record);
                let mut spans = vec![
                    Span::raw(if selected == Some(i) { "▶ " } else { "  " }),
                    Span::styled(format!("{} ", fragment.timestamp), theme::MUTED_FG_COLOR),
                    Span::styled(
                        format!("{:<width$} ", fragment.label, width = KIND_LABEL_WIDTH),
                        theme::kind_color(&record.kind),
                    ),
                ];
                if let Some(first) = fragment.lines.first() {
                    spans.extend(styled_line(first).spans);
                }

                let line = truncate_line(Line::from(spans), content_rect.width);
                if selected == Some(i) {
                    line.style(theme::SELECTED_STYLE)
                } else {
                    line
                }
            })
            .collect();

        let lines = if lines.is_empty() {
            let placeholder = if self.engine.is_loading() {
                "loading…"
            } else {
                "no records"
            };
            vec![Line::from(Span::styled(placeholder, theme::MUTED_FG_COLOR))]
        } else {
            lines
        };

        Paragraph::new(lines)
            .block(self.feed_block.build(is_focused))
            .fg(theme::TEXT_FG_COLOR)
            .render(content_area, buf);

        let scrollbar = self.feed_block.create_scrollbar(is_focused);
        StatefulWidget::render(
            scrollbar,
            scrollbar_area,
            buf,
            self.feed_block.get_scrollbar_state(),
        );
    }

    /// Common rendering logic for scrollable blocks (details and debug logs)
    fn render_scrollable_block(
        &mut self,
        area: Rect,
        buf: &mut Buffer,
        block_type: ScrollableBlockType,
        content: Vec<Line<'static>>,
        max_content_width: usize,
    ) {
        match block_type {
            ScrollableBlockType::Details => self.last_details_area = Some(area),
            ScrollableBlockType::Debug => self.last_debug_area = Some(area),
        }

        let hard_focused = self.hard_focused_block_id;
        let block = match block_type {
            ScrollableBlockType::Details => &mut self.details_block,
            ScrollableBlockType::Debug => &mut self.debug_block,
        };
        let is_focused = hard_focused == block.id();

        let [vertical_content_area, scrollbar_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let [content_area, horizontal_scrollbar_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)])
                .areas(vertical_content_area);

        let content_rect = block.get_content_rect(content_area, is_focused);
        let needs_horizontal_scrollbar = max_content_width > content_rect.width as usize;

        let lines_count = content.len();
        block.update_horizontal_scrollbar_state(max_content_width, content_rect.width as usize);
        block.set_lines_count(lines_count);
        let scroll_position = block.get_scroll_position().min(lines_count.saturating_sub(1));
        block.set_scroll_position(scroll_position);
        block.update_scrollbar_state(lines_count, scroll_position);

        let h_scroll = if needs_horizontal_scrollbar {
            block.get_horizontal_scroll_position() as u16
        } else {
            0
        };

        Paragraph::new(content)
            .block(block.build(is_focused))
            .fg(theme::TEXT_FG_COLOR)
            .scroll((scroll_position as u16, h_scroll))
            .render(content_area, buf);

        let scrollbar = block.create_scrollbar(is_focused);
        StatefulWidget::render(scrollbar, scrollbar_area, buf, block.get_scrollbar_state());

        let horizontal_scrollbar =
            block.create_horizontal_scrollbar(is_focused, needs_horizontal_scrollbar);
        StatefulWidget::render(
            horizontal_scrollbar,
            horizontal_scrollbar_area,
            buf,
            block.get_horizontal_scrollbar_state(),
        );
    }

    pub(super) fn render_details(&mut self, area: Rect, buf: &mut Buffer) {
        let selected = self.feed_list.selected();
        if selected != self.prev_selected_index {
            self.prev_selected_index = selected;
            self.details_block.reset_scroll();
        }

        let Some(record) = selected.and_then(|i| self.engine.rendered().get(i)) else {
            let placeholder = vec![Line::from(Span::styled(
                "select a record to see its details",
                theme::MUTED_FG_COLOR,
            ))];
            self.render_scrollable_block(area, buf, ScrollableBlockType::Details, placeholder, 0);
            return;
        };

        let fragment = format_record(record);
        let label = |name: &str| Span::styled(format!("{:<8}", name), theme::MUTED_FG_COLOR);

        let mut content = vec![
            Line::from(vec![label("Time"), Span::raw(fragment.timestamp.clone())]),
            Line::from(vec![
                label("Kind"),
                Span::styled(fragment.label.clone(), theme::kind_color(&record.kind)),
            ]),
            Line::from(vec![
                label("Status"),
                Span::raw(if fragment.in_progress { "in progress" } else { "final" }),
            ]),
        ];
        if let Some(id) = &record.id {
            content.push(Line::from(vec![label("Id"), Span::raw(id.clone())]));
        }
        for (key, value) in &record.metadata {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            content.push(Line::from(vec![label(key.as_str()), Span::raw(value)]));
        }
        content.push(Line::from(""));

        // width of the paragraph inside borders, padding and both scrollbars
        let text_width = area.width.saturating_sub(4);
        let (mode, max_content_width) = if self.text_wrapping_enabled {
            (WrappingMode::Wrapped, 0)
        } else {
            (
                WrappingMode::Unwrapped,
                calculate_content_width(&fragment.lines),
            )
        };
        content.extend(fragment_into_lines(&fragment.lines, text_width, mode));

        self.render_scrollable_block(
            area,
            buf,
            ScrollableBlockType::Details,
            content,
            max_content_width,
        );
    }

    pub(super) fn render_debug_logs(&mut self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<String> = match self.debug_logs.lock() {
            Ok(logs) => logs.iter().cloned().collect(),
            Err(_) => vec!["debug log buffer unavailable".to_string()],
        };

        let max_content_width = lines
            .iter()
            .map(|l| unicode_width::UnicodeWidthStr::width(l.as_str()))
            .max()
            .unwrap_or(0);

        // follow the tail unless the user scrolled away from it
        let at_tail = self.debug_block.get_scroll_position() + 1
            >= self.debug_block.get_lines_count();
        if at_tail {
            self.debug_block.set_scroll_position(lines.len().saturating_sub(1));
        }

        let content = lines
            .into_iter()
            .map(|line| {
                let style = debug_line_style(&line);
                Line::from(Span::styled(line, style))
            })
            .collect();

        self.render_scrollable_block(
            area,
            buf,
            ScrollableBlockType::Debug,
            content,
            max_content_width,
        );
    }

    pub(super) fn render_footer(&mut self, area: Rect, buf: &mut Buffer) {
        self.last_footer_area = Some(area);
        let view = self.engine.view_state();

        let mut status_bar = StatusBar::new()
            .add_status(
                StatusGravity::Left,
                format!("type: {}", view.message_type.as_str()),
                Style::new().fg(theme::MUTED_FG_COLOR),
            )
            .add_status(
                StatusGravity::Left,
                format!("granularity: {}", view.granularity.token()),
                Style::new().fg(theme::MUTED_FG_COLOR),
            );

        let pending = self.engine.pending_count();
        let showing_affordance = self.display_event.is_none() && pending > 0;
        status_bar = if let Some(event) = &self.display_event {
            status_bar.add_status(StatusGravity::Mid, event.text.clone(), event.style)
        } else if showing_affordance {
            status_bar.add_status(
                StatusGravity::Mid,
                affordance_label(pending),
                theme::AFFORDANCE_STYLE,
            )
        } else {
            status_bar.add_status_plain(StatusGravity::Mid, "?: help | q: quit")
        };

        if self.engine.is_loading() {
            status_bar = status_bar.add_status(StatusGravity::Right, "loading…", theme::WARN_STYLE);
        } else if !self.engine.has_more() {
            status_bar = status_bar.add_status(
                StatusGravity::Right,
                "end of history",
                Style::new().fg(theme::MUTED_FG_COLOR),
            );
        }
        status_bar = status_bar.add_status(
            StatusGravity::Right,
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::new().fg(theme::MUTED_FG_COLOR),
        );

        self.affordance_columns = if showing_affordance {
            status_bar.mid_columns(area)
        } else {
            None
        };

        status_bar.render(area, buf);
    }

    pub(super) fn render_help_popup(&self, area: Rect, buf: &mut Buffer) {
        let help_text = vec![
            Line::from("Navigation:".bold()),
            Line::from("  j/k/↑/↓  - Move to older/newer record"),
            Line::from("  h/l/←/→  - Scroll focused panel sideways"),
            Line::from("  Home     - Back to the newest record"),
            Line::from(""),
            Line::from("Feed:".bold()),
            Line::from("  n/Enter  - Show new records"),
            Line::from("  r        - Check for new records"),
            Line::from("  Tab      - Cycle message type"),
            Line::from("  g        - Cycle granularity"),
            Line::from("  drag ↓   - Pull at the top to refresh"),
            Line::from(""),
            Line::from("Actions:".bold()),
            Line::from("  y        - Copy selected record to clipboard"),
            Line::from("  w        - Toggle text wrapping"),
            Line::from("  b        - Toggle debug logs"),
            Line::from("  q        - Quit program"),
            Line::from(""),
            Line::from("Focus:".bold()),
            Line::from("  1/2/3        - Focus feed/details/debug"),
            Line::from("  Shift+scroll - Horizontal scroll with mouse"),
        ];

        let popup_height = help_text.len() as u16 + 2;

        let popup_area = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(popup_height),
            Constraint::Fill(1),
        ])
        .split(area)[1];

        let popup_area = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(HELP_POPUP_WIDTH),
            Constraint::Fill(1),
        ])
        .split(popup_area)[1];

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER_COLOR));

        Paragraph::new(help_text)
            .block(block)
            .fg(theme::TEXT_FG_COLOR)
            .render(popup_area, buf);
    }
}

/// Footer badge shown while new records are buffered.
pub(super) fn affordance_label(pending: usize) -> String {
    format!(" ▲ {} new · press n ", pending)
}
