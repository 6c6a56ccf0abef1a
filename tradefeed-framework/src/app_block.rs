use crate::theme;
use ratatui::{
    layout::Rect,
    prelude::Stylize,
    style::{Color, Style},
    symbols::scrollbar,
    widgets::{
        Block, BorderType, Borders, Padding, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
};
use uuid::Uuid;

fn brighten_color(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(10),
            g.saturating_add(10),
            b.saturating_add(10),
        ),
        Color::Gray => Color::White,
        Color::Yellow => Color::LightYellow,
        c => c,
    }
}

pub fn get_border_color(focused: bool, accent: Color) -> Color {
    if focused {
        brighten_color(accent)
    } else {
        accent
    }
}

/// A titled panel with its own scroll state.
pub struct AppBlock {
    id: Uuid,
    title: Option<String>,
    accent: Color,
    lines_count: usize,
    scroll_position: usize,
    scrollbar_state: ScrollbarState,
    padding: Option<Padding>,
    horizontal_scroll_position: usize,
    horizontal_scrollbar_state: ScrollbarState,
    content_width: usize,
}

impl AppBlock {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: None,
            accent: theme::BORDER_COLOR,
            lines_count: 0,
            scroll_position: 0,
            scrollbar_state: ScrollbarState::default(),
            padding: None,
            horizontal_scroll_position: 0,
            horizontal_scrollbar_state: ScrollbarState::default(),
            content_width: 0,
        }
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.update_title(title);
        self
    }

    pub fn set_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn set_accent(mut self, accent: Color) -> Self {
        self.accent = accent;
        self
    }

    pub fn update_title(&mut self, title: impl Into<String>) {
        self.title = Some(format!("─{}", title.into()));
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn build(&self, focused: bool) -> Block<'_> {
        let mut block = Block::default()
            .borders(Borders::TOP | Borders::LEFT)
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(get_border_color(focused, self.accent)));

        if let Some(title) = &self.title {
            let title_style = if focused {
                Style::new().bold()
            } else {
                Style::new()
            };
            block = block.title(
                ratatui::prelude::Line::from(title.as_str())
                    .style(title_style)
                    .left_aligned(),
            );
        }

        if let Some(padding) = self.padding {
            block = block.padding(padding);
        }

        block
    }

    pub fn update_scrollbar_state(&mut self, total_items: usize, position: usize) {
        if total_items > 0 {
            self.scrollbar_state = self
                .scrollbar_state
                .content_length(total_items)
                .position(position);
        } else {
            // full-height thumb when there is nothing to scroll
            self.scrollbar_state = self.scrollbar_state.content_length(1).position(0);
        }
    }

    pub fn set_lines_count(&mut self, lines_count: usize) {
        self.lines_count = lines_count;
    }

    pub fn get_lines_count(&self) -> usize {
        self.lines_count
    }

    pub fn set_scroll_position(&mut self, scroll_position: usize) {
        self.scroll_position = scroll_position;
    }

    pub fn get_scroll_position(&self) -> usize {
        self.scroll_position
    }

    /// Moves one line up or down within `[0, lines_count - 1]`.
    pub fn scroll_by_line(&mut self, down: bool) {
        let last_index = self.lines_count.saturating_sub(1);
        let position = if down {
            self.scroll_position.saturating_add(1).min(last_index)
        } else {
            self.scroll_position.saturating_sub(1)
        };
        self.scroll_position = position;
        self.update_scrollbar_state(self.lines_count, position);
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_position = 0;
        self.horizontal_scroll_position = 0;
    }

    pub fn get_scrollbar_state(&mut self) -> &mut ScrollbarState {
        &mut self.scrollbar_state
    }

    pub fn set_horizontal_scroll_position(&mut self, position: usize) {
        self.horizontal_scroll_position = position;
    }

    pub fn get_horizontal_scroll_position(&self) -> usize {
        self.horizontal_scroll_position
    }

    pub fn get_content_width(&self) -> usize {
        self.content_width
    }

    pub fn update_horizontal_scrollbar_state(
        &mut self,
        content_width: usize,
        viewport_width: usize,
    ) {
        self.content_width = content_width;
        if content_width > viewport_width {
            let max_scroll = content_width.saturating_sub(viewport_width);
            let position = self.horizontal_scroll_position.min(max_scroll);
            self.horizontal_scroll_position = position;
            self.horizontal_scrollbar_state = self
                .horizontal_scrollbar_state
                .content_length(max_scroll)
                .position(position);
        } else {
            self.horizontal_scroll_position = 0;
            self.horizontal_scrollbar_state = self
                .horizontal_scrollbar_state
                .content_length(1)
                .position(0);
        }
    }

    pub fn get_horizontal_scrollbar_state(&mut self) -> &mut ScrollbarState {
        &mut self.horizontal_scrollbar_state
    }

    pub fn create_scrollbar(&self, focused: bool) -> Scrollbar<'static> {
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(scrollbar::VERTICAL)
            .style(Style::default().fg(get_border_color(focused, self.accent)))
            .begin_symbol(Some("╮"))
            .end_symbol(Some("╯"))
            .track_symbol(Some("│"))
            .thumb_symbol("█")
    }

    /// Horizontal scrollbar; the thumb is hidden when nothing overflows.
    pub fn create_horizontal_scrollbar(
        &self,
        focused: bool,
        overflowing: bool,
    ) -> Scrollbar<'static> {
        Scrollbar::new(ScrollbarOrientation::HorizontalBottom)
            .symbols(scrollbar::HORIZONTAL)
            .style(Style::default().fg(get_border_color(focused, self.accent)))
            .begin_symbol(Some("╰"))
            .end_symbol(Some("─"))
            .track_symbol(Some("─"))
            .thumb_symbol(if overflowing { "🬋" } else { "─" })
    }

    /// Returns the content rectangle accounting for block borders
    pub fn get_content_rect(&self, area: Rect, focused: bool) -> Rect {
        self.build(focused).inner(area)
    }
}

impl Default for AppBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_by_line_is_clamped() {
        let mut block = AppBlock::new();
        block.set_lines_count(3);
        block.scroll_by_line(false);
        assert_eq!(block.get_scroll_position(), 0);
        for _ in 0..5 {
            block.scroll_by_line(true);
        }
        assert_eq!(block.get_scroll_position(), 2);
    }

    #[test]
    fn test_content_rect_excludes_top_and_left_border() {
        let block = AppBlock::new().set_title("Feed");
        let inner = block.get_content_rect(Rect::new(0, 0, 20, 10), false);
        assert_eq!(inner, Rect::new(1, 1, 19, 9));
    }

    #[test]
    fn test_horizontal_position_clamped_to_overflow() {
        let mut block = AppBlock::new();
        block.set_horizontal_scroll_position(50);
        block.update_horizontal_scrollbar_state(30, 20);
        assert_eq!(block.get_horizontal_scroll_position(), 10);
        block.update_horizontal_scrollbar_state(10, 20);
        assert_eq!(block.get_horizontal_scroll_position(), 0);
    }
}
