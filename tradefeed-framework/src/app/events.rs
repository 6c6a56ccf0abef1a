use super::{App, ScrollableBlockType};
use crate::{
    engine::{FeedEvent, FilterChange},
    formatter::format_record,
    gesture::PointerSample,
    view_state::QueryStore,
};
use anyhow::Result;
use arboard::Clipboard;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Instant;

impl<S: QueryStore> App<S> {
    pub(super) fn handle_mouse_event(&mut self, mouse: &MouseEvent) -> Result<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.is_affordance_click(mouse) {
                    log::debug!("Footer affordance clicked");
                    self.dispatch(FeedEvent::CommitRequested);
                    return Ok(());
                }

                if let Some(block_id) = self.get_block_under_mouse(mouse) {
                    self.set_hard_focused_block(block_id);
                }

                if self.is_in_feed(mouse) {
                    self.mouse_down_row = Some(mouse.row);
                    self.feed_pointer(PointerSample::Down {
                        y: self.gesture_units(mouse.row),
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.feed_pointer(PointerSample::Move {
                    y: self.gesture_units(mouse.row),
                });
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let fired = self.feed_pointer(PointerSample::Up);
                if !fired && self.mouse_down_row.take() == Some(mouse.row) {
                    self.select_row_under_mouse(mouse);
                }
                self.mouse_down_row = None;
            }
            MouseEventKind::ScrollDown => {
                if let Some(block_under_mouse) = self.get_block_under_mouse(mouse) {
                    if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                        self.handle_horizontal_scrolling(block_under_mouse, true)?;
                    } else if block_under_mouse == self.feed_block.id() {
                        self.handle_feed_view_scrolling(true)?;
                    } else if block_under_mouse == self.details_block.id() {
                        self.handle_block_scrolling(ScrollableBlockType::Details, true)?;
                    } else if block_under_mouse == self.debug_block.id() {
                        self.handle_block_scrolling(ScrollableBlockType::Debug, true)?;
                    }
                }
            }
            MouseEventKind::ScrollUp => {
                if let Some(block_under_mouse) = self.get_block_under_mouse(mouse) {
                    if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                        self.handle_horizontal_scrolling(block_under_mouse, false)?;
                    } else if block_under_mouse == self.feed_block.id() {
                        if self.is_at_origin() {
                            self.feed_pointer(PointerSample::Wheel { delta_y: -1 });
                        } else {
                            self.handle_feed_view_scrolling(false)?;
                        }
                    } else if block_under_mouse == self.details_block.id() {
                        self.handle_block_scrolling(ScrollableBlockType::Details, false)?;
                    } else if block_under_mouse == self.debug_block.id() {
                        self.handle_block_scrolling(ScrollableBlockType::Debug, false)?;
                    }
                }
            }
            MouseEventKind::ScrollLeft => {
                if let Some(block_under_mouse) = self.get_block_under_mouse(mouse) {
                    self.handle_horizontal_scrolling(block_under_mouse, false)?;
                }
            }
            MouseEventKind::ScrollRight => {
                if let Some(block_under_mouse) = self.get_block_under_mouse(mouse) {
                    self.handle_horizontal_scrolling(block_under_mouse, true)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Feeds one pointer sample to the gesture detector; true if it fired.
    fn feed_pointer(&mut self, sample: PointerSample) -> bool {
        let at_origin = self.is_at_origin();
        match self.gesture.feed(sample, at_origin, Instant::now()) {
            Some(event) => {
                log::debug!("Gesture fired: {:?}", event);
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    fn gesture_units(&self, row: u16) -> i32 {
        row as i32 * self.desc.units_per_row
    }

    fn is_in_feed(&self, mouse: &MouseEvent) -> bool {
        self.last_feed_area
            .is_some_and(|area| Self::is_mouse_in_area(mouse, area))
    }

    fn is_affordance_click(&self, mouse: &MouseEvent) -> bool {
        if !self.engine.has_pending() {
            return false;
        }
        let in_footer = self
            .last_footer_area
            .is_some_and(|area| Self::is_mouse_in_area(mouse, area));
        in_footer
            && self
                .affordance_columns
                .as_ref()
                .is_some_and(|columns| columns.contains(&mouse.column))
    }

    fn select_row_under_mouse(&mut self, mouse: &MouseEvent) {
        let Some(area) = self.last_feed_content_area else {
            return;
        };
        if !Self::is_mouse_in_area(mouse, area) {
            return;
        }

        let row = self.feed_block.get_scroll_position() + (mouse.row - area.y) as usize;
        if row < self.engine.rendered().len() {
            self.feed_list.select(Some(row));
            self.details_block.reset_scroll();
        }
    }

    pub(super) fn yank_selected_record(&mut self) -> Result<()> {
        let Some(record) = self
            .feed_list
            .selected()
            .and_then(|i| self.engine.rendered().get(i))
        else {
            log::debug!("No record selected for yanking");
            return Ok(());
        };

        let fragment = format_record(record);
        let yank_content = format!(
            "{} [{}] {}",
            fragment.timestamp,
            fragment.label,
            fragment.plain_text()
        );

        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(&yank_content)?;

        log::debug!("Copied {} chars to clipboard", yank_content.len());
        self.set_display_event("Record copied to clipboard".to_string());

        Ok(())
    }

    fn cycle_message_type(&mut self) {
        let next = self.engine.view_state().message_type.next();
        self.dispatch(FeedEvent::FilterChanged(FilterChange::MessageType(next)));
        self.set_display_event(format!("Type: {}", next.as_str()));
    }

    fn cycle_granularity(&mut self) {
        let next = self.engine.view_state().granularity.next();
        self.dispatch(FeedEvent::FilterChanged(FilterChange::Granularity(next)));
        self.set_display_event(format!("Granularity: {}", next.token()));
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // help popup mode has higher priority
        if self.show_help_popup {
            match key.code {
                KeyCode::Char('?') | KeyCode::Esc => {
                    self.show_help_popup = false;
                    return Ok(());
                }
                KeyCode::Char('q') => {}
                _ => return Ok(()),
            }
        }

        match key.code {
            KeyCode::Char('q') => {
                log::debug!("Quit key pressed");
                self.is_exiting = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.is_exiting = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let focused = self.hard_focused_block_id;
                if focused == self.details_block.id() {
                    self.handle_block_scrolling(ScrollableBlockType::Details, true)?;
                } else if focused == self.debug_block.id() {
                    self.handle_block_scrolling(ScrollableBlockType::Debug, true)?;
                } else {
                    self.handle_feed_selection(true)?;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let focused = self.hard_focused_block_id;
                if focused == self.details_block.id() {
                    self.handle_block_scrolling(ScrollableBlockType::Details, false)?;
                } else if focused == self.debug_block.id() {
                    self.handle_block_scrolling(ScrollableBlockType::Debug, false)?;
                } else {
                    self.handle_feed_selection(false)?;
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.handle_horizontal_scrolling(self.hard_focused_block_id, false)?;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.handle_horizontal_scrolling(self.hard_focused_block_id, true)?;
            }
            KeyCode::Home => self.scroll_to_origin(),
            KeyCode::Char('n') | KeyCode::Enter => {
                self.dispatch(FeedEvent::CommitRequested);
            }
            KeyCode::Char('r') => {
                self.dispatch(FeedEvent::RefreshRequested);
            }
            KeyCode::Tab => self.cycle_message_type(),
            KeyCode::Char('g') => self.cycle_granularity(),
            KeyCode::Char('y') => self.yank_selected_record()?,
            KeyCode::Char('w') => {
                self.text_wrapping_enabled = !self.text_wrapping_enabled;
                self.details_block.set_horizontal_scroll_position(0);
                self.set_display_event(format!(
                    "Wrapping {}",
                    if self.text_wrapping_enabled { "on" } else { "off" }
                ));
            }
            KeyCode::Char('b') => {
                self.show_debug_logs = !self.show_debug_logs;
                if !self.show_debug_logs && self.hard_focused_block_id == self.debug_block.id() {
                    self.set_hard_focused_block(self.feed_block.id());
                }
            }
            KeyCode::Char('1') => self.set_hard_focused_block(self.feed_block.id()),
            KeyCode::Char('2') => self.set_hard_focused_block(self.details_block.id()),
            KeyCode::Char('3') if self.show_debug_logs => {
                self.set_hard_focused_block(self.debug_block.id())
            }
            KeyCode::Char('?') => self.show_help_popup = true,
            _ => {}
        }
        Ok(())
    }
}
