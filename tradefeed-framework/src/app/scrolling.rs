use super::{App, HORIZONTAL_SCROLL_STEP, SCROLL_PAD, ScrollableBlockType};
use crate::{engine::FeedEvent, feed_list::is_near_bottom, view_state::QueryStore};
use anyhow::Result;
use ratatui::prelude::*;

impl<S: QueryStore> App<S> {
    pub(super) fn feed_viewport_height(&self) -> usize {
        self.last_feed_content_area
            .map(|area| area.height as usize)
            .unwrap_or(0)
    }

    pub(super) fn handle_feed_selection(&mut self, move_next: bool) -> Result<()> {
        let len = self.engine.rendered().len();
        if move_next {
            self.feed_list.select_next(len);
        } else {
            self.feed_list.select_previous(len);
        }

        self.ensure_selection_visible();
        if move_next {
            self.check_near_bottom();
        }
        Ok(())
    }

    pub(super) fn handle_feed_view_scrolling(&mut self, move_down: bool) -> Result<()> {
        let total = self.engine.rendered().len();
        let viewport = self.feed_viewport_height();
        let max_position = total.saturating_sub(viewport);
        let current_position = self.feed_block.get_scroll_position();

        let new_position = if move_down {
            current_position.saturating_add(1).min(max_position)
        } else {
            current_position.saturating_sub(1)
        };

        self.feed_block.set_scroll_position(new_position);
        self.feed_block.update_scrollbar_state(total, new_position);

        if move_down {
            self.check_near_bottom();
        }
        Ok(())
    }

    /// Moves the feed viewport so the selected row stays on screen.
    pub(super) fn ensure_selection_visible(&mut self) {
        let Some(selected) = self.feed_list.selected() else {
            return;
        };
        let viewport = self.feed_viewport_height();
        if viewport == 0 {
            return;
        }

        let position = self.feed_block.get_scroll_position();
        let new_position = if selected < position + SCROLL_PAD {
            selected.saturating_sub(SCROLL_PAD)
        } else if selected + SCROLL_PAD >= position + viewport {
            (selected + SCROLL_PAD + 1).saturating_sub(viewport)
        } else {
            position
        };

        let total = self.engine.rendered().len();
        let new_position = new_position.min(total.saturating_sub(viewport));
        self.feed_block.set_scroll_position(new_position);
        self.feed_block.update_scrollbar_state(total, new_position);
    }

    pub(super) fn scroll_to_origin(&mut self) {
        self.feed_block.reset_scroll();
        self.feed_list.select_first(self.engine.rendered().len());
        self.details_block.reset_scroll();
    }

    /// Asks for an older page when the viewport is close to the last row.
    pub(super) fn check_near_bottom(&mut self) {
        if !self.engine.has_more() || self.engine.is_loading() {
            return;
        }

        let total = self.engine.rendered().len();
        let position = self.feed_block.get_scroll_position();
        if is_near_bottom(
            position,
            self.feed_viewport_height(),
            total,
            self.desc.near_bottom_margin,
        ) {
            log::debug!("Near bottom at {}/{}, loading older records", position, total);
            self.dispatch(FeedEvent::ScrollNearBottom);
        }
    }

    pub(super) fn handle_block_scrolling(
        &mut self,
        block_type: ScrollableBlockType,
        move_next: bool,
    ) -> Result<()> {
        let block = match block_type {
            ScrollableBlockType::Details => &mut self.details_block,
            ScrollableBlockType::Debug => &mut self.debug_block,
        };

        block.scroll_by_line(move_next);
        Ok(())
    }

    pub(super) fn handle_horizontal_scrolling(
        &mut self,
        block_id: uuid::Uuid,
        move_right: bool,
    ) -> Result<()> {
        let (block, area) = if block_id == self.details_block.id() {
            (&mut self.details_block, self.last_details_area)
        } else if block_id == self.debug_block.id() {
            (&mut self.debug_block, self.last_debug_area)
        } else {
            return Ok(());
        };

        let Some(area) = area else {
            return Ok(());
        };

        let content_width = block.get_content_width();

        let [main_content_area, _scrollbar_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let [content_area, _horizontal_scrollbar_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(main_content_area);
        let viewport_width = block.get_content_rect(content_area, true).width as usize;

        if content_width <= viewport_width {
            return Ok(());
        }

        let current_position = block.get_horizontal_scroll_position();
        let max_scroll = content_width.saturating_sub(viewport_width);
        let new_position = if move_right {
            current_position
                .saturating_add(HORIZONTAL_SCROLL_STEP)
                .min(max_scroll)
        } else {
            current_position.saturating_sub(HORIZONTAL_SCROLL_STEP)
        };

        block.set_horizontal_scroll_position(new_position);
        block.update_horizontal_scrollbar_state(content_width, viewport_width);

        Ok(())
    }
}
