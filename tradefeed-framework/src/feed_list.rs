use ratatui::widgets::ListState;

/// Selection over the rendered feed. Row 0 is the newest record.
#[derive(Debug, Default)]
pub struct FeedList {
    pub state: ListState,
}

impl FeedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.state.select(index);
    }

    /// Moves toward older records, stopping at the last row.
    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.state.select(None);
            return;
        }

        let next = match self.state.selected() {
            Some(i) if i + 1 >= len => len - 1,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(next));
    }

    /// Moves toward newer records, stopping at the first row.
    pub fn select_previous(&mut self, len: usize) {
        if len == 0 {
            self.state.select(None);
            return;
        }

        let prev = self
            .state
            .selected()
            .map(|i| i.min(len - 1).saturating_sub(1))
            .unwrap_or(0);
        self.state.select(Some(prev));
    }

    pub fn select_first(&mut self, len: usize) {
        self.state.select(if len == 0 { None } else { Some(0) });
    }

    /// Keeps the selection inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        match self.state.selected() {
            Some(_) if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.state = ListState::default();
    }
}

/// Whether the last visible row is within `margin` rows of the end.
pub fn is_near_bottom(scroll: usize, viewport_height: usize, total: usize, margin: usize) -> bool {
    let last_visible = scroll + viewport_height;
    total.saturating_sub(last_visible) <= margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_next_stops_at_last() {
        let mut list = FeedList::new();
        list.select_next(2);
        assert_eq!(list.selected(), Some(0));
        list.select_next(2);
        list.select_next(2);
        assert_eq!(list.selected(), Some(1));
    }

    #[test]
    fn test_select_previous_stops_at_first() {
        let mut list = FeedList::new();
        list.select_previous(3);
        assert_eq!(list.selected(), Some(0));
        list.select_previous(3);
        assert_eq!(list.selected(), Some(0));
    }

    #[test]
    fn test_empty_list_clears_selection() {
        let mut list = FeedList::new();
        list.select(Some(4));
        list.select_next(0);
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn test_clamp() {
        let mut list = FeedList::new();
        list.select(Some(9));
        list.clamp(5);
        assert_eq!(list.selected(), Some(4));
        list.clamp(0);
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn test_near_bottom() {
        assert!(is_near_bottom(0, 10, 12, 5));
        assert!(!is_near_bottom(0, 10, 40, 5));
        assert!(is_near_bottom(25, 10, 40, 5));
        assert!(is_near_bottom(0, 10, 0, 5));
    }
}
