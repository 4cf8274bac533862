use crate::listing::{Identified, Viewport};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_LOGS: usize = 50;

/// Detail pane for the selected item: shows the listed copy right away and is
/// replaced once the full record arrives.
#[derive(Debug, Clone)]
pub struct DetailPane<T> {
    pub item: T,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

/// Everything the view owns besides the listing itself.
pub struct ViewState<T> {
    pub title: String,
    /// Filter edited by the `/` prompt.
    pub filter_key: &'static str,
    pub selected: usize,
    pub scroll_offset: usize,
    /// Rows the table showed on the last frame.
    pub list_height: usize,
    /// `Some` while the filter prompt is open.
    pub input: Option<String>,
    pub detail: Option<DetailPane<T>>,
    pub logs: VecDeque<LogEntry>,
    pub start_time: Instant,
}

impl<T: Identified + Clone> ViewState<T> {
    pub fn new(title: String, filter_key: &'static str) -> Self {
        Self {
            title,
            filter_key,
            selected: 0,
            scroll_offset: 0,
            list_height: 0,
            input: None,
            detail: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            start_time: Instant::now(),
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn last_log(&self) -> Option<&LogEntry> {
        self.logs.back()
    }

    /// Move the cursor by `delta` rows, clamped to the list.
    pub fn move_selection(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.selected = 0;
            return;
        }
        let max = total - 1;
        self.selected = if delta < 0 {
            self.selected.saturating_sub(delta.unsigned_abs())
        } else {
            self.selected.saturating_add(delta as usize).min(max)
        };
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self, total: usize) {
        self.selected = total.saturating_sub(1);
    }

    /// Scroll so the selected row is inside the window.
    pub fn ensure_visible(&mut self, total: usize) {
        if total == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected = self.selected.min(total - 1);
        let height = self.list_height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
        self.scroll_offset = self.scroll_offset.min(total.saturating_sub(1));
    }

    pub fn viewport(&self, total: usize) -> Viewport {
        Viewport::new(self.scroll_offset, self.list_height, total)
    }

    /// Back to the top, e.g. after the filters changed.
    pub fn rewind(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
        self.detail = None;
    }

    pub fn open_detail(&mut self, item: T) {
        self.detail = Some(DetailPane {
            item,
            loading: true,
            error: None,
        });
    }

    /// Returns true when the pane was showing `id` and took the update.
    pub fn detail_arrived(&mut self, id: &T::Id, result: Result<T, String>) -> bool {
        let Some(pane) = self.detail.as_mut() else { return false };
        if &pane.item.id() != id {
            return false;
        }
        pane.loading = false;
        match result {
            Ok(item) => {
                pane.item = item;
                pane.error = None;
            }
            Err(message) => pane.error = Some(message),
        }
        true
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32, &'static str);

    impl Identified for Row {
        type Id = u32;
        fn id(&self) -> u32 {
            self.0
        }
    }

    fn view(height: usize) -> ViewState<Row> {
        let mut v = ViewState::new("Test".to_string(), "city");
        v.list_height = height;
        v
    }

    #[test]
    fn test_selection_clamps() {
        let mut v = view(5);
        v.move_selection(-3, 10);
        assert_eq!(v.selected, 0);
        v.move_selection(25, 10);
        assert_eq!(v.selected, 9);
        v.move_selection(1, 0);
        assert_eq!(v.selected, 0);
    }

    #[test]
    fn test_scroll_follows_selection() {
        let mut v = view(5);
        v.selected = 7;
        v.ensure_visible(20);
        assert_eq!(v.scroll_offset, 3);
        assert_eq!(v.viewport(20), Viewport::new(3, 5, 20));

        v.selected = 1;
        v.ensure_visible(20);
        assert_eq!(v.scroll_offset, 1);
    }

    #[test]
    fn test_ensure_visible_after_list_shrinks() {
        let mut v = view(5);
        v.selected = 15;
        v.scroll_offset = 11;
        v.ensure_visible(0);
        assert_eq!((v.selected, v.scroll_offset), (0, 0));
    }

    #[test]
    fn test_detail_updates_only_matching_item() {
        let mut v = view(5);
        v.open_detail(Row(1, "listed"));
        assert!(!v.detail_arrived(&2, Ok(Row(2, "other"))));
        assert!(v.detail.as_ref().unwrap().loading);

        assert!(v.detail_arrived(&1, Ok(Row(1, "full"))));
        let pane = v.detail.as_ref().unwrap();
        assert!(!pane.loading);
        assert_eq!(pane.item, Row(1, "full"));

        assert!(v.detail_arrived(&1, Err("gone".to_string())));
        assert_eq!(v.detail.as_ref().unwrap().error.as_deref(), Some("gone"));
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let mut v = view(5);
        for i in 0..(MAX_LOGS + 5) {
            v.push_log("INFO", format!("line {}", i));
        }
        assert_eq!(v.logs.len(), MAX_LOGS);
        assert_eq!(v.last_log().unwrap().message, format!("line {}", MAX_LOGS + 4));
    }
}
