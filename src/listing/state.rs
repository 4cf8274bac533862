use super::query::{Filters, ListPage, ListQuery};
use super::Identified;
use crate::api::error::FetchError;
use std::collections::HashSet;

/// Where the listing currently stands, derived from the flags in [`ListState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet.
    Idle,
    Loading,
    /// Items shown, more pages available.
    Loaded,
    /// Items shown, last page reached.
    Exhausted,
    /// Last page reached with zero items: the "no results" state.
    Empty,
    /// Last fetch failed; loaded items stay. Sentinel reports are ignored in
    /// this phase and only `retry` (or a reset) requests again.
    Errored,
    Unmounted,
}

/// A fetch the driver must perform. `generation` ties the eventual result back
/// to the filter set that was active when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub page_index: u32,
    pub page_size: u32,
    pub filters: Filters,
}

/// Outcome of feeding a completion back into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Appended { added: usize, duplicates: usize },
    Failed,
    /// Result belonged to a superseded generation or arrived after unmount.
    Stale,
}

/// Paginated list state machine. Pure: it never performs I/O, it only hands
/// out [`FetchRequest`]s and absorbs their results.
pub struct ListState<T: Identified> {
    items: Vec<T>,
    seen: HashSet<T::Id>,
    query: ListQuery,
    loading: bool,
    has_more: bool,
    error: Option<FetchError>,
    generation: u64,
    mounted: bool,
}

impl<T: Identified> ListState<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            query: ListQuery::new(page_size),
            loading: false,
            has_more: true,
            error: None,
            generation: 0,
            mounted: true,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filters(&self) -> &Filters {
        &self.query.filters
    }

    pub fn page_index(&self) -> u32 {
        self.query.page_index
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn phase(&self) -> Phase {
        if !self.mounted {
            Phase::Unmounted
        } else if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Errored
        } else if !self.has_more && self.items.is_empty() {
            Phase::Empty
        } else if !self.has_more {
            Phase::Exhausted
        } else if !self.items.is_empty() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }

    /// Start a new filter generation and request its first page.
    /// Any fetch still in flight is superseded: its result will be stale.
    pub fn reset(&mut self, filters: Filters) -> Option<FetchRequest> {
        if !self.mounted {
            return None;
        }
        self.generation += 1;
        self.items.clear();
        self.seen.clear();
        self.query = self.query.first_page(filters);
        self.loading = false;
        self.has_more = true;
        self.error = None;
        self.load_next_page()
    }

    /// Request the next page, unless one is already in flight or the listing
    /// is exhausted.
    pub fn load_next_page(&mut self) -> Option<FetchRequest> {
        if !self.mounted || self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(FetchRequest {
            generation: self.generation,
            page_index: self.query.page_index,
            page_size: self.query.page_size,
            filters: self.query.filters.clone(),
        })
    }

    /// The trailing marker scrolled into view. While errored, scrolling does
    /// not refetch; the user has to ask for a retry.
    pub fn sentinel_visible(&mut self) -> Option<FetchRequest> {
        if self.error.is_some() {
            return None;
        }
        self.load_next_page()
    }

    /// Retry after a failure. A failed first page restarts the generation with
    /// the same filters; later failures just ask for the missing page again.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if self.loading {
            return None;
        }
        if self.query.page_index == 0 && self.items.is_empty() {
            let filters = self.query.filters.clone();
            return self.reset(filters);
        }
        self.load_next_page()
    }

    pub fn page_arrived(&mut self, generation: u64, page: ListPage<T>) -> Applied {
        if !self.accepts(generation) {
            return Applied::Stale;
        }
        let mut added = 0;
        let mut duplicates = 0;
        for item in page.items {
            if self.seen.insert(item.id()) {
                self.items.push(item);
                added += 1;
            } else {
                duplicates += 1;
            }
        }
        self.has_more = !page.is_last_page;
        self.query.page_index += 1;
        self.loading = false;
        self.error = None;
        Applied::Appended { added, duplicates }
    }

    pub fn page_failed(&mut self, generation: u64, error: FetchError) -> Applied {
        if !self.accepts(generation) {
            return Applied::Stale;
        }
        self.error = Some(error);
        self.loading = false;
        Applied::Failed
    }

    /// Swap in a fresher copy of an already listed item (e.g. from a detail
    /// fetch). Returns false when the item is not in the list.
    pub fn update_item(&mut self, item: T) -> bool {
        let id = item.id();
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Tear down. Nothing arriving afterwards is applied.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
        self.generation += 1;
    }

    fn accepts(&self, generation: u64) -> bool {
        self.mounted && self.loading && generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str);

    impl Identified for Row {
        type Id = &'static str;
        fn id(&self) -> &'static str {
            self.0
        }
    }

    fn rows(keys: &[&'static str]) -> Vec<Row> {
        keys.iter().map(|k| Row(*k)).collect()
    }

    fn ids(state: &ListState<Row>) -> Vec<&'static str> {
        state.items().iter().map(|r| r.0).collect()
    }

    #[test]
    fn test_two_pages_with_overlap() {
        let mut state = ListState::new(3);
        let first = state.reset(Filters::new()).unwrap();
        assert_eq!(first.page_index, 0);
        assert_eq!(state.phase(), Phase::Loading);

        state.page_arrived(first.generation, ListPage::more(rows(&["A", "B", "C"])));
        assert_eq!(state.items().len(), 3);
        assert!(state.has_more());
        assert_eq!(state.phase(), Phase::Loaded);

        let second = state.load_next_page().unwrap();
        assert_eq!(second.page_index, 1);
        let applied = state.page_arrived(second.generation, ListPage::last(rows(&["C", "D"])));
        assert_eq!(applied, Applied::Appended { added: 1, duplicates: 1 });
        assert_eq!(ids(&state), vec!["A", "B", "C", "D"]);
        assert!(!state.has_more());
        assert_eq!(state.phase(), Phase::Exhausted);
    }

    #[test]
    fn test_load_while_loading_is_noop() {
        let mut state: ListState<Row> = ListState::new(5);
        assert!(state.reset(Filters::new()).is_some());
        assert!(state.load_next_page().is_none());
        assert!(state.sentinel_visible().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn test_first_page_failure() {
        let mut state: ListState<Row> = ListState::new(5);
        let req = state.reset(Filters::new()).unwrap();
        let applied = state.page_failed(req.generation, FetchError::Transport("refused".to_string()));
        assert_eq!(applied, Applied::Failed);
        assert!(state.error().is_some());
        assert!(state.items().is_empty());
        assert!(!state.is_loading());
        assert!(state.has_more());
        assert_eq!(state.phase(), Phase::Errored);
    }

    #[test]
    fn test_retry_on_first_page_starts_new_generation() {
        let mut state: ListState<Row> = ListState::new(5);
        let req = state.reset(Filters::new().with("city", "Austin")).unwrap();
        state.page_failed(req.generation, FetchError::Transport("refused".to_string()));

        let retry = state.retry().unwrap();
        assert_eq!(retry.generation, req.generation + 1);
        assert_eq!(retry.page_index, 0);
        assert_eq!(retry.filters.get("city"), Some("Austin"));
        assert!(state.error().is_none());
    }

    #[test]
    fn test_retry_after_later_failure_keeps_items() {
        let mut state = ListState::new(2);
        let first = state.reset(Filters::new()).unwrap();
        state.page_arrived(first.generation, ListPage::more(rows(&["A", "B"])));

        let second = state.load_next_page().unwrap();
        state.page_failed(
            second.generation,
            FetchError::Status { status: 500, message: "boom".to_string() },
        );
        assert_eq!(ids(&state), vec!["A", "B"]);
        assert!(state.has_more());

        // scrolling does not hammer a failing endpoint
        assert!(state.sentinel_visible().is_none());

        let retry = state.retry().unwrap();
        assert_eq!(retry.generation, first.generation);
        assert_eq!(retry.page_index, 1);
        assert_eq!(ids(&state), vec!["A", "B"]);
    }

    #[test]
    fn test_reset_clears_before_first_fetch_resolves() {
        let mut state = ListState::new(2);
        let first = state.reset(Filters::new()).unwrap();
        state.page_arrived(first.generation, ListPage::more(rows(&["A", "B"])));

        let req = state.reset(Filters::new().with("sort", "rating")).unwrap();
        assert!(state.items().is_empty());
        assert_eq!(state.page_index(), 0);
        assert_eq!(req.page_index, 0);
        assert!(state.has_more());
    }

    #[test]
    fn test_stale_result_after_filter_change_is_discarded() {
        let mut state = ListState::new(2);
        let x = state.reset(Filters::new().with("city", "X")).unwrap();
        let y = state.reset(Filters::new().with("city", "Y")).unwrap();

        assert_eq!(state.page_arrived(x.generation, ListPage::more(rows(&["X1"]))), Applied::Stale);
        assert!(state.items().is_empty());
        assert!(state.is_loading());

        state.page_arrived(y.generation, ListPage::last(rows(&["Y1"])));
        assert_eq!(ids(&state), vec!["Y1"]);
    }

    #[test]
    fn test_empty_first_page_is_terminal_not_error() {
        let mut state: ListState<Row> = ListState::new(10);
        let req = state.reset(Filters::new()).unwrap();
        state.page_arrived(req.generation, ListPage::last(Vec::new()));
        assert_eq!(state.phase(), Phase::Empty);
        assert!(state.error().is_none());
        assert!(!state.has_more());
        assert!(state.load_next_page().is_none());
    }

    #[test]
    fn test_duplicate_only_last_page_stops_fetching() {
        let mut state = ListState::new(2);
        let first = state.reset(Filters::new()).unwrap();
        state.page_arrived(first.generation, ListPage::more(rows(&["A", "B"])));
        let second = state.load_next_page().unwrap();
        let applied = state.page_arrived(second.generation, ListPage::last(rows(&["A", "B"])));
        assert_eq!(applied, Applied::Appended { added: 0, duplicates: 2 });
        assert!(!state.has_more());
        assert!(state.sentinel_visible().is_none());
    }

    #[test]
    fn test_duplicates_within_one_page() {
        let mut state = ListState::new(4);
        let req = state.reset(Filters::new()).unwrap();
        state.page_arrived(req.generation, ListPage::more(rows(&["A", "A", "B"])));
        assert_eq!(ids(&state), vec!["A", "B"]);
    }

    #[test]
    fn test_unmount_discards_in_flight() {
        let mut state = ListState::new(2);
        let req = state.reset(Filters::new()).unwrap();
        state.unmount();
        assert_eq!(state.page_arrived(req.generation, ListPage::more(rows(&["A"]))), Applied::Stale);
        assert!(state.items().is_empty());
        assert_eq!(state.phase(), Phase::Unmounted);
        assert!(state.reset(Filters::new()).is_none());
    }

    #[test]
    fn test_update_item_in_place() {
        let mut state = ListState::new(2);
        let req = state.reset(Filters::new()).unwrap();
        state.page_arrived(req.generation, ListPage::more(rows(&["A", "B"])));
        assert!(state.update_item(Row("B")));
        assert!(!state.update_item(Row("Z")));
        assert_eq!(ids(&state), vec!["A", "B"]);
    }
}
