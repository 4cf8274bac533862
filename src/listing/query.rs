use std::collections::BTreeMap;

/// Client-side filters for a listing. Empty values are never stored, so an
/// unset filter is simply absent from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    values: BTreeMap<String, String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a filter. `None` and blank strings remove the key.
    pub fn set(&mut self, name: &str, value: Option<&str>) {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => {
                self.values.insert(name.to_string(), v.to_string());
            }
            _ => {
                self.values.remove(name);
            }
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, Some(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Short "k=v, k=v" rendering for titles and log lines.
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page_index: u32,
    pub page_size: u32,
    pub filters: Filters,
}

impl ListQuery {
    /// Page size is clamped to at least 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            filters: Filters::new(),
        }
    }

    /// First page of `filters` at the same page size. Every filter change
    /// goes through here, so a new filter set never inherits a page index.
    pub fn first_page(&self, filters: Filters) -> Self {
        Self {
            page_index: 0,
            page_size: self.page_size,
            filters,
        }
    }
}

/// One page as returned by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub is_last_page: bool,
}

impl<T> ListPage<T> {
    pub fn new(items: Vec<T>, is_last_page: bool) -> Self {
        Self { items, is_last_page }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, true)
    }

    pub fn more(items: Vec<T>) -> Self {
        Self::new(items, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filter_values_are_omitted() {
        let mut filters = Filters::new();
        filters.set("city", Some("Austin"));
        filters.set("sort", Some("   "));
        filters.set("status", None);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("city"), Some("Austin"));
        assert_eq!(filters.get("sort"), None);

        filters.set("city", None);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_filters_iterate_in_stable_order() {
        let filters = Filters::new().with("sort", "rating").with("city", "Austin");
        let keys: Vec<_> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["city", "sort"]);
        assert_eq!(filters.summary(), "city=Austin, sort=rating");
    }

    #[test]
    fn test_filter_change_resets_page_index() {
        let mut query = ListQuery::new(10);
        query.page_index = 4;

        let changed = query.first_page(Filters::new().with("city", "Reno"));
        assert_eq!(changed.page_index, 0);
        assert_eq!(changed.page_size, 10);
        assert_eq!(changed.filters.get("city"), Some("Reno"));
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        assert_eq!(ListQuery::new(0).page_size, 1);
    }
}
