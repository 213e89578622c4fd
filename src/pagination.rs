//! Listing queries, the `{items, meta}` envelope, and client-side page math
//! shared by every list screen.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{Range, RangeInclusive};

use crate::catalog::DifficultyLevel;

pub const DEFAULT_PER_PAGE: usize = 10;

/// Filters of the question listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub per_page: usize,
    pub search: Option<String>,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub tags: Vec<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            topic: None,
            subtopic: None,
            difficulty_level: None,
            tags: Vec::new(),
        }
    }
}

impl ListQuery {
    pub fn page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    pub fn difficulty(mut self, level: DifficultyLevel) -> Self {
        self.difficulty_level = Some(level);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Query parameters, leaving out empty filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.max(1).to_string()),
        ];
        push_filter(&mut pairs, "search", self.search.as_deref());
        push_filter(&mut pairs, "topic", self.topic.as_deref());
        push_filter(&mut pairs, "subtopic", self.subtopic.as_deref());
        if let Some(level) = self.difficulty_level {
            pairs.push(("difficulty_level", level.to_string()));
        }
        let tags = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        push_filter(&mut pairs, "tags", Some(tags.as_str()));
        pairs
    }
}

pub(crate) fn push_filter(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((key, value.to_string()));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, alias = "current_page")]
    pub page: usize,
    #[serde(default, alias = "limit")]
    pub per_page: usize,
    #[serde(default, alias = "total_items", alias = "count")]
    pub total: usize,
    #[serde(default)]
    pub total_pages: usize,
}

impl PageMeta {
    /// Fills fields the backend left out.
    fn completed(mut self, page: usize, per_page: usize) -> Self {
        if self.page == 0 {
            self.page = page.max(1);
        }
        if self.per_page == 0 {
            self.per_page = per_page.max(1);
        }
        if self.total_pages == 0 {
            self.total_pages = Pager::new(self.total, self.per_page).total_pages();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T: DeserializeOwned> Paginated<T> {
    /// Reads a listing body. Accepts the `{items, meta}` envelope, the
    /// `results` and `data` spellings of it, or a bare array. A `{"data": {…}}`
    /// wrapper is unwrapped first; meta beside the wrapper is kept when the
    /// inner object has none.
    pub fn from_body(body: Value, page: usize, per_page: usize) -> Result<Self, serde_json::Error> {
        let (items, meta) = match body {
            Value::Array(items) => (Value::Array(items), None),
            Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
                let outer_meta = map.remove("meta").or_else(|| map.remove("pagination"));
                let mut inner = match map.remove("data") {
                    Some(Value::Object(inner)) => inner,
                    _ => Map::new(),
                };
                if let Some(meta) = outer_meta {
                    if !inner.contains_key("meta") && !inner.contains_key("pagination") {
                        inner.insert("meta".to_string(), meta);
                    }
                }
                return Self::from_body(Value::Object(inner), page, per_page);
            }
            Value::Object(mut map) => {
                let items = ["items", "results", "data", "students", "submissions"]
                    .iter()
                    .find_map(|key| map.remove(*key).filter(Value::is_array))
                    .unwrap_or(Value::Array(Vec::new()));
                let meta = map.remove("meta").or_else(|| map.remove("pagination"));
                (items, meta)
            }
            _ => (Value::Array(Vec::new()), None),
        };

        let items: Vec<T> = serde_json::from_value(items)?;
        let meta = match meta {
            Some(meta) => serde_json::from_value::<PageMeta>(meta)?,
            None => PageMeta {
                total: items.len(),
                ..PageMeta::default()
            },
        };

        Ok(Self {
            meta: meta.completed(page, per_page),
            items,
        })
    }
}

/// Page arithmetic over `total` items. Pages are 1-based and there is
/// always at least one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    total: usize,
    per_page: usize,
}

impl Pager {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages())
    }

    pub fn offset(&self, page: usize) -> usize {
        (self.clamp(page) - 1) * self.per_page
    }

    pub fn range(&self, page: usize) -> Range<usize> {
        let start = self.offset(page).min(self.total);
        start..(start + self.per_page).min(self.total)
    }

    pub fn slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        let range = self.range(page);
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }

    pub fn has_prev(&self, page: usize) -> bool {
        self.clamp(page) > 1
    }

    pub fn has_next(&self, page: usize) -> bool {
        self.clamp(page) < self.total_pages()
    }

    /// Up to `width` page numbers around `page`, for page links.
    pub fn window(&self, page: usize, width: usize) -> RangeInclusive<usize> {
        let last = self.total_pages();
        let width = width.clamp(1, last);
        let page = self.clamp(page);
        let start = page.saturating_sub(width / 2).max(1).min(last + 1 - width);
        start..=start + width - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_math() {
        let pager = Pager::new(23, 10);
        assert_eq!(pager.total_pages(), 3);
        assert_eq!(pager.clamp(0), 1);
        assert_eq!(pager.clamp(9), 3);
        assert_eq!(pager.range(3), 20..23);
        assert!(pager.has_next(2));
        assert!(!pager.has_prev(1));
        assert_eq!(Pager::new(0, 10).total_pages(), 1);
        assert_eq!(Pager::new(0, 10).range(1), 0..0);
    }

    #[test]
    fn slices_fetched_lists() {
        let items: Vec<u32> = (1..=7).collect();
        let pager = Pager::new(items.len(), 3);
        assert_eq!(pager.slice(&items, 3), &[7]);
        assert_eq!(pager.slice(&items, 2), &[4, 5, 6]);
    }

    #[test]
    fn window_stays_in_bounds() {
        let pager = Pager::new(100, 10);
        assert_eq!(pager.window(1, 5), 1..=5);
        assert_eq!(pager.window(5, 5), 3..=7);
        assert_eq!(pager.window(10, 5), 6..=10);
        assert_eq!(Pager::new(15, 10).window(1, 5), 1..=2);
    }

    #[test]
    fn query_omits_empty_filters() {
        let query = ListQuery::default()
            .page(2)
            .search("  ")
            .topic("Algorithms")
            .difficulty(DifficultyLevel::Hard)
            .tags(vec!["dp".into(), " ".into()]);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "2".to_string()),
                ("per_page", "10".to_string()),
                ("topic", "Algorithms".to_string()),
                ("difficulty_level", "hard".to_string()),
                ("tags", "dp".to_string()),
            ]
        );
    }

    #[test]
    fn envelope_and_bare_arrays() {
        let page: Paginated<u32> = Paginated::from_body(
            json!({ "items": [1, 2], "meta": { "page": 2, "per_page": 2, "total": 5 } }),
            2,
            2,
        )
        .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.meta.total_pages, 3);

        let data_array: Paginated<u32> = Paginated::from_body(json!({ "data": [7, 8] }), 1, 10).unwrap();
        assert_eq!(data_array.items, vec![7, 8]);

        let bare: Paginated<u32> = Paginated::from_body(json!([4, 5, 6]), 1, 10).unwrap();
        assert_eq!(bare.meta.total, 3);
        assert_eq!(bare.meta.total_pages, 1);
        assert_eq!(bare.meta.page, 1);
    }

    #[test]
    fn data_wrapped_listings_are_unwrapped() {
        let page: Paginated<u32> = Paginated::from_body(
            json!({ "data": { "items": [1, 2, 3], "meta": { "page": 1, "per_page": 10, "total": 3 } } }),
            1,
            10,
        )
        .unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.meta.total, 3);

        let outer_meta: Paginated<u32> = Paginated::from_body(
            json!({ "data": { "results": [4] }, "pagination": { "current_page": 2, "limit": 1, "count": 5 } }),
            2,
            1,
        )
        .unwrap();
        assert_eq!(outer_meta.items, vec![4]);
        assert_eq!(outer_meta.meta.total, 5);
        assert_eq!(outer_meta.meta.total_pages, 5);
    }

}
