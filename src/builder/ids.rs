use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::{Entry, Image};

/// Opaque identifier of an option, item or image. Stable for the lifetime of
/// the entry it names, independent of display position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// older records carry numeric ids
impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryIdVisitor;

        impl<'de> Visitor<'de> for EntryIdVisitor {
            type Value = EntryId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntryId, E> {
                Ok(EntryId::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<EntryId, E> {
                Ok(EntryId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntryId, E> {
                Ok(EntryId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntryId, E> {
                Ok(EntryId(v.to_string()))
            }
        }

        deserializer.deserialize_any(EntryIdVisitor)
    }
}

pub trait IdSource: Send {
    fn next_id(&mut self) -> EntryId;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> EntryId {
        EntryId(Uuid::new_v4().to_string())
    }
}

/// Yields `{prefix}1`, `{prefix}2`, ...
#[derive(Debug, Clone)]
pub struct SequentialSource {
    prefix: String,
    next: usize,
}

impl SequentialSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdSource for SequentialSource {
    fn next_id(&mut self) -> EntryId {
        let id = EntryId(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// An option or item as it may arrive from the backend or a draft file:
/// either a bare string (legacy records) or an object that may or may not
/// already carry an id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    Legacy(String),
    Object {
        #[serde(default, alias = "option_id", alias = "item_id")]
        id: Option<EntryId>,
        #[serde(default, alias = "text")]
        value: String,
        #[serde(default)]
        images: Vec<Image>,
    },
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        RawEntry::Object {
            id: Some(entry.id),
            value: entry.value,
            images: entry.images,
        }
    }
}

impl From<&str> for RawEntry {
    fn from(value: &str) -> Self {
        RawEntry::Legacy(value.to_string())
    }
}

impl RawEntry {
    fn id(&self) -> Option<&EntryId> {
        match self {
            RawEntry::Object { id: Some(id), .. } if !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

/// Hands out entry and image ids for one edit session.
///
/// Every id the assigner has issued or observed is remembered, so an id is
/// never handed out twice: not after the entry is deleted and not when the
/// backend already used it.
pub struct IdAssigner {
    source: Box<dyn IdSource>,
    seen: HashSet<EntryId>,
}

impl fmt::Debug for IdAssigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAssigner")
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl Default for IdAssigner {
    fn default() -> Self {
        Self::new(UuidSource)
    }
}

impl IdAssigner {
    pub fn new(source: impl IdSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            seen: HashSet::new(),
        }
    }

    pub fn sequential(prefix: impl Into<String>) -> Self {
        Self::new(SequentialSource::new(prefix))
    }

    pub fn fresh(&mut self) -> EntryId {
        loop {
            let id = self.source.next_id();
            if self.seen.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Marks `id` as taken without issuing it.
    pub fn reserve(&mut self, id: &EntryId) {
        if !id.is_empty() {
            self.seen.insert(id.clone());
        }
    }

    /// Normalizes options or items to `{id, value, images}`.
    ///
    /// Elements that already carry an id keep it; only missing ids and the
    /// second occurrence of a duplicated id get a fresh one.
    pub fn normalize(&mut self, raw: Vec<RawEntry>) -> Vec<Entry> {
        // existing ids first so fresh ones never collide with a later element
        for id in raw.iter().filter_map(RawEntry::id) {
            self.seen.insert(id.clone());
        }

        let mut in_list: HashSet<EntryId> = HashSet::with_capacity(raw.len());
        raw.into_iter()
            .map(|raw| {
                let (id, value, images) = match raw {
                    RawEntry::Legacy(value) => (None, value, Vec::new()),
                    RawEntry::Object { id, value, images } => (id, value, images),
                };

                let id = match id {
                    Some(id) if !id.is_empty() && !in_list.contains(&id) => id,
                    _ => self.fresh(),
                };
                in_list.insert(id.clone());

                Entry {
                    id,
                    value,
                    images: self.normalize_images(images),
                }
            })
            .collect()
    }

    /// Same as [`IdAssigner::normalize`] for state that is already in
    /// `Entry` form. Running it on its own output changes nothing.
    pub fn renormalize(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        self.normalize(entries.into_iter().map(RawEntry::from).collect())
    }

    pub fn normalize_images(&mut self, images: Vec<Image>) -> Vec<Image> {
        for image in &images {
            self.reserve(&image.id);
        }

        let mut in_list: HashSet<EntryId> = HashSet::with_capacity(images.len());
        images
            .into_iter()
            .map(|mut image| {
                if image.id.is_empty() || in_list.contains(&image.id) {
                    image.id = self.fresh();
                }
                in_list.insert(image.id.clone());
                image
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn legacy_strings_get_sequential_ids() {
        let mut assigner = IdAssigner::sequential("o");
        let entries = assigner.normalize(vec!["A".into(), "B".into()]);
        assert_eq!(ids(&entries), vec!["o1", "o2"]);
        assert_eq!(entries[1].value, "B");
    }

    #[test]
    fn normalizing_twice_keeps_ids() {
        let mut assigner = IdAssigner::default();
        let first = assigner.normalize(vec!["A".into(), "B".into(), "C".into()]);
        let second = assigner.renormalize(first.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn existing_ids_win_over_fresh_ones() {
        let raw: Vec<RawEntry> = serde_json::from_value(json!([
            "first",
            { "option_id": "o1", "value": "second" },
        ]))
        .unwrap();

        let mut assigner = IdAssigner::sequential("o");
        let entries = assigner.normalize(raw);
        assert_eq!(ids(&entries), vec!["o2", "o1"]);
    }

    #[test]
    fn duplicate_ids_are_split() {
        let raw: Vec<RawEntry> = serde_json::from_value(json!([
            { "id": "x", "text": "one" },
            { "id": "x", "text": "two" },
        ]))
        .unwrap();

        let mut assigner = IdAssigner::sequential("o");
        let entries = assigner.normalize(raw);
        assert_eq!(ids(&entries), vec!["x", "o1"]);
        assert_eq!(entries[1].value, "two");
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let raw: Vec<RawEntry> =
            serde_json::from_value(json!([{ "item_id": 7, "value": "seven" }])).unwrap();
        let entries = IdAssigner::default().normalize(raw);
        assert_eq!(entries[0].id.as_str(), "7");
    }

    #[test]
    fn fresh_skips_reserved_ids() {
        let mut assigner = IdAssigner::sequential("o");
        assigner.reserve(&EntryId::from("o1"));
        assert_eq!(assigner.fresh().as_str(), "o2");
        assert_eq!(assigner.fresh().as_str(), "o3");
    }

    #[test]
    fn images_without_ids_get_one() {
        let images: Vec<Image> = serde_json::from_value(json!([
            { "url": "https://cdn.example/a.png" },
            { "id": "img", "url": "https://cdn.example/b.png" },
        ]))
        .unwrap();

        let mut assigner = IdAssigner::sequential("i");
        let images = assigner.normalize_images(images);
        assert_eq!(images[0].id.as_str(), "i1");
        assert_eq!(images[1].id.as_str(), "img");
    }
}
