use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::{BuilderError, EntryId, IdAssigner, Image, RawEntry};

/// One MCQ option or one rearrange item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub value: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Entry {
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty() && self.images.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// MCQ option
    Choice,
    /// rearrange item
    Item,
}

impl EntryKind {
    pub fn min_len(self) -> usize {
        match self {
            EntryKind::Choice => 2,
            EntryKind::Item => 1,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Choice => f.write_str("option"),
            EntryKind::Item => f.write_str("item"),
        }
    }
}

/// MCQ question type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Single,
    Multiple,
}

/// Ordered entries plus the set of entry ids marked correct.
///
/// The correct set is held by id, so reordering entries never changes which
/// entries are correct and deleting an entry only drops that entry's id.
/// For rearrange questions the order of `correct` is the correct order.
#[derive(Debug)]
pub struct EntryList {
    kind: EntryKind,
    entries: Vec<Entry>,
    correct: Vec<EntryId>,
    ids: IdAssigner,
}

impl EntryList {
    pub fn new(kind: EntryKind, ids: IdAssigner) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            correct: Vec::new(),
            ids,
        }
    }

    pub fn from_raw(kind: EntryKind, mut ids: IdAssigner, raw: Vec<RawEntry>) -> Self {
        let entries = ids.normalize(raw);
        Self {
            kind,
            entries,
            correct: Vec::new(),
            ids,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn min_len(&self) -> usize {
        self.kind.min_len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn position(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.position(id).is_some()
    }

    pub(crate) fn entry_mut(&mut self, id: &EntryId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| &entry.id == id)
    }

    pub fn correct(&self) -> &[EntryId] {
        &self.correct
    }

    pub fn is_correct(&self, id: &EntryId) -> bool {
        self.correct.contains(id)
    }

    pub fn fresh_id(&mut self) -> EntryId {
        self.ids.fresh()
    }

    pub fn push(&mut self, value: impl Into<String>) -> EntryId {
        let id = self.ids.fresh();
        self.entries.push(Entry {
            id: id.clone(),
            value: value.into(),
            images: Vec::new(),
        });
        debug!(kind = %self.kind, %id, "entry added");
        id
    }

    pub fn insert(&mut self, index: usize, value: impl Into<String>) -> Result<EntryId, BuilderError> {
        if index > self.entries.len() {
            return Err(self.out_of_range(index));
        }
        let id = self.ids.fresh();
        self.entries.insert(
            index,
            Entry {
                id: id.clone(),
                value: value.into(),
                images: Vec::new(),
            },
        );
        debug!(kind = %self.kind, %id, index, "entry inserted");
        Ok(id)
    }

    /// Removes the entry at `index` and its id from the correct set.
    pub fn remove(&mut self, index: usize) -> Result<Entry, BuilderError> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        if self.entries.len() <= self.min_len() {
            return Err(BuilderError::TooFewEntries {
                kind: self.kind,
                min: self.min_len(),
            });
        }

        let entry = self.entries.remove(index);
        self.correct.retain(|id| id != &entry.id);
        debug!(kind = %self.kind, id = %entry.id, index, "entry removed");
        Ok(entry)
    }

    /// Moves an entry to a new display position. Correct-set membership and
    /// the correct order stay as they are.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        if from >= self.entries.len() {
            return Err(self.out_of_range(from));
        }
        if to >= self.entries.len() {
            return Err(self.out_of_range(to));
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> Result<(), BuilderError> {
        let kind = self.kind;
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(BuilderError::IndexOutOfRange { kind, index })?;
        entry.value = value.into();
        Ok(())
    }

    /// Marks `id` correct. With [`Selection::Single`] it replaces the
    /// current correct answer.
    pub fn mark_correct(&mut self, id: &EntryId, selection: Selection) -> Result<(), BuilderError> {
        self.ensure_known(id)?;
        if selection == Selection::Single {
            self.correct.clear();
        }
        if !self.correct.contains(id) {
            self.correct.push(id.clone());
        }
        Ok(())
    }

    pub fn unmark_correct(&mut self, id: &EntryId) -> Result<(), BuilderError> {
        self.ensure_known(id)?;
        self.correct.retain(|c| c != id);
        Ok(())
    }

    /// Flips the correct flag of `id`; returns whether it is now correct.
    pub fn toggle_correct(&mut self, id: &EntryId, selection: Selection) -> Result<bool, BuilderError> {
        if self.is_correct(id) {
            self.unmark_correct(id)?;
            Ok(false)
        } else {
            self.mark_correct(id, selection)?;
            Ok(true)
        }
    }

    /// Replaces the correct set. Ids that name no current entry and repeated
    /// ids are dropped.
    pub fn set_correct(&mut self, ids: impl IntoIterator<Item = EntryId>) {
        self.correct.clear();
        for id in ids {
            if !self.contains(&id) {
                warn!(kind = %self.kind, %id, "dropping correct answer that names no entry");
                continue;
            }
            if !self.correct.contains(&id) {
                self.correct.push(id);
            }
        }
    }

    /// Display positions of the correct set, in correct-set order.
    pub fn correct_positions(&self) -> Vec<usize> {
        self.correct.iter().filter_map(|id| self.position(id)).collect()
    }

    pub fn set_correct_positions(&mut self, positions: &[usize]) -> Result<(), BuilderError> {
        let ids = positions
            .iter()
            .map(|&index| {
                self.entries
                    .get(index)
                    .map(|entry| entry.id.clone())
                    .ok_or(self.out_of_range(index))
            })
            .collect::<Result<Vec<EntryId>, BuilderError>>()?;
        self.set_correct(ids);
        Ok(())
    }

    /// Reorders the correct-order list without touching display order.
    pub fn move_correct(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        let len = self.correct.len();
        if from >= len || to >= len {
            return Err(self.out_of_range(from.max(to)));
        }
        let id = self.correct.remove(from);
        self.correct.insert(to, id);
        Ok(())
    }

    /// Re-runs id normalization over the current entries. Ids are kept, so
    /// the correct set stays valid.
    pub fn renormalize(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = self.ids.renormalize(entries);
        let entries = &self.entries;
        self.correct.retain(|id| entries.iter().any(|e| &e.id == id));
    }

    /// Back to `count` blank entries. Ids handed out before stay retired.
    pub fn reset(&mut self, count: usize) {
        self.entries.clear();
        self.correct.clear();
        for _ in 0..count {
            self.push("");
        }
    }

    fn ensure_known(&self, id: &EntryId) -> Result<(), BuilderError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(BuilderError::UnknownEntry {
                kind: self.kind,
                id: id.clone(),
            })
        }
    }

    fn out_of_range(&self, index: usize) -> BuilderError {
        BuilderError::IndexOutOfRange {
            kind: self.kind,
            index,
        }
    }
}

/// Remaps display positions after the entry at `from` moved to `to`, so the
/// same logical entries stay selected.
pub fn remap_after_move(positions: &[usize], from: usize, to: usize) -> Vec<usize> {
    positions
        .iter()
        .map(|&p| {
            if p == from {
                to
            } else if from < to && p > from && p <= to {
                p - 1
            } else if to < from && p >= to && p < from {
                p + 1
            } else {
                p
            }
        })
        .collect()
}

/// Drops `removed` from `positions` and shifts larger positions down by one.
pub fn remap_after_remove(positions: &[usize], removed: usize) -> Vec<usize> {
    positions
        .iter()
        .filter(|&&p| p != removed)
        .map(|&p| if p > removed { p - 1 } else { p })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> EntryList {
        EntryList::from_raw(
            EntryKind::Choice,
            IdAssigner::sequential("o"),
            values.iter().map(|&v| RawEntry::from(v)).collect(),
        )
    }

    fn values(list: &EntryList) -> Vec<&str> {
        list.entries().iter().map(|e| e.value.as_str()).collect()
    }

    #[test]
    fn removing_an_option_drops_only_its_id() {
        let mut list = options(&["A", "B", "C", "D"]);
        list.mark_correct(&"o1".into(), Selection::Multiple).unwrap();
        list.mark_correct(&"o3".into(), Selection::Multiple).unwrap();
        list.mark_correct(&"o4".into(), Selection::Multiple).unwrap();

        let removed = list.remove(2).unwrap();
        assert_eq!(removed.id.as_str(), "o3");
        assert_eq!(list.correct(), &[EntryId::from("o1"), EntryId::from("o4")]);
        assert_eq!(list.correct_positions(), vec![0, 2]);
    }

    #[test]
    fn moving_keeps_correct_membership() {
        let mut list = options(&["A", "B", "C"]);
        list.mark_correct(&"o1".into(), Selection::Single).unwrap();

        list.move_entry(0, 2).unwrap();
        assert_eq!(values(&list), vec!["B", "C", "A"]);
        assert_eq!(list.correct(), &[EntryId::from("o1")]);
        assert_eq!(list.correct_positions(), vec![2]);
    }

    #[test]
    fn mcq_keeps_two_options() {
        let mut list = options(&["A", "B"]);
        let err = list.remove(0).unwrap_err();
        assert_eq!(
            err,
            BuilderError::TooFewEntries {
                kind: EntryKind::Choice,
                min: 2
            }
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn rearrange_keeps_one_item() {
        let mut list = EntryList::from_raw(
            EntryKind::Item,
            IdAssigner::sequential("i"),
            vec!["only".into(), "other".into()],
        );
        list.remove(1).unwrap();
        assert!(list.remove(0).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn single_selection_replaces_answer() {
        let mut list = options(&["A", "B", "C"]);
        list.mark_correct(&"o1".into(), Selection::Single).unwrap();
        list.mark_correct(&"o2".into(), Selection::Single).unwrap();
        assert_eq!(list.correct(), &[EntryId::from("o2")]);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut list = options(&["A", "B"]);
        let id = EntryId::from("o2");
        assert!(list.toggle_correct(&id, Selection::Multiple).unwrap());
        assert!(!list.toggle_correct(&id, Selection::Multiple).unwrap());
        assert!(list.correct().is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut list = options(&["A", "B"]);
        assert!(matches!(
            list.mark_correct(&"nope".into(), Selection::Single),
            Err(BuilderError::UnknownEntry { .. })
        ));
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let mut list = options(&["A", "B", "C"]);
        list.remove(2).unwrap();
        assert_eq!(list.push("D").as_str(), "o4");
    }

    #[test]
    fn correct_positions_round_trip_through_ids() {
        let mut list = options(&["A", "B", "C"]);
        list.set_correct_positions(&[2, 0]).unwrap();
        assert_eq!(list.correct(), &[EntryId::from("o3"), EntryId::from("o1")]);
        assert!(list.set_correct_positions(&[5]).is_err());
    }

    #[test]
    fn correct_order_moves_independently() {
        let mut list = EntryList::from_raw(
            EntryKind::Item,
            IdAssigner::sequential("i"),
            vec!["a".into(), "b".into(), "c".into()],
        );
        list.set_correct_positions(&[0, 1, 2]).unwrap();
        list.move_correct(2, 0).unwrap();
        assert_eq!(values(&list), vec!["a", "b", "c"]);
        assert_eq!(
            list.correct(),
            &[EntryId::from("i3"), EntryId::from("i1"), EntryId::from("i2")]
        );
    }

    #[test]
    fn position_remaps_follow_entries() {
        // entries A B C D, positions of B and D selected
        assert_eq!(remap_after_move(&[1, 3], 1, 3), vec![3, 2]);
        assert_eq!(remap_after_move(&[1, 3], 3, 0), vec![2, 0]);
        assert_eq!(remap_after_move(&[0], 2, 1), vec![0]);
        assert_eq!(remap_after_remove(&[0, 2, 3], 2), vec![0, 2]);
        assert_eq!(remap_after_remove(&[1], 0), vec![0]);
    }

    #[test]
    fn reset_uses_fresh_ids() {
        let mut list = options(&["A", "B"]);
        list.mark_correct(&"o1".into(), Selection::Single).unwrap();
        list.reset(2);
        assert_eq!(
            list.entries().iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["o3", "o4"]
        );
        assert!(list.correct().is_empty());
    }

    #[test]
    fn insert_bounds_and_correct_ids() {
        let mut list = options(&["A", "B"]);
        list.mark_correct(&"o2".into(), Selection::Single).unwrap();

        assert_eq!(list.insert(1, "between").unwrap(), EntryId::from("o3"));
        assert_eq!(list.insert(3, "last").unwrap(), EntryId::from("o4"));
        assert_eq!(values(&list), vec!["A", "between", "B", "last"]);
        assert_eq!(list.correct(), &[EntryId::from("o2")]);
        assert_eq!(list.correct_positions(), vec![2]);

        assert_eq!(
            list.insert(5, "far"),
            Err(BuilderError::IndexOutOfRange {
                kind: EntryKind::Choice,
                index: 5
            })
        );
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn renormalize_keeps_ids_and_answers() {
        let mut list = options(&["A", "B", "C"]);
        list.mark_correct(&"o1".into(), Selection::Multiple).unwrap();
        list.mark_correct(&"o3".into(), Selection::Multiple).unwrap();
        let before: Vec<EntryId> = list.entries().iter().map(|e| e.id.clone()).collect();

        list.renormalize();
        let after: Vec<EntryId> = list.entries().iter().map(|e| e.id.clone()).collect();
        assert_eq!(after, before);
        assert_eq!(list.correct(), &[EntryId::from("o1"), EntryId::from("o3")]);
        assert_eq!(values(&list), vec!["A", "B", "C"]);
    }
}
