//! In-memory ordered list of child records with deferred persistence.
//!
//! Position in the list is the only source of truth for `sort_order`; the
//! value stored on each item is whatever was last loaded or saved and is
//! rewritten from position when writes are planned.

use std::fmt;

use shared::{
    domain::{ChildId, ScenarioId},
    protocol::{ChildRecord, ChildWrite},
};
use uuid::Uuid;

use crate::error::EditorError;

/// Client-only identity of a row. Never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempKey(Uuid);

impl TempKey {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TempKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    id: Option<ChildId>,
    text: String,
    sort_order: i64,
    is_active: Option<bool>,
    temp_key: TempKey,
}

impl DraftItem {
    fn from_record(record: ChildRecord) -> Self {
        Self {
            id: Some(record.id),
            text: record.text,
            sort_order: record.sort_order,
            is_active: record.is_active,
            temp_key: TempKey::fresh(),
        }
    }

    fn new_draft(text: String, sort_order: i64, is_active: Option<bool>) -> Self {
        Self {
            id: None,
            text,
            sort_order,
            is_active,
            temp_key: TempKey::fresh(),
        }
    }

    pub fn id(&self) -> Option<ChildId> {
        self.id
    }

    /// True until the first successful create; never true again afterwards.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last loaded or saved order. Stale after any local reorder.
    pub fn sort_order(&self) -> i64 {
        self.sort_order
    }

    pub fn is_active(&self) -> Option<bool> {
        self.is_active
    }

    pub fn temp_key(&self) -> TempKey {
        self.temp_key
    }

    /// Same logical row: by id when both sides have one, otherwise by temp key.
    pub fn same_identity(&self, id: Option<ChildId>, temp_key: TempKey) -> bool {
        match (self.id, id) {
            (Some(left), Some(right)) => left == right,
            _ => self.temp_key == temp_key,
        }
    }

    pub(crate) fn mark_persisted(&mut self, id: ChildId, sort_order: i64) {
        debug_assert!(self.id.is_none() || self.id == Some(id));
        self.id = Some(id);
        self.sort_order = sort_order;
    }
}

/// One create or update the list needs to bring the backend in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub position: usize,
    pub temp_key: TempKey,
    pub id: Option<ChildId>,
    pub body: ChildWrite,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftList {
    items: Vec<DraftItem>,
}

impl DraftList {
    /// Keeps the order the backend returned; every item starts persisted.
    pub fn from_records(records: Vec<ChildRecord>) -> Self {
        Self {
            items: records.into_iter().map(DraftItem::from_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&DraftItem> {
        self.items.get(position)
    }

    pub fn position_of(&self, temp_key: TempKey) -> Option<usize> {
        self.items.iter().position(|item| item.temp_key == temp_key)
    }

    pub fn push_draft(&mut self, text: &str, is_active: Option<bool>) -> Result<TempKey, EditorError> {
        if text.trim().is_empty() {
            return Err(EditorError::EmptyText);
        }
        let sort_order = self.items.len() as i64 + 1;
        let item = DraftItem::new_draft(text.to_string(), sort_order, is_active);
        let key = item.temp_key;
        self.items.push(item);
        Ok(key)
    }

    pub fn set_text(&mut self, position: usize, text: impl Into<String>) -> Result<(), EditorError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(position)
            .ok_or(EditorError::PositionOutOfRange { position, len })?;
        item.text = text.into();
        Ok(())
    }

    /// Moves one item, shifting everything between `from` and `to` by one.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.items.len();
        for position in [from, to] {
            if position >= len {
                return Err(EditorError::PositionOutOfRange { position, len });
            }
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, position: usize) -> Result<DraftItem, EditorError> {
        let len = self.items.len();
        if position >= len {
            return Err(EditorError::PositionOutOfRange { position, len });
        }
        Ok(self.items.remove(position))
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut DraftItem> {
        self.items.get_mut(position)
    }

    /// Writes for every item in current order, `sort_order` = position + 1.
    pub fn plan_writes(&self, scenario_id: ScenarioId) -> Vec<PlannedWrite> {
        self.items
            .iter()
            .enumerate()
            .map(|(position, item)| PlannedWrite {
                position,
                temp_key: item.temp_key,
                id: item.id,
                body: ChildWrite {
                    text: item.text.clone(),
                    sort_order: position as i64 + 1,
                    scenario_id,
                    is_active: item.is_active,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn record(id: i64, text: &str, sort_order: i64) -> ChildRecord {
        ChildRecord {
            id: ChildId(id),
            text: text.to_string(),
            sort_order,
            scenario_id: ScenarioId(1),
            is_active: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn keys(list: &DraftList) -> Vec<TempKey> {
        list.items().iter().map(DraftItem::temp_key).collect()
    }

    #[test]
    fn loaded_items_are_persisted() {
        let list = DraftList::from_records(vec![record(1, "A", 1), record(2, "B", 2)]);
        assert!(list.items().iter().all(|item| !item.is_new()));
        assert_eq!(list.get(1).and_then(DraftItem::id), Some(ChildId(2)));
    }

    #[test]
    fn blank_text_never_mutates() {
        let mut list = DraftList::from_records(vec![record(1, "A", 1)]);
        let before = list.clone();
        for text in ["", "   ", "\t\n"] {
            assert!(matches!(list.push_draft(text, None), Err(EditorError::EmptyText)));
        }
        assert_eq!(list, before);
    }

    #[test]
    fn drafts_append_at_the_end() {
        let mut list = DraftList::from_records(vec![record(1, "A", 1)]);
        let key = list.push_draft("B", Some(true)).expect("add");
        assert_eq!(list.position_of(key), Some(1));
        let item = list.get(1).expect("item");
        assert!(item.is_new());
        assert_eq!(item.sort_order(), 2);
        assert_eq!(item.is_active(), Some(true));
    }

    #[test]
    fn reorder_is_a_permutation() {
        let mut list = DraftList::default();
        for text in ["A", "B", "C", "D"] {
            list.push_draft(text, None).expect("add");
        }
        let before: HashSet<_> = keys(&list).into_iter().collect();

        list.reorder(0, 3).expect("reorder");
        let texts: Vec<_> = list.items().iter().map(DraftItem::text).collect();
        assert_eq!(texts, ["B", "C", "D", "A"]);

        list.reorder(3, 1).expect("reorder");
        let texts: Vec<_> = list.items().iter().map(DraftItem::text).collect();
        assert_eq!(texts, ["B", "A", "C", "D"]);

        let after: HashSet<_> = keys(&list).into_iter().collect();
        assert_eq!(before, after);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn out_of_range_reorder_leaves_list_alone() {
        let mut list = DraftList::from_records(vec![record(1, "A", 1), record(2, "B", 2)]);
        let before = list.clone();
        assert!(matches!(
            list.reorder(0, 2),
            Err(EditorError::PositionOutOfRange { position: 2, len: 2 })
        ));
        assert!(list.set_text(5, "x").is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn reorder_does_not_touch_stored_sort_order() {
        let mut list = DraftList::from_records(vec![record(1, "A", 1), record(2, "B", 2)]);
        list.reorder(0, 1).expect("reorder");
        assert_eq!(list.get(0).map(DraftItem::sort_order), Some(2));
        assert_eq!(list.get(1).map(DraftItem::sort_order), Some(1));
    }

    #[test]
    fn planned_writes_follow_position() {
        let mut list = DraftList::from_records(vec![record(10, "A", 7), record(11, "B", 3)]);
        list.push_draft("C", None).expect("add");
        list.reorder(2, 0).expect("reorder");

        let plan = list.plan_writes(ScenarioId(5));
        let summary: Vec<_> = plan
            .iter()
            .map(|write| (write.id, write.body.text.as_str(), write.body.sort_order))
            .collect();
        assert_eq!(
            summary,
            [
                (None, "C", 1),
                (Some(ChildId(10)), "A", 2),
                (Some(ChildId(11)), "B", 3),
            ]
        );
        assert!(plan.iter().all(|write| write.body.scenario_id == ScenarioId(5)));
    }

    #[test]
    fn identity_prefers_ids_over_temp_keys() {
        let list = DraftList::from_records(vec![record(4, "A", 1)]);
        let item = list.get(0).expect("item");
        assert!(item.same_identity(Some(ChildId(4)), TempKey::fresh()));
        assert!(!item.same_identity(Some(ChildId(5)), item.temp_key()));
        assert!(item.same_identity(None, item.temp_key()));
    }
}
