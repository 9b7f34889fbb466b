//! Draft editor for one child collection of one scenario.
//!
//! Text edits, additions and reorders stay local until [`DraftEditor::save`].
//! Removing a persisted row is the exception: it deletes on the backend
//! immediately and only then drops the row locally.

use std::sync::Arc;

use futures::future::join_all;
use shared::domain::{ChildId, ChildKind, ScenarioId};
use tracing::{info, warn};

use crate::{
    diff::{self, DraftChange, DraftSnapshot},
    draft::{DraftItem, DraftList, PlannedWrite, TempKey},
    error::{EditorError, FailedItem, SaveFailure},
    gesture::DropMove,
    AdminBackend,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    Empty,
    /// The fetch failed; the list was reset to empty.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedItem {
    pub item: DraftItem,
    /// Whether a backend delete was issued for it.
    pub deleted_remotely: bool,
}

pub struct DraftEditor {
    kind: ChildKind,
    backend: Arc<dyn AdminBackend>,
    scenario_id: Option<ScenarioId>,
    list: DraftList,
    baseline: DraftSnapshot,
}

impl DraftEditor {
    pub fn new(kind: ChildKind, backend: Arc<dyn AdminBackend>) -> Self {
        Self {
            kind,
            backend,
            scenario_id: None,
            list: DraftList::default(),
            baseline: DraftSnapshot::default(),
        }
    }

    pub fn kind(&self) -> ChildKind {
        self.kind
    }

    /// Scenario of the last load, if any.
    pub fn scenario_id(&self) -> Option<ScenarioId> {
        self.scenario_id
    }

    pub fn list(&self) -> &DraftList {
        &self.list
    }

    pub fn items(&self) -> &[DraftItem] {
        self.list.items()
    }

    /// State as of the last load or fully successful save.
    pub fn baseline(&self) -> &DraftSnapshot {
        &self.baseline
    }

    pub async fn load(&mut self, scenario_id: ScenarioId) -> LoadOutcome {
        self.scenario_id = Some(scenario_id);
        let outcome = match self.backend.list_children(self.kind, scenario_id).await {
            Ok(records) if records.is_empty() => {
                self.list = DraftList::default();
                LoadOutcome::Empty
            }
            Ok(records) => {
                self.list = DraftList::from_records(records);
                LoadOutcome::Loaded {
                    count: self.list.len(),
                }
            }
            Err(err) => {
                warn!(%scenario_id, kind = %self.kind, error = %err, "load failed; showing empty list");
                self.list = DraftList::default();
                LoadOutcome::Unavailable {
                    reason: format!("{err:#}"),
                }
            }
        };
        self.baseline = DraftSnapshot::capture(&self.list);
        info!(%scenario_id, kind = %self.kind, count = self.list.len(), "draft list loaded");
        outcome
    }

    pub fn add_draft(&mut self, text: &str) -> Result<TempKey, EditorError> {
        let is_active = self.kind.has_active_flag().then_some(true);
        self.list.push_draft(text, is_active)
    }

    pub fn update_text(&mut self, position: usize, text: impl Into<String>) -> Result<(), EditorError> {
        self.list.set_text(position, text)
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        self.list.reorder(from, to)
    }

    /// Applies a finished drag gesture.
    pub fn apply_drop(&mut self, drop: DropMove) -> Result<(), EditorError> {
        self.list.reorder(drop.from, drop.to)
    }

    /// Callers confirm with the user before removing a persisted row; the
    /// delete is not part of the deferred save.
    pub async fn remove_draft(&mut self, position: usize) -> Result<RemovedItem, EditorError> {
        let len = self.list.len();
        let id = self
            .list
            .get(position)
            .ok_or(EditorError::PositionOutOfRange { position, len })?
            .id();

        if let Some(id) = id {
            self.backend
                .delete_child(self.kind, id)
                .await
                .map_err(|source| EditorError::DeleteFailed {
                    kind: self.kind,
                    id,
                    source,
                })?;
            info!(kind = %self.kind, %id, "deleted persisted draft");
        }

        let item = self.list.remove(position)?;
        if id.is_some() {
            self.baseline.forget(&item);
        }
        Ok(RemovedItem {
            item,
            deleted_remotely: id.is_some(),
        })
    }

    /// Creates new rows and updates persisted ones, all with `sort_order`
    /// taken from current position. Writes are dispatched together and the
    /// save settles when every one of them has.
    pub async fn save(&mut self, scenario_id: ScenarioId) -> Result<SaveSummary, EditorError> {
        let plan = self.list.plan_writes(scenario_id);
        let results = join_all(plan.iter().map(|write| self.dispatch(write))).await;

        let mut summary = SaveSummary::default();
        let mut failed = Vec::new();
        for (write, result) in plan.into_iter().zip(results) {
            match result {
                Ok(id) => {
                    if write.id.is_none() {
                        summary.created += 1;
                    } else {
                        summary.updated += 1;
                    }
                    if let Some(item) = self.list.get_mut(write.position) {
                        item.mark_persisted(id, write.body.sort_order);
                    }
                }
                Err(err) => failed.push(FailedItem {
                    position: write.position,
                    temp_key: write.temp_key,
                    id: write.id,
                    text: write.body.text,
                    reason: format!("{err:#}"),
                }),
            }
        }

        let saved = summary.created + summary.updated;
        if failed.is_empty() {
            self.baseline = DraftSnapshot::capture(&self.list);
            info!(
                %scenario_id,
                kind = %self.kind,
                created = summary.created,
                updated = summary.updated,
                "draft list saved"
            );
            return Ok(summary);
        }

        warn!(
            %scenario_id,
            kind = %self.kind,
            saved,
            failed = failed.len(),
            "draft list partially saved"
        );
        Err(SaveFailure {
            kind: self.kind,
            saved,
            failed,
        }
        .into())
    }

    async fn dispatch(&self, write: &PlannedWrite) -> anyhow::Result<ChildId> {
        match write.id {
            None => self.backend.create_child(self.kind, &write.body).await,
            Some(id) => {
                self.backend
                    .update_child(self.kind, id, &write.body)
                    .await?;
                Ok(id)
            }
        }
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::capture(&self.list)
    }

    pub fn diff_summary(&self, previous: &DraftSnapshot) -> Vec<DraftChange> {
        diff::diff(previous, &self.snapshot())
    }

    /// Stored `sort_order` values are not compared: loaded rows may carry
    /// any order, and local reorders already show up as moves.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.diff_summary(&self.baseline).is_empty()
            || self.list.items().iter().any(DraftItem::is_new)
    }
}
