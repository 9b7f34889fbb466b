//! Human-readable change summaries between two states of a draft list.
//!
//! Only used for confirmation notices; nothing here affects what gets saved.

use std::fmt;

use shared::domain::ChildId;
use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::draft::{DraftItem, DraftList, TempKey};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SnapshotEntry {
    id: Option<ChildId>,
    temp_key: TempKey,
    text: String,
}

impl SnapshotEntry {
    fn same_identity(&self, other: &SnapshotEntry) -> bool {
        match (self.id, other.id) {
            (Some(left), Some(right)) => left == right,
            _ => self.temp_key == other.temp_key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl DraftSnapshot {
    pub fn capture(list: &DraftList) -> Self {
        Self {
            entries: list
                .items()
                .iter()
                .map(|item| SnapshotEntry {
                    id: item.id(),
                    temp_key: item.temp_key(),
                    text: item.text().to_string(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the row matching `item`, used once its deletion reached the backend.
    pub fn forget(&mut self, item: &DraftItem) {
        self.entries
            .retain(|entry| !item.same_identity(entry.id, entry.temp_key));
    }
}

/// Positions are 0-based; `Display` renders them 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftChange {
    Added {
        position: usize,
        text: String,
    },
    Removed {
        position: usize,
        text: String,
    },
    TextChanged {
        position: usize,
        before: String,
        after: String,
    },
    Moved {
        from: usize,
        to: usize,
        text: String,
    },
}

impl fmt::Display for DraftChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftChange::Added { position, text } => write!(f, "added #{}: {text}", position + 1),
            DraftChange::Removed { position, text } => {
                write!(f, "removed #{}: {text}", position + 1)
            }
            DraftChange::TextChanged {
                position,
                before,
                after,
            } => write!(f, "edited #{}: {before} -> {after}", position + 1),
            DraftChange::Moved { from, to, text } => {
                write!(f, "moved #{} -> #{}: {text}", from + 1, to + 1)
            }
        }
    }
}

pub fn diff(previous: &DraftSnapshot, current: &DraftSnapshot) -> Vec<DraftChange> {
    let mut matched_previous = vec![false; previous.entries.len()];
    // (current position, previous position) for rows present in both.
    let mut survivors: Vec<(usize, usize)> = Vec::new();
    let mut changes = Vec::new();

    for (position, entry) in current.entries.iter().enumerate() {
        let found = previous
            .entries
            .iter()
            .enumerate()
            .find(|(index, candidate)| !matched_previous[*index] && candidate.same_identity(entry));
        match found {
            Some((index, before)) => {
                matched_previous[index] = true;
                survivors.push((position, index));
                if before.text != entry.text {
                    changes.push(DraftChange::TextChanged {
                        position,
                        before: before.text.clone(),
                        after: entry.text.clone(),
                    });
                }
            }
            None => changes.push(DraftChange::Added {
                position,
                text: entry.text.clone(),
            }),
        }
    }

    let removed = previous
        .entries
        .iter()
        .enumerate()
        .filter(|(index, _)| !matched_previous[*index])
        .map(|(position, entry)| DraftChange::Removed {
            position,
            text: entry.text.clone(),
        });
    let mut summary: Vec<DraftChange> = removed.collect();

    let previous_order: Vec<usize> = survivors.iter().map(|(_, index)| *index).collect();
    let stable = stable_rows(&previous_order);
    for (slot, (position, index)) in survivors.iter().enumerate() {
        if !stable[slot] {
            changes.push(DraftChange::Moved {
                from: *index,
                to: *position,
                text: current.entries[*position].text.clone(),
            });
        }
    }

    summary.extend(changes);
    summary
}

/// Marks the surviving rows that kept their relative order. `previous_order`
/// holds each survivor's previous position, in current order; rows outside
/// the common subsequence with the original order are the moved ones.
fn stable_rows(previous_order: &[usize]) -> Vec<bool> {
    let mut original = previous_order.to_vec();
    original.sort_unstable();

    let mut stable = vec![false; previous_order.len()];
    for op in capture_diff_slices(Algorithm::Myers, &original, previous_order) {
        if let DiffOp::Equal { new_index, len, .. } = op {
            stable[new_index..new_index + len].fill(true);
        }
    }
    stable
}
