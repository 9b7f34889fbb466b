//! Screen events and error modeling for the console controller.

use std::fmt;

use admin_client::{DraftChange, DraftItem, EditorError, FailedItem, LoadOutcome, SaveSummary};
use shared::{
    domain::{ChildId, ChildKind},
    error::{ApiException, ErrorCode},
    protocol::ScenarioSummary,
};

use super::commands::HELP;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub position: usize,
    pub id: Option<ChildId>,
    pub text: String,
}

impl RowView {
    pub fn from_item(position: usize, item: &DraftItem) -> Self {
        Self {
            position,
            id: item.id(),
            text: item.text().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Info(String),
    Help,
    Scenarios(Vec<ScenarioSummary>),
    ScenarioOpened {
        scenario: ScenarioSummary,
        loads: Vec<(ChildKind, LoadOutcome)>,
    },
    Rows {
        kind: ChildKind,
        rows: Vec<RowView>,
    },
    ConfirmRemoval {
        kind: ChildKind,
        row: RowView,
    },
    Removed {
        kind: ChildKind,
        row: RowView,
        deleted_remotely: bool,
    },
    Changes {
        kind: ChildKind,
        changes: Vec<DraftChange>,
    },
    Saved {
        kind: ChildKind,
        summary: SaveSummary,
        changes: Vec<DraftChange>,
    },
    SaveFailed {
        kind: ChildKind,
        saved: usize,
        failed: Vec<FailedItem>,
    },
    Error(UiError),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    NotFound,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Scenarios,
    Select,
    Edit,
    Remove,
    Save,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn from_backend(context: UiErrorContext, err: &anyhow::Error) -> Self {
        let category = match err.downcast_ref::<ApiException>() {
            Some(api) => match api.code {
                ErrorCode::Unauthorized | ErrorCode::Forbidden => UiErrorCategory::Auth,
                ErrorCode::NotFound => UiErrorCategory::NotFound,
                ErrorCode::Validation => UiErrorCategory::Validation,
                _ => UiErrorCategory::Backend,
            },
            None if err.downcast_ref::<reqwest::Error>().is_some() => UiErrorCategory::Transport,
            None => UiErrorCategory::Backend,
        };
        Self::new(category, context, format!("{err:#}"))
    }

    pub fn from_editor(context: UiErrorContext, err: &EditorError) -> Self {
        match err {
            EditorError::DeleteFailed { source, .. } => {
                let mut ui = Self::from_backend(context, source);
                ui.message = format!("{err}: {source:#}");
                ui
            }
            other if other.is_validation() => {
                Self::new(UiErrorCategory::Validation, context, other.to_string())
            }
            other => Self::new(UiErrorCategory::Backend, context, other.to_string()),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, kind: ChildKind, rows: &[RowView]) -> fmt::Result {
    writeln!(f, "{}s ({}):", kind.label(), rows.len())?;
    if rows.is_empty() {
        return write!(f, "  (none)");
    }
    for (index, row) in rows.iter().enumerate() {
        let marker = match row.id {
            Some(id) => format!("id {id}"),
            None => "new".to_string(),
        };
        write!(f, "  {:>2}. [{marker}] {}", row.position + 1, row.text)?;
        if index + 1 < rows.len() {
            writeln!(f)?;
        }
    }
    Ok(())
}

fn write_changes(f: &mut fmt::Formatter<'_>, changes: &[DraftChange]) -> fmt::Result {
    for change in changes {
        write!(f, "\n  - {change}")?;
    }
    Ok(())
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiEvent::Info(message) => write!(f, "{message}"),
            UiEvent::Help => write!(f, "{HELP}"),
            UiEvent::Scenarios(scenarios) if scenarios.is_empty() => write!(f, "no scenarios"),
            UiEvent::Scenarios(scenarios) => {
                for (index, scenario) in scenarios.iter().enumerate() {
                    let state = if scenario.is_hard_stopped {
                        "stopped"
                    } else if scenario.is_active {
                        "active"
                    } else {
                        "paused"
                    };
                    write!(
                        f,
                        "{:>4}  {} (mode {}, {state})",
                        scenario.id, scenario.name, scenario.conversation_mode
                    )?;
                    if index + 1 < scenarios.len() {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
            UiEvent::ScenarioOpened { scenario, loads } => {
                write!(f, "opened scenario {}: {}", scenario.id, scenario.name)?;
                for (kind, outcome) in loads {
                    match outcome {
                        LoadOutcome::Loaded { count } => write!(f, "\n  {count} {kind}(s)")?,
                        LoadOutcome::Empty => write!(f, "\n  no {kind}s yet")?,
                        LoadOutcome::Unavailable { reason } => {
                            write!(f, "\n  could not load {kind}s ({reason}); starting empty")?
                        }
                    }
                }
                Ok(())
            }
            UiEvent::Rows { kind, rows } => write_rows(f, *kind, rows),
            UiEvent::ConfirmRemoval { kind, row } => write!(
                f,
                "{kind} #{} \"{}\" is saved; deleting it is immediate and cannot be undone. Delete? [y/n]",
                row.position + 1,
                row.text
            ),
            UiEvent::Removed {
                kind,
                row,
                deleted_remotely,
            } => {
                let how = if *deleted_remotely {
                    "deleted"
                } else {
                    "discarded draft"
                };
                write!(f, "{how} {kind} #{}: {}", row.position + 1, row.text)
            }
            UiEvent::Changes { kind, changes } if changes.is_empty() => {
                write!(f, "{kind}s: no unsaved changes")
            }
            UiEvent::Changes { kind, changes } => {
                write!(f, "{kind}s:")?;
                write_changes(f, changes)
            }
            UiEvent::Saved {
                kind,
                summary,
                changes,
            } => {
                write!(
                    f,
                    "saved {kind}s ({} created, {} updated)",
                    summary.created, summary.updated
                )?;
                write_changes(f, changes)
            }
            UiEvent::SaveFailed {
                kind,
                saved,
                failed,
            } => {
                write!(
                    f,
                    "{} {kind}(s) failed to save ({saved} saved); run 'save' again to retry:",
                    failed.len()
                )?;
                for item in failed {
                    write!(f, "\n  #{} \"{}\": {}", item.position + 1, item.text, item.reason)?;
                }
                Ok(())
            }
            UiEvent::Error(err) => {
                write!(f, "error: {}", err.message())?;
                if err.requires_reauth() {
                    write!(f, " (check username/password)")?;
                }
                Ok(())
            }
            UiEvent::Quit => write!(f, "bye"),
        }
    }
}
