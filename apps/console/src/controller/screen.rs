//! Scenario screen state and command handling.

use std::sync::Arc;

use admin_client::{AdminBackend, DraftEditor, EditorError};
use shared::{
    domain::{ChildId, ChildKind, ScenarioId},
    protocol::ScenarioSummary,
};

use super::{
    commands::ConsoleCommand,
    events::{RowView, UiError, UiErrorCategory, UiErrorContext, UiEvent},
};

/// One opened scenario with its two independently edited lists.
pub struct ScenarioScreen {
    scenario: ScenarioSummary,
    questions: DraftEditor,
    endings: DraftEditor,
}

impl ScenarioScreen {
    pub fn scenario(&self) -> &ScenarioSummary {
        &self.scenario
    }

    pub fn editor(&self, kind: ChildKind) -> &DraftEditor {
        match kind {
            ChildKind::Question => &self.questions,
            ChildKind::EndingGuidance => &self.endings,
        }
    }

    fn editor_mut(&mut self, kind: ChildKind) -> &mut DraftEditor {
        match kind {
            ChildKind::Question => &mut self.questions,
            ChildKind::EndingGuidance => &mut self.endings,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.questions.has_unsaved_changes() || self.endings.has_unsaved_changes()
    }

    fn rows(&self, kind: ChildKind) -> UiEvent {
        let rows = self
            .editor(kind)
            .items()
            .iter()
            .enumerate()
            .map(|(position, item)| RowView::from_item(position, item))
            .collect();
        UiEvent::Rows { kind, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRemoval {
    kind: ChildKind,
    position: usize,
    id: ChildId,
}

pub struct ScreenController {
    backend: Arc<dyn AdminBackend>,
    screen: Option<ScenarioScreen>,
    pending_removal: Option<PendingRemoval>,
}

impl ScreenController {
    pub fn new(backend: Arc<dyn AdminBackend>) -> Self {
        Self {
            backend,
            screen: None,
            pending_removal: None,
        }
    }

    pub fn screen(&self) -> Option<&ScenarioScreen> {
        self.screen.as_ref()
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.pending_removal.is_some()
    }

    pub async fn handle(&mut self, cmd: ConsoleCommand) -> Vec<UiEvent> {
        let mut events = Vec::new();

        if let Some(pending) = self.pending_removal.take() {
            match cmd {
                ConsoleCommand::Confirm(true) => {
                    self.remove_confirmed(pending, &mut events).await;
                    return events;
                }
                ConsoleCommand::Confirm(false) => {
                    events.push(UiEvent::Info("kept the row".to_string()));
                    return events;
                }
                _ => events.push(UiEvent::Info("removal cancelled".to_string())),
            }
        }

        match cmd {
            ConsoleCommand::Help => events.push(UiEvent::Help),
            ConsoleCommand::Scenarios => match self.backend.list_scenarios().await {
                Ok(scenarios) => events.push(UiEvent::Scenarios(scenarios)),
                Err(err) => events.push(UiEvent::Error(UiError::from_backend(
                    UiErrorContext::Scenarios,
                    &err,
                ))),
            },
            ConsoleCommand::Select(scenario_id) => self.select(scenario_id, &mut events).await,
            ConsoleCommand::Confirm(_) => {
                events.push(UiEvent::Info("nothing to confirm".to_string()))
            }
            ConsoleCommand::Quit => {
                if self.screen.as_ref().is_some_and(ScenarioScreen::has_unsaved_changes) {
                    events.push(UiEvent::Info("unsaved drafts discarded".to_string()));
                }
                events.push(UiEvent::Quit);
            }
            other => {
                let Some(screen) = self.screen.as_mut() else {
                    events.push(UiEvent::Error(UiError::new(
                        UiErrorCategory::Validation,
                        UiErrorContext::General,
                        "no scenario selected; use 'select <id>'",
                    )));
                    return events;
                };
                match other {
                    ConsoleCommand::List => {
                        events.push(screen.rows(ChildKind::Question));
                        events.push(screen.rows(ChildKind::EndingGuidance));
                    }
                    ConsoleCommand::Add { kind, text } => {
                        let result = screen.editor_mut(kind).add_draft(&text).map(|_| ());
                        push_edit_result(screen, kind, result, &mut events);
                    }
                    ConsoleCommand::Edit {
                        kind,
                        position,
                        text,
                    } => {
                        let result = screen.editor_mut(kind).update_text(position, text);
                        push_edit_result(screen, kind, result, &mut events);
                    }
                    ConsoleCommand::Move { kind, from, to } => {
                        let result = screen.editor_mut(kind).reorder(from, to);
                        push_edit_result(screen, kind, result, &mut events);
                    }
                    ConsoleCommand::Remove {
                        kind,
                        position,
                        confirmed,
                    } => {
                        let editor = screen.editor(kind);
                        match editor.list().get(position) {
                            None => events.push(UiEvent::Error(UiError::from_editor(
                                UiErrorContext::Remove,
                                &EditorError::PositionOutOfRange {
                                    position,
                                    len: editor.list().len(),
                                },
                            ))),
                            Some(item) => match item.id() {
                                Some(id) if !confirmed => {
                                    events.push(UiEvent::ConfirmRemoval {
                                        kind,
                                        row: RowView::from_item(position, item),
                                    });
                                    self.pending_removal = Some(PendingRemoval {
                                        kind,
                                        position,
                                        id,
                                    });
                                }
                                _ => remove_row(screen, kind, position, &mut events).await,
                            },
                        }
                    }
                    ConsoleCommand::Diff => {
                        for kind in ChildKind::ALL {
                            let editor = screen.editor(kind);
                            events.push(UiEvent::Changes {
                                kind,
                                changes: editor.diff_summary(editor.baseline()),
                            });
                        }
                    }
                    ConsoleCommand::Save => save_screen(screen, &mut events).await,
                    ConsoleCommand::Help
                    | ConsoleCommand::Scenarios
                    | ConsoleCommand::Select(_)
                    | ConsoleCommand::Confirm(_)
                    | ConsoleCommand::Quit => {}
                }
            }
        }

        events
    }

    async fn select(&mut self, scenario_id: ScenarioId, events: &mut Vec<UiEvent>) {
        let scenario = match self.backend.fetch_scenario(scenario_id).await {
            Ok(scenario) => scenario,
            Err(err) => {
                events.push(UiEvent::Error(UiError::from_backend(
                    UiErrorContext::Select,
                    &err,
                )));
                return;
            }
        };

        if let Some(previous) = &self.screen {
            if previous.has_unsaved_changes() {
                events.push(UiEvent::Info(format!(
                    "discarded unsaved drafts for scenario {}",
                    previous.scenario.id
                )));
            }
        }

        let mut questions = DraftEditor::new(ChildKind::Question, self.backend.clone());
        let mut endings = DraftEditor::new(ChildKind::EndingGuidance, self.backend.clone());
        let (question_load, ending_load) =
            tokio::join!(questions.load(scenario_id), endings.load(scenario_id));

        let screen = ScenarioScreen {
            scenario: scenario.clone(),
            questions,
            endings,
        };
        events.push(UiEvent::ScenarioOpened {
            scenario,
            loads: vec![
                (ChildKind::Question, question_load),
                (ChildKind::EndingGuidance, ending_load),
            ],
        });
        events.push(screen.rows(ChildKind::Question));
        events.push(screen.rows(ChildKind::EndingGuidance));
        self.screen = Some(screen);
    }

    async fn remove_confirmed(&mut self, pending: PendingRemoval, events: &mut Vec<UiEvent>) {
        let Some(screen) = self.screen.as_mut() else {
            return;
        };
        let still_there = screen
            .editor(pending.kind)
            .list()
            .get(pending.position)
            .is_some_and(|item| item.id() == Some(pending.id));
        if !still_there {
            events.push(UiEvent::Info("row changed; removal cancelled".to_string()));
            return;
        }
        remove_row(screen, pending.kind, pending.position, events).await;
    }
}

fn push_edit_result(
    screen: &ScenarioScreen,
    kind: ChildKind,
    result: Result<(), EditorError>,
    events: &mut Vec<UiEvent>,
) {
    match result {
        Ok(()) => events.push(screen.rows(kind)),
        Err(err) => events.push(UiEvent::Error(UiError::from_editor(
            UiErrorContext::Edit,
            &err,
        ))),
    }
}

async fn remove_row(
    screen: &mut ScenarioScreen,
    kind: ChildKind,
    position: usize,
    events: &mut Vec<UiEvent>,
) {
    match screen.editor_mut(kind).remove_draft(position).await {
        Ok(removed) => {
            events.push(UiEvent::Removed {
                kind,
                row: RowView::from_item(position, &removed.item),
                deleted_remotely: removed.deleted_remotely,
            });
            events.push(screen.rows(kind));
        }
        Err(err) => events.push(UiEvent::Error(UiError::from_editor(
            UiErrorContext::Remove,
            &err,
        ))),
    }
}

async fn save_screen(screen: &mut ScenarioScreen, events: &mut Vec<UiEvent>) {
    let scenario_id = screen.scenario.id;
    let ScenarioScreen {
        questions, endings, ..
    } = screen;
    let (question_events, ending_events) = tokio::join!(
        save_editor(questions, scenario_id),
        save_editor(endings, scenario_id)
    );
    events.extend(question_events);
    events.extend(ending_events);
}

async fn save_editor(editor: &mut DraftEditor, scenario_id: ScenarioId) -> Vec<UiEvent> {
    let kind = editor.kind();
    let before = editor.baseline().clone();
    match editor.save(scenario_id).await {
        Ok(summary) => vec![
            UiEvent::Saved {
                kind,
                summary,
                changes: editor.diff_summary(&before),
            },
        ],
        Err(EditorError::SaveFailed(failure)) => vec![UiEvent::SaveFailed {
            kind,
            saved: failure.saved,
            failed: failure.failed,
        }],
        Err(err) => vec![UiEvent::Error(UiError::from_editor(
            UiErrorContext::Save,
            &err,
        ))],
    }
}
