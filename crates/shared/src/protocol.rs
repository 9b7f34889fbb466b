use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{ChildId, ScenarioId};

/// A question or ending guidance as listed under its scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: ChildId,
    pub text: String,
    #[serde(default)]
    pub sort_order: i64,
    pub scenario_id: ScenarioId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Body of both the create (`POST /{collection}/`) and update
/// (`PUT /{collection}/{id}`) requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildWrite {
    pub text: String,
    pub sort_order: i64,
    pub scenario_id: ScenarioId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// The only part of a create response the client relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedChild {
    pub id: ChildId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: ScenarioId,
    pub name: String,
    #[serde(default)]
    pub greeting_text: Option<String>,
    #[serde(default = "default_conversation_mode")]
    pub conversation_mode: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_hard_stopped: bool,
}

fn default_conversation_mode() -> String {
    "A".to_string()
}

fn default_true() -> bool {
    true
}
