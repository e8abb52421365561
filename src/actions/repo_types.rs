use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Where an action sits in the workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Delayed,
    Delegated,
    Planned,
    Someday,
    Removed,
}

/// Next action owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub status: ActionStatus,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_thing_id: Option<i64>, // inbox item it was clarified from
}

#[derive(Debug, Clone)]
pub struct NewAction {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: Option<OffsetDateTime>,
    pub context: Option<String>,
    pub source_thing_id: Option<i64>,
}
