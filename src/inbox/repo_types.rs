use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThingStatus {
    #[default]
    Active,
    Done,
}

/// Something captured into the inbox, not yet clarified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thing {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub status: ThingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewThing {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}
