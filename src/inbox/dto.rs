use serde::Deserialize;
use time::OffsetDateTime;

use crate::inbox::services::Clarification;

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClarifyRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub context: Option<String>,
}

impl From<ClarifyRequest> for Clarification {
    fn from(r: ClarifyRequest) -> Self {
        Self {
            title: r.title,
            priority: r.priority,
            due_date: r.due_date,
            context: r.context,
        }
    }
}
