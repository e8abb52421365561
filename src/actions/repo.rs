use std::sync::Mutex;

use async_trait::async_trait;

use crate::actions::repo_types::{Action, ActionStatus, NewAction};

#[async_trait]
pub trait ActionRepository: Send + Sync {
    async fn add(&self, action: NewAction) -> anyhow::Result<Action>;

    /// Actions of one owner, oldest first.
    async fn list(&self, owner_id: i64) -> anyhow::Result<Vec<Action>>;
}

#[derive(Default)]
struct Rows {
    last_id: i64,
    actions: Vec<Action>,
}

/// Actions kept in process memory; ids count up from 1.
#[derive(Default)]
pub struct InMemoryActionRepository {
    rows: Mutex<Rows>,
}

impl InMemoryActionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActionRepository for InMemoryActionRepository {
    async fn add(&self, action: NewAction) -> anyhow::Result<Action> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.last_id += 1;
        let saved = Action {
            id: rows.last_id,
            owner_id: action.owner_id,
            title: action.title,
            description: action.description,
            status: ActionStatus::Todo,
            due_date: action.due_date,
            context: action.context,
            source_thing_id: action.source_thing_id,
        };
        rows.actions.push(saved.clone());
        Ok(saved)
    }

    async fn list(&self, owner_id: i64) -> anyhow::Result<Vec<Action>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .actions
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
