use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::actions::{
    repo::ActionRepository,
    repo_types::{Action, NewAction},
};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action title cannot be empty")]
    EmptyTitle,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// What an inbox item turned out to be once clarified.
#[derive(Debug, Clone, Default)]
pub struct ClarifiedData {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub due_date: Option<OffsetDateTime>,
    pub context: Option<String>,
    pub source_id: i64,
}

pub struct ActionService {
    repo: Arc<dyn ActionRepository>,
}

impl ActionService {
    pub fn new(repo: Arc<dyn ActionRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, action: NewAction) -> Result<Action, ActionError> {
        if action.title.trim().is_empty() {
            return Err(ActionError::EmptyTitle);
        }
        let saved = self.repo.add(action).await?;
        info!(action_id = saved.id, owner_id = saved.owner_id, "action created");
        Ok(saved)
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<Action>, ActionError> {
        Ok(self.repo.list(owner_id).await?)
    }

    /// `high` priority files the action under `urgent`, `low` under
    /// `someday`; anything else keeps the given context.
    pub async fn create_from_clarified(
        &self,
        owner_id: i64,
        data: ClarifiedData,
    ) -> Result<Action, ActionError> {
        let context = match data.priority.as_deref() {
            Some("high") => Some("urgent".to_string()),
            Some("low") => Some("someday".to_string()),
            _ => data.context,
        };
        self.create(NewAction {
            owner_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            context,
            source_thing_id: Some(data.source_id),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{repo::InMemoryActionRepository, repo_types::ActionStatus};

    fn service() -> ActionService {
        ActionService::new(Arc::new(InMemoryActionRepository::new()))
    }

    fn new_action(owner_id: i64, title: &str) -> NewAction {
        NewAction {
            owner_id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            context: None,
            source_thing_id: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_starts_as_todo() {
        let s = service();
        let first = s.create(new_action(1, "write report")).await.unwrap();
        let second = s.create(new_action(1, "call bank")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.status, ActionStatus::Todo);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let err = service().create(new_action(1, "   ")).await.unwrap_err();
        assert!(matches!(err, ActionError::EmptyTitle));
    }

    #[tokio::test]
    async fn list_only_returns_own_actions() {
        let s = service();
        s.create(new_action(1, "mine")).await.unwrap();
        s.create(new_action(2, "theirs")).await.unwrap();
        let mine = s.list(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[tokio::test]
    async fn priority_decides_context() {
        let s = service();
        let clarified = |priority: Option<&str>| ClarifiedData {
            title: "t".into(),
            priority: priority.map(str::to_string),
            context: Some("@home".into()),
            source_id: 9,
            ..Default::default()
        };

        let high = s.create_from_clarified(1, clarified(Some("high"))).await.unwrap();
        let low = s.create_from_clarified(1, clarified(Some("low"))).await.unwrap();
        let other = s.create_from_clarified(1, clarified(None)).await.unwrap();
        assert_eq!(high.context.as_deref(), Some("urgent"));
        assert_eq!(low.context.as_deref(), Some("someday"));
        assert_eq!(other.context.as_deref(), Some("@home"));
        assert_eq!(other.source_thing_id, Some(9));
    }
}
