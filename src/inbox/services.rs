use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::actions::{repo_types::Action, ActionError, ActionService, ClarifiedData};
use crate::clock::Clock;
use crate::inbox::{
    repo::ThingRepository,
    repo_types::{NewThing, Thing, ThingStatus},
};

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("thing title cannot be empty")]
    EmptyTitle,
    #[error("thing {0} not found")]
    NotFound(i64),
    #[error("thing {0} has already been clarified")]
    AlreadyClarified(i64),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// How the owner decided to follow up on a thing.
#[derive(Debug, Clone, Default)]
pub struct Clarification {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<time::OffsetDateTime>,
    pub context: Option<String>,
}

pub struct InboxService {
    repo: Arc<dyn ThingRepository>,
    actions: Arc<ActionService>,
    clock: Arc<dyn Clock>,
}

impl InboxService {
    pub fn new(
        repo: Arc<dyn ThingRepository>,
        actions: Arc<ActionService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            actions,
            clock,
        }
    }

    pub async fn add(
        &self,
        owner_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Thing, InboxError> {
        if title.trim().is_empty() {
            return Err(InboxError::EmptyTitle);
        }
        let thing = self
            .repo
            .add(NewThing {
                owner_id,
                title: title.to_owned(),
                description: description.to_owned(),
                created_at: self.clock.now(),
            })
            .await?;
        info!(thing_id = thing.id, owner_id, "thing captured");
        Ok(thing)
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<Thing>, InboxError> {
        Ok(self.repo.list(owner_id).await?)
    }

    pub async fn get(&self, owner_id: i64, id: i64) -> Result<Thing, InboxError> {
        self.repo
            .get(owner_id, id)
            .await?
            .ok_or(InboxError::NotFound(id))
    }

    /// Turn an active thing into an action and mark the thing done.
    ///
    /// The thing is closed before the action is created, so a thing yields at
    /// most one action. If the action cannot be created the thing is reopened.
    pub async fn clarify(
        &self,
        owner_id: i64,
        id: i64,
        clarification: Clarification,
    ) -> Result<Action, InboxError> {
        let thing = self.get(owner_id, id).await?;
        if thing.status != ThingStatus::Active {
            warn!(thing_id = id, "thing already clarified");
            return Err(InboxError::AlreadyClarified(id));
        }

        if self.repo.mark_done(owner_id, id).await?.is_none() {
            warn!(thing_id = id, "thing closed concurrently");
            return Err(InboxError::AlreadyClarified(id));
        }

        let created = self
            .actions
            .create_from_clarified(
                owner_id,
                ClarifiedData {
                    title: clarification.title.unwrap_or(thing.title),
                    description: thing.description,
                    priority: clarification.priority,
                    due_date: clarification.due_date,
                    context: clarification.context,
                    source_id: thing.id,
                },
            )
            .await;

        match created {
            Ok(action) => {
                info!(thing_id = id, action_id = action.id, "thing clarified");
                Ok(action)
            }
            Err(e) => {
                if self.repo.reopen(owner_id, id).await?.is_none() {
                    error!(thing_id = id, "could not reopen thing after failed clarify");
                }
                Err(e.into())
            }
        }
    }
}
