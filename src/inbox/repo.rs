use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::inbox::repo_types::{NewThing, Thing, ThingStatus};

#[async_trait]
pub trait ThingRepository: Send + Sync {
    async fn add(&self, thing: NewThing) -> anyhow::Result<Thing>;

    /// Things of one owner, by id.
    async fn list(&self, owner_id: i64) -> anyhow::Result<Vec<Thing>>;

    /// `None` when the id is unknown or belongs to someone else.
    async fn get(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>>;

    /// Moves an active thing to done. `None` when the thing is unknown,
    /// foreign, or already done.
    async fn mark_done(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>>;

    /// Moves a done thing back to active, with the same `None` cases.
    async fn reopen(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>>;
}

#[derive(Default)]
struct Rows {
    last_id: i64,
    things: BTreeMap<i64, Thing>,
}

/// Inbox kept in process memory; ids count up from 1.
#[derive(Default)]
pub struct InMemoryThingRepository {
    rows: Mutex<Rows>,
}

impl InMemoryThingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ThingRepository for InMemoryThingRepository {
    async fn add(&self, thing: NewThing) -> anyhow::Result<Thing> {
        let mut rows = self.lock();
        rows.last_id += 1;
        let saved = Thing {
            id: rows.last_id,
            owner_id: thing.owner_id,
            title: thing.title,
            description: thing.description,
            status: ThingStatus::Active,
            created_at: thing.created_at,
        };
        rows.things.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn list(&self, owner_id: i64) -> anyhow::Result<Vec<Thing>> {
        Ok(self
            .lock()
            .things
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>> {
        Ok(self
            .lock()
            .things
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn mark_done(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>> {
        Ok(self.lock().transition(owner_id, id, ThingStatus::Active, ThingStatus::Done))
    }

    async fn reopen(&self, owner_id: i64, id: i64) -> anyhow::Result<Option<Thing>> {
        Ok(self.lock().transition(owner_id, id, ThingStatus::Done, ThingStatus::Active))
    }
}

impl Rows {
    fn transition(
        &mut self,
        owner_id: i64,
        id: i64,
        from: ThingStatus,
        to: ThingStatus,
    ) -> Option<Thing> {
        let thing = self
            .things
            .get_mut(&id)
            .filter(|t| t.owner_id == owner_id && t.status == from)?;
        thing.status = to;
        Some(thing.clone())
    }
}
