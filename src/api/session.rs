//! In-memory dataset sessions
//!
//! Each uploaded CSV becomes a session holding its working table. Mutating
//! operations run against a copy and only replace the stored table when they
//! succeed. Every session has its own lock; the map lock is only held long
//! enough to look a session up.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::Table;

type Session = Arc<RwLock<Table>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn session(&self, id: &Uuid) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Store a table under a fresh id
    pub async fn insert(&self, table: Table) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(table)));
        id
    }

    /// Snapshot of the session's table
    pub async fn get(&self, id: &Uuid) -> Option<Table> {
        let session = self.session(id).await?;
        let table = session.read().await.clone();
        Some(table)
    }

    /// Run `op` on a copy of the session's table and keep the copy only if
    /// `op` succeeds. `None` when the session does not exist.
    ///
    /// Updates to the same session are serialized; other sessions stay
    /// available while `op` runs.
    pub async fn update<T, E>(
        &self,
        id: &Uuid,
        op: impl FnOnce(&mut Table) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let session = self.session(id).await?;
        let mut stored = session.write().await;
        let mut working = stored.clone();
        let result = op(&mut working);
        if result.is_ok() {
            *stored = working;
        }
        Some(result)
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
