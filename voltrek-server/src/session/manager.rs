//! Owns the set of live sessions: allocation, lookup, listing, eviction,
//! and the single `mutate` choke point the command service drives state
//! changes through.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use voltrek_core::GameState;

use super::id::SessionId;
use super::model::Session;
use super::persistence::Persistence;
use voltrek_core::ConfigRegistry;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("could not allocate a unique session id")]
    Conflict,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    Created,
    Accessed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_secs()
}

type SessionSlot = Arc<Mutex<Session>>;

pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
    persistence: Arc<dyn Persistence>,
    registry: Arc<ConfigRegistry>,
}

impl SessionManager {
    /// Load every persisted session into memory. A session file that
    /// fails to parse is logged and skipped, never fatal (spec §4.C).
    pub async fn load(persistence: Arc<dyn Persistence>, registry: Arc<ConfigRegistry>) -> Self {
        let mut sessions = HashMap::new();
        match persistence.list().await {
            Ok(ids) => {
                for id in ids {
                    match persistence.load(&id).await {
                        Ok(session) => {
                            sessions.insert(id, Arc::new(Mutex::new(session)));
                        }
                        Err(e) => {
                            tracing::warn!("skipping unreadable session {id}: {e}");
                        }
                    }
                }
            }
            Err(e) => tracing::warn!("could not list persisted sessions at startup: {e}"),
        }
        tracing::info!("loaded {} session(s) from disk", sessions.len());

        Self {
            sessions: RwLock::new(sessions),
            persistence,
            registry,
        }
    }

    pub async fn create(&self, config_name: Option<&str>) -> Result<Session, SessionError> {
        let config = self.registry.load_or_default(config_name.unwrap_or(""));
        let state = GameState::new(&config);

        let id = {
            let sessions = self.sessions.read().await;
            SessionId::allocate(|candidate| sessions.contains_key(candidate))
        }
        .ok_or(SessionError::Conflict)?;

        let now = now_unix();
        let session = Session::new(id.clone(), config.name.clone(), state, now);

        self.persistence
            .save(&session)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session.clone())));

        Ok(session)
    }

    /// Case-insensitive lookup. A miss never falls through to disk in
    /// the hot path; the reconciler is what keeps memory and disk in
    /// sync (spec §4.C).
    pub async fn get(&self, id: &str) -> Result<Session, SessionError> {
        let id = SessionId::parse(id);
        let sessions = self.sessions.read().await;
        let slot = sessions
            .get(&id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        Ok(slot.lock().await.clone())
    }

    pub async fn list(&self, sort_by: SortBy, order: SortOrder, limit: Option<usize>) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        let mut snapshots = Vec::with_capacity(sessions.len());
        for slot in sessions.values() {
            snapshots.push(slot.lock().await.clone());
        }
        snapshots.sort_by_key(|s| match sort_by {
            SortBy::Created => s.created_at,
            SortBy::Accessed => s.last_accessed_at,
        });
        if order == SortOrder::Desc {
            snapshots.reverse();
        }
        if let Some(limit) = limit {
            snapshots.truncate(limit);
        }
        snapshots
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        let id = SessionId::parse(id);
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }
        self.persistence
            .delete(&id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        Ok(())
    }

    /// The only way callers mutate session state: acquire the
    /// per-session lock for the duration of `f`, update
    /// `last_accessed_at`, persist, then return the post-mutation
    /// snapshot alongside whatever `f` returned.
    pub async fn mutate<F, R>(&self, id: &str, f: F) -> Result<(Session, R), SessionError>
    where
        F: FnOnce(&mut Session) -> R + Send,
    {
        let session_id = SessionId::parse(id);
        let slot = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&session_id)
                .cloned()
                .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?
        };

        let mut guard = slot.lock().await;
        let result = f(&mut guard);
        guard.touch(now_unix());
        let snapshot = guard.clone();
        drop(guard);

        // Persistence failures never roll back the in-memory mutation,
        // which is authoritative (spec §7): log and retry on next
        // mutation instead of surfacing an error here.
        if let Err(e) = self.persistence.save(&snapshot).await {
            tracing::error!("failed to persist session {session_id} after mutation: {e}");
        }

        Ok((snapshot, result))
    }

    pub async fn registry(&self) -> Arc<ConfigRegistry> {
        self.registry.clone()
    }

    /// Evict sessions idle past `retention`. Only removes; never mutates
    /// live state (spec §9 "no background mutation").
    pub async fn cleanup(&self, retention: Duration) -> usize {
        let now = now_unix();
        let retention_secs = retention.as_secs();
        let mut stale = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, slot) in sessions.iter() {
                let last_accessed = slot.lock().await.last_accessed_at;
                if now.saturating_sub(last_accessed) > retention_secs {
                    stale.push(id.clone());
                }
            }
        }
        for id in &stale {
            self.sessions.write().await.remove(id);
            if let Err(e) = self.persistence.delete(id).await {
                tracing::warn!("cleanup: failed to delete persisted session {id}: {e}");
            }
        }
        if !stale.is_empty() {
            tracing::info!("cleanup evicted {} idle session(s)", stale.len());
        }
        stale.len()
    }

    /// Evict in-memory sessions whose persisted file has disappeared —
    /// the supported operator workflow for evicting a session is
    /// deleting its file (spec §9).
    pub async fn reconcile(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        let mut pruned = Vec::new();
        for id in ids {
            if !self.persistence.exists(&id).await {
                pruned.push(id);
            }
        }
        for id in &pruned {
            self.sessions.write().await.remove(id);
        }
        if !pruned.is_empty() {
            tracing::info!("reconcile pruned {} session(s) with missing files", pruned.len());
        }
        pruned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::persistence::FsPersistence;

    async fn manager() -> (SessionManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(FsPersistence::new(dir.path()));
        let registry = Arc::new(ConfigRegistry::new(dir.path().join("configs")));
        (SessionManager::load(persistence, registry).await, dir)
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let (manager, _dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        let fetched = manager.get(created.id.as_str()).await.unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn get_is_case_insensitive() {
        let (manager, _dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        let upper = created.id.as_str().to_ascii_uppercase();
        assert!(manager.get(&upper).await.is_ok());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (manager, _dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        manager.delete(created.id.as_str()).await.unwrap();
        assert!(matches!(
            manager.get(created.id.as_str()).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            manager.delete(created.id.as_str()).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn mutate_updates_last_accessed_and_persists() {
        let (manager, _dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        let (after, _) = manager
            .mutate(created.id.as_str(), |session| {
                session.state.score = 9;
            })
            .await
            .unwrap();
        assert_eq!(after.state.score, 9);
        assert!(after.last_accessed_at >= created.last_accessed_at);

        let refetched = manager.get(created.id.as_str()).await.unwrap();
        assert_eq!(refetched.state.score, 9);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (manager, _dir) = manager().await;
        let a = manager.create(None).await.unwrap();
        let b = manager.create(None).await.unwrap();

        manager
            .mutate(a.id.as_str(), |session| session.state.score = 3)
            .await
            .unwrap();

        let b_after = manager.get(b.id.as_str()).await.unwrap();
        assert_eq!(b_after.state.score, 0);
    }

    #[tokio::test]
    async fn cleanup_evicts_past_retention() {
        let (manager, _dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        manager
            .mutate(created.id.as_str(), |session| {
                session.last_accessed_at = 0;
            })
            .await
            .unwrap();

        let evicted = manager.cleanup(Duration::from_secs(1)).await;
        assert_eq!(evicted, 1);
        assert!(manager.get(created.id.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn reconcile_prunes_sessions_whose_file_disappeared() {
        let (manager, dir) = manager().await;
        let created = manager.create(None).await.unwrap();
        std::fs::remove_file(dir.path().join(format!("{}.json", created.id))).unwrap();

        let pruned = manager.reconcile().await;
        assert_eq!(pruned, 1);
        assert!(manager.get(created.id.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn list_sorts_and_limits() {
        let (manager, _dir) = manager().await;
        manager.create(None).await.unwrap();
        manager.create(None).await.unwrap();
        manager.create(None).await.unwrap();

        let page = manager.list(SortBy::Created, SortOrder::Asc, Some(2)).await;
        assert_eq!(page.len(), 2);
    }
}
