//! Durable, per-session, one-file-per-session storage.
//!
//! Writes are temp-file-then-rename: a partially written file can never
//! corrupt a later read. Malformed files are logged and skipped, never
//! fatal, matching the teacher's tolerance for a single bad upstream
//! event never taking down the whole poll loop.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::id::SessionId;
use super::model::Session;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no such session on disk: {0}")]
    NotFound(SessionId),
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), PersistenceError>;
    async fn load(&self, id: &SessionId) -> Result<Session, PersistenceError>;
    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError>;
    async fn exists(&self, id: &SessionId) -> bool;
    async fn list(&self) -> Result<Vec<SessionId>, PersistenceError>;
}

pub struct FsPersistence {
    dir: PathBuf,
}

impl FsPersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn tmp_path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!(".tmp-{id}"))
    }

    fn save_blocking(dir: &Path, path: PathBuf, tmp_path: PathBuf, session: Session) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(dir)?;
        let body = serde_json::to_vec_pretty(&session)?;
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load_blocking(path: PathBuf, id: SessionId) -> Result<Session, PersistenceError> {
        let body = std::fs::read(&path).map_err(|_| PersistenceError::NotFound(id))?;
        let session = serde_json::from_slice(&body)?;
        Ok(session)
    }
}

#[async_trait]
impl Persistence for FsPersistence {
    async fn save(&self, session: &Session) -> Result<(), PersistenceError> {
        let dir = self.dir.clone();
        let path = self.path_for(&session.id);
        let tmp_path = self.tmp_path_for(&session.id);
        let session = session.clone();
        tokio::task::spawn_blocking(move || Self::save_blocking(&dir, path, tmp_path, session))
            .await
            .expect("persistence save task panicked")
    }

    async fn load(&self, id: &SessionId) -> Result<Session, PersistenceError> {
        let path = self.path_for(id);
        let id = id.clone();
        tokio::task::spawn_blocking(move || Self::load_blocking(path, id))
            .await
            .expect("persistence load task panicked")
    }

    async fn delete(&self, id: &SessionId) -> Result<(), PersistenceError> {
        let path = self.path_for(id);
        tokio::task::spawn_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::from(e)),
        })
        .await
        .expect("persistence delete task panicked")
    }

    async fn exists(&self, id: &SessionId) -> bool {
        let path = self.path_for(id);
        tokio::task::spawn_blocking(move || path.exists())
            .await
            .unwrap_or(false)
    }

    async fn list(&self) -> Result<Vec<SessionId>, PersistenceError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(PersistenceError::from(e)),
            };
            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.starts_with(".tmp-") {
                        ids.push(SessionId::parse(stem));
                    }
                }
            }
            Ok(ids)
        })
        .await
        .expect("persistence list task panicked")
    }
}
