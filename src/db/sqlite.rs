use super::traits::FragmentStore;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Fragment store backed by a local libsql database.
///
/// One connection is shared by all operations, so an in-memory database
/// stays the same database for the life of the store. Reads wait for an
/// open batch transaction, since on a shared connection they would
/// otherwise see its uncommitted rows.
pub struct LibsqlFragmentStore {
    conn: Connection,
    lock: Mutex<()>,
}

impl LibsqlFragmentStore {
    /// Open the database at `url`: a file path, or `:memory:`.
    ///
    /// Missing parent directories of a file path are created.
    pub async fn open(url: &str) -> Result<Self> {
        if url == ":memory:" {
            return Self::new_memory().await;
        }
        Self::new_local(url).await
    }

    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Store(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        Self::connect(path).await
    }

    pub async fn new_memory() -> Result<Self> {
        Self::connect(":memory:").await
    }

    async fn connect(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Store(format!("Failed to open {}: {}", path, e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Store(format!("Failed to get connection: {}", e)))?;

        let store = Self {
            conn,
            lock: Mutex::new(()),
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS fragments (
                    source_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    stored_at INTEGER NOT NULL,
                    PRIMARY KEY (source_id, position)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Store(format!("Failed to create fragments table: {}", e)))?;
        Ok(())
    }

    async fn count(&self, source_id: &str) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM fragments WHERE source_id = ?",
                [source_id],
            )
            .await
            .map_err(|e| AppError::Store(format!("Failed to query fragments: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl FragmentStore for LibsqlFragmentStore {
    async fn has_fragments(&self, source_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        Ok(self.count(source_id).await? > 0)
    }

    async fn get_fragments(&self, source_id: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT content FROM fragments WHERE source_id = ? ORDER BY position",
                [source_id],
            )
            .await
            .map_err(|e| AppError::Store(format!("Failed to query fragments: {}", e)))?;

        let mut fragments = Vec::new();
        while let Some(row) = rows.next().await? {
            fragments.push(row.get::<String>(0)?);
        }
        Ok(fragments)
    }

    async fn put_fragments(&self, source_id: &str, fragments: &[String]) -> Result<bool> {
        if fragments.is_empty() {
            return Ok(false);
        }

        let _guard = self.lock.lock().await;
        if self.count(source_id).await? > 0 {
            debug!(source_id, "Fragments already stored");
            return Ok(false);
        }

        let now = Utc::now().timestamp();
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        for (position, content) in fragments.iter().enumerate() {
            tx.execute(
                "INSERT INTO fragments (source_id, position, content, stored_at)
                 VALUES (?, ?, ?, ?)",
                (source_id, position as i64, content.as_str(), now),
            )
            .await
            .map_err(|e| AppError::Store(format!("Failed to insert fragment: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Store(format!("Failed to commit fragments: {}", e)))?;

        debug!(source_id, count = fragments.len(), "Stored fragments");
        Ok(true)
    }

    async fn sources(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT DISTINCT source_id FROM fragments ORDER BY source_id",
                (),
            )
            .await
            .map_err(|e| AppError::Store(format!("Failed to list sources: {}", e)))?;

        let mut sources = Vec::new();
        while let Some(row) = rows.next().await? {
            sources.push(row.get::<String>(0)?);
        }
        Ok(sources)
    }
}
