//! essaymark-store: SQLite persistence for finished reviews.
//!
//! Reviews are written once and never updated. Each row keeps the user id,
//! the essay text, and the evaluation as an opaque JSON document.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use essaymark_core::traits::{NewReview, ReviewRecord, ReviewStore};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS english_writing_review (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    essay_text TEXT NOT NULL,
    review_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_review_user ON english_writing_review(user_id, created_at);
"#;

/// Review store backed by a single SQLite connection.
#[derive(Clone)]
pub struct SqliteReviewStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReviewStore {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL mode")?;
        tracing::info!("review store at {}", path.display());
        Self::with_connection(conn)
    }

    /// A throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to create database schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a review. Blocking.
    pub fn insert(&self, review: &NewReview) -> Result<ReviewRecord> {
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            user_id: review.user_id.clone(),
            essay_text: review.essay_text.clone(),
            review_json: review.review_json.clone(),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO english_writing_review (id, user_id, essay_text, review_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.user_id,
                record.essay_text,
                record.review_json,
                record.created_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("failed to insert review for {}", record.user_id))?;

        Ok(record)
    }

    /// Reviews for `user_id`, newest first. Blocking.
    pub fn reviews_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<ReviewRecord>> {
        let limit = limit as i64;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, essay_text, review_json, created_at FROM english_writing_review WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], read_row)?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?.context("corrupt review row")?);
        }
        Ok(reviews)
    }

    /// Total number of stored reviews.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM english_writing_review", [], |r| {
            r.get(0)
        })?;
        Ok(n as u64)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("review store connection poisoned"))
    }
}

/// Decode a row; the inner `Result` carries id/timestamp parse failures.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Result<ReviewRecord>> {
    Ok(decode_record(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn decode_record(
    id: String,
    user_id: String,
    essay_text: String,
    review_json: String,
    created_at: String,
) -> Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: Uuid::parse_str(&id).with_context(|| format!("bad review id: {id}"))?,
        user_id,
        essay_text,
        review_json,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .with_context(|| format!("bad timestamp: {created_at}"))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn save(&self, review: &NewReview) -> Result<ReviewRecord> {
        let store = self.clone();
        let review = review.clone();
        tokio::task::spawn_blocking(move || store.insert(&review))
            .await
            .context("review store task failed")?
    }

    async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<ReviewRecord>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.reviews_for_user(&user_id, limit))
            .await
            .context("review store task failed")?
    }
}
