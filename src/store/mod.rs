//! Persistent store — SQLite database holding the `content` and
//! `subscribers` tables.
//!
//! [`Database::open`] is the explicit init step: it creates the parent
//! directory, applies the schema (tracked with `PRAGMA user_version`) and
//! returns a cheap, cloneable handle. Every operation opens its own
//! connection and runs auto-committed single statements.

pub mod content;
pub mod subscribers;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

pub use content::ContentStore;
pub use subscribers::{ChatIdentity, Subscriber, SubscriberRegistry};

const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot create database directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("word already stored: {0}")]
    Duplicate(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store task failed: {0}")]
    Task(String),
}

/// Handle to the SQLite file. Clone freely; holds no open connection.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Resolve `url`, create the file if needed and bring the schema up to date.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let path = path_from_url(url);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let db = Self { path };
        db.init_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> ContentStore {
        ContentStore::new(self.clone())
    }

    pub fn subscribers(&self) -> SubscriberRegistry {
        SubscriberRegistry::new(self.clone())
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS subscribers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    chat_id INTEGER NOT NULL UNIQUE,
                    subscribed INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS content (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    word TEXT NOT NULL,
                    word_key TEXT NOT NULL UNIQUE,
                    meaning TEXT NOT NULL,
                    example TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;
                ",
            )?;
            debug!(path = %self.path.display(), from = version, to = SCHEMA_VERSION, "schema migrated");
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.display().to_string(),
            source,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(conn)
    }
}

/// Accepts `sqlite://path`, `sqlite:path`, or a bare filesystem path.
/// A leading `~` expands to the home directory.
pub fn path_from_url(url: &str) -> PathBuf {
    let raw = url
        .trim()
        .strip_prefix("sqlite://")
        .or_else(|| url.trim().strip_prefix("sqlite:"))
        .unwrap_or(url.trim());
    expand_home(raw)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Run a store operation on tokio's blocking pool so SQLite I/O never stalls
/// the async workers.
pub async fn blocking<T, F>(op: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

pub(crate) fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn url_forms_resolve_to_same_path() {
        assert_eq!(path_from_url("sqlite://data/words.db"), PathBuf::from("data/words.db"));
        assert_eq!(path_from_url("sqlite:data/words.db"), PathBuf::from("data/words.db"));
        assert_eq!(path_from_url(" data/words.db "), PathBuf::from("data/words.db"));
        assert_eq!(path_from_url("sqlite:///var/lib/words.db"), PathBuf::from("/var/lib/words.db"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        assert!(path_from_url("~/.lexicon/words.db").starts_with(&home));
    }

    #[test]
    fn open_creates_parent_dirs_and_schema() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("words.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();
        assert!(path.exists());

        let conn = db.conn().unwrap();
        let version: i64 = conn.query_row("PRAGMA user_version;", [], |r| r.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn blocking_runs_store_ops_off_the_runtime() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path().join("words.db").to_str().unwrap()).unwrap();

        let registry = db.subscribers();
        blocking(move || registry.subscribe(3)).await.unwrap();
        let registry = db.subscribers();
        assert_eq!(blocking(move || registry.list_subscribed()).await.unwrap(), vec![3]);

        let err = blocking(|| -> Result<(), StoreError> { Err(StoreError::Duplicate("lucid".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref w) if w == "lucid"));
    }

    #[tokio::test]
    async fn blocking_reports_panicked_op() {
        let err = blocking(|| -> Result<(), StoreError> { panic!("disk on fire") }).await.unwrap_err();
        assert!(matches!(err, StoreError::Task(_)));
    }

    #[test]
    fn reopen_keeps_data() {
        let tmp = TempDir::new().unwrap();
        let url = format!("sqlite://{}", tmp.path().join("words.db").display());
        Database::open(&url).unwrap().subscribers().subscribe(7).unwrap();
        let again = Database::open(&url).unwrap();
        assert_eq!(again.subscribers().list_subscribed().unwrap(), vec![7]);
    }
}
