//! `content` table — every word ever sent, unique by case-insensitive key.

use rusqlite::{ErrorCode, OptionalExtension, params};

use super::{Database, StoreError, now_iso8601};
use crate::words::WordEntry;

#[derive(Debug, Clone)]
pub struct ContentStore {
    db: Database,
}

impl ContentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Case-insensitive membership test.
    pub fn exists(&self, word: &str) -> Result<bool, StoreError> {
        let conn = self.db.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM content WHERE word_key = ?1",
                params![word_key(word)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a new entry. A word already present under any casing is
    /// rejected with [`StoreError::Duplicate`] by the `UNIQUE(word_key)`
    /// constraint.
    pub fn save(&self, entry: &WordEntry) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO content (word, word_key, meaning, example, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.word,
                word_key(&entry.word),
                entry.meaning,
                entry.example,
                now_iso8601(),
            ],
        )
        .map_err(|e| match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::Duplicate(entry.word.clone()),
            _ => StoreError::Sqlite(e),
        })?;
        Ok(())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.db.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

/// Dedup key: trimmed, Unicode-lowercased.
fn word_key(word: &str) -> String {
    word.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, ContentStore) {
        let tmp = TempDir::new().expect("tempdir");
        let db = Database::open(tmp.path().join("words.db").to_str().unwrap()).expect("open db");
        (tmp, db.content())
    }

    fn entry(word: &str) -> WordEntry {
        WordEntry::new(word, "clear", "a lucid explanation")
    }

    #[test]
    fn exists_is_case_insensitive() {
        let (_tmp, store) = make_store();
        assert!(!store.exists("lucid").unwrap());
        store.save(&entry("Lucid")).unwrap();
        assert!(store.exists("lucid").unwrap());
        assert!(store.exists("LUCID").unwrap());
        assert!(store.exists("  lucid ").unwrap());
        assert!(!store.exists("lucidity").unwrap());
    }

    #[test]
    fn save_rejects_duplicate_under_any_casing() {
        let (_tmp, store) = make_store();
        store.save(&entry("lucid")).unwrap();
        let err = store.save(&entry("LuCiD")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref w) if w == "LuCiD"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn non_ascii_words_dedup() {
        let (_tmp, store) = make_store();
        store.save(&entry("Ärger")).unwrap();
        assert!(store.exists("ärger").unwrap());
    }

    #[test]
    fn count_tracks_inserts() {
        let (_tmp, store) = make_store();
        assert_eq!(store.count().unwrap(), 0);
        store.save(&entry("lucid")).unwrap();
        store.save(&entry("candor")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }
}
