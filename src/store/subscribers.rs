//! `subscribers` table — chat ids and their subscription flag.
//!
//! Rows are created on first subscribe and never deleted; unsubscribing only
//! clears the flag.

use rusqlite::{OptionalExtension, params};

use super::{Database, StoreError, now_iso8601};

/// Telegram chat id.
pub type ChatIdentity = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub chat_id: ChatIdentity,
    pub subscribed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SubscriberRegistry {
    db: Database,
}

impl SubscriberRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the record or re-enable an existing one.
    pub fn subscribe(&self, chat_id: ChatIdentity) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO subscribers (chat_id, subscribed, created_at) VALUES (?1, 1, ?2)
             ON CONFLICT (chat_id) DO UPDATE SET subscribed = 1",
            params![chat_id, now_iso8601()],
        )?;
        Ok(())
    }

    /// Clear the flag. Unknown ids are a silent no-op.
    pub fn unsubscribe(&self, chat_id: ChatIdentity) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        conn.execute(
            "UPDATE subscribers SET subscribed = 0 WHERE chat_id = ?1",
            params![chat_id],
        )?;
        Ok(())
    }

    pub fn list_subscribed(&self) -> Result<Vec<ChatIdentity>, StoreError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare("SELECT chat_id FROM subscribers WHERE subscribed = 1")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<ChatIdentity>, _>>()?;
        Ok(ids)
    }

    pub fn get(&self, chat_id: ChatIdentity) -> Result<Option<Subscriber>, StoreError> {
        let conn = self.db.conn()?;
        let sub = conn
            .query_row(
                "SELECT chat_id, subscribed, created_at FROM subscribers WHERE chat_id = ?1",
                params![chat_id],
                |row| {
                    Ok(Subscriber {
                        chat_id: row.get(0)?,
                        subscribed: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_registry() -> (TempDir, SubscriberRegistry) {
        let tmp = TempDir::new().expect("tempdir");
        let db = Database::open(tmp.path().join("words.db").to_str().unwrap()).expect("open db");
        (tmp, db.subscribers())
    }

    fn row_count(reg: &SubscriberRegistry, chat_id: ChatIdentity) -> i64 {
        reg.db
            .conn()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM subscribers WHERE chat_id = ?1",
                params![chat_id],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn subscribe_creates_flagged_record() {
        let (_tmp, reg) = make_registry();
        reg.subscribe(42).unwrap();
        let sub = reg.get(42).unwrap().expect("record");
        assert!(sub.subscribed);
        assert!(!sub.created_at.is_empty());
    }

    #[test]
    fn subscribe_then_unsubscribe_leaves_one_disabled_record() {
        let (_tmp, reg) = make_registry();
        reg.subscribe(42).unwrap();
        reg.unsubscribe(42).unwrap();
        assert_eq!(row_count(&reg, 42), 1);
        assert!(!reg.get(42).unwrap().unwrap().subscribed);
        assert!(reg.list_subscribed().unwrap().is_empty());
    }

    #[test]
    fn resubscribe_upserts_without_new_row() {
        let (_tmp, reg) = make_registry();
        reg.subscribe(42).unwrap();
        let created = reg.get(42).unwrap().unwrap().created_at;
        reg.unsubscribe(42).unwrap();
        reg.subscribe(42).unwrap();
        reg.subscribe(42).unwrap();
        assert_eq!(row_count(&reg, 42), 1);
        let sub = reg.get(42).unwrap().unwrap();
        assert!(sub.subscribed);
        assert_eq!(sub.created_at, created);
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let (_tmp, reg) = make_registry();
        reg.unsubscribe(999).unwrap();
        assert!(reg.get(999).unwrap().is_none());
    }

    #[test]
    fn list_subscribed_filters_by_latest_action() {
        let (_tmp, reg) = make_registry();
        for id in [1, 2, 3, -100123] {
            reg.subscribe(id).unwrap();
        }
        reg.unsubscribe(2).unwrap();
        let mut ids = reg.list_subscribed().unwrap();
        ids.sort();
        assert_eq!(ids, vec![-100123, 1, 3]);
    }
}
