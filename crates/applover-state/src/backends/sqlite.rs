use std::{path::Path, sync::Mutex, time::Duration};

use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::{
    store::{incremented, KeyValueStore, StoreError},
    value::Value,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A store backed by a SQLite database file.
///
/// Every namespace lives in the same `preferences` table, so several stores can share one file.
/// Values are stored as JSON text carrying their type tag.
pub struct SqliteStore {
    namespace: String,
    connection: Mutex<rusqlite::Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `file_path` and scopes the store to
    /// `namespace`.
    pub fn open(file_path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        let file_path = file_path.as_ref();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let connection = rusqlite::Connection::open(file_path)?;
        connection.busy_timeout(BUSY_TIMEOUT)?;

        // Set WAL mode so readers don't block the committing writer
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )?;

        debug!(namespace, path = %file_path.display(), "Opened SQLite store");

        Ok(SqliteStore {
            namespace: namespace.to_string(),
            connection: Mutex::new(connection),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.connection.lock().expect("Mutex should not be poisoned");
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match value {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let value = serde_json::to_string(&value)?;

        let mut conn = self.connection.lock().expect("Mutex should not be poisoned");
        let transaction = conn.transaction()?;
        transaction.execute(
            "INSERT OR REPLACE INTO preferences (namespace, key, value) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.namespace, key, value],
        )?;
        transaction.commit()?;

        debug!(namespace = %self.namespace, key, "Committed value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.lock().expect("Mutex should not be poisoned");
        let transaction = conn.transaction()?;
        transaction.execute(
            "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
            rusqlite::params![self.namespace, key],
        )?;
        transaction.commit()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connection.lock().expect("Mutex should not be poisoned");
        let mut stmt = conn.prepare("SELECT key FROM preferences WHERE namespace = ?1")?;
        let rows = stmt.query_map(rusqlite::params![self.namespace], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.lock().expect("Mutex should not be poisoned");
        let transaction = conn.transaction()?;
        let removed = transaction.execute(
            "DELETE FROM preferences WHERE namespace = ?1",
            rusqlite::params![self.namespace],
        )?;
        transaction.commit()?;

        debug!(namespace = %self.namespace, removed, "Cleared namespace");
        Ok(())
    }

    fn increment_int(&self, key: &str) -> Result<i32, StoreError> {
        let mut conn = self.connection.lock().expect("Mutex should not be poisoned");

        // Take the write lock up front so other connections on the file can't read the same count
        let transaction = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = transaction
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|value| serde_json::from_str::<Value>(&value))
            .transpose()?;

        let count = incremented(&self.namespace, key, current);
        transaction.execute(
            "INSERT OR REPLACE INTO preferences (namespace, key, value) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.namespace, key, serde_json::to_string(&Value::Int(count))?],
        )?;
        transaction.commit()?;

        debug!(namespace = %self.namespace, key, count, "Incremented counter");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.sqlite");

        {
            let store = SqliteStore::open(&path, "app").unwrap();
            store.put_long("first", 1_400_000_000_000).unwrap();
            store.put_bool("flag", true).unwrap();
        }

        let store = SqliteStore::open(&path, "app").unwrap();
        assert_eq!(store.get_long("first").unwrap(), Some(1_400_000_000_000));
        assert_eq!(store.get_bool("flag").unwrap(), Some(true));
        assert_eq!(store.get_int("missing").unwrap(), None);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.sqlite");

        let a = SqliteStore::open(&path, "a").unwrap();
        let b = SqliteStore::open(&path, "b").unwrap();

        a.put_int("count", 1).unwrap();
        b.put_int("count", 2).unwrap();
        a.clear().unwrap();

        assert_eq!(a.get_int("count").unwrap(), None);
        assert_eq!(b.get_int("count").unwrap(), Some(2));
        assert_eq!(b.keys().unwrap(), vec!["count".to_string()]);
    }

    #[test]
    fn test_increment_int_is_atomic_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.sqlite");

        let a = SqliteStore::open(&path, "app").unwrap();
        let b = SqliteStore::open(&path, "app").unwrap();

        std::thread::scope(|scope| {
            for store in [&a, &b] {
                scope.spawn(move || {
                    for _ in 0..100 {
                        store.increment_int("count").unwrap();
                    }
                });
            }
        });

        assert_eq!(a.get_int("count").unwrap(), Some(200));
        assert_eq!(b.increment_int("count").unwrap(), 201);
    }

    #[test]
    fn test_put_replaces_and_remove_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested/prefs.sqlite"), "app").unwrap();

        store.put_int("count", 1).unwrap();
        store.put_int("count", 2).unwrap();
        assert_eq!(store.get_int("count").unwrap(), Some(2));

        store.remove("count").unwrap();
        store.remove("count").unwrap();
        assert_eq!(store.get_int("count").unwrap(), None);
    }
}
