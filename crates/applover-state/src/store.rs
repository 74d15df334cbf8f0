use tracing::warn;

use crate::value::{StoreValue, Value};

/// An error resulting from operations on a store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The namespace name contains characters that are not allowed.
    #[error("Invalid namespace name: {0:?}")]
    InvalidNamespace(String),

    /// An error reported by the SQLite backend.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// An I/O error while reading or committing a settings file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// A persistent key-value store scoped to a single namespace.
///
/// All operations are synchronous: a write has been committed by the time it returns, so a value
/// can be read back immediately. Implementations serialize their own commits, but a sequence of
/// calls (such as read-modify-write) is not atomic; counters go through
/// [`increment_int`](KeyValueStore::increment_int) instead.
pub trait KeyValueStore: Send + Sync {
    /// The namespace this store was opened for.
    fn namespace(&self) -> &str;

    /// Retrieves a value by its key.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Stores a value under the specified key, replacing any previous value.
    fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes a value by its key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key currently stored in the namespace.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Removes every key in the namespace in a single commit.
    fn clear(&self) -> Result<(), StoreError>;

    /// Atomically adds one to the 32-bit integer under `key` and returns the committed value.
    ///
    /// A missing key, or a value of another type, counts as `0`. The counter saturates at
    /// `i32::MAX`. The read and the write form one unit with respect to every other store handle
    /// on the same namespace.
    fn increment_int(&self, key: &str) -> Result<i32, StoreError>;

    /// Retrieves a 32-bit integer. A value of another type is reported as absent.
    fn get_int(&self, key: &str) -> Result<Option<i32>, StoreError> {
        typed(self.namespace(), key, self.get(key)?)
    }

    /// Retrieves a 64-bit integer. A value of another type is reported as absent.
    fn get_long(&self, key: &str) -> Result<Option<i64>, StoreError> {
        typed(self.namespace(), key, self.get(key)?)
    }

    /// Retrieves a boolean. A value of another type is reported as absent.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        typed(self.namespace(), key, self.get(key)?)
    }

    #[allow(missing_docs)]
    fn put_int(&self, key: &str, value: i32) -> Result<(), StoreError> {
        self.put(key, Value::Int(value))
    }

    #[allow(missing_docs)]
    fn put_long(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.put(key, Value::Long(value))
    }

    #[allow(missing_docs)]
    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.put(key, Value::Bool(value))
    }
}

impl dyn KeyValueStore {
    /// Retrieves a value of any [`StoreValue`] type. A value of another type is reported as
    /// absent.
    pub fn get_as<T: StoreValue>(&self, key: &str) -> Result<Option<T>, StoreError> {
        typed(self.namespace(), key, self.get(key)?)
    }

    /// Stores a value of any [`StoreValue`] type.
    pub fn put_as<T: StoreValue>(&self, key: &str, value: T) -> Result<(), StoreError> {
        self.put(key, value.into_value())
    }
}

/// The value an increment commits, given what is currently stored under `key`.
pub(crate) fn incremented(namespace: &str, key: &str, current: Option<Value>) -> i32 {
    match current {
        None => 1,
        Some(Value::Int(count)) => count.saturating_add(1),
        Some(value) => {
            warn!(namespace, key, ?value, "Replacing a counter of an unexpected type");
            1
        }
    }
}

fn typed<T: StoreValue>(
    namespace: &str,
    key: &str,
    value: Option<Value>,
) -> Result<Option<T>, StoreError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match T::from_value(value) {
        Some(v) => Ok(Some(v)),
        None => {
            warn!(namespace, key, ?value, "Stored value has an unexpected type, ignoring it");
            Ok(None)
        }
    }
}

/// Validate that the provided name can be used as a namespace.
///
/// Namespaces end up in file names and SQL parameters, so they are limited to non-empty names made
/// of ASCII letters, digits, underscore (_), hyphen (-) and period (.).
pub const fn validate_namespace(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    // A name made only of periods would resolve to a directory
    let mut only_periods = true;
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if !(byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' || byte == b'.') {
            return false;
        }
        if byte != b'.' {
            only_periods = false;
        }
        i += 1;
    }
    !only_periods
}
