use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, Weak},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    store::{incremented, KeyValueStore, StoreError},
    value::Value,
};

type Values = Mutex<BTreeMap<String, Value>>;

/// Settings files currently open in this process, by canonical path.
///
/// Every [`FileStore`] on the same file shares one map and one lock, so a commit through one handle
/// never overwrites what another handle committed.
fn open_files() -> &'static Mutex<HashMap<PathBuf, Weak<Values>>> {
    static OPEN_FILES: OnceLock<Mutex<HashMap<PathBuf, Weak<Values>>>> = OnceLock::new();
    OPEN_FILES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// A store backed by one JSON settings file per namespace, `<folder>/<namespace>.json`.
///
/// The file is read when it is first opened in the process; later opens of the same file share
/// that state. Every write produces the complete new map, commits it to a temporary file, syncs it
/// and renames it over the old file, so a reader never observes a partially written file. If
/// committing fails the in-memory state is left untouched and the temporary file is removed.
pub struct FileStore {
    namespace: String,
    path: PathBuf,
    values: Arc<Values>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .finish()
    }
}

impl FileStore {
    /// Opens the settings file for `namespace` inside `folder_path`, creating the folder and an
    /// empty file if they don't exist yet.
    pub fn open(folder_path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        let folder_path = folder_path.as_ref();
        fs::create_dir_all(folder_path)?;
        let path = fs::canonicalize(folder_path)?.join(format!("{namespace}.json"));

        let mut open_files = open_files().lock().expect("Mutex should not be poisoned");
        let values = match open_files.get(&path).and_then(Weak::upgrade) {
            Some(values) => values,
            None => {
                let values = Arc::new(Mutex::new(load(&path)?));
                open_files.retain(|_, open| open.strong_count() > 0);
                open_files.insert(path.clone(), Arc::downgrade(&values));
                values
            }
        };
        drop(open_files);

        debug!(namespace, path = %path.display(), "Opened settings file");

        Ok(FileStore {
            namespace: namespace.to_string(),
            path,
            values,
        })
    }

    /// The location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<R>(
        &self,
        update: impl FnOnce(&mut BTreeMap<String, Value>) -> R,
    ) -> Result<R, StoreError> {
        let mut values = self.values.lock().expect("Mutex should not be poisoned");

        let mut next = values.clone();
        let result = update(&mut next);
        write_atomically(&self.path, &next)?;
        *values = next;

        Ok(result)
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, Value>, StoreError> {
    if path.exists() {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    } else {
        let empty = BTreeMap::new();
        write_atomically(path, &empty)?;
        Ok(empty)
    }
}

fn write_atomically(path: &Path, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(values)?;

    let folder = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(folder)?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;

    // On failure the temporary file is deleted when the error drops it
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl KeyValueStore for FileStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .lock()
            .expect("Mutex should not be poisoned")
            .get(key)
            .copied())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.commit(|values| {
            values.insert(key.to_string(), value);
        })?;

        debug!(namespace = %self.namespace, key, "Committed value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.commit(|values| {
            values.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .values
            .lock()
            .expect("Mutex should not be poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.commit(|values| values.clear())?;

        debug!(namespace = %self.namespace, "Cleared namespace");
        Ok(())
    }

    fn increment_int(&self, key: &str) -> Result<i32, StoreError> {
        let count = self.commit(|values| {
            let count = incremented(&self.namespace, key, values.get(key).copied());
            values.insert(key.to_string(), Value::Int(count));
            count
        })?;

        debug!(namespace = %self.namespace, key, count, "Incremented counter");
        Ok(count)
    }
}
