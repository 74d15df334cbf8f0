use std::{path::PathBuf, sync::Arc};

use crate::{
    backends::{FileStore, MemoryStore, SqliteStore},
    store::{validate_namespace, KeyValueStore, StoreError},
};

/// Selects the backend a store is opened with, and where it keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfiguration {
    /// Keep everything in process memory. Nothing is persisted.
    Memory,

    /// SQLite database file. Namespaces opened on the same file share it.
    Sqlite {
        /// The path of the database file. Missing parent directories are created.
        file_path: PathBuf,
    },

    /// One JSON settings file per namespace inside a folder.
    File {
        /// The folder holding the settings files. It is created if missing.
        folder_path: PathBuf,
    },
}

/// Open the store for `namespace` using the given configuration.
///
/// The namespace is allocated (file or table created) on first open; opening an existing
/// namespace again sees the values committed before.
pub fn open_store(
    configuration: StoreConfiguration,
    namespace: &str,
) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    if !validate_namespace(namespace) {
        return Err(StoreError::InvalidNamespace(namespace.to_string()));
    }

    Ok(match configuration {
        StoreConfiguration::Memory => Arc::new(MemoryStore::new(namespace)),
        StoreConfiguration::Sqlite { file_path } => {
            Arc::new(SqliteStore::open(file_path, namespace)?)
        }
        StoreConfiguration::File { folder_path } => {
            Arc::new(FileStore::open(folder_path, namespace)?)
        }
    })
}
