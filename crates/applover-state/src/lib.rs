#![doc = include_str!("../README.md")]

/// Storage backends implementing [`KeyValueStore`].
pub mod backends;

/// Backend selection and opening of namespaced stores.
pub mod configuration;

/// The namespaced key-value store interface.
pub mod store;

/// Values held by a store.
pub mod value;

pub use configuration::{open_store, StoreConfiguration};
pub use store::{validate_namespace, KeyValueStore, StoreError};
pub use value::{StoreValue, Value};
