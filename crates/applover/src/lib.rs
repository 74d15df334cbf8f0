#![doc = include_str!("../README.md")]

pub mod key;
mod preferences;
mod state;

pub use applover_state::{StoreConfiguration, StoreError};
pub use key::Key;
pub use preferences::{AppLoverPreferences, PREFERENCES_NAME};
pub use state::AppLoverState;
