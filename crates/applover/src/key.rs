//! Type-safe keys for the preferences namespace.

use std::{borrow::Cow, marker::PhantomData};

/// Prefix shared by every custom event counter key.
pub const CUSTOM_EVENT_PREFIX: &str = "applover_custom_event_";

/// Type-safe key for preference storage.
///
/// Associates a storage key name with a value type at compile time, so the launch count can only
/// be read as an `i32` and the flags only as `bool`.
///
/// # Example
/// ```rust
/// use applover::Key;
///
/// const MY_FLAG: Key<bool> = Key::new("my_flag");
/// assert_eq!(MY_FLAG.name(), "my_flag");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<T>,
}

impl<T> Key<T> {
    /// Create a new type-safe key with the given storage name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Get the string key name used for storage.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Key<i32> {
    /// The counter key for a caller-named event: [`CUSTOM_EVENT_PREFIX`] followed by `event`.
    ///
    /// The event name is not validated; callers pick names that don't collide with each other.
    pub fn custom_event(event: &str) -> Self {
        Self {
            name: Cow::Owned(format!("{CUSTOM_EVENT_PREFIX}{event}")),
            _marker: PhantomData,
        }
    }
}

/// Epoch milliseconds of the first recorded launch.
pub const FIRST_LAUNCH_DATE: Key<i64> = Key::new("applover_first_launch_date");
/// Number of recorded app launches.
pub const APP_LAUNCH_COUNT: Key<i32> = Key::new("applover_app_launch_count");
/// Set once the dialog must never be shown again.
pub const DO_NOT_SHOW_ANYMORE: Key<bool> = Key::new("applover_do_not_show_anymore");
/// Set once the user declined the dialog.
pub const USER_SAID_NO: Key<bool> = Key::new("applover_User_has_clicked_No");
/// Set once the dialog has been displayed.
pub const SHOWN_BEFORE: Key<bool> = Key::new("applover_dialog_was_shown_before");
