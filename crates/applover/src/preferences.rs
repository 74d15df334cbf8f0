//! The preferences accessor.

use std::{collections::BTreeMap, sync::Arc};

use applover_state::{open_store, KeyValueStore, StoreConfiguration, StoreError, StoreValue};
use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::{
    key::{
        Key, APP_LAUNCH_COUNT, CUSTOM_EVENT_PREFIX, DO_NOT_SHOW_ANYMORE, FIRST_LAUNCH_DATE,
        SHOWN_BEFORE, USER_SAID_NO,
    },
    AppLoverState,
};

/// Name of the namespace holding every AppLover preference.
pub const PREFERENCES_NAME: &str = "android-applover";

/// Typed access to the persisted AppLover state.
///
/// Getters never fail: a missing entry reads as its default (`0` or `false`) and a store that
/// cannot be read is logged and treated the same way. Setters commit before returning and hand
/// back the store's own error if the commit fails.
///
/// The accessor can be shared between threads. Increments are a single atomic operation of the
/// store, so concurrent increments of the same counter never lose an update, even through
/// different accessors on the same store.
///
/// # Example
/// ```rust
/// use applover::AppLoverPreferences;
/// use applover_state::StoreConfiguration;
///
/// let prefs = AppLoverPreferences::open(StoreConfiguration::Memory)?;
///
/// assert_eq!(prefs.increment_launch_count()?, 1);
/// assert_eq!(prefs.increment_launch_count()?, 2);
/// assert_eq!(prefs.launch_count(), 2);
///
/// prefs.set_shown_before()?;
/// assert!(prefs.is_shown_before());
/// # Ok::<_, applover_state::StoreError>(())
/// ```
pub struct AppLoverPreferences {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for AppLoverPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppLoverPreferences")
            .field("namespace", &self.store.namespace())
            .finish()
    }
}

impl AppLoverPreferences {
    /// Create an accessor over an already opened store.
    ///
    /// The store should be scoped to [`PREFERENCES_NAME`] to interoperate with previously
    /// persisted data.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Open the [`PREFERENCES_NAME`] namespace with the given backend and create an accessor
    /// over it.
    pub fn open(configuration: StoreConfiguration) -> Result<Self, StoreError> {
        Ok(Self::new(open_store(configuration, PREFERENCES_NAME)?))
    }

    /// Epoch milliseconds of the first recorded launch, or `0`.
    pub fn first_launch_date(&self) -> i64 {
        self.get(&FIRST_LAUNCH_DATE)
    }

    #[allow(missing_docs)]
    pub fn set_first_launch_date(&self, first_launch_date: i64) -> Result<(), StoreError> {
        self.set(&FIRST_LAUNCH_DATE, first_launch_date)
    }

    /// The first launch date as a UTC timestamp, or `None` if it was never recorded.
    pub fn first_launch_date_time(&self) -> Option<DateTime<Utc>> {
        match self.first_launch_date() {
            0 => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    #[allow(missing_docs)]
    pub fn set_first_launch_date_time(&self, date: DateTime<Utc>) -> Result<(), StoreError> {
        self.set_first_launch_date(date.timestamp_millis())
    }

    #[allow(missing_docs)]
    pub fn launch_count(&self) -> i32 {
        self.get(&APP_LAUNCH_COUNT)
    }

    /// Increments the launch count.
    ///
    /// Returns the new launch count, as committed to the store.
    pub fn increment_launch_count(&self) -> Result<i32, StoreError> {
        self.increment(&APP_LAUNCH_COUNT)
    }

    /// Increments the count of a custom event.
    ///
    /// Returns the new count for `event`, as committed to the store.
    pub fn increment_custom_event_count(&self, event: &str) -> Result<i32, StoreError> {
        self.increment(&Key::custom_event(event))
    }

    #[allow(missing_docs)]
    pub fn custom_event_count(&self, event: &str) -> i32 {
        self.get(&Key::custom_event(event))
    }

    /// Every custom event with a stored counter, by event name.
    pub fn custom_event_counts(&self) -> BTreeMap<String, i32> {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list preferences: {:?}", e);
                return BTreeMap::new();
            }
        };

        keys.iter()
            .filter_map(|key| key.strip_prefix(CUSTOM_EVENT_PREFIX))
            .map(|event| (event.to_string(), self.custom_event_count(event)))
            .collect()
    }

    /// Whether the dialog should not be shown anymore, meaning the user already went through it
    /// and finished the task it was designed for.
    pub fn is_do_not_show_anymore(&self) -> bool {
        self.get(&DO_NOT_SHOW_ANYMORE)
    }

    /// Marks the dialog as not to be shown anymore. Only [`clear`](Self::clear) resets this.
    pub fn set_do_not_show_anymore(&self) -> Result<(), StoreError> {
        self.set(&DO_NOT_SHOW_ANYMORE, true)
    }

    #[allow(missing_docs)]
    pub fn is_shown_before(&self) -> bool {
        self.get(&SHOWN_BEFORE)
    }

    #[allow(missing_docs)]
    pub fn set_shown_before(&self) -> Result<(), StoreError> {
        self.set(&SHOWN_BEFORE, true)
    }

    /// Whether the user has previously declined the dialog.
    ///
    /// This flag is only reset together with everything else by [`clear`](Self::clear), for
    /// instance when the host app moves to a new version.
    pub fn user_said_no(&self) -> bool {
        self.get(&USER_SAID_NO)
    }

    /// Records that the user declined the dialog.
    pub fn set_user_said_no(&self) -> Result<(), StoreError> {
        self.set(&USER_SAID_NO, true)
    }

    /// Removes every preference. All getters return their defaults afterwards.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    /// Read every fixed preference and all custom event counters.
    pub fn snapshot(&self) -> AppLoverState {
        AppLoverState {
            first_launch_date: self.first_launch_date(),
            launch_count: self.launch_count(),
            custom_event_counts: self.custom_event_counts(),
            do_not_show_anymore: self.is_do_not_show_anymore(),
            user_said_no: self.user_said_no(),
            shown_before: self.is_shown_before(),
        }
    }

    fn get<T: StoreValue + Default>(&self, key: &Key<T>) -> T {
        match self.store.get_as::<T>(key.name()) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read preference '{}': {:?}", key.name(), e);
                T::default()
            }
        }
    }

    fn set<T: StoreValue>(&self, key: &Key<T>, value: T) -> Result<(), StoreError> {
        self.store.put_as(key.name(), value)
    }

    fn increment(&self, key: &Key<i32>) -> Result<i32, StoreError> {
        self.store.increment_int(key.name())
    }
}
