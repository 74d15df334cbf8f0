use std::collections::BTreeMap;

use serde::Serialize;

/// A point-in-time copy of everything recorded in the preferences namespace.
///
/// Absent entries are reported with their defaults, the same way the individual getters of
/// [`AppLoverPreferences`](crate::AppLoverPreferences) report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLoverState {
    /// Epoch milliseconds of the first recorded launch, `0` if never recorded.
    pub first_launch_date: i64,
    /// Number of recorded launches.
    pub launch_count: i32,
    /// Counters of every custom event that has been incremented, by event name.
    pub custom_event_counts: BTreeMap<String, i32>,
    /// Terminal flag: the dialog must never be shown again.
    pub do_not_show_anymore: bool,
    /// The user declined the dialog.
    pub user_said_no: bool,
    /// The dialog has been displayed at least once.
    pub shown_before: bool,
}
