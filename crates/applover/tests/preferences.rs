use std::sync::Arc;

use applover::{AppLoverPreferences, AppLoverState, StoreConfiguration};
use tempfile::TempDir;

/// Runs `test` once against each backend, with a fresh location per backend.
fn for_each_backend(test: impl Fn(&AppLoverPreferences)) {
    let dir = TempDir::new().unwrap();
    let configurations = [
        StoreConfiguration::Memory,
        StoreConfiguration::Sqlite {
            file_path: dir.path().join("applover.sqlite"),
        },
        StoreConfiguration::File {
            folder_path: dir.path().join("prefs"),
        },
    ];

    for configuration in configurations {
        let prefs = AppLoverPreferences::open(configuration).unwrap();
        test(&prefs);
    }
}

#[test]
fn test_getters_return_defaults_before_any_write() {
    for_each_backend(|prefs| {
        assert_eq!(prefs.first_launch_date(), 0);
        assert_eq!(prefs.launch_count(), 0);
        assert_eq!(prefs.custom_event_count("purchase"), 0);
        assert!(!prefs.is_do_not_show_anymore());
        assert!(!prefs.user_said_no());
        assert!(!prefs.is_shown_before());
    });
}

#[test]
fn test_first_launch_date_roundtrip() {
    for_each_backend(|prefs| {
        for value in [1_400_000_000_000, i64::MIN, i64::MAX, -1, 0] {
            prefs.set_first_launch_date(value).unwrap();
            assert_eq!(prefs.first_launch_date(), value);
        }
    });
}

#[test]
fn test_increment_launch_count_returns_sequence() {
    for_each_backend(|prefs| {
        let returned: Vec<i32> = (0..10)
            .map(|_| prefs.increment_launch_count().unwrap())
            .collect();

        assert_eq!(returned, (1..=10).collect::<Vec<_>>());
        assert_eq!(prefs.launch_count(), 10);
    });
}

#[test]
fn test_custom_event_counters_are_independent() {
    for_each_backend(|prefs| {
        assert_eq!(prefs.increment_custom_event_count("purchase").unwrap(), 1);
        assert_eq!(prefs.increment_custom_event_count("purchase").unwrap(), 2);
        assert_eq!(prefs.increment_custom_event_count("share").unwrap(), 1);

        assert_eq!(prefs.custom_event_count("purchase"), 2);
        assert_eq!(prefs.custom_event_count("share"), 1);
        assert_eq!(prefs.launch_count(), 0);
    });
}

#[test]
fn test_do_not_show_anymore_latches_until_clear() {
    for_each_backend(|prefs| {
        prefs.set_do_not_show_anymore().unwrap();
        assert!(prefs.is_do_not_show_anymore());

        prefs.increment_launch_count().unwrap();
        prefs.set_first_launch_date(42).unwrap();
        prefs.set_shown_before().unwrap();
        prefs.set_do_not_show_anymore().unwrap();
        assert!(prefs.is_do_not_show_anymore());

        prefs.clear().unwrap();
        assert!(!prefs.is_do_not_show_anymore());
    });
}

#[test]
fn test_clear_resets_everything() {
    for_each_backend(|prefs| {
        prefs.set_shown_before().unwrap();
        prefs.set_user_said_no().unwrap();
        prefs.increment_launch_count().unwrap();
        prefs.increment_custom_event_count("share").unwrap();
        prefs.set_first_launch_date(1).unwrap();

        prefs.clear().unwrap();

        assert_eq!(prefs.snapshot(), AppLoverState::default());
        assert_eq!(prefs.launch_count(), 0);
        assert_eq!(prefs.custom_event_count("share"), 0);
        assert!(!prefs.is_shown_before());
        assert!(!prefs.user_said_no());

        assert_eq!(prefs.increment_launch_count().unwrap(), 1);
    });
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    const THREADS: usize = 8;
    const INCREMENTS: usize = 25;

    for_each_backend(|prefs| {
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..INCREMENTS {
                        prefs.increment_launch_count().unwrap();
                        prefs.increment_custom_event_count("tap").unwrap();
                    }
                });
            }
        });

        let total = (THREADS * INCREMENTS) as i32;
        assert_eq!(prefs.launch_count(), total);
        assert_eq!(prefs.custom_event_count("tap"), total);
    });
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let configurations = [
        StoreConfiguration::Sqlite {
            file_path: dir.path().join("applover.sqlite"),
        },
        StoreConfiguration::File {
            folder_path: dir.path().join("prefs"),
        },
    ];

    for configuration in configurations {
        {
            let prefs = AppLoverPreferences::open(configuration.clone()).unwrap();
            prefs.set_first_launch_date(1_400_000_000_000).unwrap();
            prefs.increment_launch_count().unwrap();
            prefs.increment_launch_count().unwrap();
            prefs.increment_custom_event_count("purchase").unwrap();
            prefs.set_user_said_no().unwrap();
        }

        let prefs = AppLoverPreferences::open(configuration).unwrap();
        assert_eq!(prefs.first_launch_date(), 1_400_000_000_000);
        assert_eq!(prefs.launch_count(), 2);
        assert_eq!(prefs.custom_event_count("purchase"), 1);
        assert!(prefs.user_said_no());
        assert!(!prefs.is_shown_before());
    }
}

#[test]
fn test_accessors_sharing_a_store_see_each_other() {
    let store = applover_state::open_store(StoreConfiguration::Memory, applover::PREFERENCES_NAME)
        .unwrap();
    let a = AppLoverPreferences::new(Arc::clone(&store));
    let b = AppLoverPreferences::new(store);

    a.set_shown_before().unwrap();
    b.increment_launch_count().unwrap();

    assert!(b.is_shown_before());
    assert_eq!(a.launch_count(), 1);
}

#[test]
fn test_concurrent_increments_through_separate_accessors() {
    const INCREMENTS: usize = 50;

    let dir = TempDir::new().unwrap();
    let memory =
        applover_state::open_store(StoreConfiguration::Memory, applover::PREFERENCES_NAME).unwrap();
    let pairs = [
        (
            AppLoverPreferences::new(Arc::clone(&memory)),
            AppLoverPreferences::new(memory),
        ),
        {
            let configuration = StoreConfiguration::Sqlite {
                file_path: dir.path().join("applover.sqlite"),
            };
            (
                AppLoverPreferences::open(configuration.clone()).unwrap(),
                AppLoverPreferences::open(configuration).unwrap(),
            )
        },
        {
            let configuration = StoreConfiguration::File {
                folder_path: dir.path().join("prefs"),
            };
            (
                AppLoverPreferences::open(configuration.clone()).unwrap(),
                AppLoverPreferences::open(configuration).unwrap(),
            )
        },
    ];

    for (a, b) in &pairs {
        std::thread::scope(|scope| {
            for prefs in [a, b, a, b] {
                scope.spawn(move || {
                    for _ in 0..INCREMENTS {
                        prefs.increment_launch_count().unwrap();
                    }
                });
            }
        });

        let total = (4 * INCREMENTS) as i32;
        assert_eq!(a.launch_count(), total);
        assert_eq!(b.launch_count(), total);
    }
}

#[test]
fn test_latch_survives_writes_through_another_accessor() {
    let dir = TempDir::new().unwrap();
    let configurations = [
        StoreConfiguration::Sqlite {
            file_path: dir.path().join("applover.sqlite"),
        },
        StoreConfiguration::File {
            folder_path: dir.path().join("prefs"),
        },
    ];

    for configuration in configurations {
        {
            let a = AppLoverPreferences::open(configuration.clone()).unwrap();
            let b = AppLoverPreferences::open(configuration.clone()).unwrap();

            a.set_do_not_show_anymore().unwrap();
            b.increment_launch_count().unwrap();
            b.set_user_said_no().unwrap();

            assert!(b.is_do_not_show_anymore());
        }

        let prefs = AppLoverPreferences::open(configuration).unwrap();
        assert!(prefs.is_do_not_show_anymore());
        assert!(prefs.user_said_no());
        assert_eq!(prefs.launch_count(), 1);
    }
}
