//! Test utilities shared by the unit tests across the crate
//!
//! Every test gets its own private in-memory SQLite database, so tests that only touch
//! the stores do not need to be serialized.

use std::sync::{Arc, Mutex, MutexGuard, Once};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::storage::{DataStore, DataStoreConfig};
use crate::userdb::PasswordHasher;

/// Loads `.env_test` (falling back to `.env`) once per process
pub fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
}

/// A fresh in-memory SQLite data store
pub async fn sqlite_store() -> Arc<dyn DataStore> {
    init_test_environment();
    DataStoreConfig::sqlite_memory()
        .connect()
        .await
        .expect("Failed to open in-memory SQLite")
}

/// Argon2id with the smallest sensible cost so tests stay fast
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(1024, 1, 1).expect("Failed to build test hasher")
}

/// A clock that only moves when told to
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Midnight UTC on 2026-01-01
    pub fn starting_at_fixture() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex poisoned")
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now()
    }
}
