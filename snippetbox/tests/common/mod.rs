//! Shared setup for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use snippetbox::{Clock, DataStoreConfig, Models, PasswordHasher, StoreType};

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
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
        *self.lock_clock()
    }
}

fn test_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(1024, 1, 1).expect("test hasher")
}

/// Both stores over a private in-memory database, with a controllable clock
pub async fn setup() -> (Models, Arc<MutableClock>) {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ));
    let store = DataStoreConfig::sqlite_memory()
        .connect()
        .await
        .expect("Failed to open in-memory SQLite");
    let models = Models::init_with_hasher(store, test_hasher())
        .await
        .expect("Failed to initialize stores")
        .with_clock(clock.clone());

    (models, clock)
}

/// Both stores on the PostgreSQL database named by `.env_test` or the environment.
///
/// Returns `None` unless `GENERIC_DATA_STORE_TYPE=postgres`.
pub async fn postgres_setup() -> Option<Models> {
    if dotenvy::from_filename(".env_test").is_err() {
        dotenvy::dotenv().ok();
    }

    let config = DataStoreConfig::from_env().ok()?;
    if config.store_type != StoreType::Postgres {
        eprintln!("Skipping: GENERIC_DATA_STORE_TYPE is not postgres");
        return None;
    }

    let store = config.connect().await.expect("Failed to connect to PostgreSQL");
    Some(
        Models::init_with_hasher(store, test_hasher())
            .await
            .expect("Failed to initialize stores"),
    )
}

/// An email no earlier test run has registered
pub fn unique_email(tag: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{tag}-{nanos}@example.com")
}
