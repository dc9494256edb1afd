use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::ModelError;

/// Latest year an expiry may fall in; SQLite compares timestamps as RFC 3339 text, which
/// only orders correctly for four-digit years
const MAX_EXPIRY_YEAR: i32 = 9999;

/// A piece of user-submitted text with a creation time and an expiration time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Snippet {
    /// Database-assigned identifier
    pub id: i64,
    pub title: String,
    pub content: String,
    /// When the store accepted the snippet
    pub created: DateTime<Utc>,
    /// `created` plus the requested number of days
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Visible strictly before `expires`
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

pub(crate) fn expiry_from(
    created: DateTime<Utc>,
    expires_in_days: u32,
) -> Result<DateTime<Utc>, ModelError> {
    Duration::try_days(i64::from(expires_in_days))
        .and_then(|lifetime| created.checked_add_signed(lifetime))
        .filter(|expires| expires.year() <= MAX_EXPIRY_YEAR)
        .ok_or_else(|| {
            ModelError::Storage(format!(
                "Expiry of {expires_in_days} days is out of range (latest year {MAX_EXPIRY_YEAR})"
            ))
        })
}
