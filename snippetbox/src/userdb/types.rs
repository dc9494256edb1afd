use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account
#[derive(Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    /// Database-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Unique across all users
    pub email: String,
    /// PHC-encoded Argon2id hash; never serialized
    #[serde(skip)]
    pub hashed_password: Vec<u8>,
    pub created: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("hashed_password", &"[redacted]")
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            id: 7,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: b"$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_vec(),
            created: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_debug_redacts_hash() {
        let debug = format!("{:?}", sample_user());

        assert!(debug.contains("alice@example.com"));
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn test_serialization_omits_hash() {
        let json = serde_json::to_value(sample_user()).expect("Failed to serialize");

        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["email"], "alice@example.com");

        // Deserializing yields an empty hash rather than failing
        let back: User = serde_json::from_value(json).expect("Failed to deserialize");
        assert!(back.hashed_password.is_empty());
        assert_eq!(back.id, 7);
    }
}
