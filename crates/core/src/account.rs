//! Account records: the signed-in user, JWT pairs and order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Price, UserId};

/// Profile returned by `/auth/users/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    /// Name shown in the header and on the profile page.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }

    /// Make a relative avatar path absolute against `origin`.
    pub fn resolve_media(&mut self, origin: &str) {
        crate::catalog::resolve(&mut self.avatar, origin);
    }

    /// Single letter for the avatar placeholder.
    #[must_use]
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// Access and refresh tokens issued by `/auth/jwt/create/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// One past purchase as listed on the profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub amount: Price,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items_display: Vec<String>,
}

impl OrderSummary {
    /// First eight characters of the order UUID, as shown to customers.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.id.simple().to_string().chars().take(8).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user: User = serde_json::from_value(json!({
            "id": 1, "email": "dj@example.com"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "dj@example.com");
        assert_eq!(user.initial(), "D");

        user.first_name = "Anna".into();
        user.last_name = "Petrova".into();
        assert_eq!(user.display_name(), "Anna Petrova");
    }

    #[test]
    fn test_order_summary_accepts_offset_timestamps() {
        let order: OrderSummary = serde_json::from_value(json!({
            "id": "5f0c6a4e-8f0b-4c53-9d6a-2f1f5b8c9e10",
            "amount": "2500.00",
            "created_at": "2024-05-01T12:00:00.123456+03:00",
            "items_display": ["Track: Morning Drive", "Collection: Lo-Fi"]
        }))
        .unwrap();
        assert_eq!(order.short_id(), "5f0c6a4e");
        assert_eq!(order.created_at.to_rfc3339(), "2024-05-01T09:00:00.123456+00:00");
        assert_eq!(order.items_display.len(), 2);
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let pair = TokenPair {
            access: "aaa".into(),
            refresh: "bbb".into(),
        };
        let debug = format!("{pair:?}");
        assert!(!debug.contains("aaa"));
        assert!(debug.contains("REDACTED"));
    }
}
