//! Authentication-related types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use motoparts_core::UserId;
use motoparts_core::types::lenient;

/// A storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned id.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Avatar image path or URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Membership tier driving the server-side discount.
    #[serde(default)]
    pub membership_tier: Option<String>,
    /// Loyalty points balance.
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub points: Option<u32>,
    /// Whether the email address has been verified.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_verified: bool,
}

/// An authenticated session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    /// The logged-in user, when the server identified them.
    pub user_id: Option<UserId>,
    /// Bearer token sent with every request.
    pub token: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Body of a login or registration response.
///
/// The server sends `{ "user": {...}, "token": "..." }`; registration may omit
/// the token when email verification is required first.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    /// The authenticated (or newly registered) user.
    #[serde(default)]
    pub user: Option<User>,
    /// Bearer token, if the server issued one.
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    /// Informational message (e.g. "check your inbox").
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthPayload {
    /// The token, if present and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_decodes_with_minimal_fields() {
        let user: User = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(user.id, UserId::from(7));
        assert!(user.name.is_empty());
        assert_eq!(user.points, None);
    }

    #[test]
    fn test_auth_payload_blank_token_is_absent() {
        let payload: AuthPayload =
            serde_json::from_value(json!({"user": {"id": 1}, "token": " "})).unwrap();
        assert!(payload.token().is_none());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            user_id: Some(UserId::new("u1")),
            token: SecretString::from("super-secret-bearer"),
        };
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-bearer"));
    }
}
