//! Session types.
//!
//! A session is the pair of bearer token and user profile that a successful
//! login establishes. The token is the sole authority that a session is
//! active: without one, any stored profile is ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile of the signed-in user as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(
        default,
        deserialize_with = "super::flexible_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields this client does not model, kept so updates round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Create a profile with only an email address
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: None,
            role: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    /// Profile used when a login response carries a token but no user record.
    ///
    /// The name is the local part of the email address.
    pub fn fallback(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or(email);
        Self {
            name: Some(local.to_string()),
            ..Self::new(email)
        }
    }

    /// Name to show for this user
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Check if the user has the admin role
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// The current authenticated identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    auth_token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    /// Create an active session
    pub fn new(auth_token: String, user: UserProfile) -> Self {
        Self {
            auth_token: Some(auth_token),
            user: Some(user),
        }
    }

    /// Session with no identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Rebuild a session from stored parts, dropping a user without a token
    pub fn from_parts(auth_token: Option<String>, user: Option<UserProfile>) -> Self {
        let auth_token = auth_token.filter(|t| !t.is_empty());
        let user = if auth_token.is_some() { user } else { None };
        Self { auth_token, user }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.auth_token.as_ref().and(self.user.as_ref())
    }

    pub fn is_active(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Replace the stored profile, keeping the token
    pub fn set_user(&mut self, user: UserProfile) {
        if self.auth_token.is_some() {
            self.user = Some(user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_without_token_is_absent() {
        let session = Session::from_parts(None, Some(UserProfile::new("a@b.com")));
        assert!(!session.is_active());
        assert!(session.user().is_none());

        let session = Session::from_parts(Some(String::new()), Some(UserProfile::new("a@b.com")));
        assert!(session.user().is_none());
    }

    #[test]
    fn test_active_session() {
        let session = Session::new("t".to_string(), UserProfile::new("a@b.com"));
        assert_eq!(session.token(), Some("t"));
        assert_eq!(session.user().map(|u| u.email.as_str()), Some("a@b.com"));
    }

    #[test]
    fn test_set_user_requires_token() {
        let mut session = Session::anonymous();
        session.set_user(UserProfile::new("x@y.z"));
        assert!(session.user().is_none());
    }

    #[test]
    fn test_fallback_profile() {
        let user = UserProfile::fallback("jane.doe@example.com");
        assert_eq!(user.name.as_deref(), Some("jane.doe"));
        assert_eq!(user.display_name(), "jane.doe");
    }

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let value = json!({
            "id": 7,
            "email": "admin@demo.qryti.com",
            "name": "Admin User",
            "role": "admin",
            "organization": "Qryti"
        });
        let user: UserProfile = serde_json::from_value(value).unwrap();
        assert_eq!(user.id.as_deref(), Some("7"));
        assert!(user.is_admin());
        assert_eq!(user.extra.get("organization"), Some(&json!("Qryti")));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["organization"], "Qryti");
    }
}
