//! Authenticated identity types.

use serde::{Deserialize, Serialize};

use super::{Email, UserId};

/// The current user's profile as returned by the backend's profile endpoint.
///
/// Unknown fields (timestamps, etc.) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserProfile {
    /// "First Last", falling back to the email when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.to_string()
        } else {
            full.to_owned()
        }
    }
}

/// An authenticated session.
///
/// Only the auth session component creates or destroys these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub profile: UserProfile,
    /// Whether a bearer token was stored when the session was established.
    pub token_present: bool,
}

impl Session {
    #[must_use]
    pub const fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            token_present: true,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.profile.id
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.profile.is_admin
    }
}
