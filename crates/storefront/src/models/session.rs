//! Session-stored types and keys.

use serde::{Deserialize, Serialize};

use clementine_core::UserId;

use super::User;

/// Keys under which values are stored in the session.
pub mod session_keys {
    /// The logged-in user ([`super::CurrentUser`]).
    pub const CURRENT_USER: &str = "current_user";
}

/// The authenticated user, as carried in the session cookie's server-side
/// record. Handlers receive this through the auth extractors and pass it
/// explicitly into services - there is no ambient request-global user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
        }
    }
}
