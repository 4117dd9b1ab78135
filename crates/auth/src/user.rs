use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// Profile of a signed-in user, as stored in the session slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

impl AuthUser {
    /// Builds a profile whose display name is the local-part of `email`.
    pub fn derived(uid: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        let display_name = local_part(&email).to_owned();
        Self {
            uid: uid.into(),
            email,
            display_name,
        }
    }
}

/// Everything before the first `@`, or the whole string when there is none.
pub(crate) fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Produces bearer tokens for a user.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn id_token(&self, user: &AuthUser, force_refresh: bool) -> AuthResult<String>;
}

/// A signed-in user together with the means to authenticate API calls.
#[derive(Clone)]
pub struct UserHandle {
    profile: AuthUser,
    tokens: Arc<dyn TokenSource>,
}

impl UserHandle {
    pub fn new(profile: AuthUser, tokens: Arc<dyn TokenSource>) -> Self {
        Self { profile, tokens }
    }

    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn email(&self) -> &str {
        &self.profile.email
    }

    pub fn display_name(&self) -> &str {
        &self.profile.display_name
    }

    pub fn profile(&self) -> &AuthUser {
        &self.profile
    }

    pub fn into_profile(self) -> AuthUser {
        self.profile
    }

    pub async fn id_token(&self, force_refresh: bool) -> AuthResult<String> {
        self.tokens.id_token(&self.profile, force_refresh).await
    }

    /// Value for the `Authorization` header on calls to the remote API.
    pub async fn authorization_header(&self) -> AuthResult<String> {
        let token = self.id_token(true).await?;
        Ok(format!("Bearer {token}"))
    }
}

impl PartialEq for UserHandle {
    fn eq(&self, other: &Self) -> bool {
        self.profile == other.profile
    }
}

impl Eq for UserHandle {}

impl fmt::Debug for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserHandle")
            .field("uid", &self.profile.uid)
            .field("email", &self.profile.email)
            .field("display_name", &self.profile.display_name)
            .finish()
    }
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub user: UserHandle,
}
