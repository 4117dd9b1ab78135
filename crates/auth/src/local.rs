//! Offline identity provider backed by a [`KeyValueStore`].
//!
//! Users live in one JSON object keyed by email, the active session in a
//! second entry. Passwords are stored in cleartext: this provider exists for
//! local development and is not a security boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genie_config::AuthConfig;
use genie_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::user::local_part;
use crate::{
    AuthError, AuthObserver, AuthResult, AuthStateBus, AuthUser, IdentityProvider, Subscription,
    TokenSource, UserCredential, UserHandle,
};

pub const USERS_KEY: &str = "local_users_db";
pub const SESSION_KEY: &str = "local_current_session";

/// Marks identifiers minted by this provider rather than the cloud.
pub const LOCAL_UID_PREFIX: &str = "local_";

const UID_SUFFIX_DIGITS: usize = 4;

/// Builds a local uid from the email's local-part and the clock.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use genie_auth::local::generate_local_uid;
///
/// let now = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
/// assert_eq!(generate_local_uid("john.doe@x.com", now), "local_johndoe_3456");
/// ```
pub fn generate_local_uid(email: &str, now: DateTime<Utc>) -> String {
    let sanitized: String = local_part(email)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let millis = now.timestamp_millis().to_string();
    let suffix = &millis[millis.len().saturating_sub(UID_SUFFIX_DIGITS)..];
    format!("{LOCAL_UID_PREFIX}{sanitized}_{suffix}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    uid: String,
    email: String,
    password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl UserRecord {
    fn profile(&self) -> AuthUser {
        let mut profile = AuthUser::derived(&self.uid, &self.email);
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        profile
    }
}

type UsersCollection = HashMap<String, UserRecord>;

#[derive(Debug, Clone)]
pub struct LocalIdentityOptions {
    pub latency: Duration,
    pub demo_email: String,
    pub demo_password: String,
}

impl Default for LocalIdentityOptions {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for LocalIdentityOptions {
    fn from(config: &AuthConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.simulated_latency_ms),
            demo_email: config.demo_email.clone(),
            demo_password: config.demo_password.clone(),
        }
    }
}

/// The mock token is the uid itself: no expiry, no signature.
struct LocalTokenSource;

#[async_trait]
impl TokenSource for LocalTokenSource {
    async fn id_token(&self, user: &AuthUser, _force_refresh: bool) -> AuthResult<String> {
        Ok(user.uid.clone())
    }
}

pub struct LocalIdentity {
    store: Arc<dyn KeyValueStore>,
    options: LocalIdentityOptions,
    observers: AuthStateBus,
    tokens: Arc<dyn TokenSource>,
    // Serialises every read-modify-write of the users collection and the
    // session slot, and orders notifications with them.
    writer: Mutex<()>,
}

impl LocalIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>, options: LocalIdentityOptions) -> Self {
        Self {
            store,
            options,
            observers: AuthStateBus::new(),
            tokens: Arc::new(LocalTokenSource),
            writer: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &AuthConfig) -> Self {
        Self::new(store, LocalIdentityOptions::from(config))
    }

    pub fn observers(&self) -> &AuthStateBus {
        &self.observers
    }

    async fn simulate_latency(&self) {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
    }

    fn handle(&self, profile: AuthUser) -> UserHandle {
        UserHandle::new(profile, Arc::clone(&self.tokens))
    }

    async fn load_users(&self) -> AuthResult<UsersCollection> {
        let Some(raw) = self.store.get(USERS_KEY).await? else {
            return Ok(UsersCollection::new());
        };
        serde_json::from_str(&raw).map_err(|source| AuthError::Corrupt {
            key: USERS_KEY,
            source,
        })
    }

    async fn save_users(&self, users: &UsersCollection) -> AuthResult<()> {
        let raw = serde_json::to_string(users).map_err(|source| AuthError::Encode {
            key: USERS_KEY,
            source,
        })?;
        self.store.set(USERS_KEY, &raw).await?;
        Ok(())
    }

    /// Reads the persisted session. A record that no longer parses counts
    /// as signed out.
    async fn restore_session(&self) -> AuthResult<Option<AuthUser>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<AuthUser>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(error) => {
                warn!(%error, "ignoring unreadable session record");
                Ok(None)
            }
        }
    }

    /// Persists the session and notifies observers. Callers hold `writer`.
    async fn establish_session(&self, profile: AuthUser) -> AuthResult<UserHandle> {
        let raw = serde_json::to_string(&profile).map_err(|source| AuthError::Encode {
            key: SESSION_KEY,
            source,
        })?;
        self.store.set(SESSION_KEY, &raw).await?;

        let user = self.handle(profile);
        self.observers.notify(Some(&user));
        Ok(user)
    }

    /// Signs in an account that was just written to `users`. If the session
    /// cannot be stored the account is withdrawn again, so a failed sign-up
    /// leaves the email free.
    async fn establish_new_account(
        &self,
        mut users: UsersCollection,
        email: &str,
        profile: AuthUser,
    ) -> AuthResult<UserHandle> {
        match self.establish_session(profile).await {
            Ok(user) => Ok(user),
            Err(error) => {
                users.remove(email);
                if let Err(rollback) = self.save_users(&users).await {
                    warn!(%email, error = %rollback, "failed to withdraw account after session error");
                }
                Err(error)
            }
        }
    }

    fn authenticate(users: &UsersCollection, email: &str, password: &str) -> AuthResult<AuthUser> {
        let Some(record) = users.get(email) else {
            warn!(%email, "local sign-in for unknown email");
            return Err(AuthError::UserNotFound);
        };

        if record.password != password {
            warn!(%email, "local sign-in with wrong password");
            return Err(AuthError::WrongPassword);
        }

        Ok(record.profile())
    }

    fn new_record(email: &str, password: &str) -> UserRecord {
        UserRecord {
            uid: generate_local_uid(email, Utc::now()),
            email: email.to_owned(),
            password: password.to_owned(),
            display_name: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn mode(&self) -> &'static str {
        "local"
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<UserCredential> {
        debug!(%email, "local sign-in requested");
        self.simulate_latency().await;

        let _guard = self.writer.lock().await;
        let users = self.load_users().await?;
        let profile = Self::authenticate(&users, email, password)?;

        info!(uid = %profile.uid, "local sign-in succeeded");
        let user = self.establish_session(profile).await?;
        Ok(UserCredential { user })
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<UserCredential> {
        debug!(%email, "local sign-up requested");
        self.simulate_latency().await;

        let _guard = self.writer.lock().await;
        let mut users = self.load_users().await?;
        if users.contains_key(email) {
            warn!(%email, "local sign-up for existing email");
            return Err(AuthError::EmailAlreadyInUse);
        }

        let record = Self::new_record(email, password);
        let profile = record.profile();
        users.insert(email.to_owned(), record);
        self.save_users(&users).await?;

        info!(uid = %profile.uid, "local account created");
        let user = self.establish_new_account(users, email, profile).await?;
        Ok(UserCredential { user })
    }

    async fn sign_in_with_alternate_provider(&self) -> AuthResult<UserCredential> {
        let email = self.options.demo_email.as_str();
        let password = self.options.demo_password.as_str();
        debug!(%email, "simulating third-party sign-in");
        self.simulate_latency().await;

        let _guard = self.writer.lock().await;
        let mut users = self.load_users().await?;
        let provisioned = !users.contains_key(email);
        if provisioned {
            users.insert(email.to_owned(), Self::new_record(email, password));
            self.save_users(&users).await?;
            info!(%email, "provisioned demo identity");
        }

        let profile = Self::authenticate(&users, email, password)?;
        info!(uid = %profile.uid, "demo identity signed in");
        let user = if provisioned {
            self.establish_new_account(users, email, profile).await?
        } else {
            self.establish_session(profile).await?
        };
        Ok(UserCredential { user })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let _guard = self.writer.lock().await;
        if self.store.get(SESSION_KEY).await?.is_none() {
            debug!("sign-out without an active session");
            return Ok(());
        }

        self.store.remove(SESSION_KEY).await?;
        info!("local session cleared");
        self.observers.notify(None);
        Ok(())
    }

    async fn on_auth_state_changed(&self, observer: AuthObserver) -> AuthResult<Subscription> {
        let _guard = self.writer.lock().await;
        let current = self.restore_session().await?.map(|profile| self.handle(profile));

        let subscription = self.observers.subscribe(Arc::clone(&observer));
        debug!(signed_in = current.is_some(), "replaying auth state to new observer");
        observer(current);
        Ok(subscription)
    }

    async fn current_user(&self) -> AuthResult<Option<UserHandle>> {
        Ok(self
            .restore_session()
            .await?
            .map(|profile| self.handle(profile)))
    }

    async fn update_display_name(&self, display_name: &str) -> AuthResult<UserHandle> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::InvalidDisplayName);
        }

        let _guard = self.writer.lock().await;
        let Some(mut profile) = self.restore_session().await? else {
            return Err(AuthError::NoCurrentUser);
        };

        let mut users = self.load_users().await?;
        if let Some(record) = users.get_mut(&profile.email) {
            record.display_name = Some(display_name.to_owned());
            self.save_users(&users).await?;
        }

        profile.display_name = display_name.to_owned();
        info!(uid = %profile.uid, "display name updated");
        self.establish_session(profile).await
    }

    async fn send_password_reset_email(&self, email: &str) -> AuthResult<()> {
        info!(%email, "password reset email simulated in local mode");
        Ok(())
    }

    async fn send_email_verification(&self, user: &UserHandle) -> AuthResult<()> {
        info!(uid = %user.uid(), "email verification simulated in local mode");
        Ok(())
    }
}
