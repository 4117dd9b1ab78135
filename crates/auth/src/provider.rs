use async_trait::async_trait;

use crate::{AuthObserver, AuthResult, Subscription, UserCredential, UserHandle};

/// The identity operations the client is written against.
///
/// Local and cloud modes both implement this, so calling code does not
/// branch on the deployment mode.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name of the backing mode, used in logs.
    fn mode(&self) -> &'static str;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<UserCredential>;

    /// Creates the account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<UserCredential>;

    /// Third-party ("social") login.
    async fn sign_in_with_alternate_provider(&self) -> AuthResult<UserCredential>;

    /// Ends the current session. Succeeds when nobody is signed in.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Registers `observer` for every later transition and immediately
    /// replays the current state to it.
    async fn on_auth_state_changed(&self, observer: AuthObserver) -> AuthResult<Subscription>;

    async fn current_user(&self) -> AuthResult<Option<UserHandle>>;

    /// Overrides the display name of the signed-in user.
    async fn update_display_name(&self, display_name: &str) -> AuthResult<UserHandle>;

    async fn send_password_reset_email(&self, email: &str) -> AuthResult<()>;

    async fn send_email_verification(&self, user: &UserHandle) -> AuthResult<()>;
}
