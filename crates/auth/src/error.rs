use genie_storage::StorageError;
use thiserror::Error;

/// Prefix the emulated cloud provider puts in front of every error message.
pub const PROVIDER_MESSAGE_PREFIX: &str = "Firebase: ";

/// Failures surfaced by an [`IdentityProvider`](crate::IdentityProvider).
///
/// Credential errors render exactly like the cloud provider's, so UI code
/// that strips [`PROVIDER_MESSAGE_PREFIX`] treats both modes alike.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Firebase: Error (auth/user-not-found).")]
    UserNotFound,
    #[error("Firebase: Error (auth/wrong-password).")]
    WrongPassword,
    #[error("Firebase: Error (auth/email-already-in-use).")]
    EmailAlreadyInUse,
    #[error("Firebase: Error (auth/null-user).")]
    NoCurrentUser,
    #[error("Firebase: Error (auth/invalid-display-name).")]
    InvalidDisplayName,
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("stored {key} record is malformed: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {key} record: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl AuthError {
    /// Stable machine-readable kind, in the emulated provider's vocabulary.
    ///
    /// ```
    /// use genie_auth::AuthError;
    ///
    /// assert_eq!(AuthError::WrongPassword.code(), "auth/wrong-password");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::NoCurrentUser => "auth/null-user",
            AuthError::InvalidDisplayName => "auth/invalid-display-name",
            AuthError::Storage(_) | AuthError::Corrupt { .. } | AuthError::Encode { .. } => {
                "auth/internal-error"
            }
        }
    }

    /// Message fit for display, without the provider name.
    ///
    /// ```
    /// use genie_auth::AuthError;
    ///
    /// assert_eq!(
    ///     AuthError::UserNotFound.user_message(),
    ///     "Error (auth/user-not-found)."
    /// );
    /// ```
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        match message.strip_prefix(PROVIDER_MESSAGE_PREFIX) {
            Some(stripped) => stripped.to_owned(),
            None => message,
        }
    }

    /// True for the failures a user can fix by retyping something.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AuthError::UserNotFound | AuthError::WrongPassword | AuthError::EmailAlreadyInUse
        )
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
