//! # Genie Auth
//!
//! The identity contract the client is written against, plus the local
//! shim that fulfils it offline.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use genie_auth::{IdentityProvider, LocalIdentity, LocalIdentityOptions, UserHandle};
//! use genie_storage::MemoryStore;
//!
//! # async fn demo() -> genie_auth::AuthResult<()> {
//! let identity = LocalIdentity::new(Arc::new(MemoryStore::new()), LocalIdentityOptions::default());
//! identity
//!     .on_auth_state_changed(Arc::new(|user: Option<UserHandle>| {
//!         println!("signed in: {}", user.is_some());
//!     }))
//!     .await?;
//! identity.sign_up("trader@example.com", "hunter2").await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod local;
pub mod observer;
pub mod provider;
pub mod user;

pub use error::{AuthError, AuthResult, PROVIDER_MESSAGE_PREFIX};
pub use local::{LocalIdentity, LocalIdentityOptions};
pub use observer::{AuthObserver, AuthStateBus, Subscription};
pub use provider::IdentityProvider;
pub use user::{AuthUser, TokenSource, UserCredential, UserHandle};
