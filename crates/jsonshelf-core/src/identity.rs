//! Identity provider seam and the in-process implementation.

use crate::ShelfCoreError;
use async_trait::async_trait;
use jsonshelf_protocol::User;
use log::info;
use tokio::sync::watch;

/// Source of the signed-in user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<User>;

    /// Receiver that changes whenever a user signs in or out.
    fn watch(&self) -> watch::Receiver<Option<User>>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), ShelfCoreError>;
}

/// Identity held in process, seeded from config or the command line.
pub struct LocalIdentity {
    user: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    pub fn new(user: Option<User>) -> Self {
        let (user, _) = watch::channel(user);
        Self { user }
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, user: User) {
        info!("signed in (user_id={})", user.id);
        self.user.send_replace(Some(user));
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ShelfCoreError> {
        if let Some(user) = self.user.send_replace(None) {
            info!("signed out (user_id={})", user.id);
        }
        Ok(())
    }
}
