use crate::OwnerId;
use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Stable user identifier; records are owned by this id.
    pub id: OwnerId,
    /// Optional email shown in the header.
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Build a user with an optional email.
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: OwnerId::new(id),
            email,
        }
    }

    /// Label used when rendering the signed-in user.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(self.id.as_str())
    }
}
