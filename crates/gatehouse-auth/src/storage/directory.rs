//! User directory: authority assignment for confirmed identities.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{Authority, ExternalIdentity, Principal};

/// Maps a confirmed third-party identity onto a principal.
///
/// Authority assignment lives behind this seam so the OAuth2 completion
/// handlers stay independent of where user data actually comes from.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves an external identity to a principal.
    ///
    /// # Errors
    /// Returns an error if the identity cannot be resolved.
    async fn resolve(&self, identity: &ExternalIdentity) -> AuthResult<Principal>;
}

/// Directory with a static authority table.
///
/// Subjects listed in the table receive their configured authorities;
/// everyone else receives the default set. The default set should
/// include [`Authority::User`] so freshly logged-in users can reach the
/// general API subtree.
#[derive(Debug, Clone)]
pub struct StaticUserDirectory {
    overrides: HashMap<String, Vec<Authority>>,
    default_authorities: Vec<Authority>,
}

impl StaticUserDirectory {
    /// Creates a directory that grants every subject the default set.
    #[must_use]
    pub fn new(default_authorities: Vec<Authority>) -> Self {
        Self {
            overrides: HashMap::new(),
            default_authorities,
        }
    }

    /// Assigns a specific authority set to a subject.
    #[must_use]
    pub fn with_subject(
        mut self,
        subject: impl Into<String>,
        authorities: Vec<Authority>,
    ) -> Self {
        self.overrides.insert(subject.into(), authorities);
        self
    }
}

impl Default for StaticUserDirectory {
    fn default() -> Self {
        Self::new(vec![Authority::User])
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn resolve(&self, identity: &ExternalIdentity) -> AuthResult<Principal> {
        let authorities = self
            .overrides
            .get(&identity.subject)
            .cloned()
            .unwrap_or_else(|| self.default_authorities.clone());
        Ok(Principal::new(identity.subject.clone(), authorities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(subject: &str) -> ExternalIdentity {
        ExternalIdentity {
            subject: subject.to_string(),
            email: None,
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_default_authorities_for_unknown_subject() {
        let directory = StaticUserDirectory::default();
        let principal = directory.resolve(&identity("someone")).await.unwrap();
        assert_eq!(principal.user_id, "someone");
        assert_eq!(principal.authorities, vec![Authority::User]);
    }

    #[tokio::test]
    async fn test_subject_override() {
        let directory = StaticUserDirectory::default()
            .with_subject("root", vec![Authority::User, Authority::Admin]);

        let principal = directory.resolve(&identity("root")).await.unwrap();
        assert!(principal.has_authority(Authority::Admin));

        let other = directory.resolve(&identity("guest")).await.unwrap();
        assert!(!other.has_authority(Authority::Admin));
    }
}
