//! Path-based authorization policy.
//!
//! The policy is a linear table of (pattern, required access) rules
//! evaluated top to bottom against the request path; the first matching
//! rule wins and the table carries an explicit fallback. Overlapping
//! patterns are therefore unambiguous: more specific rules simply come
//! first.

use crate::error::AuthError;
use crate::types::{Authority, Principal};

pub mod pattern;

pub use pattern::{PathPattern, PatternError};

/// Access level a rule requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredAccess {
    /// Always permitted, authenticated or not.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// A principal holding the given authority. No hierarchy applies:
    /// the rule is satisfied by exactly this tag.
    HasAuthority(Authority),
}

/// One (pattern, required access) entry in the table.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// Path pattern the rule applies to.
    pub pattern: PathPattern,
    /// Access the rule requires.
    pub access: RequiredAccess,
}

/// Ordered, first-match-wins authorization table.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<PolicyRule>,
    fallback: RequiredAccess,
}

impl AccessPolicy {
    /// Starts building a policy table.
    #[must_use]
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::new()
    }

    /// Evaluates the table against a request path.
    ///
    /// # Errors
    /// Returns [`AuthError::Unauthorized`] when the matched rule needs a
    /// principal and none is bound, and [`AuthError::Forbidden`] when
    /// the bound principal lacks the required authority.
    pub fn evaluate(&self, path: &str, principal: Option<&Principal>) -> Result<(), AuthError> {
        let access = self
            .rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map_or(self.fallback, |rule| rule.access);

        match access {
            RequiredAccess::Public => Ok(()),
            RequiredAccess::Authenticated => match principal {
                Some(_) => Ok(()),
                None => Err(AuthError::unauthorized("authentication required")),
            },
            RequiredAccess::HasAuthority(required) => match principal {
                None => Err(AuthError::unauthorized("authentication required")),
                Some(principal) if principal.has_authority(required) => Ok(()),
                Some(principal) => {
                    tracing::debug!(
                        user_id = %principal.user_id,
                        path = %path,
                        required = %required,
                        "access denied: missing authority"
                    );
                    Err(AuthError::forbidden(format!(
                        "requires {required} authority"
                    )))
                }
            },
        }
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }
}

/// Builder for [`AccessPolicy`].
#[derive(Debug, Default)]
pub struct AccessPolicyBuilder {
    rules: Vec<(String, RequiredAccess)>,
    fallback: Option<RequiredAccess>,
}

impl AccessPolicyBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Appends a rule permitting the pattern unconditionally.
    #[must_use]
    pub fn permit(mut self, pattern: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), RequiredAccess::Public));
        self
    }

    /// Appends a rule requiring any authenticated principal.
    #[must_use]
    pub fn authenticated(mut self, pattern: impl Into<String>) -> Self {
        self.rules
            .push((pattern.into(), RequiredAccess::Authenticated));
        self
    }

    /// Appends a rule requiring a specific authority.
    #[must_use]
    pub fn authority(mut self, pattern: impl Into<String>, authority: Authority) -> Self {
        self.rules
            .push((pattern.into(), RequiredAccess::HasAuthority(authority)));
        self
    }

    /// Sets the fallback for paths no rule matches.
    /// Defaults to requiring any authenticated principal.
    #[must_use]
    pub fn fallback(mut self, access: RequiredAccess) -> Self {
        self.fallback = Some(access);
        self
    }

    /// Compiles the table, preserving declaration order.
    ///
    /// # Errors
    /// Returns an error if any pattern does not compile.
    pub fn build(self) -> Result<AccessPolicy, PatternError> {
        let rules = self
            .rules
            .into_iter()
            .map(|(pattern, access)| {
                Ok(PolicyRule {
                    pattern: PathPattern::new(pattern)?,
                    access,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(AccessPolicy {
            rules,
            fallback: self.fallback.unwrap_or(RequiredAccess::Authenticated),
        })
    }
}
