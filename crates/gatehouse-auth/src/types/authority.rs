//! Role authority tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse-grained role tag used for path-based access control.
///
/// Authorities carry no implicit hierarchy: each policy rule names
/// exactly the authority that satisfies it. A principal that should pass
/// both the admin subtree and the general API subtree must hold both
/// [`Authority::Admin`] and [`Authority::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    /// Regular API consumer.
    User,
    /// Host of resources exposed under host-scoped paths.
    Host,
    /// Administrator.
    Admin,
}

impl Authority {
    /// Returns the authority's wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Host => "host",
            Self::Admin => "admin",
        }
    }

    /// Parses an authority from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "host" => Some(Self::Host),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::str::FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown authority: {s}"))
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
