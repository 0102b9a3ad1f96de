//! Role requirements for protected routes.
//!
//! Role titles compare case-insensitively. `RequireAll` is what the router uses;
//! `RequireAny` exists for routes that accept one of several roles.

use crate::auth::models::LocalSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// The session must hold every listed role
    RequireAll(Vec<String>),
    /// The session must hold at least one listed role
    RequireAny(Vec<String>),
}

impl RoleRequirement {
    pub fn all<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequireAll(titles.into_iter().map(Into::into).collect())
    }

    pub fn any<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequireAny(titles.into_iter().map(Into::into).collect())
    }

    /// An empty `RequireAll` admits everyone; an empty `RequireAny` admits no one.
    pub fn is_satisfied_by(&self, session: &LocalSession) -> bool {
        match self {
            Self::RequireAll(titles) => titles.iter().all(|title| session.has_role(title)),
            Self::RequireAny(titles) => titles.iter().any(|title| session.has_role(title)),
        }
    }

    pub fn titles(&self) -> &[String] {
        match self {
            Self::RequireAll(titles) | Self::RequireAny(titles) => titles,
        }
    }
}

impl Default for RoleRequirement {
    fn default() -> Self {
        Self::RequireAll(Vec::new())
    }
}
