//! Request-scoped caller identity.
//!
//! The gateway authenticates callers; services receive the result as an
//! explicit value passed down the call chain rather than implicit
//! thread-local state. `arcana-web` extracts it from trusted headers.

use crate::model::UserId;
use serde::{Deserialize, Serialize};

/// Authorization role of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user. May only mutate their own spreads and interpretations.
    Reader,
    /// Privileged role. May mutate any spread or interpretation.
    Oracle,
}

impl Role {
    /// Parse the wire representation, defaulting unknown values to `Reader`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("oracle") {
            Self::Oracle
        } else {
            Self::Reader
        }
    }
}

/// Authenticated caller identity carried through a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// The authenticated user.
    pub user_id: UserId,
    /// The caller's role.
    pub role: Role,
}

impl AuthContext {
    /// Build a reader-level context.
    #[must_use]
    pub const fn reader(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Reader,
        }
    }

    /// Build a privileged context.
    #[must_use]
    pub const fn oracle(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Oracle,
        }
    }

    /// Whether this caller may mutate a resource owned by `author`.
    ///
    /// True for the author themselves and for any privileged caller.
    #[must_use]
    pub fn can_mutate(&self, author: UserId) -> bool {
        self.role == Role::Oracle || self.user_id == author
    }
}
