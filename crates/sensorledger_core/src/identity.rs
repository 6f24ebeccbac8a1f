//! Caller identity source for organization-gated operations.
//!
//! # Responsibility
//! - Abstract "which organization is calling" away from any platform
//!   binding, so gates can be exercised with fixed identities.

/// Supplies the organization of the current caller.
pub trait CallerIdentity {
    fn caller_org(&self) -> String;
}

/// Identity pinned to one organization string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    org: String,
}

impl StaticIdentity {
    pub fn new(org: impl Into<String>) -> Self {
        Self { org: org.into() }
    }
}

impl CallerIdentity for StaticIdentity {
    fn caller_org(&self) -> String {
        self.org.clone()
    }
}
