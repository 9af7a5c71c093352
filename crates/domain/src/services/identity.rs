//! Identity seam for attributing redemptions.
//!
//! Resolving who is scanning belongs to the external auth system. The
//! validator only asks an [`IdentityProvider`] for the requester.

use crate::models::Redeemer;

/// Supplies the identity of the party on whose behalf a call runs.
pub trait IdentityProvider: Send + Sync {
    fn requester(&self) -> Redeemer;
}

/// Used when no identity collaborator is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    fn requester(&self) -> Redeemer {
        Redeemer::Anonymous
    }
}

/// A fixed, already-resolved identity.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity(pub Redeemer);

impl ResolvedIdentity {
    pub fn user(subject: impl Into<String>) -> Self {
        Self(Redeemer::User {
            subject: subject.into(),
        })
    }
}

impl IdentityProvider for ResolvedIdentity {
    fn requester(&self) -> Redeemer {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        assert_eq!(AnonymousIdentity.requester(), Redeemer::Anonymous);
    }

    #[test]
    fn test_resolved_identity() {
        let identity = ResolvedIdentity::user("user-7");
        assert_eq!(identity.requester().subject(), Some("user-7"));
    }
}
