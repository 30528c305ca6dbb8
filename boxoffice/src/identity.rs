//! Buyer identity.
//!
//! Core operations take an already-verified [`BuyerId`]; turning a bearer
//! token into one is the job of an [`IdentityProvider`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use uuid::Uuid;

use crate::types::BuyerId;

/// Identity verification failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Unknown, revoked or malformed token
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Resolves bearer tokens to buyer ids.
///
/// Returns a boxed future so the trait stays object-safe.
pub trait IdentityProvider: Send + Sync {
    /// Verify `token`
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BuyerId, IdentityError>> + Send + 'a>>;
}

/// Opaque session tokens kept in memory.
#[derive(Default)]
pub struct SessionIdentity {
    sessions: RwLock<HashMap<String, BuyerId>>,
}

impl SessionIdentity {
    /// An identity provider with no sessions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `buyer` and return its token
    pub fn issue(&self, buyer: BuyerId) -> String {
        let token = Uuid::new_v4().simple().to_string();
        tracing::debug!(buyer = %buyer, "Session issued");
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), buyer);
        token
    }

    /// Close a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }
}

impl IdentityProvider for SessionIdentity {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BuyerId, IdentityError>> + Send + 'a>> {
        let buyer = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned();
        Box::pin(async move { buyer.ok_or(IdentityError::InvalidToken) })
    }
}
