use crate::models::Principal;
use parking_lot::RwLock;
use std::sync::Arc;

/// Request-scoped holder of the authenticated principal.
///
/// The interceptor creates one per request and stores it in the request
/// extensions; clones share the same cell, so a login handler binding a
/// principal is visible to anything else holding that request's context.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    principal: Arc<RwLock<Option<Principal>>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, principal: Principal) {
        *self.principal.write() = Some(principal);
    }

    pub fn current(&self) -> Option<Principal> {
        self.principal.read().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.principal.read().is_some()
    }

    pub fn clear(&self) {
        self.principal.write().take();
    }
}
