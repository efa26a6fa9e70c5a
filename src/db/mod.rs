use crate::models::Identity;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Uniqueness violation reported by [`IdentityResolver::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DuplicateIdentity {
    #[error("email already belongs to another identity")]
    Email,
    #[error("nik already belongs to another identity")]
    Nik,
}

/// Lookup capability over the identity store.
///
/// `Ok(None)` means the identity does not exist; `Err` is reserved for the
/// store itself failing. `save` inserts only and fails with a
/// [`DuplicateIdentity`] when the email or NIK is taken; `update` replaces an
/// existing record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    async fn exists_by_nik(&self, nik: &str) -> Result<bool>;

    async fn save(&self, identity: Identity) -> Result<Identity>;

    async fn update(&self, identity: Identity) -> Result<Identity>;

    /// Returns whether a record was removed
    async fn delete_by_email(&self, email: &str) -> Result<bool>;
}

/// Process-local identity store keyed by email
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    identities: Arc<RwLock<HashMap<String, Identity>>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.identities.read().get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.identities.read().contains_key(email))
    }

    async fn exists_by_nik(&self, nik: &str) -> Result<bool> {
        Ok(self.identities.read().values().any(|i| i.nik == nik))
    }

    async fn save(&self, identity: Identity) -> Result<Identity> {
        // Both uniqueness checks and the insert happen under one write lock
        let mut identities = self.identities.write();
        if identities.contains_key(&identity.email) {
            return Err(DuplicateIdentity::Email.into());
        }
        if identities.values().any(|existing| existing.nik == identity.nik) {
            return Err(DuplicateIdentity::Nik.into());
        }
        identities.insert(identity.email.clone(), identity.clone());
        Ok(identity)
    }

    async fn update(&self, identity: Identity) -> Result<Identity> {
        let mut identities = self.identities.write();
        let Some(existing) = identities.get_mut(&identity.email) else {
            anyhow::bail!("identity {} does not exist", identity.id);
        };
        *existing = identity.clone();
        Ok(identity)
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.identities.write().remove(email).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Role};
    use chrono::Utc;
    use uuid::Uuid;

    fn identity(email: &str, nik: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Name".to_string(),
            nik: nik.to_string(),
            role: Role::Caregiver,
            profile: Profile::default(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryIdentityStore::new();
        assert!(store.is_empty());

        store.save(identity("a@x.com", "1")).await.unwrap();

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.email, "a@x.com");
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let store = InMemoryIdentityStore::new();
        store.save(identity("a@x.com", "317")).await.unwrap();

        assert!(store.exists_by_email("a@x.com").await.unwrap());
        assert!(!store.exists_by_email("z@x.com").await.unwrap());
        assert!(store.exists_by_nik("317").await.unwrap());
        assert!(!store.exists_by_nik("999").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_nik_is_rejected() {
        let store = InMemoryIdentityStore::new();
        store.save(identity("a@x.com", "317")).await.unwrap();

        let err = store.save(identity("b@x.com", "317")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DuplicateIdentity>(),
            Some(&DuplicateIdentity::Nik)
        );
    }

    #[tokio::test]
    async fn test_save_never_replaces_existing_email() {
        let store = InMemoryIdentityStore::new();
        let mut first = identity("a@x.com", "1");
        first.password_hash = "h1".to_string();
        store.save(first).await.unwrap();

        let mut second = identity("a@x.com", "2");
        second.password_hash = "h2".to_string();
        let err = store.save(second).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<DuplicateIdentity>(),
            Some(&DuplicateIdentity::Email)
        );
        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.nik, "1");
        assert_eq!(stored.password_hash, "h1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryIdentityStore::new();
        assert!(store.update(identity("a@x.com", "1")).await.is_err());

        store.save(identity("a@x.com", "1")).await.unwrap();
        let mut changed = identity("a@x.com", "1");
        changed.name = "Renamed".to_string();
        store.update(changed).await.unwrap();
        assert_eq!(
            store.find_by_email("a@x.com").await.unwrap().unwrap().name,
            "Renamed"
        );

        assert!(store.delete_by_email("a@x.com").await.unwrap());
        assert!(!store.delete_by_email("a@x.com").await.unwrap());
        assert!(store.is_empty());
    }
}
