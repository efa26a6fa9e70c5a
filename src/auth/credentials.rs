use crate::{
    auth::{context::AuthContext, password::PasswordHasher},
    db::IdentityResolver,
    models::{Identity, Principal},
    utils::AuthError,
};
use std::sync::Arc;

/// Plaintext hashed once at startup to give unknown emails a digest to check against
const DUMMY_PASSWORD: &str = "care-auth-dummy-password";

/// Validates email/password pairs against the identity store
pub struct CredentialAuthenticator {
    resolver: Arc<dyn IdentityResolver>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_digest: String,
}

impl CredentialAuthenticator {
    pub fn new(resolver: Arc<dyn IdentityResolver>, hasher: Arc<dyn PasswordHasher>) -> Self {
        let dummy_digest = hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            tracing::warn!("Failed to precompute dummy password digest: {}", e);
            String::new()
        });
        Self {
            resolver,
            hasher,
            dummy_digest,
        }
    }

    /// Authenticate and bind the identity into `ctx`.
    ///
    /// Unknown email and wrong password both yield `BadCredentials`, and both
    /// pay for one hash comparison.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ctx: &AuthContext,
    ) -> Result<Identity, AuthError> {
        let identity = self
            .resolver
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Unexpected(e.to_string()))?;

        let Some(identity) = identity else {
            self.hasher.matches(password, &self.dummy_digest);
            tracing::debug!("Login rejected: bad credentials");
            return Err(AuthError::BadCredentials);
        };

        if !self.hasher.matches(password, &identity.password_hash) {
            tracing::debug!("Login rejected: bad credentials");
            return Err(AuthError::BadCredentials);
        }

        ctx.bind(Principal::from(&identity));
        tracing::info!(user_id = %identity.id, role = %identity.role, "User authenticated");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{Argon2Hasher, MockPasswordHasher};
    use crate::db::{InMemoryIdentityStore, MockIdentityResolver};
    use crate::models::Role;
    use chrono::Utc;
    use uuid::Uuid;

    async fn store_with(email: &str, password: &str) -> Arc<InMemoryIdentityStore> {
        let store = Arc::new(InMemoryIdentityStore::new());
        store
            .save(Identity {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: Argon2Hasher::new().hash(password).unwrap(),
                name: "A".to_string(),
                nik: "1".to_string(),
                role: Role::Pacilian,
                profile: Default::default(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_correct_password_binds_context() {
        let store = store_with("a@x.com", "right").await;
        let authenticator = CredentialAuthenticator::new(store, Arc::new(Argon2Hasher::new()));
        let ctx = AuthContext::new();

        let identity = authenticator
            .authenticate("a@x.com", "right", &ctx)
            .await
            .unwrap();

        assert_eq!(identity.email, "a@x.com");
        let principal = ctx.current().unwrap();
        assert_eq!(principal.email, "a@x.com");
        assert_eq!(principal.authority, "ROLE_PACILIAN");
    }

    #[tokio::test]
    async fn test_wrong_password_is_bad_credentials() {
        let store = store_with("a@x.com", "right").await;
        let authenticator = CredentialAuthenticator::new(store, Arc::new(Argon2Hasher::new()));
        let ctx = AuthContext::new();

        let result = authenticator.authenticate("a@x.com", "wrong", &ctx).await;

        assert_eq!(result.unwrap_err(), AuthError::BadCredentials);
        assert!(!ctx.is_bound());
    }

    #[tokio::test]
    async fn test_unknown_email_is_indistinguishable() {
        let store = store_with("a@x.com", "right").await;
        let authenticator = CredentialAuthenticator::new(store, Arc::new(Argon2Hasher::new()));
        let ctx = AuthContext::new();

        let unknown = authenticator
            .authenticate("nobody@x.com", "right", &ctx)
            .await
            .unwrap_err();
        let wrong = authenticator
            .authenticate("a@x.com", "wrong", &ctx)
            .await
            .unwrap_err();

        assert_eq!(unknown, wrong);
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(!ctx.is_bound());
    }

    #[tokio::test]
    async fn test_store_failure_is_unexpected() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_find_by_email()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));
        let authenticator =
            CredentialAuthenticator::new(Arc::new(resolver), Arc::new(Argon2Hasher::new()));

        let result = authenticator
            .authenticate("a@x.com", "right", &AuthContext::new())
            .await;

        assert!(matches!(result, Err(AuthError::Unexpected(_))));
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_hash_comparison() {
        let store = store_with("a@x.com", "right").await;
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("$argon2id$dummy".to_string()));
        hasher
            .expect_matches()
            .withf(|_, digest| digest.ends_with("$dummy"))
            .times(1)
            .returning(|_, _| false);
        hasher
            .expect_matches()
            .withf(|_, digest| !digest.ends_with("$dummy"))
            .times(1)
            .returning(|_, _| false);
        let authenticator = CredentialAuthenticator::new(store, Arc::new(hasher));
        let ctx = AuthContext::new();

        let unknown = authenticator.authenticate("nobody@x.com", "pw", &ctx).await;
        let wrong = authenticator.authenticate("a@x.com", "pw", &ctx).await;

        assert_eq!(unknown.unwrap_err(), AuthError::BadCredentials);
        assert_eq!(wrong.unwrap_err(), AuthError::BadCredentials);
    }
}
