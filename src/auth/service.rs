use crate::{
    auth::{
        context::AuthContext, credentials::CredentialAuthenticator, password::PasswordHasher,
        token::TokenEngine,
    },
    db::{DuplicateIdentity, IdentityResolver},
    models::{
        Identity, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Role,
        TokenVerificationResponse,
    },
    utils::{ApiError, ApiResult},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const REGISTRATION_SUCCESS_MESSAGE: &str = "Registration successful. Please login.";

/// Authentication service
pub struct AuthService {
    engine: Arc<TokenEngine>,
    resolver: Arc<dyn IdentityResolver>,
    hasher: Arc<dyn PasswordHasher>,
    authenticator: CredentialAuthenticator,
}

impl AuthService {
    pub fn new(
        engine: Arc<TokenEngine>,
        resolver: Arc<dyn IdentityResolver>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let authenticator = CredentialAuthenticator::new(resolver.clone(), hasher.clone());
        Self {
            engine,
            resolver,
            hasher,
            authenticator,
        }
    }

    pub fn engine(&self) -> &Arc<TokenEngine> {
        &self.engine
    }

    /// Authenticate user with email/password and return a bearer token
    pub async fn login(&self, request: &LoginRequest, ctx: &AuthContext) -> ApiResult<LoginResponse> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::validation_error("Email and password are required"));
        }

        let identity = self
            .authenticator
            .authenticate(&request.email, &request.password, ctx)
            .await?;
        let access_token = self.engine.issue(&identity, None)?;

        Ok(LoginResponse {
            access_token,
            email: identity.email,
            name: identity.name,
            role: identity.role,
            expires_in: self.engine.expiration_time().as_millis() as u64,
        })
    }

    pub fn logout(&self, ctx: &AuthContext) {
        ctx.clear();
    }

    /// Explicit token check; every failure reads as `valid: false`
    pub async fn verify_token(&self, token: &str) -> TokenVerificationResponse {
        let Ok(email) = self.engine.extract_subject(token) else {
            return TokenVerificationResponse::invalid();
        };

        let identity = match self.resolver.find_by_email(&email).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return TokenVerificationResponse::invalid(),
            Err(e) => {
                tracing::warn!("Identity lookup failed during token verification: {}", e);
                return TokenVerificationResponse::invalid();
            }
        };

        if !self.engine.is_valid(token, &identity.email) {
            return TokenVerificationResponse::invalid();
        }

        TokenVerificationResponse {
            valid: true,
            user_id: Some(identity.id),
            email: Some(identity.email),
            role: Some(identity.role),
            expires_in: Some(self.engine.remaining_ttl(token).as_millis() as u64),
        }
    }

    /// Register a new account of the given kind
    pub async fn register(&self, request: RegisterRequest, role: Role) -> ApiResult<RegisterResponse> {
        request.validate(role)?;

        if self.resolver.exists_by_email(&request.email).await? {
            return Err(ApiError::conflict_error("Email already exists"));
        }
        if self.resolver.exists_by_nik(&request.nik).await? {
            return Err(ApiError::conflict_error("NIK already exists"));
        }

        let profile = request.profile_for(role);
        let identity = Identity {
            id: Uuid::new_v4(),
            email: request.email,
            password_hash: self.hasher.hash(&request.password)?,
            name: request.name,
            nik: request.nik,
            role,
            profile,
            created_at: Utc::now(),
        };
        // The store re-checks uniqueness atomically; concurrent registrations lose here
        let saved = self
            .resolver
            .save(identity)
            .await
            .map_err(|e| match e.downcast_ref::<DuplicateIdentity>() {
                Some(DuplicateIdentity::Email) => ApiError::conflict_error("Email already exists"),
                Some(DuplicateIdentity::Nik) => ApiError::conflict_error("NIK already exists"),
                None => ApiError::from(e),
            })?;
        tracing::info!(user_id = %saved.id, role = %saved.role, "Registered new account");

        Ok(RegisterResponse {
            id: saved.id,
            role: saved.role,
            message: REGISTRATION_SUCCESS_MESSAGE.to_string(),
        })
    }
}
