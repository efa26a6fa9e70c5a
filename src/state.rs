use crate::{
    auth::{
        Argon2Hasher, AuthInterceptor, AuthService, JsonErrorResolver, PasswordHasher,
        ProfileService, TokenEngine,
    },
    db::IdentityResolver,
    utils::{Config, ConfigError},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub interceptor: Arc<AuthInterceptor>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the service graph; fails if the JWT section is unusable
    pub fn new(config: Config, resolver: Arc<dyn IdentityResolver>) -> Result<Self, ConfigError> {
        let engine = Arc::new(TokenEngine::new(&config.jwt)?);
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());
        let auth_service = Arc::new(AuthService::new(
            engine.clone(),
            resolver.clone(),
            hasher.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(resolver.clone(), hasher));
        let interceptor = Arc::new(AuthInterceptor::new(
            engine,
            resolver,
            Arc::new(JsonErrorResolver),
        ));

        Ok(Self {
            auth_service,
            profile_service,
            interceptor,
            config: Arc::new(config),
        })
    }
}
