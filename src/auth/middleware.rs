//! Per-request bearer token interception.
//!
//! [`AuthInterceptor::intercept`] is a single pass over the request headers
//! that ends in exactly one [`Interception`]. Token and lookup failures are
//! never surfaced here; they leave the request anonymous so a later
//! authorization layer decides between 401 and 403. Only failures the
//! interceptor cannot classify are delegated to the [`ErrorResolver`].

use crate::{
    auth::{context::AuthContext, token::TokenEngine},
    db::IdentityResolver,
    models::Principal,
    utils::{ApiError, AuthError},
};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of intercepting one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// A principal is bound in the auth context
    Continue,
    /// Proceed without a principal
    ContinueAnonymous,
    /// Hand the failure to the error resolver and skip downstream
    Delegate(AuthError),
}

/// Renders unexpected interceptor failures
pub trait ErrorResolver: Send + Sync {
    fn handle(&self, request: &Request, error: AuthError) -> Response;
}

/// Default resolver: JSON `ApiError` body
#[derive(Debug, Default)]
pub struct JsonErrorResolver;

impl ErrorResolver for JsonErrorResolver {
    fn handle(&self, request: &Request, error: AuthError) -> Response {
        tracing::error!(
            method = %request.method(),
            path = %request.uri().path(),
            "Authentication interceptor failed: {}",
            error
        );
        ApiError::from(error).into_response()
    }
}

pub struct AuthInterceptor {
    engine: Arc<TokenEngine>,
    resolver: Arc<dyn IdentityResolver>,
    error_resolver: Arc<dyn ErrorResolver>,
}

impl AuthInterceptor {
    pub fn new(
        engine: Arc<TokenEngine>,
        resolver: Arc<dyn IdentityResolver>,
        error_resolver: Arc<dyn ErrorResolver>,
    ) -> Self {
        Self {
            engine,
            resolver,
            error_resolver,
        }
    }

    pub async fn intercept(&self, headers: &HeaderMap, ctx: &AuthContext) -> Interception {
        let Some(token) = extract_auth_token(headers) else {
            return Interception::ContinueAnonymous;
        };

        let subject = match self.engine.extract_subject(&token) {
            Ok(subject) => subject,
            Err(error) if error.is_recognized() => {
                tracing::debug!("Ignoring bearer token: {}", error);
                return Interception::ContinueAnonymous;
            }
            Err(error) => return Interception::Delegate(error),
        };

        if subject.is_empty() {
            return Interception::ContinueAnonymous;
        }

        // Already authenticated earlier in this request
        if ctx.is_bound() {
            return Interception::Continue;
        }

        let identity = match self.resolver.find_by_email(&subject).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!("Bearer token subject has no identity");
                return Interception::ContinueAnonymous;
            }
            Err(error) => return Interception::Delegate(AuthError::Unexpected(error.to_string())),
        };

        if !self.engine.is_valid(&token, &identity.email) {
            return Interception::ContinueAnonymous;
        }

        ctx.bind(Principal::from(&identity));
        tracing::debug!(user_id = %identity.id, "Bearer token authenticated");
        Interception::Continue
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_auth_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

/// Authentication middleware
///
/// Attaches an [`AuthContext`] to every request and clears it once the
/// downstream response has been produced.
pub async fn auth_middleware(
    State(interceptor): State<Arc<AuthInterceptor>>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = request.extensions().get::<AuthContext>().cloned();
    let owned = existing.is_none();
    let ctx = existing.unwrap_or_default();
    if owned {
        request.extensions_mut().insert(ctx.clone());
    }

    let outcome = interceptor.intercept(request.headers(), &ctx).await;
    let response = match outcome {
        Interception::Delegate(error) => interceptor.error_resolver.handle(&request, error),
        Interception::Continue | Interception::ContinueAnonymous => next.run(request).await,
    };

    if owned {
        ctx.clear();
    }
    response
}

/// Required authentication middleware (returns 401 if no principal is bound)
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    let authenticated = request
        .extensions()
        .get::<AuthContext>()
        .is_some_and(AuthContext::is_bound);

    if authenticated {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::authentication_error("Authentication required"))
    }
}
