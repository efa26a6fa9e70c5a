pub mod auth;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod utils;

pub use auth::{AuthContext, AuthInterceptor, AuthService, TokenEngine};
pub use db::{IdentityResolver, InMemoryIdentityStore};
pub use state::AppState;
pub use utils::{ApiError, ApiResult, AuthError, Config};

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use handlers::{auth as auth_handlers, profile};
use tower::ServiceBuilder;

/// Build the HTTP router with the authentication layer applied to every route
pub fn create_app(state: AppState) -> Router {
    // Create public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(middleware::health_check))
        .route(
            "/api/auth/register/pacilian",
            post(auth_handlers::register_pacilian),
        )
        .route(
            "/api/auth/register/caregiver",
            post(auth_handlers::register_caregiver),
        )
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/logout", post(auth_handlers::logout))
        .route("/api/auth/verify", post(auth_handlers::verify));

    // Create protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/profile/me", get(profile::me))
        .route(
            "/api/profile",
            get(profile::get_profile)
                .put(profile::update_profile)
                .delete(profile::delete_account),
        )
        .route("/api/profile/change-password", post(profile::change_password))
        .layer(from_fn(auth::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(middleware::trace_layer())
                // Request ID
                .layer(middleware::request_id_layer())
                // Authentication middleware
                .layer(from_fn_with_state(
                    state.interceptor.clone(),
                    auth::auth_middleware,
                )),
        )
        .with_state(state)
}
