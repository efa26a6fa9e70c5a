//! Token issuance, per-request interception and credential checks.
//!
//! The [`middleware`] layer attaches an [`AuthContext`] to every request,
//! binds a principal when the bearer token checks out and otherwise lets the
//! request through anonymously. Handlers that need a user sit behind
//! [`require_auth`].

pub mod context;
pub mod credentials;
pub mod middleware;
pub mod password;
pub mod profile;
pub mod service;
pub mod token;

pub use context::AuthContext;
pub use credentials::CredentialAuthenticator;
pub use middleware::{
    auth_middleware, extract_auth_token, require_auth, AuthInterceptor, ErrorResolver,
    Interception, JsonErrorResolver,
};
pub use password::{Argon2Hasher, PasswordHasher};
pub use profile::ProfileService;
pub use service::AuthService;
pub use token::{Claims, TokenEngine, Verification};
