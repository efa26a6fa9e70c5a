use crate::{
    auth::{extract_auth_token, AuthContext},
    models::{
        LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse, Role,
        TokenVerificationResponse,
    },
    state::AppState,
    utils::{ApiError, ApiResult},
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};

use super::ApiJson;

/// Register a Pacilian account
pub async fn register_pacilian(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let response = state.auth_service.register(request, Role::Pacilian).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Register a Caregiver account
pub async fn register_caregiver(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let response = state.auth_service.register(request, Role::Caregiver).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handle user login
pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let response = state.auth_service.login(&request, &ctx).await?;
    Ok(Json(response))
}

/// Drop whatever principal this request carries
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<MessageResponse> {
    state.auth_service.logout(&ctx);
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Verify the bearer token presented with this request
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenVerificationResponse>> {
    let token = extract_auth_token(&headers)
        .ok_or_else(|| ApiError::authentication_error("Invalid authentication token"))?;

    let response = state.auth_service.verify_token(&token).await;
    if !response.valid {
        return Err(ApiError::authentication_error("Invalid or expired token"));
    }
    Ok(Json(response))
}
