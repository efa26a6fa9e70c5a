use crate::{
    auth::AuthContext,
    models::{ApiResponse, PasswordChangeRequest, Principal, UpdateProfileRequest, UserProfile},
    state::AppState,
    utils::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};

use super::ApiJson;

fn principal(ctx: &AuthContext) -> ApiResult<Principal> {
    ctx.current()
        .ok_or_else(|| ApiError::authentication_error("Authentication required"))
}

/// Get current user profile
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.profile_service.get_profile(&principal(&ctx)?).await?;
    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.profile_service.get_profile(&principal(&ctx)?).await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Profile retrieved successfully",
        Some(profile),
    )))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = state
        .profile_service
        .update_profile(&principal(&ctx)?, request)
        .await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Profile updated successfully",
        Some(profile),
    )))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .profile_service
        .delete_account(&principal(&ctx)?, &ctx)
        .await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Account deleted successfully",
        None,
    )))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(request): ApiJson<PasswordChangeRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .profile_service
        .change_password(&principal(&ctx)?, &request)
        .await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Password changed successfully",
        None,
    )))
}
