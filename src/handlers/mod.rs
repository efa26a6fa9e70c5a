pub mod auth;
pub mod profile;

use crate::utils::ApiError;
use axum::extract::FromRequest;

/// JSON body extractor whose rejections render as [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
