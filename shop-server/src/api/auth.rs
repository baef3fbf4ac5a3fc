//! Authentication endpoints: request a magic link, redeem it, sign out

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use shared::error::AppError;
use validator::Validate;

use crate::auth::link::{issue_link, redeem_link, validate_redirect};
use crate::auth::session::{clear_session_cookie, create_token, session_cookie};
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::now_millis;

use super::ApiResult;

/// POST /authenticate
#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticateRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

pub async fn send_auth_link(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> ApiResult<serde_json::Value> {
    let Json(req) = payload.map_err(AppError::from)?;
    req.validate().map_err(AppError::from)?;
    let email = req.email.trim().to_lowercase();

    // Same answer whether or not the email has an account
    issue_link(
        &state.pool,
        state.mailer.as_ref(),
        &email,
        &state.api_base_url,
        &state.auth_redirect_url,
        now_millis(),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "message": "If the email exists, a sign-in link has been sent"
    })))
}

/// GET /auth-links/authenticate
#[derive(Debug, Deserialize)]
pub struct AuthLinkQuery {
    pub code: Option<String>,
    pub redirect: Option<String>,
}

pub async fn authenticate_from_link(
    State(state): State<AppState>,
    query: Result<Query<AuthLinkQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query.map_err(AppError::from)?;
    // Checked before the code is consumed so a bad redirect does not burn it
    let redirect = validate_redirect(query.redirect.as_deref(), &state.auth_redirect_url)?;

    let redeemed = redeem_link(
        &state.pool,
        query.code.as_deref().unwrap_or_default(),
        now_millis(),
    )
    .await?;

    let token = create_token(
        &redeemed.user_id,
        redeemed.restaurant_id.as_deref(),
        &state.jwt_secret,
        state.session_ttl_days,
    )?;
    let cookie = session_cookie(&token, state.session_ttl_days, state.secure_cookies);

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, redirect), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

/// POST /sign-out
pub async fn sign_out(State(state): State<AppState>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie(state.secure_cookies))],
    )
        .into_response()
}
