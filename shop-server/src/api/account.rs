//! Account endpoints: profile, managed restaurant, restaurant onboarding

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, UserProfile};
use validator::Validate;

use crate::auth::SessionIdentity;
use crate::db::{restaurants, users};
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::now_millis;

use super::ApiResult;

/// GET /me
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<UserProfile> {
    let profile = users::get_profile(&state.pool, &identity.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(profile))
}

/// GET /managed-restaurant
pub async fn get_managed_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Restaurant> {
    identity.restaurant_id()?;
    let restaurant = restaurants::find_managed(&state.pool, &identity.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::NotAManager))?;
    Ok(Json(restaurant))
}

/// POST /restaurants
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRestaurantRequest {
    #[validate(length(min = 1, max = 120, message = "Restaurant name is required"))]
    pub restaurant_name: String,
    #[validate(length(min = 1, max = 120, message = "Manager name is required"))]
    pub manager_name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(max = 32, message = "Phone is too long"))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRestaurantResponse {
    pub restaurant_id: String,
    pub manager_id: String,
}

pub async fn register_restaurant(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRestaurantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterRestaurantResponse>), ServiceError> {
    let Json(req) = payload.map_err(AppError::from)?;
    req.validate().map_err(AppError::from)?;

    let email = req.email.trim().to_lowercase();
    let input = users::NewRestaurant {
        restaurant_name: req.restaurant_name.trim(),
        manager_name: req.manager_name.trim(),
        email: &email,
        phone: req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()),
    };

    let (manager_id, restaurant_id) =
        users::create_manager_with_restaurant(&state.pool, &input, now_millis()).await?;
    tracing::info!(restaurant_id = %restaurant_id, manager_id = %manager_id, "Restaurant registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterRestaurantResponse {
            restaurant_id,
            manager_id,
        }),
    ))
}
