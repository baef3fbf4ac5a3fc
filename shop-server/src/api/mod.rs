//! API routes for shop-server

pub mod account;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod orders;

use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::authenticate_rate_limit;
use crate::auth::session::session_middleware;
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, ServiceError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 request ids
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Session required; restaurant scope checked per handler
    let session = Router::new()
        .route("/me", get(account::get_profile))
        .route("/managed-restaurant", get(account::get_managed_restaurant))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order_details))
        .route("/orders/{id}/approve", patch(orders::approve_order))
        .route("/orders/{id}/dispatch", patch(orders::dispatch_order))
        .route("/orders/{id}/deliver", patch(orders::deliver_order))
        .route("/orders/{id}/cancel", patch(orders::cancel_order))
        .route(
            "/metrics/daily-receipt-in-period",
            get(metrics::daily_receipt_in_period),
        )
        .route("/metrics/day-orders-amount", get(metrics::day_orders_amount))
        .route("/metrics/month-receipt", get(metrics::month_receipt))
        .route(
            "/metrics/month-orders-amount",
            get(metrics::month_orders_amount),
        )
        .route(
            "/metrics/month-canceled-orders-amount",
            get(metrics::month_canceled_orders_amount),
        )
        .route("/metrics/popular-products", get(metrics::popular_products))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Magic-link request (rate limited per IP)
    let authenticate = Router::new()
        .route("/authenticate", post(auth::send_auth_link))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_rate_limit,
        ));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/auth-links/authenticate", get(auth::authenticate_from_link))
        .route("/sign-out", post(auth::sign_out))
        .route("/restaurants", post(account::register_restaurant))
        .merge(authenticate)
        .merge(session)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), XRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}
