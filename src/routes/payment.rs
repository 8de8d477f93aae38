use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payment::{CallbackAck, PayRequest, PaymentNotifyRequest, PaymentResult},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pay", post(pay))
        .route("/notify", post(notify))
}

#[utoipa::path(
    post,
    path = "/api/payment/pay",
    request_body = PayRequest,
    responses(
        (status = 200, description = "Mock payment captured", body = ApiResponse<PaymentResult>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not awaiting payment"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn pay(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PayRequest>,
) -> AppResult<Json<ApiResponse<PaymentResult>>> {
    let resp = payment_service::pay(&state, &user, payload).await?;
    Ok(Json(resp))
}

// Unauthenticated by contract; a real gateway integration must verify a signature here.
#[utoipa::path(
    post,
    path = "/api/payment/notify",
    request_body = PaymentNotifyRequest,
    responses(
        (status = 200, description = "Callback processed (idempotent)", body = ApiResponse<CallbackAck>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order was cancelled"),
    ),
    tag = "Payment"
)]
pub async fn notify(
    State(state): State<AppState>,
    Json(payload): Json<PaymentNotifyRequest>,
) -> AppResult<Json<ApiResponse<CallbackAck>>> {
    let resp = payment_service::handle_callback(&state, payload).await?;
    Ok(Json(resp))
}
