//! Mock settlement: synchronous capture plus the idempotent payer callback.

use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    audit,
    db::finish_transaction,
    dto::payment::{
        CallbackAck, CallbackOutcome, PayRequest, PaymentNotifyRequest, PaymentOutcome,
        PaymentResult,
    },
    entity::{orders::Model as OrderModel, sea_orm_active_enums::OrderStatus},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::to_decimal,
    order_no::generate_transaction_no,
    response::ApiResponse,
    services::{
        order_service::audit_action,
        order_state::{self, Actor, OrderEvent},
    },
    state::AppState,
};

const DEFAULT_PAYMENT_METHOD: &str = "MOCK";

pub async fn pay(
    state: &AppState,
    user: &AuthUser,
    payload: PayRequest,
) -> AppResult<ApiResponse<PaymentResult>> {
    let payment_method = payload
        .payment_method
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

    let txn = state.orm.begin().await?;
    let result = capture(&txn, user, &payload.order_no).await;
    let (order, transaction_no) = finish_transaction(txn, result).await?;

    tracing::info!(
        order_no = %order.order_no,
        pay_amount = order.pay_amount,
        %payment_method,
        %transaction_no,
        "payment captured"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        audit_action(OrderEvent::Pay),
        serde_json::json!({
            "order_no": order.order_no,
            "transaction_no": transaction_no,
            "payment_method": payment_method,
        }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Payment succeeded",
        PaymentResult {
            order_no: order.order_no,
            pay_amount: to_decimal(order.pay_amount),
            payment_method,
            payment_status: PaymentOutcome::Success,
            message: "Payment succeeded".to_string(),
            transaction_no,
        },
    ))
}

async fn capture(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<(OrderModel, String)> {
    let order = order_state::load(txn, order_no).await?;
    Actor::owner(user).authorize(&order)?;
    if order.status != OrderStatus::Unpaid {
        return Err(AppError::InvalidOrderStatus);
    }

    // No gateway: the capture always succeeds and yields a fresh reference.
    let transaction_no = generate_transaction_no();
    let order = order_state::transition(txn, order, OrderEvent::Pay).await?;
    Ok((order, transaction_no))
}

/// Payer notification. Safe to deliver any number of times.
pub async fn handle_callback(
    state: &AppState,
    payload: PaymentNotifyRequest,
) -> AppResult<ApiResponse<CallbackAck>> {
    tracing::info!(
        order_no = %payload.order_no,
        transaction_no = %payload.transaction_no,
        outcome = ?payload.payment_status,
        timestamp = ?payload.timestamp,
        "payment callback received"
    );

    let txn = state.orm.begin().await?;
    let result = settle(&txn, &payload).await;
    let outcome = finish_transaction(txn, result).await?;

    if outcome == CallbackOutcome::Settled {
        audit::record(
            &state.orm,
            None,
            audit_action(OrderEvent::Pay),
            serde_json::json!({
                "order_no": payload.order_no,
                "transaction_no": payload.transaction_no,
                "source": "callback",
            }),
        )
        .await;
    }

    Ok(ApiResponse::ok(
        "Callback processed",
        CallbackAck {
            order_no: payload.order_no,
            outcome,
        },
    ))
}

async fn settle(
    txn: &DatabaseTransaction,
    payload: &PaymentNotifyRequest,
) -> AppResult<CallbackOutcome> {
    let order = order_state::load(txn, &payload.order_no).await?;

    match order.status {
        OrderStatus::Unpaid => {}
        OrderStatus::Paid => {
            tracing::warn!(order_no = %order.order_no, "duplicate callback ignored");
            return Ok(CallbackOutcome::AlreadySettled);
        }
        status => {
            tracing::error!(order_no = %order.order_no, %status, "callback for order in unexpected status");
            return Err(AppError::InvalidOrderStatus);
        }
    }

    if payload.payment_status == PaymentOutcome::Failed {
        tracing::warn!(
            order_no = %order.order_no,
            transaction_no = %payload.transaction_no,
            "payer reported failure, order stays unpaid"
        );
        return Ok(CallbackOutcome::Declined);
    }

    match order_state::transition(txn, order, OrderEvent::Pay).await {
        Ok(order) => {
            tracing::info!(order_no = %order.order_no, "order settled by callback");
            Ok(CallbackOutcome::Settled)
        }
        // Lost a race with a concurrent capture of the same order.
        Err(AppError::InvalidOrderStatus) => {
            let current = order_state::load(txn, &payload.order_no).await?;
            if current.status == OrderStatus::Paid {
                Ok(CallbackOutcome::AlreadySettled)
            } else {
                Err(AppError::InvalidOrderStatus)
            }
        }
        Err(err) => Err(err),
    }
}

