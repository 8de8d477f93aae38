//! Order lifecycle.
//!
//! ```text
//! UNPAID ──pay──► PAID ──ship──► SHIPPED ──confirm──► COMPLETED
//!    │              │
//!    └───cancel─────┴──────────► CANCELLED
//! ```
//!
//! `next_status` is the only place transitions are defined. Every transition
//! is persisted with a compare-and-set on the status read in the same
//! transaction, so two actors racing on one order cannot both succeed.

use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{
    entity::{orders::Model as OrderModel, sea_orm_active_enums::OrderStatus},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner},
    services::{
        order_repository::{self, StatusStamp},
        stock_ledger,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Pay,
    Ship,
    ConfirmReceipt,
    Cancel,
}

impl OrderEvent {
    pub const ALL: [OrderEvent; 4] = [
        OrderEvent::Pay,
        OrderEvent::Ship,
        OrderEvent::ConfirmReceipt,
        OrderEvent::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::Pay => "pay",
            OrderEvent::Ship => "ship",
            OrderEvent::ConfirmReceipt => "confirm_receipt",
            OrderEvent::Cancel => "cancel",
        }
    }

    fn stamp(&self) -> StatusStamp {
        match self {
            OrderEvent::Pay => StatusStamp::PaymentTime,
            OrderEvent::Ship => StatusStamp::ShipTime,
            OrderEvent::ConfirmReceipt => StatusStamp::CompleteTime,
            OrderEvent::Cancel => StatusStamp::None,
        }
    }

    /// Error raised when this event is not legal from the current status.
    pub fn rejection(&self) -> AppError {
        match self {
            OrderEvent::Cancel => AppError::OrderCannotBeCancelled,
            _ => AppError::InvalidOrderStatus,
        }
    }
}

pub fn next_status(from: OrderStatus, event: OrderEvent) -> Option<OrderStatus> {
    use OrderEvent::*;
    use OrderStatus::*;

    match (from, event) {
        (Unpaid, Pay) => Some(Paid),
        (Unpaid, Cancel) | (Paid, Cancel) => Some(Cancelled),
        (Paid, Ship) => Some(Shipped),
        (Shipped, ConfirmReceipt) => Some(Completed),
        _ => None,
    }
}

/// Who is driving a transition.
#[derive(Debug, Clone, Copy)]
pub enum Actor {
    /// The buyer; must own the order.
    Owner(Uuid),
    /// Back office; ownership is not checked.
    Admin,
}

impl Actor {
    pub fn owner(user: &AuthUser) -> Self {
        Actor::Owner(user.user_id)
    }

    pub fn admin(user: &AuthUser) -> AppResult<Self> {
        ensure_admin(user)?;
        Ok(Actor::Admin)
    }

    pub fn authorize(&self, order: &OrderModel) -> AppResult<()> {
        match self {
            Actor::Owner(user_id) => ensure_owner(&AuthUser::user(*user_id), order.user_id),
            Actor::Admin => Ok(()),
        }
    }
}

/// Reads the order fresh inside `txn`.
pub async fn load(txn: &DatabaseTransaction, order_no: &str) -> AppResult<OrderModel> {
    order_repository::find_by_order_no(txn, order_no)
        .await?
        .ok_or(AppError::OrderNotFound)
}

/// Load, authorize and transition in one go.
pub async fn fire(
    txn: &DatabaseTransaction,
    order_no: &str,
    actor: Actor,
    event: OrderEvent,
) -> AppResult<OrderModel> {
    let order = load(txn, order_no).await?;
    actor.authorize(&order)?;
    transition(txn, order, event).await
}

/// Moves `order` (as read inside `txn`) along `event` and runs the side effects.
pub async fn transition(
    txn: &DatabaseTransaction,
    order: OrderModel,
    event: OrderEvent,
) -> AppResult<OrderModel> {
    let from = order.status;
    let Some(to) = next_status(from, event) else {
        tracing::info!(
            order_no = %order.order_no,
            status = %from,
            event = event.as_str(),
            "transition rejected"
        );
        return Err(event.rejection());
    };

    if !order_repository::compare_and_set_status(txn, order.id, from, to, event.stamp()).await? {
        tracing::info!(
            order_no = %order.order_no,
            status = %from,
            event = event.as_str(),
            "order changed concurrently, transition rejected"
        );
        return Err(event.rejection());
    }

    if to == OrderStatus::Cancelled {
        let items = order_repository::find_items(txn, order.id).await?;
        for item in &items {
            stock_ledger::increase(txn, item.product_id, item.quantity).await?;
        }
        tracing::debug!(order_no = %order.order_no, lines = items.len(), "stock restored");
    }

    tracing::info!(
        order_no = %order.order_no,
        from = %from,
        to = %to,
        "order transitioned"
    );

    load(txn, &order.order_no).await
}
