//! Cart to order, as one all-or-nothing transaction.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    db::finish_transaction,
    dto::orders::{CreateOrderRequest, OrderWithItems},
    entity::{
        cart_items::Model as CartItemModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel, sea_orm_active_enums::ProductStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner},
    order_no::generate_order_no,
    response::ApiResponse,
    services::{
        cart_snapshot, catalog,
        order_repository::{self, NewOrder, NewOrderItem},
        stock_ledger,
    },
    state::AppState,
};

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let result = place_order(&txn, user, &payload).await;
    let (order, items) = finish_transaction(txn, result).await?;

    tracing::info!(
        order_no = %order.order_no,
        user_id = %user.user_id,
        total_amount = order.total_amount,
        lines = items.len(),
        "order created"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_create",
        serde_json::json!({ "order_no": order.order_no, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items: items.into_iter().map(Into::into).collect(),
        },
    ))
}

/// Every read and write below runs on `txn`; any error leaves nothing behind
/// once the caller rolls back.
pub async fn place_order(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateOrderRequest,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let lines = cart_snapshot::checked_lines(txn, user.user_id).await?;
    place_order_from_lines(txn, user, payload, &lines).await
}

/// Checkout of an already-read cart snapshot. Fails with `NoCheckedItems`
/// when any of `lines` is gone from the cart by the time it is consumed.
pub async fn place_order_from_lines(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateOrderRequest,
    lines: &[CartItemModel],
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    if lines.is_empty() {
        return Err(AppError::NoCheckedItems);
    }

    let address = catalog::find_address(txn, payload.address_id)
        .await?
        .ok_or(AppError::AddressNotFound)?;
    ensure_owner(user, address.user_id)?;

    let mut staged = Vec::with_capacity(lines.len());
    let mut total_amount: i64 = 0;
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        let product = catalog::find_product(txn, line.product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        if product.status != ProductStatus::OnSale {
            return Err(AppError::ProductUnavailable);
        }
        // Advisory only; the ledger debit below is authoritative.
        if product.stock < line.quantity {
            return Err(AppError::InsufficientStock);
        }

        let item = NewOrderItem::snapshot(&product, line.quantity)?;
        total_amount = total_amount
            .checked_add(item.total_price)
            .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))?;
        staged.push(item);
    }

    for item in &staged {
        if !stock_ledger::decrease(txn, item.product_id, item.quantity).await? {
            tracing::warn!(
                product_id = %item.product_id,
                quantity = item.quantity,
                user_id = %user.user_id,
                "checkout lost the race for stock"
            );
            return Err(AppError::InsufficientStock);
        }
    }

    let draft = NewOrder {
        user_id: user.user_id,
        total_amount,
        pay_amount: total_amount,
        freight: 0,
        receiver_name: address.receiver_name.clone(),
        receiver_phone: address.phone.clone(),
        receiver_address: catalog::receiver_address(&address),
        remark: payload.remark.clone(),
    };
    let (order, items) =
        order_repository::insert_order(txn, &draft, &staged, generate_order_no).await?;

    let line_ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    let consumed = cart_snapshot::consume_lines(txn, user.user_id, &line_ids).await?;
    if consumed != line_ids.len() as u64 {
        // Another checkout of the same cart got there first.
        tracing::warn!(
            user_id = %user.user_id,
            expected = line_ids.len(),
            consumed,
            "cart consumed concurrently"
        );
        return Err(AppError::NoCheckedItems);
    }

    Ok((order, items))
}
