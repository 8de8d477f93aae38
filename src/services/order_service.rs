use sea_orm::TransactionTrait;

use crate::{
    audit,
    db::finish_transaction,
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::Model as OrderItemModel, orders::Model as OrderModel,
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{
        order_repository,
        order_state::{self, Actor, OrderEvent},
    },
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list(state, Some(user), query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list(state, None, query).await
}

async fn list(
    state: &AppState,
    owner: Option<&AuthUser>,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(OrderStatus::parse(raw).ok_or(AppError::InvalidOrderStatus)?),
        None => None,
    };

    let (orders, total) = order_repository::list(
        &state.orm,
        owner.map(|u| u.user_id),
        status,
        limit as u64,
        offset as u64,
    )
    .await?;

    Ok(ApiResponse::paged(
        "Ok",
        OrderList {
            items: orders.into_iter().map(Into::into).collect(),
        },
        Meta::page(page, limit, total),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = order_repository::find_by_order_no(&state.orm, order_no)
        .await?
        .ok_or(AppError::OrderNotFound)?;
    ensure_owner(user, order.user_id)?;
    let items = order_repository::find_items(&state.orm, order.id).await?;
    Ok(ApiResponse::ok("OK", with_items(order, items)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = order_repository::find_by_order_no(&state.orm, order_no)
        .await?
        .ok_or(AppError::OrderNotFound)?;
    let items = order_repository::find_items(&state.orm, order.id).await?;
    Ok(ApiResponse::ok("Order found", with_items(order, items)))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    drive(state, user, order_no, Actor::owner(user), OrderEvent::Cancel).await
}

pub async fn confirm_receipt(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    drive(state, user, order_no, Actor::owner(user), OrderEvent::ConfirmReceipt).await
}

pub async fn ship_order(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let actor = Actor::admin(user)?;
    drive(state, user, order_no, actor, OrderEvent::Ship).await
}

pub async fn cancel_order_admin(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let actor = Actor::admin(user)?;
    drive(state, user, order_no, actor, OrderEvent::Cancel).await
}

async fn drive(
    state: &AppState,
    user: &AuthUser,
    order_no: &str,
    actor: Actor,
    event: OrderEvent,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let result = async {
        let order = order_state::fire(&txn, order_no, actor, event).await?;
        let items = order_repository::find_items(&txn, order.id).await?;
        Ok::<_, AppError>((order, items))
    }
    .await;
    let (order, items) = finish_transaction(txn, result).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        audit_action(event),
        serde_json::json!({ "order_no": order.order_no, "status": order.status.as_str() }),
    )
    .await;

    Ok(ApiResponse::ok("Order updated", with_items(order, items)))
}

pub(crate) fn audit_action(event: OrderEvent) -> &'static str {
    match event {
        OrderEvent::Pay => "order_paid",
        OrderEvent::Ship => "order_shipped",
        OrderEvent::ConfirmReceipt => "order_completed",
        OrderEvent::Cancel => "order_cancelled",
    }
}

fn with_items(order: OrderModel, items: Vec<OrderItemModel>) -> OrderWithItems {
    OrderWithItems {
        order: order.into(),
        items: items.into_iter().map(Into::into).collect(),
    }
}
