mod common;

use common::*;
use shop_checkout::{
    dto::payment::PayRequest,
    entity::sea_orm_active_enums::{OrderStatus, ProductStatus},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};
use uuid::Uuid;

fn query(status: Option<&str>) -> OrderListQuery {
    OrderListQuery {
        page: Some(1),
        per_page: Some(10),
        status: status.map(str::to_string),
    }
}

async fn pay(state: &AppState, user: &AuthUser, order_no: &str) -> anyhow::Result<()> {
    payment_service::pay(
        state,
        user,
        PayRequest {
            order_no: order_no.to_string(),
            payment_method: Some("ALIPAY".into()),
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let product = seed_product(&state, "chair", 25000, 5, ProductStatus::OnSale).await?;
    let placed = place_single_order(&state, &user, product, 3).await?;
    let order_no = placed.order.order_no;
    assert_eq!(stock_of(&state, product).await?, 2);

    let cancelled = order_service::cancel_order(&state, &user, &order_no)
        .await?
        .data
        .expect("order payload");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product).await?, 5);

    let again = order_service::cancel_order(&state, &user, &order_no).await;
    assert!(matches!(again, Err(AppError::OrderCannotBeCancelled)));
    assert_eq!(stock_of(&state, product).await?, 5);

    assert_eq!(audit_entries(&state, "order_cancelled").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn paid_order_can_still_be_cancelled() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let product = seed_product(&state, "desk", 50000, 2, ProductStatus::OnSale).await?;
    let order_no = place_single_order(&state, &user, product, 2).await?.order.order_no;
    pay(&state, &user, &order_no).await?;

    order_service::cancel_order(&state, &user, &order_no).await?;
    let order = reload_order(&state, &order_no).await?;
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.payment_time.is_some());
    assert_eq!(stock_of(&state, product).await?, 2);
    Ok(())
}

#[tokio::test]
async fn full_lifecycle_stamps_each_step() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let admin = AuthUser::admin(Uuid::new_v4());
    let product = seed_product(&state, "bike", 120000, 1, ProductStatus::OnSale).await?;
    let order_no = place_single_order(&state, &user, product, 1).await?.order.order_no;

    pay(&state, &user, &order_no).await?;
    let paid = reload_order(&state, &order_no).await?;
    assert_eq!(paid.status, OrderStatus::Paid);
    assert!(paid.payment_time.is_some());
    assert!(paid.ship_time.is_none());

    order_service::ship_order(&state, &admin, &order_no).await?;
    let shipped = reload_order(&state, &order_no).await?;
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.ship_time.is_some());
    assert_eq!(shipped.payment_time, paid.payment_time);

    order_service::confirm_receipt(&state, &user, &order_no).await?;
    let completed = reload_order(&state, &order_no).await?;
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.complete_time.is_some());

    let cancel = order_service::cancel_order(&state, &user, &order_no).await;
    assert!(matches!(cancel, Err(AppError::OrderCannotBeCancelled)));
    assert_eq!(stock_of(&state, product).await?, 0);
    Ok(())
}

#[tokio::test]
async fn illegal_transitions_change_nothing() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let admin = AuthUser::admin(Uuid::new_v4());
    let product = seed_product(&state, "sofa", 80000, 3, ProductStatus::OnSale).await?;
    let order_no = place_single_order(&state, &user, product, 1).await?.order.order_no;
    let before = reload_order(&state, &order_no).await?;

    let ship = order_service::ship_order(&state, &admin, &order_no).await;
    assert!(matches!(ship, Err(AppError::InvalidOrderStatus)));

    let confirm = order_service::confirm_receipt(&state, &user, &order_no).await;
    assert!(matches!(confirm, Err(AppError::InvalidOrderStatus)));

    let after = reload_order(&state, &order_no).await?;
    assert_eq!(after, before);
    assert_eq!(stock_of(&state, product).await?, 2);
    Ok(())
}

#[tokio::test]
async fn shipping_needs_admin_and_buyers_only_touch_their_orders() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let stranger = AuthUser::user(Uuid::new_v4());
    let product = seed_product(&state, "rug", 7000, 3, ProductStatus::OnSale).await?;
    let order_no = place_single_order(&state, &user, product, 1).await?.order.order_no;
    pay(&state, &user, &order_no).await?;

    let ship = order_service::ship_order(&state, &user, &order_no).await;
    assert!(matches!(ship, Err(AppError::Forbidden)));

    let peek = order_service::get_order(&state, &stranger, &order_no).await;
    assert!(matches!(peek, Err(AppError::Forbidden)));

    let cancel = order_service::cancel_order(&state, &stranger, &order_no).await;
    assert!(matches!(cancel, Err(AppError::Forbidden)));

    let missing = order_service::get_order(&state, &user, "19700101000000000000").await;
    assert!(matches!(missing, Err(AppError::OrderNotFound)));

    assert_eq!(reload_order(&state, &order_no).await?.status, OrderStatus::Paid);
    Ok(())
}

#[tokio::test]
async fn admin_cancel_skips_ownership() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let admin = AuthUser::admin(Uuid::new_v4());
    let product = seed_product(&state, "vase", 3000, 4, ProductStatus::OnSale).await?;
    let order_no = place_single_order(&state, &user, product, 4).await?.order.order_no;

    let denied = order_service::cancel_order_admin(&state, &user, &order_no).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let detail = order_service::get_order_admin(&state, &admin, &order_no)
        .await?
        .data
        .expect("order payload");
    assert_eq!(detail.items.len(), 1);

    order_service::cancel_order_admin(&state, &admin, &order_no).await?;
    assert_eq!(stock_of(&state, product).await?, 4);
    Ok(())
}

#[tokio::test]
async fn listing_filters_by_owner_and_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let other = AuthUser::user(Uuid::new_v4());
    let admin = AuthUser::admin(Uuid::new_v4());
    let product = seed_product(&state, "cup", 900, 10, ProductStatus::OnSale).await?;

    let first = place_single_order(&state, &user, product, 1).await?.order.order_no;
    place_single_order(&state, &user, product, 1).await?;
    place_single_order(&state, &other, product, 1).await?;
    pay(&state, &user, &first).await?;

    let mine = order_service::list_orders(&state, &user, query(None)).await?;
    assert_eq!(mine.data.expect("list").items.len(), 2);
    assert_eq!(mine.meta.and_then(|m| m.total), Some(2));

    let paid = order_service::list_orders(&state, &user, query(Some("PAID")))
        .await?
        .data
        .expect("list");
    assert_eq!(paid.items.len(), 1);
    assert_eq!(paid.items[0].order_no, first);

    let bogus = order_service::list_orders(&state, &user, query(Some("LOST"))).await;
    assert!(matches!(bogus, Err(AppError::InvalidOrderStatus)));

    let denied = order_service::list_all_orders(&state, &user, query(None)).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let everything = order_service::list_all_orders(&state, &admin, query(Some("UNPAID")))
        .await?
        .data
        .expect("list");
    assert_eq!(everything.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser::user(Uuid::new_v4());
    let product = seed_product(&state, "spoon", 300, 5, ProductStatus::OnSale).await?;
    place_single_order(&state, &user, product, 1).await?;

    let far = OrderListQuery {
        page: Some(i64::MAX),
        per_page: Some(100),
        status: None,
    };
    let response = order_service::list_orders(&state, &user, far).await?;
    assert!(response.data.expect("list").items.is_empty());
    assert_eq!(response.meta.and_then(|m| m.total), Some(1));
    Ok(())
}
