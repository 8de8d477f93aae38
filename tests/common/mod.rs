#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use shop_checkout::{
    db::{create_orm_conn, run_migrations},
    dto::orders::{CreateOrderRequest, OrderWithItems},
    entity::{
        AuditLogs, CartItems, OrderItems, Orders, Products,
        addresses::ActiveModel as AddressActive,
        audit_logs::{Column as AuditCol, Model as AuditModel},
        cart_items::{ActiveModel as CartActive, Column as CartCol},
        orders::{Column as OrderCol, Model as OrderModel},
        products::ActiveModel as ProductActive,
        sea_orm_active_enums::ProductStatus,
    },
    middleware::auth::AuthUser,
    services::checkout_service,
    state::AppState,
};
use uuid::Uuid;

pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    Ok(AppState {
        orm,
        jwt_secret: "test-secret".into(),
    })
}

pub async fn seed_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
    status: ProductStatus,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        main_image: Set(Some(format!("https://img.example.com/{name}.png"))),
        price: Set(price),
        stock: Set(stock),
        status: Set(status),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn seed_address(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        receiver_name: Set("Li Lei".into()),
        phone: Set("13800000000".into()),
        province: Set("Zhejiang".into()),
        city: Set("Hangzhou".into()),
        district: Set("Xihu".into()),
        detail_address: Set("1 Wensan Rd".into()),
        is_default: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

pub async fn add_cart_line(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    checked: bool,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        checked: Set(checked),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(line.id)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub async fn cart_lines(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}

pub async fn order_count(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}

pub async fn order_item_count(state: &AppState) -> anyhow::Result<u64> {
    Ok(OrderItems::find().count(&state.orm).await?)
}

pub async fn reload_order(state: &AppState, order_no: &str) -> anyhow::Result<OrderModel> {
    Orders::find()
        .filter(OrderCol::OrderNo.eq(order_no))
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order {order_no} missing"))
}

pub async fn audit_entries(state: &AppState, action: &str) -> anyhow::Result<Vec<AuditModel>> {
    Ok(AuditLogs::find()
        .filter(AuditCol::Action.eq(action))
        .all(&state.orm)
        .await?)
}

/// One product, one checked line, one address; returns the placed order.
pub async fn place_single_order(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<OrderWithItems> {
    add_cart_line(state, user.user_id, product_id, quantity, true).await?;
    let address_id = seed_address(state, user.user_id).await?;
    let response = checkout_service::create_order(
        state,
        user,
        CreateOrderRequest {
            address_id,
            remark: None,
        },
    )
    .await?;
    response
        .data
        .ok_or_else(|| anyhow::anyhow!("order payload missing"))
}
