//! Durable storage of orders and their lines, addressed by `order_no`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Model as ProductModel,
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
};

const MAX_ORDER_NO_ATTEMPTS: u32 = 5;

/// Header of an order about to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total_amount: i64,
    pub pay_amount: i64,
    pub freight: i64,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub remark: Option<String>,
}

/// A staged order line with the catalog data frozen at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub total_price: i64,
}

impl NewOrderItem {
    pub fn snapshot(product: &ProductModel, quantity: i32) -> AppResult<Self> {
        let total_price = product
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))?;
        Ok(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_image: product.main_image.clone(),
            unit_price: product.price,
            quantity,
            total_price,
        })
    }
}

/// Timestamp written alongside a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStamp {
    None,
    PaymentTime,
    ShipTime,
    CompleteTime,
}

/// Inserts the order header and its lines inside `txn`.
///
/// The header goes in under a savepoint so a duplicate `order_no` can be
/// retried with a fresh number without aborting the outer transaction.
pub async fn insert_order(
    txn: &DatabaseTransaction,
    draft: &NewOrder,
    items: &[NewOrderItem],
    mut next_order_no: impl FnMut() -> String,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let mut attempt = 0;
    let order = loop {
        attempt += 1;
        let order_no = next_order_no();
        let savepoint = txn.begin().await?;
        match order_active(draft, &order_no).insert(&savepoint).await {
            Ok(order) => {
                savepoint.commit().await?;
                break order;
            }
            Err(err) if is_unique_violation(&err) && attempt < MAX_ORDER_NO_ATTEMPTS => {
                savepoint.rollback().await?;
                tracing::warn!(%order_no, attempt, "order number collision, regenerating");
            }
            Err(err) => {
                savepoint.rollback().await?;
                return Err(err.into());
            }
        }
    };

    let mut order_items = Vec::with_capacity(items.len());
    for item in items {
        let inserted = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            product_name: Set(item.product_name.clone()),
            product_image: Set(item.product_image.clone()),
            unit_price: Set(item.unit_price),
            quantity: Set(item.quantity),
            total_price: Set(item.total_price),
            created_at: Set(order.created_at),
        }
        .insert(txn)
        .await?;
        order_items.push(inserted);
    }

    Ok((order, order_items))
}

fn order_active(draft: &NewOrder, order_no: &str) -> OrderActive {
    let now = Utc::now();
    OrderActive {
        id: Set(Uuid::new_v4()),
        order_no: Set(order_no.to_string()),
        user_id: Set(draft.user_id),
        total_amount: Set(draft.total_amount),
        pay_amount: Set(draft.pay_amount),
        freight: Set(draft.freight),
        status: Set(OrderStatus::Unpaid),
        payment_time: Set(None),
        ship_time: Set(None),
        complete_time: Set(None),
        receiver_name: Set(draft.receiver_name.clone()),
        receiver_phone: Set(draft.receiver_phone.clone()),
        receiver_address: Set(draft.receiver_address.clone()),
        remark: Set(draft.remark.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub async fn find_by_order_no<C: ConnectionTrait>(
    conn: &C,
    order_no: &str,
) -> AppResult<Option<OrderModel>> {
    let order = Orders::find()
        .filter(OrderCol::OrderNo.eq(order_no))
        .one(conn)
        .await?;
    Ok(order)
}

pub async fn find_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItemModel>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;
    Ok(items)
}

/// One page of orders, newest first, plus the total count.
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    status: Option<OrderStatus>,
    limit: u64,
    offset: u64,
) -> AppResult<(Vec<OrderModel>, u64)> {
    let mut condition = Condition::all();
    if let Some(user_id) = user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id);

    let total = finder.clone().count(conn).await?;
    let orders = finder.limit(limit).offset(offset).all(conn).await?;
    Ok((orders, total))
}

/// `UPDATE orders SET status = to WHERE id = ? AND status = from`.
///
/// Returns false when the persisted status is no longer `from`.
pub async fn compare_and_set_status<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
    stamp: StatusStamp,
) -> AppResult<bool> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(to))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now));
    update = match stamp {
        StatusStamp::None => update,
        StatusStamp::PaymentTime => update.col_expr(OrderCol::PaymentTime, Expr::value(now)),
        StatusStamp::ShipTime => update.col_expr(OrderCol::ShipTime, Expr::value(now)),
        StatusStamp::CompleteTime => update.col_expr(OrderCol::CompleteTime, Expr::value(now)),
    };

    let result = update
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(from))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}
