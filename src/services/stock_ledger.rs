//! All writes to `products.stock` go through here.
//!
//! `decrease` is a single conditional UPDATE, so the comparison and the
//! mutation are evaluated together by the storage engine and a racing buyer
//! simply observes `false`.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};
use uuid::Uuid;

use crate::{
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
};

/// `UPDATE products SET stock = stock - q WHERE id = ? AND stock >= q`.
///
/// Returns whether exactly one row was debited.
pub async fn decrease<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<bool> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be greater than 0".into()));
    }

    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::Stock.gte(quantity))
        .exec(conn)
        .await?;

    let consumed = result.rows_affected == 1;
    if !consumed {
        tracing::debug!(%product_id, quantity, "stock debit rejected");
    }
    Ok(consumed)
}

/// Unconditional credit, used for compensation on cancellation.
pub async fn increase<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be greater than 0".into()));
    }

    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(quantity))
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(%product_id, quantity, "stock credit matched no product");
    }
    Ok(())
}
