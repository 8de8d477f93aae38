use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::cart_items::{Column as CartCol, Entity as CartItems, Model as CartItemModel},
    error::AppResult,
};

/// Checked cart lines of a user, oldest first. Read-only.
pub async fn checked_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Vec<CartItemModel>> {
    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::Checked.eq(true))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .all(conn)
        .await?;
    Ok(lines)
}

/// Deletes the given lines of the user's cart and reports how many went.
pub async fn consume_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    line_ids: &[Uuid],
) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::Id.is_in(line_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
