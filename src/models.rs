use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    order_items::Model as OrderItemModel, orders::Model as OrderModel,
    sea_orm_active_enums::OrderStatus,
};

/// Money is persisted in minor units and shown with two decimal places.
pub fn to_decimal(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, 2)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub pay_amount: Decimal,
    pub freight: Decimal,
    pub status: OrderStatus,
    pub status_desc: String,
    pub payment_time: Option<DateTime<Utc>>,
    pub ship_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Order {
            id: model.id,
            order_no: model.order_no,
            user_id: model.user_id,
            total_amount: to_decimal(model.total_amount),
            pay_amount: to_decimal(model.pay_amount),
            freight: to_decimal(model.freight),
            status: model.status,
            status_desc: model.status.description().to_string(),
            payment_time: model.payment_time.map(|dt| dt.with_timezone(&Utc)),
            ship_time: model.ship_time.map(|dt| dt.with_timezone(&Utc)),
            complete_time: model.complete_time.map(|dt| dt.with_timezone(&Utc)),
            receiver_name: model.receiver_name,
            receiver_phone: model.receiver_phone,
            receiver_address: model.receiver_address,
            remark: model.remark,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        OrderItem {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_image: model.product_image,
            unit_price: to_decimal(model.unit_price),
            quantity: model.quantity,
            total_price: to_decimal(model.total_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_render_with_two_places() {
        assert_eq!(to_decimal(3500).to_string(), "35.00");
        assert_eq!(to_decimal(5).to_string(), "0.05");
        assert_eq!(to_decimal(1000), Decimal::new(10, 0));
    }
}
