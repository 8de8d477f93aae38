use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::OrderStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_no: String,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub pay_amount: i64,
    pub freight: i64,
    pub status: OrderStatus,
    pub payment_time: Option<DateTimeWithTimeZone>,
    pub ship_time: Option<DateTimeWithTimeZone>,
    pub complete_time: Option<DateTimeWithTimeZone>,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub remark: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
