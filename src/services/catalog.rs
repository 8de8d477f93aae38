use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    entity::{addresses::Model as AddressModel, products::Model as ProductModel, Addresses, Products},
    error::AppResult,
};

pub async fn find_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<Option<ProductModel>> {
    Ok(Products::find_by_id(product_id).one(conn).await?)
}

pub async fn find_address<C: ConnectionTrait>(
    conn: &C,
    address_id: Uuid,
) -> AppResult<Option<AddressModel>> {
    Ok(Addresses::find_by_id(address_id).one(conn).await?)
}

/// Single-line receiver address as frozen onto an order.
pub fn receiver_address(address: &AddressModel) -> String {
    [
        address.province.as_str(),
        address.city.as_str(),
        address.district.as_str(),
        address.detail_address.as_str(),
    ]
    .iter()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
