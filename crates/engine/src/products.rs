//! Products sold by a shop, with their on-hand stock.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub cost_minor: i64,
    pub stock_quantity: i64,
    pub reorder_level: i64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// `true` when the stock reached the reorder threshold.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        !self.archived && self.stock_quantity <= self.reorder_level
    }
}

/// SKU assigned when the user leaves it empty.
pub(crate) fn generated_sku(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("P-{}", simple[..8].to_ascii_uppercase())
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub shop_id: String,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub cost_minor: i64,
    pub stock_quantity: i64,
    pub reorder_level: i64,
    pub archived: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "product")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            shop_id: parse_uuid(&model.shop_id, "shop")?,
            name: model.name,
            sku: model.sku,
            description: model.description,
            price_minor: model.price_minor,
            cost_minor: model.cost_minor,
            stock_quantity: model.stock_quantity,
            reorder_level: model.reorder_level,
            archived: model.archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Product> for ActiveModel {
    fn from(value: &Product) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            shop_id: ActiveValue::Set(value.shop_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            sku: ActiveValue::Set(value.sku.clone()),
            description: ActiveValue::Set(value.description.clone()),
            price_minor: ActiveValue::Set(value.price_minor),
            cost_minor: ActiveValue::Set(value.cost_minor),
            stock_quantity: ActiveValue::Set(value.stock_quantity),
            reorder_level: ActiveValue::Set(value.reorder_level),
            archived: ActiveValue::Set(value.archived),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_sku_uses_id_prefix() {
        let id = Uuid::parse_str("6a8416ed-b8e6-4732-a591-bf55da9687e7").unwrap();
        assert_eq!(generated_sku(id), "P-6A8416ED");
    }
}
