//! Lines of a purchase, priced at sale time.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    /// Product name when sold; later renames do not rewrite history.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for PurchaseItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "purchase item")?,
            purchase_id: parse_uuid(&model.purchase_id, "purchase")?,
            product_id: parse_uuid(&model.product_id, "product")?,
            product_name: model.product_name,
            quantity: model.quantity,
            unit_price_minor: model.unit_price_minor,
            line_total_minor: model.line_total_minor,
        })
    }
}

impl From<&PurchaseItem> for ActiveModel {
    fn from(value: &PurchaseItem) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            purchase_id: ActiveValue::Set(value.purchase_id.to_string()),
            product_id: ActiveValue::Set(value.product_id.to_string()),
            product_name: ActiveValue::Set(value.product_name.clone()),
            quantity: ActiveValue::Set(value.quantity),
            unit_price_minor: ActiveValue::Set(value.unit_price_minor),
            line_total_minor: ActiveValue::Set(value.line_total_minor),
        }
    }
}
