//! Stock movements.
//!
//! Every change to `products.stock_quantity` is recorded here, so the
//! on-hand quantity always equals the sum of `change` for the product.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{db_enum, parse_opt_uuid, parse_uuid},
};

db_enum! {
    pub enum StockReason("stock reason") {
        Restock => "restock",
        Sale => "sale",
        Adjustment => "adjustment",
        Return => "return",
        Cancellation => "cancellation",
    }
}

impl StockReason {
    /// Reasons a user may pick for a manual adjustment. Sales and
    /// cancellations are written by the purchase workflow.
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Restock | Self::Adjustment | Self::Return)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub change: i64,
    pub quantity_after: i64,
    pub reason: StockReason,
    pub purchase_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        product_id: Uuid,
        change: i64,
        quantity_after: i64,
        reason: StockReason,
        created_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            change,
            quantity_after,
            reason,
            purchase_id: None,
            note: None,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_id: String,
    pub change: i64,
    pub quantity_after: i64,
    pub reason: String,
    pub purchase_id: Option<String>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for StockMovement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "stock movement")?,
            product_id: parse_uuid(&model.product_id, "product")?,
            change: model.change,
            quantity_after: model.quantity_after,
            reason: StockReason::try_from(model.reason.as_str())?,
            purchase_id: parse_opt_uuid(model.purchase_id.as_deref(), "purchase")?,
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

impl From<&StockMovement> for ActiveModel {
    fn from(value: &StockMovement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            product_id: ActiveValue::Set(value.product_id.to_string()),
            change: ActiveValue::Set(value.change),
            quantity_after: ActiveValue::Set(value.quantity_after),
            reason: ActiveValue::Set(value.reason.as_str().to_string()),
            purchase_id: ActiveValue::Set(value.purchase_id.map(|id| id.to_string())),
            note: ActiveValue::Set(value.note.clone()),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
