//! Invoices, receipts and waybills.
//!
//! Numbers are sequential per business and kind: `INV-000001`,
//! `RCT-000001`, `WB-000001`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{db_enum, parse_opt_uuid, parse_uuid},
};

db_enum! {
    pub enum DocumentKind("document kind") {
        Invoice => "invoice",
        Receipt => "receipt",
        Waybill => "waybill",
    }
}

impl DocumentKind {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Invoice => "INV",
            Self::Receipt => "RCT",
            Self::Waybill => "WB",
        }
    }

    #[must_use]
    pub fn number(self, sequence: i64) -> String {
        format!("{}-{sequence:06}", self.prefix())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub business_id: Uuid,
    pub purchase_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub kind: DocumentKind,
    pub sequence: i64,
    pub number: String,
    pub amount_minor: i64,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub purchase_id: String,
    pub payment_id: Option<String>,
    pub kind: String,
    pub sequence: i64,
    pub number: String,
    pub amount_minor: i64,
    pub issued_by: String,
    pub issued_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Document {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "document")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            purchase_id: parse_uuid(&model.purchase_id, "purchase")?,
            payment_id: parse_opt_uuid(model.payment_id.as_deref(), "payment")?,
            kind: DocumentKind::try_from(model.kind.as_str())?,
            sequence: model.sequence,
            number: model.number,
            amount_minor: model.amount_minor,
            issued_by: model.issued_by,
            issued_at: model.issued_at,
        })
    }
}

impl From<&Document> for ActiveModel {
    fn from(value: &Document) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            purchase_id: ActiveValue::Set(value.purchase_id.to_string()),
            payment_id: ActiveValue::Set(value.payment_id.map(|id| id.to_string())),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            sequence: ActiveValue::Set(value.sequence),
            number: ActiveValue::Set(value.number.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            issued_by: ActiveValue::Set(value.issued_by.clone()),
            issued_at: ActiveValue::Set(value.issued_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(DocumentKind::Invoice.number(1), "INV-000001");
        assert_eq!(DocumentKind::Receipt.number(42), "RCT-000042");
        assert_eq!(DocumentKind::Waybill.number(1_234_567), "WB-1234567");
    }
}
