//! Payments against a purchase.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{db_enum, parse_opt_uuid, parse_uuid},
};

db_enum! {
    pub enum PaymentMethod("payment method") {
        Cash => "cash",
        MobileMoney => "mobile_money",
        BankTransfer => "bank_transfer",
        Card => "card",
        /// Debits the customer's wallet.
        Wallet => "wallet",
    }
}

db_enum! {
    pub enum PaymentStatus("payment status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Rejected => "rejected",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub shop_id: Uuid,
    pub purchase_id: Uuid,
    pub customer_id: Uuid,
    pub amount_minor: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub recorded_by: String,
    pub collector_id: Option<Uuid>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub shop_id: String,
    pub purchase_id: String,
    pub customer_id: String,
    pub amount_minor: i64,
    pub method: String,
    pub status: String,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub recorded_by: String,
    pub collector_id: Option<String>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTimeUtc>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            shop_id: parse_uuid(&model.shop_id, "shop")?,
            purchase_id: parse_uuid(&model.purchase_id, "purchase")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            amount_minor: model.amount_minor,
            method: PaymentMethod::try_from(model.method.as_str())?,
            status: PaymentStatus::try_from(model.status.as_str())?,
            reference: model.reference,
            note: model.note,
            recorded_by: model.recorded_by,
            collector_id: parse_opt_uuid(model.collector_id.as_deref(), "collector")?,
            confirmed_by: model.confirmed_by,
            confirmed_at: model.confirmed_at,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at,
        })
    }
}

impl From<&Payment> for ActiveModel {
    fn from(value: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            shop_id: ActiveValue::Set(value.shop_id.to_string()),
            purchase_id: ActiveValue::Set(value.purchase_id.to_string()),
            customer_id: ActiveValue::Set(value.customer_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            method: ActiveValue::Set(value.method.as_str().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            reference: ActiveValue::Set(value.reference.clone()),
            note: ActiveValue::Set(value.note.clone()),
            recorded_by: ActiveValue::Set(value.recorded_by.clone()),
            collector_id: ActiveValue::Set(value.collector_id.map(|id| id.to_string())),
            confirmed_by: ActiveValue::Set(value.confirmed_by.clone()),
            confirmed_at: ActiveValue::Set(value.confirmed_at),
            rejection_reason: ActiveValue::Set(value.rejection_reason.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_use_snake_case_labels() {
        assert_eq!(PaymentMethod::MobileMoney.as_str(), "mobile_money");
        assert_eq!(
            PaymentMethod::try_from("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::MobileMoney).unwrap(),
            "\"mobile_money\""
        );
        assert!(PaymentMethod::try_from("cheque").is_err());
    }
}
