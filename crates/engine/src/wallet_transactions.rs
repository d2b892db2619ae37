//! Customer wallet ledger.
//!
//! Deposits start `pending` and move the balance only once confirmed. The
//! other kinds are written `confirmed`. For a confirmed row
//! `balance_after = balance_before + signed(amount)`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{db_enum, parse_opt_uuid, parse_uuid},
};

db_enum! {
    pub enum WalletTxKind("wallet transaction kind") {
        Deposit => "deposit",
        Withdrawal => "withdrawal",
        /// Wallet funds spent on a purchase.
        Payment => "payment",
        /// Money returned from a cancelled purchase.
        Refund => "refund",
    }
}

db_enum! {
    pub enum WalletTxStatus("wallet transaction status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Rejected => "rejected",
    }
}

impl WalletTxKind {
    /// Balance effect of `amount_minor` for this kind.
    #[must_use]
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Deposit | Self::Refund => amount_minor,
            Self::Withdrawal | Self::Payment => -amount_minor,
        }
    }

    /// Balance after applying `amount_minor` of this kind to `balance_minor`.
    pub fn apply(self, balance_minor: i64, amount_minor: i64) -> ResultEngine<i64> {
        Ok(Money::new(balance_minor)
            .shifted(self.signed(amount_minor))?
            .minor())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub kind: WalletTxKind,
    pub amount_minor: i64,
    pub status: WalletTxStatus,
    pub balance_before_minor: Option<i64>,
    pub balance_after_minor: Option<i64>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub purchase_id: Option<Uuid>,
    pub recorded_by: String,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// A row that is confirmed on creation against `balance_before`.
    pub(crate) fn confirmed(
        business_id: Uuid,
        customer_id: Uuid,
        kind: WalletTxKind,
        amount_minor: i64,
        balance_before: i64,
        recorded_by: &str,
    ) -> ResultEngine<Self> {
        let balance_after = kind.apply(balance_before, amount_minor)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            business_id,
            customer_id,
            kind,
            amount_minor,
            status: WalletTxStatus::Confirmed,
            balance_before_minor: Some(balance_before),
            balance_after_minor: Some(balance_after),
            reference: None,
            note: None,
            purchase_id: None,
            recorded_by: recorded_by.to_string(),
            confirmed_by: Some(recorded_by.to_string()),
            confirmed_at: Some(now),
            created_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub customer_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub status: String,
    pub balance_before_minor: Option<i64>,
    pub balance_after_minor: Option<i64>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub purchase_id: Option<String>,
    pub recorded_by: String,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for WalletTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet transaction")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            kind: WalletTxKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            status: WalletTxStatus::try_from(model.status.as_str())?,
            balance_before_minor: model.balance_before_minor,
            balance_after_minor: model.balance_after_minor,
            reference: model.reference,
            note: model.note,
            purchase_id: parse_opt_uuid(model.purchase_id.as_deref(), "purchase")?,
            recorded_by: model.recorded_by,
            confirmed_by: model.confirmed_by,
            confirmed_at: model.confirmed_at,
            created_at: model.created_at,
        })
    }
}

impl From<&WalletTransaction> for ActiveModel {
    fn from(value: &WalletTransaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            customer_id: ActiveValue::Set(value.customer_id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            balance_before_minor: ActiveValue::Set(value.balance_before_minor),
            balance_after_minor: ActiveValue::Set(value.balance_after_minor),
            reference: ActiveValue::Set(value.reference.clone()),
            note: ActiveValue::Set(value.note.clone()),
            purchase_id: ActiveValue::Set(value.purchase_id.map(|id| id.to_string())),
            recorded_by: ActiveValue::Set(value.recorded_by.clone()),
            confirmed_by: ActiveValue::Set(value.confirmed_by.clone()),
            confirmed_at: ActiveValue::Set(value.confirmed_at),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
