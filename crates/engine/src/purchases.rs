//! Hire-purchase agreements.
//!
//! A [`Purchase`] records what a customer bought, how it is paid for and how
//! much is still owed. Money columns always satisfy
//! `total_paid_minor + outstanding_minor == total_price_minor`.

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{db_enum, parse_opt_uuid, parse_uuid},
};

/// Longest schedule accepted for layaway and credit purchases.
pub const MAX_INSTALLMENTS: i64 = 60;

db_enum! {
    pub enum PurchaseType("purchase type") {
        /// Paid in full at the counter.
        Cash => "cash",
        /// Paid in installments; goods stay in the shop until paid off.
        Layaway => "layaway",
        /// Paid in installments; goods leave with the customer.
        Credit => "credit",
    }
}

db_enum! {
    pub enum PurchaseStatus("purchase status") {
        Active => "active",
        Completed => "completed",
        Overdue => "overdue",
        Defaulted => "defaulted",
        Cancelled => "cancelled",
    }
}

db_enum! {
    pub enum Frequency("installment frequency") {
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
    }
}

impl PurchaseStatus {
    /// Open purchases still accept payments.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Overdue | Self::Defaulted)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Frequency {
    /// Due date of the `number`-th installment (1-based) of a schedule
    /// starting on `start`.
    ///
    /// Monthly schedules clamp to the last day of shorter months.
    #[must_use]
    pub fn due_date(self, start: NaiveDate, number: u32) -> Option<NaiveDate> {
        match self {
            Self::Weekly => start.checked_add_signed(TimeDelta::days(7 * i64::from(number))),
            Self::Biweekly => start.checked_add_signed(TimeDelta::days(14 * i64::from(number))),
            Self::Monthly => start.checked_add_months(Months::new(number)),
        }
    }
}

/// Re-derives the status of a purchase from its balances and schedule.
///
/// `oldest_past_due` is the due date of the oldest installment that is not
/// fully paid and whose due date is before `today`.
///
/// Terminal statuses never change here; a defaulted purchase stays defaulted
/// until it is paid off.
#[must_use]
pub fn derive_status(
    current: PurchaseStatus,
    outstanding_minor: i64,
    oldest_past_due: Option<NaiveDate>,
    today: NaiveDate,
    default_after_days: i64,
) -> PurchaseStatus {
    if current.is_terminal() {
        return current;
    }
    if outstanding_minor <= 0 {
        return PurchaseStatus::Completed;
    }
    match oldest_past_due {
        Some(due) if (today - due).num_days() > default_after_days => PurchaseStatus::Defaulted,
        _ if current == PurchaseStatus::Defaulted => PurchaseStatus::Defaulted,
        Some(_) => PurchaseStatus::Overdue,
        None => PurchaseStatus::Active,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub business_id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    pub collector_id: Option<Uuid>,
    pub purchase_type: PurchaseType,
    pub status: PurchaseStatus,
    pub total_price_minor: i64,
    pub down_payment_minor: i64,
    pub total_paid_minor: i64,
    pub outstanding_minor: i64,
    pub installment_count: i64,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

impl Purchase {
    /// Applies a confirmed payment to the running balances.
    pub(crate) fn apply_payment(&mut self, amount_minor: i64) -> ResultEngine<()> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if amount_minor > self.outstanding_minor {
            return Err(EngineError::InvalidAmount(format!(
                "payment of {amount_minor} exceeds outstanding balance {}",
                self.outstanding_minor
            )));
        }
        self.total_paid_minor += amount_minor;
        self.outstanding_minor -= amount_minor;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub collector_id: Option<String>,
    pub purchase_type: String,
    pub status: String,
    pub total_price_minor: i64,
    pub down_payment_minor: i64,
    pub total_paid_minor: i64,
    pub outstanding_minor: i64,
    pub installment_count: i64,
    pub frequency: String,
    pub start_date: Date,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub cancel_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Purchase {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "purchase")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            shop_id: parse_uuid(&model.shop_id, "shop")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            collector_id: parse_opt_uuid(model.collector_id.as_deref(), "collector")?,
            purchase_type: PurchaseType::try_from(model.purchase_type.as_str())?,
            status: PurchaseStatus::try_from(model.status.as_str())?,
            total_price_minor: model.total_price_minor,
            down_payment_minor: model.down_payment_minor,
            total_paid_minor: model.total_paid_minor,
            outstanding_minor: model.outstanding_minor,
            installment_count: model.installment_count,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
            completed_at: model.completed_at,
            cancelled_at: model.cancelled_at,
            cancel_reason: model.cancel_reason,
        })
    }
}

impl From<&Purchase> for ActiveModel {
    fn from(value: &Purchase) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            shop_id: ActiveValue::Set(value.shop_id.to_string()),
            customer_id: ActiveValue::Set(value.customer_id.to_string()),
            collector_id: ActiveValue::Set(value.collector_id.map(|id| id.to_string())),
            purchase_type: ActiveValue::Set(value.purchase_type.as_str().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            total_price_minor: ActiveValue::Set(value.total_price_minor),
            down_payment_minor: ActiveValue::Set(value.down_payment_minor),
            total_paid_minor: ActiveValue::Set(value.total_paid_minor),
            outstanding_minor: ActiveValue::Set(value.outstanding_minor),
            installment_count: ActiveValue::Set(value.installment_count),
            frequency: ActiveValue::Set(value.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(value.start_date),
            note: ActiveValue::Set(value.note.clone()),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
            completed_at: ActiveValue::Set(value.completed_at),
            cancelled_at: ActiveValue::Set(value.cancelled_at),
            cancel_reason: ActiveValue::Set(value.cancel_reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_due_dates_clamp_to_month_end() {
        let start = date(2026, 1, 31);
        assert_eq!(Frequency::Monthly.due_date(start, 1), Some(date(2026, 2, 28)));
        assert_eq!(Frequency::Monthly.due_date(start, 2), Some(date(2026, 3, 31)));
        assert_eq!(Frequency::Weekly.due_date(start, 2), Some(date(2026, 2, 14)));
        assert_eq!(Frequency::Biweekly.due_date(start, 1), Some(date(2026, 2, 14)));
    }

    #[test]
    fn paid_off_purchase_completes() {
        let today = date(2026, 5, 1);
        let status = derive_status(PurchaseStatus::Overdue, 0, Some(date(2026, 4, 1)), today, 90);
        assert_eq!(status, PurchaseStatus::Completed);
    }

    #[test]
    fn past_due_marks_overdue_then_defaulted() {
        let today = date(2026, 5, 1);
        assert_eq!(
            derive_status(PurchaseStatus::Active, 100, Some(date(2026, 4, 30)), today, 90),
            PurchaseStatus::Overdue
        );
        assert_eq!(
            derive_status(PurchaseStatus::Overdue, 100, Some(date(2026, 1, 1)), today, 90),
            PurchaseStatus::Defaulted
        );
    }

    #[test]
    fn overdue_returns_to_active_but_default_is_sticky() {
        let today = date(2026, 5, 1);
        assert_eq!(
            derive_status(PurchaseStatus::Overdue, 100, None, today, 90),
            PurchaseStatus::Active
        );
        assert_eq!(
            derive_status(PurchaseStatus::Defaulted, 100, None, today, 90),
            PurchaseStatus::Defaulted
        );
    }

    #[test]
    fn terminal_statuses_do_not_move() {
        let today = date(2026, 5, 1);
        assert_eq!(
            derive_status(PurchaseStatus::Cancelled, 100, Some(date(2025, 1, 1)), today, 90),
            PurchaseStatus::Cancelled
        );
    }

    #[test]
    fn apply_payment_keeps_the_identity() {
        let mut purchase = Purchase {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            collector_id: None,
            purchase_type: PurchaseType::Credit,
            status: PurchaseStatus::Active,
            total_price_minor: 10_000,
            down_payment_minor: 1_000,
            total_paid_minor: 1_000,
            outstanding_minor: 9_000,
            installment_count: 3,
            frequency: Frequency::Monthly,
            start_date: date(2026, 1, 1),
            note: None,
            created_by: "alice".to_string(),
            created_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
        };
        purchase.apply_payment(4_000).unwrap();
        assert_eq!(purchase.total_paid_minor + purchase.outstanding_minor, 10_000);
        assert!(purchase.apply_payment(5_001).is_err());
        assert!(purchase.apply_payment(0).is_err());
    }
}
