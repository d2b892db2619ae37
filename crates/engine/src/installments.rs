//! Installment schedules.
//!
//! The part of a purchase not covered by the down payment is split into
//! `installment_count` equal parts; the last one absorbs the remainder of
//! the integer division so the schedule always sums to the financed amount.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    purchases::Frequency,
    util::{db_enum, parse_uuid},
};

db_enum! {
    pub enum InstallmentStatus("installment status") {
        Pending => "pending",
        Partial => "partial",
        Paid => "paid",
        Overdue => "overdue",
    }
}

impl InstallmentStatus {
    /// Status of an installment given what has been paid and today's date.
    ///
    /// An installment past its due date stays `overdue` until fully paid.
    #[must_use]
    pub fn derive(amount_minor: i64, paid_minor: i64, due_date: NaiveDate, today: NaiveDate) -> Self {
        if paid_minor >= amount_minor {
            Self::Paid
        } else if due_date < today {
            Self::Overdue
        } else if paid_minor > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub id: Uuid,
    pub purchase_id: Uuid,
    /// 1-based position in the schedule.
    pub number: i64,
    pub due_date: NaiveDate,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Installment {
    #[must_use]
    pub fn remaining_minor(&self) -> i64 {
        (self.amount_minor - self.paid_minor).max(0)
    }

    #[must_use]
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.due_date < today && self.remaining_minor() > 0
    }
}

/// Builds the schedule for `financed_minor` over `count` installments.
pub fn build_schedule(
    purchase_id: Uuid,
    financed_minor: i64,
    count: i64,
    frequency: Frequency,
    start_date: NaiveDate,
) -> ResultEngine<Vec<Installment>> {
    if count <= 0 {
        return Err(EngineError::InvalidInput(
            "installment_count must be > 0".to_string(),
        ));
    }
    if financed_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "financed amount must be > 0".to_string(),
        ));
    }
    let base = financed_minor / count;
    let rest = financed_minor % count;

    let mut out = Vec::with_capacity(count as usize);
    for number in 1..=count {
        let due_date = u32::try_from(number)
            .ok()
            .and_then(|n| frequency.due_date(start_date, n))
            .ok_or_else(|| EngineError::InvalidInput("due date out of range".to_string()))?;
        let amount_minor = if number == count { base + rest } else { base };
        // When fewer minor units are financed than there are installments,
        // the leading ones are zero and owe nothing.
        let status = if amount_minor == 0 {
            InstallmentStatus::Paid
        } else {
            InstallmentStatus::Pending
        };
        out.push(Installment {
            id: Uuid::new_v4(),
            purchase_id,
            number,
            due_date,
            amount_minor,
            paid_minor: 0,
            status,
            paid_at: None,
        });
    }
    Ok(out)
}

/// Spreads `amount_minor` over the installments in schedule order.
///
/// Returns the indexes of the installments that changed. Any amount left
/// once every installment is paid is ignored; callers validate the amount
/// against the outstanding balance first.
pub fn allocate(
    installments: &mut [Installment],
    mut amount_minor: i64,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<usize> {
    installments.sort_by_key(|i| i.number);
    let mut touched = Vec::new();
    for (idx, inst) in installments.iter_mut().enumerate() {
        if amount_minor <= 0 {
            break;
        }
        let take = inst.remaining_minor().min(amount_minor);
        if take == 0 {
            continue;
        }
        inst.paid_minor += take;
        amount_minor -= take;
        inst.status = InstallmentStatus::derive(inst.amount_minor, inst.paid_minor, inst.due_date, today);
        if inst.status == InstallmentStatus::Paid {
            inst.paid_at = Some(now);
        }
        touched.push(idx);
    }
    touched
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_installments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub purchase_id: String,
    pub number: i64,
    pub due_date: Date,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub status: String,
    pub paid_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Installment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "installment")?,
            purchase_id: parse_uuid(&model.purchase_id, "purchase")?,
            number: model.number,
            due_date: model.due_date,
            amount_minor: model.amount_minor,
            paid_minor: model.paid_minor,
            status: InstallmentStatus::try_from(model.status.as_str())?,
            paid_at: model.paid_at,
        })
    }
}

impl From<&Installment> for ActiveModel {
    fn from(value: &Installment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            purchase_id: ActiveValue::Set(value.purchase_id.to_string()),
            number: ActiveValue::Set(value.number),
            due_date: ActiveValue::Set(value.due_date),
            amount_minor: ActiveValue::Set(value.amount_minor),
            paid_minor: ActiveValue::Set(value.paid_minor),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            paid_at: ActiveValue::Set(value.paid_at),
        }
    }
}
