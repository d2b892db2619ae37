use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    Installment, InstallmentStatus, Purchase, PurchaseStatus, ResultEngine, businesses,
    installments, purchases::{self, derive_status},
};

use super::{Engine, access::Capability, with_tx};

/// Counts of what a status sweep changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRefresh {
    pub installments_overdue: u64,
    pub purchases_overdue: u64,
    pub purchases_defaulted: u64,
    pub purchases_reactivated: u64,
    pub purchases_completed: u64,
}

impl StatusRefresh {
    fn record(&mut self, to: PurchaseStatus) {
        match to {
            PurchaseStatus::Overdue => self.purchases_overdue += 1,
            PurchaseStatus::Defaulted => self.purchases_defaulted += 1,
            PurchaseStatus::Active => self.purchases_reactivated += 1,
            PurchaseStatus::Completed => self.purchases_completed += 1,
            PurchaseStatus::Cancelled => {}
        }
    }

    fn merge(&mut self, other: StatusRefresh) {
        self.installments_overdue += other.installments_overdue;
        self.purchases_overdue += other.purchases_overdue;
        self.purchases_defaulted += other.purchases_defaulted;
        self.purchases_reactivated += other.purchases_reactivated;
        self.purchases_completed += other.purchases_completed;
    }

    #[must_use]
    pub fn purchases_changed(&self) -> u64 {
        self.purchases_overdue
            + self.purchases_defaulted
            + self.purchases_reactivated
            + self.purchases_completed
    }
}

/// Due date of the oldest installment still unpaid after its due date.
pub(super) fn oldest_past_due(installments: &[Installment], today: NaiveDate) -> Option<NaiveDate> {
    installments
        .iter()
        .filter(|i| i.is_past_due(today))
        .map(|i| i.due_date)
        .min()
}

/// Re-derives the purchase status. Returns the new status when it changed.
pub(super) fn settle_status(
    purchase: &mut Purchase,
    installments: &[Installment],
    today: NaiveDate,
    default_after_days: i64,
) -> Option<PurchaseStatus> {
    let next = derive_status(
        purchase.status,
        purchase.outstanding_minor,
        oldest_past_due(installments, today),
        today,
        default_after_days,
    );
    if next == purchase.status {
        return None;
    }
    purchase.status = next;
    if next == PurchaseStatus::Completed {
        purchase.completed_at = Some(Utc::now());
    }
    Some(next)
}

pub(super) fn open_statuses() -> Vec<&'static str> {
    PurchaseStatus::ALL
        .iter()
        .filter(|s| s.is_open())
        .map(|s| s.as_str())
        .collect()
}

impl Engine {
    pub(super) async fn load_installments(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
    ) -> ResultEngine<Vec<Installment>> {
        installments::Entity::find()
            .filter(installments::Column::PurchaseId.eq(purchase_id.to_string()))
            .order_by_asc(installments::Column::Number)
            .all(db)
            .await?
            .into_iter()
            .map(Installment::try_from)
            .collect()
    }

    async fn refresh_business(
        &self,
        db: &DatabaseTransaction,
        business: &businesses::Model,
        today: NaiveDate,
    ) -> ResultEngine<StatusRefresh> {
        let mut summary = StatusRefresh::default();
        let open = purchases::Entity::find()
            .filter(purchases::Column::BusinessId.eq(business.id.clone()))
            .filter(purchases::Column::Status.is_in(open_statuses()))
            .all(db)
            .await?;

        for model in open {
            let mut schedule = self.load_installments(db, &model.id).await?;
            for installment in &mut schedule {
                let next = InstallmentStatus::derive(
                    installment.amount_minor,
                    installment.paid_minor,
                    installment.due_date,
                    today,
                );
                if next == installment.status {
                    continue;
                }
                if next == InstallmentStatus::Overdue {
                    summary.installments_overdue += 1;
                }
                installment.status = next;
                installments::ActiveModel::from(&*installment).update(db).await?;
            }

            let mut purchase = Purchase::try_from(model)?;
            if let Some(next) =
                settle_status(&mut purchase, &schedule, today, business.default_after_days)
            {
                summary.record(next);
                purchases::ActiveModel::from(&purchase).update(db).await?;
            }
        }
        Ok(summary)
    }

    /// Marks past-due installments overdue and re-derives the status of
    /// every open purchase of the business as of `today`.
    pub async fn refresh_statuses(
        &self,
        slug: &str,
        today: NaiveDate,
        user_id: &str,
    ) -> ResultEngine<StatusRefresh> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let summary = self.refresh_business(&db_tx, &business, today).await?;
            tracing::info!(
                business = %business.slug,
                overdue = summary.purchases_overdue,
                defaulted = summary.purchases_defaulted,
                "statuses refreshed"
            );
            Ok(summary)
        })
    }

    /// [`Engine::refresh_statuses`] for every active business, one DB
    /// transaction per business.
    pub async fn refresh_all_statuses(&self, today: NaiveDate) -> ResultEngine<StatusRefresh> {
        let active = with_tx!(self, |db_tx| {
            businesses::Entity::find()
                .filter(businesses::Column::Active.eq(true))
                .all(&db_tx)
                .await
                .map_err(crate::EngineError::from)
        })?;

        let mut total = StatusRefresh::default();
        for business in active {
            let summary = with_tx!(self, |db_tx| {
                self.refresh_business(&db_tx, &business, today).await
            })?;
            total.merge(summary);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn installment(number: i64, due: NaiveDate, amount: i64, paid: i64) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            purchase_id: Uuid::new_v4(),
            number,
            due_date: due,
            amount_minor: amount,
            paid_minor: paid,
            status: InstallmentStatus::Pending,
            paid_at: None,
        }
    }

    #[test]
    fn oldest_past_due_skips_paid_and_future_installments() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let schedule = vec![
            installment(1, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(), 100, 100),
            installment(2, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(), 100, 20),
            installment(3, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), 100, 0),
        ];
        assert_eq!(
            oldest_past_due(&schedule, today),
            NaiveDate::from_ymd_opt(2026, 5, 1)
        );
    }
}
