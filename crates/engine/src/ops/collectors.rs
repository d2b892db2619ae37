use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DebtCollector, EngineError, PaymentStatus, PurchaseStatus, ResultEngine, debt_collectors,
    payments, purchases, util::parse_uuid,
};

use super::{
    Engine, PurchaseListFilter, PurchaseSummary, access::Capability, normalize_optional_text,
    normalize_required_name, statuses::open_statuses, subscriptions::Quota, with_tx,
};

/// Collection performance of one debt collector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorReport {
    pub collector: DebtCollector,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub assigned_purchases: u64,
    pub open_purchases: u64,
    /// Outstanding balance of open assigned purchases.
    pub portfolio_outstanding_minor: i64,
    pub collected_minor: i64,
    pub collected_count: u64,
    pub pending_minor: i64,
    pub pending_count: u64,
    pub rejected_count: u64,
}

impl Engine {
    async fn count_active_collectors(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
    ) -> ResultEngine<u64> {
        Ok(debt_collectors::Entity::find()
            .filter(debt_collectors::Column::BusinessId.eq(business_id.to_string()))
            .filter(debt_collectors::Column::Active.eq(true))
            .count(db)
            .await?)
    }

    /// Registers an existing user as a debt collector of the business.
    pub async fn create_collector(
        &self,
        slug: &str,
        username: &str,
        name: &str,
        phone: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<DebtCollector> {
        let name = normalize_required_name(name, "collector")?;
        let username = username.trim().to_string();
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            self.require_user(&db_tx, &username).await?;
            let existing = debt_collectors::Entity::find()
                .filter(debt_collectors::Column::BusinessId.eq(business.id.clone()))
                .filter(debt_collectors::Column::UserId.eq(username.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(username));
            }
            let used = self.count_active_collectors(&db_tx, &business.id).await?;
            self.require_quota(&db_tx, &business.id, Quota::Collectors, used)
                .await?;

            let collector = DebtCollector {
                id: Uuid::new_v4(),
                business_id: parse_uuid(&business.id, "business")?,
                user_id: username,
                name,
                phone: normalize_optional_text(phone),
                active: true,
                created_at: Utc::now(),
            };
            debt_collectors::ActiveModel::from(&collector)
                .insert(&db_tx)
                .await?;
            tracing::info!(business = %business.slug, collector = %collector.user_id, "collector created");
            Ok(collector)
        })
    }

    pub async fn list_collectors(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<DebtCollector>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Reports)
                .await?;
            debt_collectors::Entity::find()
                .filter(debt_collectors::Column::BusinessId.eq(business.id))
                .order_by_asc(debt_collectors::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(DebtCollector::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Inactive collectors keep their history but lose collector rights.
    pub async fn set_collector_active(
        &self,
        slug: &str,
        collector_id: Uuid,
        active: bool,
        user_id: &str,
    ) -> ResultEngine<DebtCollector> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let model = self
                .require_collector(&db_tx, &business.id, collector_id)
                .await?;
            if model.active == active {
                return DebtCollector::try_from(model);
            }
            if active {
                let used = self.count_active_collectors(&db_tx, &business.id).await?;
                self.require_quota(&db_tx, &business.id, Quota::Collectors, used)
                    .await?;
            }
            let mut row: debt_collectors::ActiveModel = model.into();
            row.active = ActiveValue::Set(active);
            DebtCollector::try_from(row.update(&db_tx).await?)
        })
    }

    /// Open purchases assigned to the calling debt collector.
    pub async fn collector_purchases(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<PurchaseSummary>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::CollectPayment)
                .await?;
            if !access.is_collector() {
                return Err(EngineError::Forbidden(
                    "only debt collectors have assigned purchases".to_string(),
                ));
            }
            let rows = self
                .purchase_query(&db_tx, &business.id, &access, &PurchaseListFilter::default())
                .await?
                .filter(purchases::Column::Status.is_in(open_statuses()))
                .all(&db_tx)
                .await?;
            self.summarize(&db_tx, rows).await
        })
    }

    /// Collection report of one collector. Collectors may read their own.
    ///
    /// Payment figures cover payments recorded in `[from, to)`.
    pub async fn collector_report(
        &self,
        slug: &str,
        collector_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        user_id: &str,
    ) -> ResultEngine<CollectorReport> {
        if let (Some(from), Some(to)) = (from, to)
            && from >= to
        {
            return Err(EngineError::InvalidInput(
                "invalid range: from must be < to".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            if !access.allows(Capability::Reports) && access.collector_id != Some(collector_id) {
                return Err(EngineError::Forbidden(
                    "collector reports are restricted".to_string(),
                ));
            }
            let collector = self
                .require_collector(&db_tx, &business.id, collector_id)
                .await?;

            let assigned = purchases::Entity::find()
                .filter(purchases::Column::BusinessId.eq(business.id.clone()))
                .filter(purchases::Column::CollectorId.eq(collector.id.clone()))
                .all(&db_tx)
                .await?;
            let mut open_purchases = 0;
            let mut portfolio_outstanding_minor = 0;
            for purchase in &assigned {
                if PurchaseStatus::try_from(purchase.status.as_str())?.is_open() {
                    open_purchases += 1;
                    portfolio_outstanding_minor += purchase.outstanding_minor;
                }
            }

            let mut query = payments::Entity::find()
                .filter(payments::Column::BusinessId.eq(business.id.clone()))
                .filter(payments::Column::CollectorId.eq(collector.id.clone()));
            if let Some(from) = from {
                query = query.filter(payments::Column::CreatedAt.gte(from));
            }
            if let Some(to) = to {
                query = query.filter(payments::Column::CreatedAt.lt(to));
            }

            let mut report = CollectorReport {
                collector: DebtCollector::try_from(collector)?,
                from,
                to,
                assigned_purchases: assigned.len() as u64,
                open_purchases,
                portfolio_outstanding_minor,
                collected_minor: 0,
                collected_count: 0,
                pending_minor: 0,
                pending_count: 0,
                rejected_count: 0,
            };
            for payment in query.all(&db_tx).await? {
                match PaymentStatus::try_from(payment.status.as_str())? {
                    PaymentStatus::Confirmed => {
                        report.collected_minor += payment.amount_minor;
                        report.collected_count += 1;
                    }
                    PaymentStatus::Pending => {
                        report.pending_minor += payment.amount_minor;
                        report.pending_count += 1;
                    }
                    PaymentStatus::Rejected => report.rejected_count += 1,
                }
            }
            Ok(report)
        })
    }
}
