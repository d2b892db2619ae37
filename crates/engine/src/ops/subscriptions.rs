use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Plan, PlanLimits, ResultEngine, Subscription, SubscriptionStatus, subscriptions,
    util::parse_uuid,
};

use super::{Engine, access::Capability, require_non_negative, with_tx};

/// Resources capped by the plan.
#[derive(Clone, Copy, Debug)]
pub(super) enum Quota {
    Shops,
    Products,
    Collectors,
}

impl Quota {
    fn limit(self, limits: PlanLimits) -> Option<u64> {
        match self {
            Self::Shops => limits.shops,
            Self::Products => limits.products,
            Self::Collectors => limits.collectors,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Shops => "shops",
            Self::Products => "products",
            Self::Collectors => "collectors",
        }
    }
}

impl Engine {
    pub(super) async fn current_subscription_model(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<subscriptions::Model>> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::BusinessId.eq(business_id.to_string()))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::StartsAt.lte(now))
            .filter(subscriptions::Column::EndsAt.gt(now))
            .order_by_desc(subscriptions::Column::EndsAt)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// The plan of the current subscription, or `SubscriptionInactive`.
    pub(super) async fn require_current_plan(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
    ) -> ResultEngine<Plan> {
        let model = self
            .current_subscription_model(db, business_id, Utc::now())
            .await?
            .ok_or_else(|| {
                EngineError::SubscriptionInactive("no current subscription".to_string())
            })?;
        Plan::try_from(model.plan.as_str())
    }

    /// Fails with `PlanLimitReached` when `used` already fills the quota.
    pub(super) async fn require_quota(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        quota: Quota,
        used: u64,
    ) -> ResultEngine<()> {
        let plan = self.require_current_plan(db, business_id).await?;
        if let Some(limit) = quota.limit(plan.limits())
            && used >= limit
        {
            return Err(EngineError::PlanLimitReached(format!(
                "{plan} plan allows {limit} {}",
                quota.label()
            )));
        }
        Ok(())
    }

    /// The subscription in force now, if any.
    pub async fn current_subscription(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<Option<Subscription>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            self.current_subscription_model(&db_tx, &business.id, Utc::now())
                .await?
                .map(Subscription::try_from)
                .transpose()
        })
    }

    /// Subscription history of a business, newest first.
    pub async fn list_subscriptions(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Subscription>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let rows = subscriptions::Entity::find()
                .filter(subscriptions::Column::BusinessId.eq(business.id))
                .order_by_desc(subscriptions::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Subscription::try_from).collect()
        })
    }

    /// Starts a new subscription now, cancelling the active one (platform
    /// admin).
    pub async fn set_subscription(
        &self,
        slug: &str,
        plan: Plan,
        months: u32,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<Subscription> {
        if !(1..=36).contains(&months) {
            return Err(EngineError::InvalidInput(
                "months must be between 1 and 36".to_string(),
            ));
        }
        require_non_negative(amount_minor, "amount_minor")?;

        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let business = self.find_business_by_slug(&db_tx, slug).await?;
            subscriptions::Entity::update_many()
                .col_expr(
                    subscriptions::Column::Status,
                    Expr::value(SubscriptionStatus::Cancelled.as_str()),
                )
                .filter(subscriptions::Column::BusinessId.eq(business.id.clone()))
                .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
                .exec(&db_tx)
                .await?;

            let now = Utc::now();
            let ends_at = now
                .checked_add_months(Months::new(months))
                .ok_or_else(|| EngineError::InvalidInput("months out of range".to_string()))?;
            let subscription = Subscription {
                id: Uuid::new_v4(),
                business_id: parse_uuid(&business.id, "business")?,
                plan,
                status: SubscriptionStatus::Active,
                starts_at: now,
                ends_at,
                amount_minor,
                created_by: user_id.to_string(),
                created_at: now,
            };
            subscriptions::ActiveModel::from(&subscription)
                .insert(&db_tx)
                .await?;
            tracing::info!(business = %business.slug, %plan, months, "subscription set");
            Ok(subscription)
        })
    }

    /// Cancels the current subscription (platform admin).
    pub async fn cancel_subscription(&self, slug: &str, user_id: &str) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let business = self.find_business_by_slug(&db_tx, slug).await?;
            let model = self
                .current_subscription_model(&db_tx, &business.id, Utc::now())
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("subscription not exists".to_string()))?;
            let mut active: subscriptions::ActiveModel = model.into();
            active.status = ActiveValue::Set(SubscriptionStatus::Cancelled.as_str().to_string());
            let model = active.update(&db_tx).await?;
            tracing::info!(business = %business.slug, "subscription cancelled");
            Subscription::try_from(model)
        })
    }

    /// Marks every active subscription that ended before `now` as expired.
    /// Returns how many rows changed.
    pub async fn expire_subscriptions(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let res = subscriptions::Entity::update_many()
                .col_expr(
                    subscriptions::Column::Status,
                    Expr::value(SubscriptionStatus::Expired.as_str()),
                )
                .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
                .filter(subscriptions::Column::EndsAt.lte(now))
                .exec(&db_tx)
                .await?;
            Ok(res.rows_affected)
        })
    }
}
