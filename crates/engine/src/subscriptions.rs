//! Platform subscriptions and plan limits.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{db_enum, parse_uuid},
};

db_enum! {
    pub enum Plan("plan") {
        Trial => "trial",
        Basic => "basic",
        Standard => "standard",
        Premium => "premium",
    }
}

db_enum! {
    pub enum SubscriptionStatus("subscription status") {
        Active => "active",
        Expired => "expired",
        Cancelled => "cancelled",
    }
}

/// Per-plan quotas. `None` means unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub shops: Option<u64>,
    pub products: Option<u64>,
    pub collectors: Option<u64>,
}

impl Plan {
    #[must_use]
    pub fn limits(self) -> PlanLimits {
        let (shops, products, collectors) = match self {
            Self::Trial => (Some(1), Some(50), Some(1)),
            Self::Basic => (Some(1), Some(200), Some(2)),
            Self::Standard => (Some(3), Some(1_000), Some(10)),
            Self::Premium => (None, None, None),
        };
        PlanLimits {
            shops,
            products,
            collectors,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub business_id: Uuid,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub amount_minor: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    #[must_use]
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.starts_at <= now && now < self.ends_at
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub plan: String,
    pub status: String,
    pub starts_at: DateTimeUtc,
    pub ends_at: DateTimeUtc,
    pub amount_minor: i64,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Subscription {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "subscription")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            plan: Plan::try_from(model.plan.as_str())?,
            status: SubscriptionStatus::try_from(model.status.as_str())?,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            amount_minor: model.amount_minor,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

impl From<&Subscription> for ActiveModel {
    fn from(value: &Subscription) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            plan: ActiveValue::Set(value.plan.as_str().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            starts_at: ActiveValue::Set(value.starts_at),
            ends_at: ActiveValue::Set(value.ends_at),
            amount_minor: ActiveValue::Set(value.amount_minor),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn premium_is_unlimited() {
        let limits = Plan::Premium.limits();
        assert_eq!(limits.shops, None);
        assert_eq!(Plan::Trial.limits().products, Some(50));
        assert_eq!(Plan::Standard.limits().shops, Some(3));
    }

    #[test]
    fn current_requires_active_and_in_window() {
        let now = Utc::now();
        let mut sub = Subscription {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            plan: Plan::Basic,
            status: SubscriptionStatus::Active,
            starts_at: now - TimeDelta::days(1),
            ends_at: now + TimeDelta::days(1),
            amount_minor: 0,
            created_by: "root".to_string(),
            created_at: now,
        };
        assert!(sub.is_current(now));
        assert!(!sub.is_current(now + TimeDelta::days(2)));
        sub.status = SubscriptionStatus::Cancelled;
        assert!(!sub.is_current(now));
    }
}
