use std::collections::BTreeSet;

use chrono::{TimeDelta, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Business, BusinessPatch, EngineError, MemberRole, NewBusinessCmd, Plan, ResultEngine,
    Subscription, SubscriptionStatus, businesses, debt_collectors, memberships, subscriptions,
    util::slugify,
};

use super::{
    Access, Engine, access::Capability, normalize_optional_text, normalize_required_name,
    with_tx,
};

/// Picks `base`, `base-2`, `base-3`… whichever is free among `taken`.
pub(super) fn first_free_slug(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn validate_default_after_days(days: i64) -> ResultEngine<()> {
    if !(1..=3650).contains(&days) {
        return Err(EngineError::InvalidInput(
            "default_after_days must be between 1 and 3650".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    async fn taken_business_slugs(
        &self,
        db: &DatabaseTransaction,
        base: &str,
    ) -> ResultEngine<BTreeSet<String>> {
        let rows = businesses::Entity::find()
            .filter(businesses::Column::Slug.starts_with(base))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|b| b.slug).collect())
    }

    /// Registers a business owned by `user_id`, together with the owner
    /// membership and a trial subscription.
    pub async fn create_business(
        &self,
        cmd: NewBusinessCmd,
        user_id: &str,
    ) -> ResultEngine<Business> {
        let name = normalize_required_name(&cmd.name, "business")?;
        let mut base = slugify(&name);
        if base.is_empty() {
            base = "business".to_string();
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let taken = self.taken_business_slugs(&db_tx, &base).await?;
            let now = Utc::now();
            let business = Business {
                id: Uuid::new_v4(),
                name,
                slug: first_free_slug(&base, &taken),
                owner_id: user_id.to_string(),
                currency: cmd.currency,
                phone: normalize_optional_text(cmd.contact.phone.as_deref()),
                email: normalize_optional_text(cmd.contact.email.as_deref()),
                address: normalize_optional_text(cmd.contact.address.as_deref()),
                active: true,
                default_after_days: self.default_after_days,
                created_at: now,
            };
            businesses::ActiveModel::from(&business).insert(&db_tx).await?;

            memberships::ActiveModel {
                business_id: ActiveValue::Set(business.id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(MemberRole::Owner.as_str().to_string()),
                shop_id: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            let trial = Subscription {
                id: Uuid::new_v4(),
                business_id: business.id,
                plan: Plan::Trial,
                status: SubscriptionStatus::Active,
                starts_at: now,
                ends_at: now + TimeDelta::days(self.trial_days),
                amount_minor: 0,
                created_by: user_id.to_string(),
                created_at: now,
            };
            subscriptions::ActiveModel::from(&trial).insert(&db_tx).await?;

            tracing::info!(slug = %business.slug, owner = %user_id, "business created");
            Ok(business)
        })
    }

    /// Returns a business and the caller's access to it.
    pub async fn business_by_slug(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<(Business, Access)> {
        with_tx!(self, |db_tx| {
            let (model, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            Ok((Business::try_from(model)?, access))
        })
    }

    /// Businesses the user owns, is a member of, or collects for.
    pub async fn list_businesses(&self, user_id: &str) -> ResultEngine<Vec<Business>> {
        with_tx!(self, |db_tx| {
            let mut ids: BTreeSet<String> = memberships::Entity::find()
                .filter(memberships::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.business_id)
                .collect();
            ids.extend(
                debt_collectors::Entity::find()
                    .filter(debt_collectors::Column::UserId.eq(user_id.to_string()))
                    .filter(debt_collectors::Column::Active.eq(true))
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(|c| c.business_id),
            );

            let rows = businesses::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(businesses::Column::OwnerId.eq(user_id.to_string()))
                        .add(businesses::Column::Id.is_in(ids)),
                )
                .order_by_asc(businesses::Column::Name)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Business::try_from).collect()
        })
    }

    /// Every business on the platform (platform admin).
    pub async fn list_all_businesses(&self, user_id: &str) -> ResultEngine<Vec<Business>> {
        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let rows = businesses::Entity::find()
                .order_by_asc(businesses::Column::Name)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Business::try_from).collect()
        })
    }

    /// Updates business settings (owner). The slug never changes.
    pub async fn update_business(
        &self,
        slug: &str,
        patch: BusinessPatch,
        user_id: &str,
    ) -> ResultEngine<Business> {
        if let Some(days) = patch.default_after_days {
            validate_default_after_days(days)?;
        }
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_required_name(n, "business"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let (model, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let mut active: businesses::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(phone) = patch.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(email) = patch.email.as_deref() {
                active.email = ActiveValue::Set(normalize_optional_text(Some(email)));
            }
            if let Some(address) = patch.address.as_deref() {
                active.address = ActiveValue::Set(normalize_optional_text(Some(address)));
            }
            if let Some(days) = patch.default_after_days {
                active.default_after_days = ActiveValue::Set(days);
            }
            let model = active.update(&db_tx).await?;
            Business::try_from(model)
        })
    }

    /// Suspends or reactivates a business (platform admin).
    pub async fn set_business_active(
        &self,
        slug: &str,
        active: bool,
        user_id: &str,
    ) -> ResultEngine<Business> {
        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let model = self.find_business_by_slug(&db_tx, slug).await?;
            let mut active_model: businesses::ActiveModel = model.into();
            active_model.active = ActiveValue::Set(active);
            let model = active_model.update(&db_tx).await?;
            tracing::info!(slug = %model.slug, active, "business activation changed");
            Business::try_from(model)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collisions_get_numeric_suffixes() {
        let mut taken = BTreeSet::new();
        assert_eq!(first_free_slug("acme", &taken), "acme");
        taken.insert("acme".to_string());
        assert_eq!(first_free_slug("acme", &taken), "acme-2");
        taken.insert("acme-2".to_string());
        assert_eq!(first_free_slug("acme", &taken), "acme-3");
    }
}
