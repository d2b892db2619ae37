use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MemberRole, ResultEngine, businesses, customers, debt_collectors, documents,
    memberships, payments, products, purchases, shops, tickets, users,
    util::{db_enum, parse_opt_uuid, parse_uuid},
    wallet_transactions,
};

use super::Engine;

db_enum! {
    /// How the caller relates to a business.
    pub enum AccessRole("access role") {
        PlatformAdmin => "platform_admin",
        Owner => "owner",
        ShopAdmin => "shop_admin",
        Staff => "staff",
        DebtCollector => "debt_collector",
    }
}

/// What an operation needs from the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Capability {
    /// Read business data.
    View,
    /// Dashboards and collector reports of others.
    Reports,
    /// Settings, members, shops and collectors.
    ManageBusiness,
    ManageInventory,
    ManageCustomers,
    RemoveCustomers,
    Sell,
    /// Cancel purchases, assign collectors, confirm or reject payments and
    /// deposits, withdraw from wallets.
    Supervise,
    CollectPayment,
    Deposit,
    Support,
}

impl Capability {
    fn is_write(self) -> bool {
        !matches!(self, Self::View | Self::Reports)
    }
}

/// The caller's resolved role inside one business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub role: AccessRole,
    /// Shop the membership is pinned to.
    pub shop_id: Option<Uuid>,
    /// Set when the caller acts as a debt collector.
    pub collector_id: Option<Uuid>,
}

impl Access {
    pub(super) fn allows(&self, capability: Capability) -> bool {
        match self.role {
            AccessRole::PlatformAdmin | AccessRole::Owner => true,
            AccessRole::ShopAdmin => capability != Capability::ManageBusiness,
            AccessRole::Staff => matches!(
                capability,
                Capability::View
                    | Capability::ManageCustomers
                    | Capability::Sell
                    | Capability::CollectPayment
                    | Capability::Deposit
                    | Capability::Support
            ),
            AccessRole::DebtCollector => matches!(
                capability,
                Capability::View | Capability::CollectPayment | Capability::Deposit
            ),
        }
    }

    /// `false` when the membership is pinned to another shop.
    #[must_use]
    pub fn covers_shop(&self, shop_id: Uuid) -> bool {
        self.shop_id.is_none_or(|pinned| pinned == shop_id)
    }

    #[must_use]
    pub fn is_collector(&self) -> bool {
        self.role == AccessRole::DebtCollector
    }

    #[must_use]
    pub fn is_platform_admin(&self) -> bool {
        self.role == AccessRole::PlatformAdmin
    }

    pub(super) fn require_shop(&self, shop_id: &str) -> ResultEngine<()> {
        let shop_id = parse_uuid(shop_id, "shop")?;
        if !self.covers_shop(shop_id) {
            return Err(EngineError::Forbidden(
                "shop outside of your membership".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates a `require_*` method that loads a row by id and checks it
/// belongs to the given business.
macro_rules! impl_require_in_business {
    ($require_fn:ident, $module:ident, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            business_id: &str,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id.to_string())
                .filter($module::Column::BusinessId.eq(business_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_in_business!(require_product, products, "product not exists");
    impl_require_in_business!(require_customer, customers, "customer not exists");
    impl_require_in_business!(require_purchase, purchases, "purchase not exists");
    impl_require_in_business!(require_payment, payments, "payment not exists");
    impl_require_in_business!(
        require_wallet_tx,
        wallet_transactions,
        "wallet transaction not exists"
    );
    impl_require_in_business!(require_collector, debt_collectors, "collector not exists");
    impl_require_in_business!(require_document, documents, "document not exists");
    impl_require_in_business!(require_ticket, tickets, "ticket not exists");

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_platform_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        let user = self.require_user(db, user_id).await?;
        if !user.super_admin {
            return Err(EngineError::Forbidden(
                "platform admin required".to_string(),
            ));
        }
        Ok(user)
    }

    pub(super) async fn find_business_by_slug(
        &self,
        db: &DatabaseTransaction,
        slug: &str,
    ) -> ResultEngine<businesses::Model> {
        businesses::Entity::find()
            .filter(businesses::Column::Slug.eq(slug.trim().to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("business not exists".to_string()))
    }

    /// Resolves the caller's role: platform admin, owner, member, then
    /// active debt collector. Strangers get `KeyNotFound`.
    pub(super) async fn resolve_access(
        &self,
        db: &DatabaseTransaction,
        business: &businesses::Model,
        user_id: &str,
    ) -> ResultEngine<Access> {
        let not_found = || EngineError::KeyNotFound("business not exists".to_string());
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        if user.super_admin {
            return Ok(Access {
                role: AccessRole::PlatformAdmin,
                shop_id: None,
                collector_id: None,
            });
        }
        if business.owner_id == user_id {
            return Ok(Access {
                role: AccessRole::Owner,
                shop_id: None,
                collector_id: None,
            });
        }

        let membership =
            memberships::Entity::find_by_id((business.id.clone(), user_id.to_string()))
                .one(db)
                .await?;
        if let Some(membership) = membership {
            let role = match MemberRole::try_from(membership.role.as_str())? {
                MemberRole::Owner => AccessRole::Owner,
                MemberRole::ShopAdmin => AccessRole::ShopAdmin,
                MemberRole::Staff => AccessRole::Staff,
            };
            return Ok(Access {
                role,
                shop_id: parse_opt_uuid(membership.shop_id.as_deref(), "shop")?,
                collector_id: None,
            });
        }

        let collector = debt_collectors::Entity::find()
            .filter(debt_collectors::Column::BusinessId.eq(business.id.clone()))
            .filter(debt_collectors::Column::UserId.eq(user_id.to_string()))
            .filter(debt_collectors::Column::Active.eq(true))
            .one(db)
            .await?;
        match collector {
            Some(collector) => Ok(Access {
                role: AccessRole::DebtCollector,
                shop_id: None,
                collector_id: Some(parse_uuid(&collector.id, "collector")?),
            }),
            None => Err(not_found()),
        }
    }

    /// Loads a business by slug and checks the caller may perform
    /// `capability` in it.
    pub(super) async fn require_business(
        &self,
        db: &DatabaseTransaction,
        slug: &str,
        user_id: &str,
        capability: Capability,
    ) -> ResultEngine<(businesses::Model, Access)> {
        let business = self.find_business_by_slug(db, slug).await?;
        let access = self.resolve_access(db, &business, user_id).await?;
        if !access.allows(capability) {
            return Err(EngineError::Forbidden(format!(
                "{} cannot perform this action",
                access.role
            )));
        }
        if capability.is_write() && !business.active && !access.is_platform_admin() {
            return Err(EngineError::Forbidden("business is suspended".to_string()));
        }
        Ok((business, access))
    }

    /// Loads a shop by slug inside the business and checks a pinned
    /// membership covers it.
    pub(super) async fn require_shop(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        shop_slug: &str,
        access: &Access,
    ) -> ResultEngine<shops::Model> {
        let shop = shops::Entity::find()
            .filter(shops::Column::BusinessId.eq(business_id.to_string()))
            .filter(shops::Column::Slug.eq(shop_slug.trim().to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("shop not exists".to_string()))?;
        access.require_shop(&shop.id)?;
        Ok(shop)
    }

    /// Loads a purchase visible to the caller: debt collectors only see the
    /// purchases assigned to them.
    pub(super) async fn require_visible_purchase(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        purchase_id: Uuid,
        access: &Access,
    ) -> ResultEngine<purchases::Model> {
        let purchase = self.require_purchase(db, business_id, purchase_id).await?;
        if let Some(collector_id) = access.collector_id
            && purchase.collector_id.as_deref() != Some(collector_id.to_string().as_str())
        {
            return Err(EngineError::KeyNotFound("purchase not exists".to_string()));
        }
        access.require_shop(&purchase.shop_id)?;
        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(role: AccessRole) -> Access {
        Access {
            role,
            shop_id: None,
            collector_id: None,
        }
    }

    #[test]
    fn capability_matrix() {
        let owner = access(AccessRole::Owner);
        let shop_admin = access(AccessRole::ShopAdmin);
        let staff = access(AccessRole::Staff);
        let collector = access(AccessRole::DebtCollector);

        assert!(owner.allows(Capability::ManageBusiness));
        assert!(!shop_admin.allows(Capability::ManageBusiness));
        assert!(shop_admin.allows(Capability::Supervise));
        assert!(staff.allows(Capability::Sell));
        assert!(!staff.allows(Capability::RemoveCustomers));
        assert!(!staff.allows(Capability::Supervise));
        assert!(!staff.allows(Capability::Reports));
        assert!(collector.allows(Capability::CollectPayment));
        assert!(collector.allows(Capability::Deposit));
        assert!(!collector.allows(Capability::Sell));
        assert!(!collector.allows(Capability::Support));
    }

    #[test]
    fn pinned_members_only_cover_their_shop() {
        let shop = Uuid::new_v4();
        let pinned = Access {
            role: AccessRole::Staff,
            shop_id: Some(shop),
            collector_id: None,
        };
        assert!(pinned.covers_shop(shop));
        assert!(!pinned.covers_shop(Uuid::new_v4()));
        assert!(access(AccessRole::Staff).covers_shop(Uuid::new_v4()));
    }
}
