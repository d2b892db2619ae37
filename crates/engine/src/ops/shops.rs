use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Shop, ShopPatch, products, purchases, shops,
    util::{parse_uuid, slugify},
};

use super::{
    Engine, access::Capability, businesses::first_free_slug, normalize_optional_text,
    normalize_required_name, subscriptions::Quota, with_tx,
};

impl Engine {
    /// Opens a new shop in the business (owner). Counts against the plan.
    pub async fn create_shop(
        &self,
        slug: &str,
        name: &str,
        address: Option<&str>,
        phone: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Shop> {
        let name = normalize_required_name(name, "shop")?;
        let mut base = slugify(&name);
        if base.is_empty() {
            base = "shop".to_string();
        }

        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let existing = shops::Entity::find()
                .filter(shops::Column::BusinessId.eq(business.id.clone()))
                .all(&db_tx)
                .await?;
            self.require_quota(&db_tx, &business.id, Quota::Shops, existing.len() as u64)
                .await?;
            let taken: BTreeSet<String> = existing.into_iter().map(|s| s.slug).collect();

            let shop = Shop {
                id: Uuid::new_v4(),
                business_id: parse_uuid(&business.id, "business")?,
                name,
                slug: first_free_slug(&base, &taken),
                address: normalize_optional_text(address),
                phone: normalize_optional_text(phone),
                active: true,
                created_at: Utc::now(),
            };
            shops::ActiveModel::from(&shop).insert(&db_tx).await?;
            tracing::info!(business = %business.slug, shop = %shop.slug, "shop created");
            Ok(shop)
        })
    }

    pub async fn list_shops(&self, slug: &str, user_id: &str) -> ResultEngine<Vec<Shop>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let rows = shops::Entity::find()
                .filter(shops::Column::BusinessId.eq(business.id))
                .order_by_asc(shops::Column::Name)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Shop::try_from).collect()
        })
    }

    pub async fn shop_by_slug(&self, slug: &str, shop_slug: &str, user_id: &str) -> ResultEngine<Shop> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let model = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            Shop::try_from(model)
        })
    }

    /// Renames or edits contact details. The shop slug is stable.
    pub async fn update_shop(
        &self,
        slug: &str,
        shop_slug: &str,
        patch: ShopPatch,
        user_id: &str,
    ) -> ResultEngine<Shop> {
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_required_name(n, "shop"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let model = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            let mut active: shops::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(phone) = patch.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(address) = patch.address.as_deref() {
                active.address = ActiveValue::Set(normalize_optional_text(Some(address)));
            }
            Shop::try_from(active.update(&db_tx).await?)
        })
    }

    /// Inactive shops keep their history but accept no new products or
    /// purchases.
    pub async fn set_shop_active(
        &self,
        slug: &str,
        shop_slug: &str,
        active: bool,
        user_id: &str,
    ) -> ResultEngine<Shop> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let model = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            let mut active_model: shops::ActiveModel = model.into();
            active_model.active = ActiveValue::Set(active);
            Shop::try_from(active_model.update(&db_tx).await?)
        })
    }

    /// Deletes a shop that never had products or purchases.
    pub async fn delete_shop(&self, slug: &str, shop_slug: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let shop = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            let products = products::Entity::find()
                .filter(products::Column::ShopId.eq(shop.id.clone()))
                .count(&db_tx)
                .await?;
            let purchases = purchases::Entity::find()
                .filter(purchases::Column::ShopId.eq(shop.id.clone()))
                .count(&db_tx)
                .await?;
            if products > 0 || purchases > 0 {
                return Err(EngineError::InvalidStatus(
                    "shop has products or purchases; deactivate it instead".to_string(),
                ));
            }
            shops::Entity::delete_by_id(shop.id).exec(&db_tx).await?;
            tracing::info!(business = %business.slug, shop = %shop_slug, "shop deleted");
            Ok(())
        })
    }
}
