use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, NewProductCmd, Product, ProductPatch, ResultEngine, StockMovement, StockReason,
    products::{self, generated_sku},
    purchase_items, stock_movements,
    util::parse_uuid,
};

use super::{
    Engine, access::Capability, normalize_optional_text, normalize_required_name,
    require_non_negative, require_positive, subscriptions::Quota, with_tx,
};

/// What `delete_product` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// The product has sales, so it was archived instead.
    Archived,
}

impl Engine {
    /// Changes the stock of a product and records the movement.
    pub(super) async fn move_stock(
        &self,
        db: &DatabaseTransaction,
        product: products::Model,
        change: i64,
        reason: StockReason,
        purchase_id: Option<Uuid>,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<products::Model> {
        let quantity_after = product
            .stock_quantity
            .checked_add(change)
            .ok_or_else(|| EngineError::InvalidAmount(format!("{} stock out of range", product.name)))?;
        if quantity_after < 0 {
            return Err(EngineError::InsufficientStock(format!(
                "{} has {} in stock",
                product.name, product.stock_quantity
            )));
        }
        let product_id = parse_uuid(&product.id, "product")?;
        let mut movement = StockMovement::new(product_id, change, quantity_after, reason, user_id);
        movement.purchase_id = purchase_id;
        movement.note = note;
        stock_movements::ActiveModel::from(&movement).insert(db).await?;

        let mut active: products::ActiveModel = product.into();
        active.stock_quantity = ActiveValue::Set(quantity_after);
        active.updated_at = ActiveValue::Set(Utc::now());
        Ok(active.update(db).await?)
    }

    async fn sku_taken(
        &self,
        db: &DatabaseTransaction,
        shop_id: &str,
        sku: &str,
        except: Option<&str>,
    ) -> ResultEngine<bool> {
        let mut query = products::Entity::find()
            .filter(products::Column::ShopId.eq(shop_id.to_string()))
            .filter(products::Column::Sku.eq(sku.to_string()));
        if let Some(id) = except {
            query = query.filter(products::Column::Id.ne(id.to_string()));
        }
        Ok(query.one(db).await?.is_some())
    }

    /// Adds a product to a shop. Initial stock is recorded as a restock.
    pub async fn create_product(
        &self,
        slug: &str,
        shop_slug: &str,
        cmd: NewProductCmd,
        user_id: &str,
    ) -> ResultEngine<Product> {
        let name = normalize_required_name(&cmd.name, "product")?;
        require_positive(cmd.price_minor, "price_minor")?;
        require_non_negative(cmd.cost_minor, "cost_minor")?;
        if cmd.stock_quantity < 0 || cmd.reorder_level < 0 {
            return Err(EngineError::InvalidInput(
                "stock_quantity and reorder_level must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageInventory)
                .await?;
            let shop = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            if !shop.active {
                return Err(EngineError::InvalidStatus("shop is inactive".to_string()));
            }
            let used = products::Entity::find()
                .filter(products::Column::BusinessId.eq(business.id.clone()))
                .filter(products::Column::Archived.eq(false))
                .count(&db_tx)
                .await?;
            self.require_quota(&db_tx, &business.id, Quota::Products, used)
                .await?;

            let id = Uuid::new_v4();
            let sku = normalize_optional_text(cmd.sku.as_deref()).unwrap_or_else(|| generated_sku(id));
            if self.sku_taken(&db_tx, &shop.id, &sku, None).await? {
                return Err(EngineError::ExistingKey(sku));
            }
            let now = Utc::now();
            let product = Product {
                id,
                business_id: parse_uuid(&business.id, "business")?,
                shop_id: parse_uuid(&shop.id, "shop")?,
                name,
                sku,
                description: normalize_optional_text(cmd.description.as_deref()),
                price_minor: cmd.price_minor,
                cost_minor: cmd.cost_minor,
                stock_quantity: 0,
                reorder_level: cmd.reorder_level,
                archived: false,
                created_at: now,
                updated_at: now,
            };
            let model = products::ActiveModel::from(&product).insert(&db_tx).await?;
            let model = if cmd.stock_quantity > 0 {
                self.move_stock(
                    &db_tx,
                    model,
                    cmd.stock_quantity,
                    StockReason::Restock,
                    None,
                    Some("initial stock".to_string()),
                    user_id,
                )
                .await?
            } else {
                model
            };
            Product::try_from(model)
        })
    }

    pub async fn product(&self, slug: &str, product_id: Uuid, user_id: &str) -> ResultEngine<Product> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let model = self.require_product(&db_tx, &business.id, product_id).await?;
            access.require_shop(&model.shop_id)?;
            Product::try_from(model)
        })
    }

    /// Edits product fields. Stock is changed through [`Engine::adjust_stock`].
    pub async fn update_product(
        &self,
        slug: &str,
        product_id: Uuid,
        patch: ProductPatch,
        user_id: &str,
    ) -> ResultEngine<Product> {
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_required_name(n, "product"))
            .transpose()?;
        if let Some(price) = patch.price_minor {
            require_positive(price, "price_minor")?;
        }
        if let Some(cost) = patch.cost_minor {
            require_non_negative(cost, "cost_minor")?;
        }
        if patch.reorder_level.is_some_and(|level| level < 0) {
            return Err(EngineError::InvalidInput(
                "reorder_level must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageInventory)
                .await?;
            let model = self.require_product(&db_tx, &business.id, product_id).await?;
            access.require_shop(&model.shop_id)?;

            let sku = normalize_optional_text(patch.sku.as_deref());
            if let Some(sku) = &sku
                && self
                    .sku_taken(&db_tx, &model.shop_id, sku, Some(&model.id))
                    .await?
            {
                return Err(EngineError::ExistingKey(sku.clone()));
            }

            let mut active: products::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(sku) = sku {
                active.sku = ActiveValue::Set(sku);
            }
            if let Some(description) = patch.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            if let Some(price) = patch.price_minor {
                active.price_minor = ActiveValue::Set(price);
            }
            if let Some(cost) = patch.cost_minor {
                active.cost_minor = ActiveValue::Set(cost);
            }
            if let Some(level) = patch.reorder_level {
                active.reorder_level = ActiveValue::Set(level);
            }
            if let Some(archived) = patch.archived {
                active.archived = ActiveValue::Set(archived);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            Product::try_from(active.update(&db_tx).await?)
        })
    }

    /// Deletes a product that was never sold; archives it otherwise.
    pub async fn delete_product(
        &self,
        slug: &str,
        product_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<DeleteOutcome> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageInventory)
                .await?;
            let model = self.require_product(&db_tx, &business.id, product_id).await?;
            access.require_shop(&model.shop_id)?;

            let sold = purchase_items::Entity::find()
                .filter(purchase_items::Column::ProductId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if sold > 0 {
                let mut active: products::ActiveModel = model.into();
                active.archived = ActiveValue::Set(true);
                active.updated_at = ActiveValue::Set(Utc::now());
                active.update(&db_tx).await?;
                return Ok(DeleteOutcome::Archived);
            }

            stock_movements::Entity::delete_many()
                .filter(stock_movements::Column::ProductId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            products::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(DeleteOutcome::Deleted)
        })
    }

    /// Manual stock change: restock, adjustment or customer return.
    pub async fn adjust_stock(
        &self,
        slug: &str,
        product_id: Uuid,
        change: i64,
        reason: StockReason,
        note: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Product> {
        if change == 0 {
            return Err(EngineError::InvalidInput("change must not be 0".to_string()));
        }
        if !reason.is_manual() {
            return Err(EngineError::InvalidInput(format!(
                "{reason} movements are recorded by purchases"
            )));
        }

        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageInventory)
                .await?;
            let model = self.require_product(&db_tx, &business.id, product_id).await?;
            access.require_shop(&model.shop_id)?;
            let model = self
                .move_stock(
                    &db_tx,
                    model,
                    change,
                    reason,
                    None,
                    normalize_optional_text(note),
                    user_id,
                )
                .await?;
            tracing::info!(product = %model.id, change, %reason, "stock adjusted");
            Product::try_from(model)
        })
    }

    /// Products of a shop, by name. `search` matches name or SKU.
    pub async fn list_products(
        &self,
        slug: &str,
        shop_slug: &str,
        include_archived: bool,
        search: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Vec<Product>> {
        let search = normalize_optional_text(search);
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let shop = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            let mut query = products::Entity::find()
                .filter(products::Column::ShopId.eq(shop.id))
                .order_by_asc(products::Column::Name);
            if !include_archived {
                query = query.filter(products::Column::Archived.eq(false));
            }
            if let Some(search) = &search {
                query = query.filter(
                    Condition::any()
                        .add(products::Column::Name.contains(search))
                        .add(products::Column::Sku.contains(search)),
                );
            }
            let rows = query.all(&db_tx).await?;
            rows.into_iter().map(Product::try_from).collect()
        })
    }

    /// Products at or below their reorder level.
    pub async fn low_stock(
        &self,
        slug: &str,
        shop_slug: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Product>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let shop = self
                .require_shop(&db_tx, &business.id, shop_slug, &access)
                .await?;
            let rows = products::Entity::find()
                .filter(products::Column::ShopId.eq(shop.id))
                .filter(products::Column::Archived.eq(false))
                .filter(Expr::col(products::Column::StockQuantity).lte(Expr::col(products::Column::ReorderLevel)))
                .order_by_asc(products::Column::StockQuantity)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Product::try_from).collect()
        })
    }

    /// Latest stock movements of a product, newest first.
    pub async fn stock_history(
        &self,
        slug: &str,
        product_id: Uuid,
        limit: u64,
        user_id: &str,
    ) -> ResultEngine<Vec<StockMovement>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let product = self.require_product(&db_tx, &business.id, product_id).await?;
            access.require_shop(&product.shop_id)?;
            let rows = stock_movements::Entity::find()
                .filter(stock_movements::Column::ProductId.eq(product.id))
                .order_by_desc(stock_movements::Column::CreatedAt)
                .order_by_desc(stock_movements::Column::Id)
                .limit(limit)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(StockMovement::try_from).collect()
        })
    }
}
