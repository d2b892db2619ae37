use std::collections::{BTreeMap, HashMap};

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Customer, Document, DocumentKind, EngineError, Installment, InstallmentStatus,
    MAX_INSTALLMENTS, NewPurchaseCmd, Payment, PaymentMethod, PaymentStatus, Purchase,
    PurchaseItem, PurchaseStatus, PurchaseType, ResultEngine, Shop, StockReason, WalletTxKind,
    businesses, customers, installments::{self, build_schedule},
    payments, purchase_items, purchases, shops,
    util::parse_uuid,
};

use super::{
    Access, Engine, access::Capability, normalize_optional_text, normalize_required_text,
    payments::NewPayment, with_tx,
};

/// Filters for listing purchases.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`) on `created_at`.
#[derive(Clone, Debug, Default)]
pub struct PurchaseListFilter {
    pub shop_slug: Option<String>,
    pub status: Option<PurchaseStatus>,
    pub purchase_type: Option<PurchaseType>,
    pub customer_id: Option<Uuid>,
    pub collector_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn validate_list_filter(filter: &PurchaseListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

/// A purchase as shown in lists and exports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseSummary {
    pub purchase: Purchase,
    pub shop_slug: String,
    pub customer_name: String,
    pub customer_phone: String,
    /// Due date of the first installment not yet paid.
    pub next_due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub purchase: Purchase,
    pub shop: Shop,
    pub customer: Customer,
    pub items: Vec<PurchaseItem>,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
    pub documents: Vec<Document>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PurchasesCursor {
    created_at: DateTime<Utc>,
    purchase_id: String,
}

impl PurchasesCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid purchases cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid purchases cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid purchases cursor".to_string()))
    }
}

/// Merges repeated products into one line, keeping first-seen order.
fn merge_lines(cmd: &NewPurchaseCmd) -> ResultEngine<Vec<(Uuid, i64)>> {
    if cmd.lines.is_empty() {
        return Err(EngineError::InvalidInput(
            "a purchase needs at least one item".to_string(),
        ));
    }
    let mut merged: Vec<(Uuid, i64)> = Vec::with_capacity(cmd.lines.len());
    for line in &cmd.lines {
        if line.quantity <= 0 {
            return Err(EngineError::InvalidInput(
                "quantity must be > 0".to_string(),
            ));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
                    EngineError::InvalidInput("quantity out of range".to_string())
                })?;
            }
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    Ok(merged)
}

/// Down payment and installment count the purchase will be stored with.
fn payment_plan(cmd: &NewPurchaseCmd, total_minor: i64) -> ResultEngine<(i64, i64)> {
    match cmd.purchase_type {
        PurchaseType::Cash => Ok((total_minor, 0)),
        PurchaseType::Layaway | PurchaseType::Credit => {
            if cmd.down_payment_minor < 0 || cmd.down_payment_minor >= total_minor {
                return Err(EngineError::InvalidAmount(format!(
                    "down payment must be between 0 and {}",
                    total_minor - 1
                )));
            }
            if !(1..=MAX_INSTALLMENTS).contains(&cmd.installment_count) {
                return Err(EngineError::InvalidInput(format!(
                    "installment_count must be between 1 and {MAX_INSTALLMENTS}"
                )));
            }
            Ok((cmd.down_payment_minor, cmd.installment_count))
        }
    }
}

impl Engine {
    /// Validates and writes a purchase with its items, schedule, stock
    /// movements, invoice and down payment.
    pub(super) async fn insert_purchase(
        &self,
        db: &DatabaseTransaction,
        business: &businesses::Model,
        access: &Access,
        cmd: &NewPurchaseCmd,
        user_id: &str,
    ) -> ResultEngine<purchases::Model> {
        let lines = merge_lines(cmd)?;
        let shop = self
            .require_shop(db, &business.id, &cmd.shop_slug, access)
            .await?;
        if !shop.active {
            return Err(EngineError::InvalidStatus("shop is inactive".to_string()));
        }
        self.require_current_plan(db, &business.id).await?;

        let customer = self.require_customer(db, &business.id, cmd.customer_id).await?;
        if !customer.active {
            return Err(EngineError::InvalidStatus("customer is inactive".to_string()));
        }
        if let Some(collector_id) = cmd.collector_id {
            let collector = self.require_collector(db, &business.id, collector_id).await?;
            if !collector.active {
                return Err(EngineError::InvalidStatus("collector is inactive".to_string()));
            }
        }

        let purchase_id = Uuid::new_v4();
        let mut priced = Vec::with_capacity(lines.len());
        let mut total_minor: i64 = 0;
        for (product_id, quantity) in lines {
            let product = self.require_product(db, &business.id, product_id).await?;
            if product.shop_id != shop.id {
                return Err(EngineError::KeyNotFound("product not exists".to_string()));
            }
            if product.archived {
                return Err(EngineError::InvalidStatus(format!(
                    "{} is archived",
                    product.name
                )));
            }
            if product.stock_quantity < quantity {
                return Err(EngineError::InsufficientStock(format!(
                    "{} has {} in stock, {quantity} requested",
                    product.name, product.stock_quantity
                )));
            }
            let line_total = product
                .price_minor
                .checked_mul(quantity)
                .ok_or_else(|| EngineError::InvalidAmount("line total overflow".to_string()))?;
            total_minor = total_minor
                .checked_add(line_total)
                .ok_or_else(|| EngineError::InvalidAmount("total overflow".to_string()))?;
            let item = PurchaseItem {
                id: Uuid::new_v4(),
                purchase_id,
                product_id,
                product_name: product.name.clone(),
                quantity,
                unit_price_minor: product.price_minor,
                line_total_minor: line_total,
            };
            priced.push((product, item));
        }

        let (down_payment_minor, installment_count) = payment_plan(cmd, total_minor)?;
        let purchase = Purchase {
            id: purchase_id,
            business_id: parse_uuid(&business.id, "business")?,
            shop_id: parse_uuid(&shop.id, "shop")?,
            customer_id: cmd.customer_id,
            collector_id: cmd.collector_id,
            purchase_type: cmd.purchase_type,
            status: PurchaseStatus::Active,
            total_price_minor: total_minor,
            down_payment_minor,
            total_paid_minor: 0,
            outstanding_minor: total_minor,
            installment_count,
            frequency: cmd.frequency,
            start_date: cmd.start_date,
            note: normalize_optional_text(cmd.note.as_deref()),
            created_by: user_id.to_string(),
            created_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
        };
        let mut model = purchases::ActiveModel::from(&purchase).insert(db).await?;

        for (product, item) in priced {
            purchase_items::ActiveModel::from(&item).insert(db).await?;
            self.move_stock(
                db,
                product,
                -item.quantity,
                StockReason::Sale,
                Some(purchase_id),
                None,
                user_id,
            )
            .await?;
        }

        if installment_count > 0 {
            let schedule = build_schedule(
                purchase_id,
                total_minor - down_payment_minor,
                installment_count,
                cmd.frequency,
                cmd.start_date,
            )?;
            for installment in &schedule {
                installments::ActiveModel::from(installment).insert(db).await?;
            }
        }

        self.issue_document(
            db,
            &business.id,
            &model.id,
            None,
            DocumentKind::Invoice,
            total_minor,
            user_id,
        )
        .await?;

        if down_payment_minor > 0 {
            if cmd.method == PaymentMethod::Wallet {
                self.debit_wallet_for(db, &model, down_payment_minor, user_id)
                    .await?;
            }
            let payment = self
                .insert_payment(
                    db,
                    NewPayment {
                        purchase: &model,
                        amount_minor: down_payment_minor,
                        method: cmd.method,
                        reference: normalize_optional_text(cmd.reference.as_deref()),
                        note: Some("down payment".to_string()),
                        collector_id: None,
                        status: PaymentStatus::Confirmed,
                    },
                    user_id,
                )
                .await?;
            model = self
                .apply_confirmed_payment(
                    db,
                    model,
                    &payment,
                    false,
                    business.default_after_days,
                    user_id,
                )
                .await?;
        }

        tracing::info!(
            business = %business.slug,
            purchase = %model.id,
            kind = %cmd.purchase_type,
            total = total_minor,
            "purchase created"
        );
        Ok(model)
    }

    async fn load_detail(
        &self,
        db: &DatabaseTransaction,
        model: purchases::Model,
    ) -> ResultEngine<PurchaseDetail> {
        let shop = shops::Entity::find_by_id(model.shop_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("shop not exists".to_string()))?;
        let customer = customers::Entity::find_by_id(model.customer_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("customer not exists".to_string()))?;
        let items = purchase_items::Entity::find()
            .filter(purchase_items::Column::PurchaseId.eq(model.id.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(PurchaseItem::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        let installments = self.load_installments(db, &model.id).await?;
        let payments = self.payments_of_purchase(db, &model.id).await?;
        let documents = self.documents_of_purchase(db, &model.id).await?;
        Ok(PurchaseDetail {
            purchase: Purchase::try_from(model)?,
            shop: Shop::try_from(shop)?,
            customer: Customer::try_from(customer)?,
            items,
            installments,
            payments,
            documents,
        })
    }

    pub(super) async fn summarize(
        &self,
        db: &DatabaseTransaction,
        models: Vec<purchases::Model>,
    ) -> ResultEngine<Vec<PurchaseSummary>> {
        let customer_ids: Vec<String> = models.iter().map(|p| p.customer_id.clone()).collect();
        let shop_ids: Vec<String> = models.iter().map(|p| p.shop_id.clone()).collect();
        let purchase_ids: Vec<String> = models.iter().map(|p| p.id.clone()).collect();

        let customers: HashMap<String, customers::Model> = customers::Entity::find()
            .filter(customers::Column::Id.is_in(customer_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let shops: HashMap<String, String> = shops::Entity::find()
            .filter(shops::Column::Id.is_in(shop_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.slug))
            .collect();
        let mut next_due: BTreeMap<String, NaiveDate> = BTreeMap::new();
        let unpaid = installments::Entity::find()
            .filter(installments::Column::PurchaseId.is_in(purchase_ids))
            .filter(installments::Column::Status.ne(InstallmentStatus::Paid.as_str()))
            .all(db)
            .await?;
        for installment in unpaid {
            next_due
                .entry(installment.purchase_id)
                .and_modify(|due| *due = (*due).min(installment.due_date))
                .or_insert(installment.due_date);
        }

        models
            .into_iter()
            .map(|model| {
                let customer = customers.get(&model.customer_id);
                Ok::<_, EngineError>(PurchaseSummary {
                    shop_slug: shops.get(&model.shop_id).cloned().unwrap_or_default(),
                    customer_name: customer.map(|c| c.name.clone()).unwrap_or_default(),
                    customer_phone: customer.map(|c| c.phone.clone()).unwrap_or_default(),
                    next_due_date: next_due.get(&model.id).copied(),
                    purchase: Purchase::try_from(model)?,
                })
            })
            .collect()
    }

    /// Filtered purchase query, newest first. Debt collectors only see their
    /// assigned purchases; pinned members only their shop.
    pub(super) async fn purchase_query(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        access: &Access,
        filter: &PurchaseListFilter,
    ) -> ResultEngine<sea_orm::Select<purchases::Entity>> {
        validate_list_filter(filter)?;
        let mut query = purchases::Entity::find()
            .filter(purchases::Column::BusinessId.eq(business_id.to_string()))
            .order_by_desc(purchases::Column::CreatedAt)
            .order_by_desc(purchases::Column::Id);

        if let Some(shop_slug) = &filter.shop_slug {
            let shop = self.require_shop(db, business_id, shop_slug, access).await?;
            query = query.filter(purchases::Column::ShopId.eq(shop.id));
        } else if let Some(pinned) = access.shop_id {
            query = query.filter(purchases::Column::ShopId.eq(pinned.to_string()));
        }
        if let Some(collector_id) = access.collector_id.or(filter.collector_id) {
            query = query.filter(purchases::Column::CollectorId.eq(collector_id.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(purchases::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = filter.purchase_type {
            query = query.filter(purchases::Column::PurchaseType.eq(kind.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(purchases::Column::CustomerId.eq(customer_id.to_string()));
        }
        if let Some(from) = filter.from {
            query = query.filter(purchases::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(purchases::Column::CreatedAt.lt(to));
        }
        Ok(query)
    }

    /// Records a sale. Returns the purchase with its schedule, payments and
    /// documents.
    pub async fn create_purchase(
        &self,
        slug: &str,
        cmd: NewPurchaseCmd,
        user_id: &str,
    ) -> ResultEngine<PurchaseDetail> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Sell)
                .await?;
            let model = self
                .insert_purchase(&db_tx, &business, &access, &cmd, user_id)
                .await?;
            self.load_detail(&db_tx, model).await
        })
    }

    pub async fn purchase_detail(
        &self,
        slug: &str,
        purchase_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<PurchaseDetail> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let model = self
                .require_visible_purchase(&db_tx, &business.id, purchase_id, &access)
                .await?;
            self.load_detail(&db_tx, model).await
        })
    }

    /// Lists purchases with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`.
    pub async fn list_purchases(
        &self,
        slug: &str,
        filter: &PurchaseListFilter,
        limit: u64,
        cursor: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<(Vec<PurchaseSummary>, Option<String>)> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let limit_plus_one = limit.saturating_add(1);
            let mut query = self
                .purchase_query(&db_tx, &business.id, &access, filter)
                .await?
                .limit(limit_plus_one);
            if let Some(cursor) = cursor {
                let cursor = PurchasesCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(purchases::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(purchases::Column::CreatedAt.eq(cursor.created_at))
                                .add(purchases::Column::Id.lt(cursor.purchase_id)),
                        ),
                );
            }

            let mut rows = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;
            rows.truncate(limit as usize);
            let next = match (has_more, rows.last()) {
                (true, Some(last)) => Some(
                    PurchasesCursor {
                        created_at: last.created_at,
                        purchase_id: last.id.clone(),
                    }
                    .encode()?,
                ),
                _ => None,
            };
            Ok((self.summarize(&db_tx, rows).await?, next))
        })
    }

    /// Assigns a debt collector to an open purchase; `None` unassigns.
    pub async fn assign_collector(
        &self,
        slug: &str,
        purchase_id: Uuid,
        collector_id: Option<Uuid>,
        user_id: &str,
    ) -> ResultEngine<Purchase> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let model = self
                .require_visible_purchase(&db_tx, &business.id, purchase_id, &access)
                .await?;
            if !PurchaseStatus::try_from(model.status.as_str())?.is_open() {
                return Err(EngineError::InvalidStatus(format!(
                    "purchase is {}",
                    model.status
                )));
            }
            if let Some(collector_id) = collector_id {
                let collector = self
                    .require_collector(&db_tx, &business.id, collector_id)
                    .await?;
                if !collector.active {
                    return Err(EngineError::InvalidStatus(
                        "collector is inactive".to_string(),
                    ));
                }
            }
            let mut active: purchases::ActiveModel = model.into();
            active.collector_id = ActiveValue::Set(collector_id.map(|id| id.to_string()));
            Purchase::try_from(active.update(&db_tx).await?)
        })
    }

    /// Cancels an open purchase: items go back to stock, pending payments
    /// are rejected and any money paid is refunded to the customer wallet.
    pub async fn cancel_purchase(
        &self,
        slug: &str,
        purchase_id: Uuid,
        reason: &str,
        user_id: &str,
    ) -> ResultEngine<PurchaseDetail> {
        let reason = normalize_required_text(reason, "reason")?;
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let model = self
                .require_visible_purchase(&db_tx, &business.id, purchase_id, &access)
                .await?;
            let mut purchase = Purchase::try_from(model)?;
            if !purchase.status.is_open() {
                return Err(EngineError::InvalidStatus(format!(
                    "purchase is {}",
                    purchase.status
                )));
            }

            let items = purchase_items::Entity::find()
                .filter(purchase_items::Column::PurchaseId.eq(purchase.id.to_string()))
                .all(&db_tx)
                .await?;
            for item in items {
                let product = self
                    .require_product(&db_tx, &business.id, parse_uuid(&item.product_id, "product")?)
                    .await?;
                self.move_stock(
                    &db_tx,
                    product,
                    item.quantity,
                    StockReason::Cancellation,
                    Some(purchase.id),
                    None,
                    user_id,
                )
                .await?;
            }

            let pending = payments::Entity::find()
                .filter(payments::Column::PurchaseId.eq(purchase.id.to_string()))
                .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
                .all(&db_tx)
                .await?;
            for payment in pending {
                let mut active: payments::ActiveModel = payment.into();
                active.status = ActiveValue::Set(PaymentStatus::Rejected.as_str().to_string());
                active.rejection_reason = ActiveValue::Set(Some("purchase cancelled".to_string()));
                active.confirmed_by = ActiveValue::Set(Some(user_id.to_string()));
                active.confirmed_at = ActiveValue::Set(Some(Utc::now()));
                active.update(&db_tx).await?;
            }

            if purchase.total_paid_minor > 0 {
                let customer = self
                    .require_customer(&db_tx, &business.id, purchase.customer_id)
                    .await?;
                self.post_wallet_tx(
                    &db_tx,
                    customer,
                    WalletTxKind::Refund,
                    purchase.total_paid_minor,
                    Some(purchase.id),
                    Some(format!("refund: {reason}")),
                    user_id,
                )
                .await?;
            }

            purchase.status = PurchaseStatus::Cancelled;
            purchase.cancelled_at = Some(Utc::now());
            purchase.cancel_reason = Some(reason);
            let model = purchases::ActiveModel::from(&purchase).update(&db_tx).await?;
            tracing::info!(
                business = %business.slug,
                purchase = %model.id,
                refunded = purchase.total_paid_minor,
                "purchase cancelled"
            );
            self.load_detail(&db_tx, model).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(kind: PurchaseType) -> NewPurchaseCmd {
        NewPurchaseCmd::new(
            "main",
            Uuid::new_v4(),
            kind,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
    }

    #[test]
    fn duplicate_lines_are_merged() {
        let product = Uuid::new_v4();
        let other = Uuid::new_v4();
        let cmd = cmd(PurchaseType::Cash)
            .line(product, 1)
            .line(other, 2)
            .line(product, 3);
        assert_eq!(merge_lines(&cmd).unwrap(), vec![(product, 4), (other, 2)]);
    }

    #[test]
    fn empty_or_zero_lines_are_rejected() {
        assert!(merge_lines(&cmd(PurchaseType::Cash)).is_err());
        assert!(merge_lines(&cmd(PurchaseType::Cash).line(Uuid::new_v4(), 0)).is_err());
    }

    #[test]
    fn cash_purchases_ignore_the_schedule() {
        let cmd = cmd(PurchaseType::Cash).down_payment(5).installments(3, crate::Frequency::Weekly);
        assert_eq!(payment_plan(&cmd, 1_000).unwrap(), (1_000, 0));
    }

    #[test]
    fn installment_plans_are_bounded() {
        let base = cmd(PurchaseType::Credit);
        assert!(payment_plan(&base.clone().down_payment(1_000).installments(3, crate::Frequency::Weekly), 1_000).is_err());
        assert!(payment_plan(&base.clone().down_payment(100).installments(0, crate::Frequency::Weekly), 1_000).is_err());
        assert!(payment_plan(&base.clone().down_payment(100).installments(61, crate::Frequency::Weekly), 1_000).is_err());
        assert_eq!(
            payment_plan(&base.down_payment(100).installments(3, crate::Frequency::Weekly), 1_000).unwrap(),
            (100, 3)
        );
    }

    #[test]
    fn cursor_roundtrip_and_garbage() {
        let cursor = PurchasesCursor {
            created_at: Utc::now(),
            purchase_id: Uuid::new_v4().to_string(),
        };
        let decoded = PurchasesCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.purchase_id, cursor.purchase_id);
        assert!(matches!(
            PurchasesCursor::decode("%%%"),
            Err(EngineError::InvalidCursor(_))
        ));
    }
}
