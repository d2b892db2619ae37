use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    DocumentKind, EngineError, Payment, PaymentCmd, PaymentMethod, PaymentStatus, Purchase,
    PurchaseStatus, ResultEngine, WalletTxKind, installments, payments, purchases,
    installments::allocate,
    util::parse_uuid,
};

use super::{
    Access, Engine, access::Capability, normalize_optional_text, normalize_required_text,
    require_positive, statuses::settle_status, with_tx,
};

/// A payment about to be written.
pub(super) struct NewPayment<'a> {
    pub(super) purchase: &'a purchases::Model,
    pub(super) amount_minor: i64,
    pub(super) method: PaymentMethod,
    pub(super) reference: Option<String>,
    pub(super) note: Option<String>,
    pub(super) collector_id: Option<Uuid>,
    pub(super) status: PaymentStatus,
}

fn require_open(purchase: &purchases::Model) -> ResultEngine<PurchaseStatus> {
    let status = PurchaseStatus::try_from(purchase.status.as_str())?;
    if !status.is_open() {
        return Err(EngineError::InvalidStatus(format!(
            "purchase is {status}"
        )));
    }
    Ok(status)
}

impl Engine {
    async fn pending_total(&self, db: &DatabaseTransaction, purchase_id: &str) -> ResultEngine<i64> {
        let pending = payments::Entity::find()
            .filter(payments::Column::PurchaseId.eq(purchase_id.to_string()))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .all(db)
            .await?;
        Ok(pending.iter().map(|p| p.amount_minor).sum())
    }

    /// Inserts a payment row after checking the reference is unused in the
    /// business.
    pub(super) async fn insert_payment(
        &self,
        db: &DatabaseTransaction,
        new: NewPayment<'_>,
        user_id: &str,
    ) -> ResultEngine<payments::Model> {
        if let Some(reference) = &new.reference {
            let duplicate = payments::Entity::find()
                .filter(payments::Column::BusinessId.eq(new.purchase.business_id.clone()))
                .filter(payments::Column::Reference.eq(reference.clone()))
                .one(db)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(reference.clone()));
            }
        }
        let now = Utc::now();
        let confirmed = new.status == PaymentStatus::Confirmed;
        let payment = Payment {
            id: Uuid::new_v4(),
            business_id: parse_uuid(&new.purchase.business_id, "business")?,
            shop_id: parse_uuid(&new.purchase.shop_id, "shop")?,
            purchase_id: parse_uuid(&new.purchase.id, "purchase")?,
            customer_id: parse_uuid(&new.purchase.customer_id, "customer")?,
            amount_minor: new.amount_minor,
            method: new.method,
            status: new.status,
            reference: new.reference,
            note: new.note,
            recorded_by: user_id.to_string(),
            collector_id: new.collector_id,
            confirmed_by: confirmed.then(|| user_id.to_string()),
            confirmed_at: confirmed.then_some(now),
            rejection_reason: None,
            created_at: now,
        };
        Ok(payments::ActiveModel::from(&payment).insert(db).await?)
    }

    /// Debits the customer wallet for a wallet-method payment.
    pub(super) async fn debit_wallet_for(
        &self,
        db: &DatabaseTransaction,
        purchase: &purchases::Model,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<()> {
        let customer = self
            .require_customer(
                db,
                &purchase.business_id,
                parse_uuid(&purchase.customer_id, "customer")?,
            )
            .await?;
        self.post_wallet_tx(
            db,
            customer,
            WalletTxKind::Payment,
            amount_minor,
            Some(parse_uuid(&purchase.id, "purchase")?),
            None,
            user_id,
        )
        .await?;
        Ok(())
    }

    /// Applies a confirmed payment to its purchase: balances, installments
    /// (unless it is the down payment), receipt and status.
    pub(super) async fn apply_confirmed_payment(
        &self,
        db: &DatabaseTransaction,
        purchase: purchases::Model,
        payment: &payments::Model,
        fill_installments: bool,
        default_after_days: i64,
        user_id: &str,
    ) -> ResultEngine<purchases::Model> {
        let mut purchase = Purchase::try_from(purchase)?;
        purchase.apply_payment(payment.amount_minor)?;

        let now = Utc::now();
        let today = now.date_naive();
        let mut schedule = self.load_installments(db, &purchase.id.to_string()).await?;
        if fill_installments {
            for idx in allocate(&mut schedule, payment.amount_minor, today, now) {
                installments::ActiveModel::from(&schedule[idx]).update(db).await?;
            }
        }

        self.issue_document(
            db,
            &payment.business_id,
            &payment.purchase_id,
            Some(payment.id.as_str()),
            DocumentKind::Receipt,
            payment.amount_minor,
            user_id,
        )
        .await?;

        if let Some(next) = settle_status(&mut purchase, &schedule, today, default_after_days) {
            tracing::info!(purchase = %purchase.id, status = %next, "purchase status changed");
        }
        Ok(purchases::ActiveModel::from(&purchase).update(db).await?)
    }

    /// Records a payment on a purchase.
    ///
    /// Staff payments are confirmed and applied at once. Debt collectors
    /// record `pending` payments on the purchases assigned to them; a
    /// supervisor confirms them later.
    pub async fn record_payment(&self, slug: &str, cmd: PaymentCmd, user_id: &str) -> ResultEngine<Payment> {
        require_positive(cmd.amount_minor, "amount_minor")?;
        let reference = normalize_optional_text(cmd.reference.as_deref());
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::CollectPayment)
                .await?;
            let purchase = self
                .require_visible_purchase(&db_tx, &business.id, cmd.purchase_id, &access)
                .await?;
            require_open(&purchase)?;

            let pending = self.pending_total(&db_tx, &purchase.id).await?;
            let available = purchase.outstanding_minor - pending;
            if cmd.amount_minor > available {
                return Err(EngineError::InvalidAmount(format!(
                    "payment of {} exceeds payable balance {available}",
                    cmd.amount_minor
                )));
            }

            let collector_id = access.collector_id;
            if collector_id.is_some() && cmd.method == PaymentMethod::Wallet {
                return Err(EngineError::InvalidInput(
                    "debt collectors cannot take wallet payments".to_string(),
                ));
            }
            let status = if collector_id.is_some() {
                PaymentStatus::Pending
            } else {
                PaymentStatus::Confirmed
            };
            if status == PaymentStatus::Confirmed && cmd.method == PaymentMethod::Wallet {
                self.debit_wallet_for(&db_tx, &purchase, cmd.amount_minor, user_id)
                    .await?;
            }

            let payment = self
                .insert_payment(
                    &db_tx,
                    NewPayment {
                        purchase: &purchase,
                        amount_minor: cmd.amount_minor,
                        method: cmd.method,
                        reference,
                        note,
                        collector_id,
                        status,
                    },
                    user_id,
                )
                .await?;
            if status == PaymentStatus::Confirmed {
                self.apply_confirmed_payment(
                    &db_tx,
                    purchase,
                    &payment,
                    true,
                    business.default_after_days,
                    user_id,
                )
                .await?;
            }
            tracing::info!(
                business = %business.slug,
                payment = %payment.id,
                amount = payment.amount_minor,
                status = %status,
                "payment recorded"
            );
            Payment::try_from(payment)
        })
    }

    async fn require_pending_payment(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        payment_id: Uuid,
        access: &Access,
    ) -> ResultEngine<payments::Model> {
        let payment = self.require_payment(db, business_id, payment_id).await?;
        access.require_shop(&payment.shop_id)?;
        if PaymentStatus::try_from(payment.status.as_str())? != PaymentStatus::Pending {
            return Err(EngineError::InvalidStatus(format!(
                "payment is {}",
                payment.status
            )));
        }
        Ok(payment)
    }

    /// Confirms a collector's pending payment and applies it.
    pub async fn confirm_payment(&self, slug: &str, payment_id: Uuid, user_id: &str) -> ResultEngine<Payment> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let payment = self
                .require_pending_payment(&db_tx, &business.id, payment_id, &access)
                .await?;
            let purchase = self
                .require_purchase(&db_tx, &business.id, parse_uuid(&payment.purchase_id, "purchase")?)
                .await?;
            require_open(&purchase)?;
            if payment.amount_minor > purchase.outstanding_minor {
                return Err(EngineError::InvalidAmount(format!(
                    "payment of {} exceeds outstanding balance {}",
                    payment.amount_minor, purchase.outstanding_minor
                )));
            }

            let mut active: payments::ActiveModel = payment.into();
            active.status = ActiveValue::Set(PaymentStatus::Confirmed.as_str().to_string());
            active.confirmed_by = ActiveValue::Set(Some(user_id.to_string()));
            active.confirmed_at = ActiveValue::Set(Some(Utc::now()));
            let payment = active.update(&db_tx).await?;
            self.apply_confirmed_payment(
                &db_tx,
                purchase,
                &payment,
                true,
                business.default_after_days,
                user_id,
            )
            .await?;
            tracing::info!(business = %business.slug, payment = %payment.id, "payment confirmed");
            Payment::try_from(payment)
        })
    }

    pub async fn reject_payment(
        &self,
        slug: &str,
        payment_id: Uuid,
        reason: &str,
        user_id: &str,
    ) -> ResultEngine<Payment> {
        let reason = normalize_required_text(reason, "reason")?;
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let payment = self
                .require_pending_payment(&db_tx, &business.id, payment_id, &access)
                .await?;
            let mut active: payments::ActiveModel = payment.into();
            active.status = ActiveValue::Set(PaymentStatus::Rejected.as_str().to_string());
            active.rejection_reason = ActiveValue::Set(Some(reason));
            active.confirmed_by = ActiveValue::Set(Some(user_id.to_string()));
            active.confirmed_at = ActiveValue::Set(Some(Utc::now()));
            Payment::try_from(active.update(&db_tx).await?)
        })
    }

    /// Pending payments, oldest first. Pinned members only see their shop.
    pub async fn pending_payments(
        &self,
        slug: &str,
        shop_slug: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let mut query = payments::Entity::find()
                .filter(payments::Column::BusinessId.eq(business.id.clone()))
                .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
                .order_by_asc(payments::Column::CreatedAt);
            if let Some(shop_slug) = shop_slug {
                let shop = self
                    .require_shop(&db_tx, &business.id, shop_slug, &access)
                    .await?;
                query = query.filter(payments::Column::ShopId.eq(shop.id));
            } else if let Some(pinned) = access.shop_id {
                query = query.filter(payments::Column::ShopId.eq(pinned.to_string()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Payment::try_from)
                .collect()
        })
    }

    pub(super) async fn payments_of_purchase(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
    ) -> ResultEngine<Vec<Payment>> {
        payments::Entity::find()
            .filter(payments::Column::PurchaseId.eq(purchase_id.to_string()))
            .order_by_asc(payments::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }
}
