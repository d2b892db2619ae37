use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, WalletTransaction, WalletTxKind, WalletTxStatus, customers,
    util::parse_uuid,
    wallet_transactions,
};

use super::{Engine, access::Capability, normalize_optional_text, require_positive, with_tx};

/// A customer's wallet: balance and latest transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletView {
    pub customer_id: Uuid,
    pub balance_minor: i64,
    pub transactions: Vec<WalletTransaction>,
}

impl Engine {
    /// Fails with `ExistingKey` when a wallet transaction of the business
    /// already carries `reference`.
    async fn require_unused_wallet_reference(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        reference: &str,
    ) -> ResultEngine<()> {
        let existing = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::BusinessId.eq(business_id.to_string()))
            .filter(wallet_transactions::Column::Reference.eq(reference.to_string()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(reference.to_string()));
        }
        Ok(())
    }

    /// Writes a transaction that is confirmed on creation (withdrawal,
    /// payment, refund) and moves the customer balance.
    pub(super) async fn post_wallet_tx(
        &self,
        db: &DatabaseTransaction,
        customer: customers::Model,
        kind: WalletTxKind,
        amount_minor: i64,
        purchase_id: Option<Uuid>,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<(customers::Model, WalletTransaction)> {
        require_positive(amount_minor, "amount_minor")?;
        let before = customer.wallet_balance_minor;
        let after = kind.apply(before, amount_minor)?;
        if after < 0 {
            return Err(EngineError::InsufficientFunds(format!(
                "wallet balance is {before}, {amount_minor} requested"
            )));
        }
        let mut tx = WalletTransaction::confirmed(
            parse_uuid(&customer.business_id, "business")?,
            parse_uuid(&customer.id, "customer")?,
            kind,
            amount_minor,
            before,
            user_id,
        )?;
        tx.purchase_id = purchase_id;
        tx.note = note;
        wallet_transactions::ActiveModel::from(&tx).insert(db).await?;

        let mut active: customers::ActiveModel = customer.into();
        active.wallet_balance_minor = ActiveValue::Set(after);
        let customer = active.update(db).await?;
        Ok((customer, tx))
    }

    async fn require_pending_deposit(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        tx_id: Uuid,
    ) -> ResultEngine<wallet_transactions::Model> {
        let model = self.require_wallet_tx(db, business_id, tx_id).await?;
        if WalletTxKind::try_from(model.kind.as_str())? != WalletTxKind::Deposit
            || WalletTxStatus::try_from(model.status.as_str())? != WalletTxStatus::Pending
        {
            return Err(EngineError::InvalidStatus(
                "only pending deposits can be confirmed or rejected".to_string(),
            ));
        }
        Ok(model)
    }

    /// Records a deposit awaiting confirmation. The balance does not move
    /// until [`Engine::confirm_deposit`].
    pub async fn deposit(
        &self,
        slug: &str,
        customer_id: Uuid,
        amount_minor: i64,
        reference: Option<&str>,
        note: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<WalletTransaction> {
        require_positive(amount_minor, "amount_minor")?;
        let reference = normalize_optional_text(reference);

        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Deposit)
                .await?;
            let customer = self.require_customer(&db_tx, &business.id, customer_id).await?;
            if !customer.active {
                return Err(EngineError::InvalidStatus("customer is inactive".to_string()));
            }
            if let Some(reference) = &reference {
                self.require_unused_wallet_reference(&db_tx, &business.id, reference)
                    .await?;
            }
            let tx = WalletTransaction {
                id: Uuid::new_v4(),
                business_id: parse_uuid(&business.id, "business")?,
                customer_id,
                kind: WalletTxKind::Deposit,
                amount_minor,
                status: WalletTxStatus::Pending,
                balance_before_minor: None,
                balance_after_minor: None,
                reference,
                note: normalize_optional_text(note),
                purchase_id: None,
                recorded_by: user_id.to_string(),
                confirmed_by: None,
                confirmed_at: None,
                created_at: Utc::now(),
            };
            wallet_transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx)
        })
    }

    /// Confirms a pending deposit: `balance_after = balance_before + amount`.
    pub async fn confirm_deposit(
        &self,
        slug: &str,
        tx_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<WalletTransaction> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let model = self.require_pending_deposit(&db_tx, &business.id, tx_id).await?;
            let customer = customers::Entity::find_by_id(model.customer_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("customer not exists".to_string()))?;

            let before = customer.wallet_balance_minor;
            let after = WalletTxKind::Deposit.apply(before, model.amount_minor)?;
            let mut active_customer: customers::ActiveModel = customer.into();
            active_customer.wallet_balance_minor = ActiveValue::Set(after);
            active_customer.update(&db_tx).await?;

            let mut active: wallet_transactions::ActiveModel = model.into();
            active.status = ActiveValue::Set(WalletTxStatus::Confirmed.as_str().to_string());
            active.balance_before_minor = ActiveValue::Set(Some(before));
            active.balance_after_minor = ActiveValue::Set(Some(after));
            active.confirmed_by = ActiveValue::Set(Some(user_id.to_string()));
            active.confirmed_at = ActiveValue::Set(Some(Utc::now()));
            let model = active.update(&db_tx).await?;
            tracing::info!(business = %business.slug, tx = %model.id, before, after, "deposit confirmed");
            WalletTransaction::try_from(model)
        })
    }

    /// Rejects a pending deposit; the reason is appended to the note.
    pub async fn reject_deposit(
        &self,
        slug: &str,
        tx_id: Uuid,
        reason: &str,
        user_id: &str,
    ) -> ResultEngine<WalletTransaction> {
        let reason = super::normalize_required_text(reason, "reason")?;
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let model = self.require_pending_deposit(&db_tx, &business.id, tx_id).await?;
            let note = match model.note.as_deref() {
                Some(note) => format!("{note}; rejected: {reason}"),
                None => format!("rejected: {reason}"),
            };
            let mut active: wallet_transactions::ActiveModel = model.into();
            active.status = ActiveValue::Set(WalletTxStatus::Rejected.as_str().to_string());
            active.note = ActiveValue::Set(Some(note));
            active.confirmed_by = ActiveValue::Set(Some(user_id.to_string()));
            active.confirmed_at = ActiveValue::Set(Some(Utc::now()));
            WalletTransaction::try_from(active.update(&db_tx).await?)
        })
    }

    /// Pays cash out of a wallet. Confirmed immediately.
    pub async fn withdraw(
        &self,
        slug: &str,
        customer_id: Uuid,
        amount_minor: i64,
        note: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<WalletTransaction> {
        require_positive(amount_minor, "amount_minor")?;
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            let customer = self.require_customer(&db_tx, &business.id, customer_id).await?;
            let (_, tx) = self
                .post_wallet_tx(
                    &db_tx,
                    customer,
                    WalletTxKind::Withdrawal,
                    amount_minor,
                    None,
                    normalize_optional_text(note),
                    user_id,
                )
                .await?;
            Ok(tx)
        })
    }

    /// Balance and the latest `limit` transactions, newest first.
    pub async fn wallet(
        &self,
        slug: &str,
        customer_id: Uuid,
        limit: u64,
        user_id: &str,
    ) -> ResultEngine<WalletView> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let customer = self.require_customer(&db_tx, &business.id, customer_id).await?;
            let transactions = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::CustomerId.eq(customer.id.clone()))
                .order_by_desc(wallet_transactions::Column::CreatedAt)
                .order_by_desc(wallet_transactions::Column::Id)
                .limit(limit)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(WalletTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(WalletView {
                customer_id,
                balance_minor: customer.wallet_balance_minor,
                transactions,
            })
        })
    }

    /// Deposits waiting for confirmation, oldest first.
    pub async fn pending_deposits(
        &self,
        slug: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<WalletTransaction>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::Supervise)
                .await?;
            wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::BusinessId.eq(business.id))
                .filter(wallet_transactions::Column::Kind.eq(WalletTxKind::Deposit.as_str()))
                .filter(wallet_transactions::Column::Status.eq(WalletTxStatus::Pending.as_str()))
                .order_by_asc(wallet_transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(WalletTransaction::try_from)
                .collect()
        })
    }
}
