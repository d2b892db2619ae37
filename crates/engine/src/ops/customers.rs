use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Customer, CustomerPatch, EngineError, NewCustomerCmd, Purchase, PurchaseStatus, ResultEngine,
    customers::{self, normalize_phone},
    purchases, shops,
    util::parse_uuid,
    wallet_transactions,
};

use super::{Engine, access::Capability, normalize_optional_text, normalize_required_name, with_tx};

/// A customer's account: wallet and every purchase with its totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatement {
    pub customer: Customer,
    pub wallet_balance_minor: i64,
    pub purchases: Vec<Purchase>,
    /// Totals over non-cancelled purchases.
    pub total_price_minor: i64,
    pub total_paid_minor: i64,
    pub outstanding_minor: i64,
}

fn required_phone(raw: &str) -> ResultEngine<String> {
    let phone = normalize_phone(raw);
    if phone.trim_start_matches('+').len() < 6 {
        return Err(EngineError::InvalidInput(
            "phone must contain at least 6 digits".to_string(),
        ));
    }
    Ok(phone)
}

impl Engine {
    pub(super) async fn find_customer_by_phone(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        phone: &str,
    ) -> ResultEngine<Option<customers::Model>> {
        customers::Entity::find()
            .filter(customers::Column::BusinessId.eq(business_id.to_string()))
            .filter(customers::Column::Phone.eq(phone.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Inserts a customer; the phone must be unique in the business.
    pub(super) async fn insert_customer(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        cmd: &NewCustomerCmd,
    ) -> ResultEngine<customers::Model> {
        let name = normalize_required_name(&cmd.name, "customer")?;
        let phone = required_phone(&cmd.phone)?;
        if self.find_customer_by_phone(db, business_id, &phone).await?.is_some() {
            return Err(EngineError::ExistingKey(phone));
        }
        if let Some(shop_id) = cmd.shop_id {
            shops::Entity::find_by_id(shop_id.to_string())
                .filter(shops::Column::BusinessId.eq(business_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("shop not exists".to_string()))?;
        }
        let customer = Customer {
            id: Uuid::new_v4(),
            business_id: parse_uuid(business_id, "business")?,
            shop_id: cmd.shop_id,
            name,
            phone,
            email: normalize_optional_text(cmd.email.as_deref()),
            address: normalize_optional_text(cmd.address.as_deref()),
            national_id: normalize_optional_text(cmd.national_id.as_deref()),
            wallet_balance_minor: 0,
            active: true,
            created_at: Utc::now(),
        };
        Ok(customers::ActiveModel::from(&customer).insert(db).await?)
    }

    pub async fn create_customer(
        &self,
        slug: &str,
        cmd: NewCustomerCmd,
        user_id: &str,
    ) -> ResultEngine<Customer> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageCustomers)
                .await?;
            let model = self.insert_customer(&db_tx, &business.id, &cmd).await?;
            Customer::try_from(model)
        })
    }

    pub async fn update_customer(
        &self,
        slug: &str,
        customer_id: Uuid,
        patch: CustomerPatch,
        user_id: &str,
    ) -> ResultEngine<Customer> {
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_required_name(n, "customer"))
            .transpose()?;
        let phone = patch.phone.as_deref().map(required_phone).transpose()?;

        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageCustomers)
                .await?;
            let model = self.require_customer(&db_tx, &business.id, customer_id).await?;
            if let Some(phone) = &phone
                && let Some(other) = self.find_customer_by_phone(&db_tx, &business.id, phone).await?
                && other.id != model.id
            {
                return Err(EngineError::ExistingKey(phone.clone()));
            }

            let mut active: customers::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(phone) = phone {
                active.phone = ActiveValue::Set(phone);
            }
            if let Some(email) = patch.email.as_deref() {
                active.email = ActiveValue::Set(normalize_optional_text(Some(email)));
            }
            if let Some(address) = patch.address.as_deref() {
                active.address = ActiveValue::Set(normalize_optional_text(Some(address)));
            }
            if let Some(national_id) = patch.national_id.as_deref() {
                active.national_id = ActiveValue::Set(normalize_optional_text(Some(national_id)));
            }
            Customer::try_from(active.update(&db_tx).await?)
        })
    }

    pub async fn customer(&self, slug: &str, customer_id: Uuid, user_id: &str) -> ResultEngine<Customer> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            Customer::try_from(self.require_customer(&db_tx, &business.id, customer_id).await?)
        })
    }

    /// Customers by name. `search` matches name, phone or national id.
    pub async fn list_customers(
        &self,
        slug: &str,
        search: Option<&str>,
        include_inactive: bool,
        user_id: &str,
    ) -> ResultEngine<Vec<Customer>> {
        let search = normalize_optional_text(search);
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let mut query = customers::Entity::find()
                .filter(customers::Column::BusinessId.eq(business.id))
                .order_by_asc(customers::Column::Name);
            if !include_inactive {
                query = query.filter(customers::Column::Active.eq(true));
            }
            if let Some(search) = &search {
                query = query.filter(
                    Condition::any()
                        .add(customers::Column::Name.contains(search))
                        .add(customers::Column::Phone.contains(search))
                        .add(customers::Column::NationalId.contains(search)),
                );
            }
            let rows = query.all(&db_tx).await?;
            rows.into_iter().map(Customer::try_from).collect()
        })
    }

    pub async fn set_customer_active(
        &self,
        slug: &str,
        customer_id: Uuid,
        active: bool,
        user_id: &str,
    ) -> ResultEngine<Customer> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageCustomers)
                .await?;
            let model = self.require_customer(&db_tx, &business.id, customer_id).await?;
            let mut active_model: customers::ActiveModel = model.into();
            active_model.active = ActiveValue::Set(active);
            Customer::try_from(active_model.update(&db_tx).await?)
        })
    }

    /// Deletes a customer with no history. Customers with purchases, wallet
    /// activity or a balance must be deactivated instead.
    pub async fn delete_customer(&self, slug: &str, customer_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::RemoveCustomers)
                .await?;
            let model = self.require_customer(&db_tx, &business.id, customer_id).await?;
            let purchases = purchases::Entity::find()
                .filter(purchases::Column::CustomerId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            let wallet_txs = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::CustomerId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if purchases > 0 || wallet_txs > 0 || model.wallet_balance_minor != 0 {
                return Err(EngineError::InvalidStatus(
                    "customer has purchases or wallet activity; deactivate instead".to_string(),
                ));
            }
            customers::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    pub async fn customer_statement(
        &self,
        slug: &str,
        customer_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<CustomerStatement> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let model = self.require_customer(&db_tx, &business.id, customer_id).await?;
            let rows = purchases::Entity::find()
                .filter(purchases::Column::CustomerId.eq(model.id.clone()))
                .order_by_desc(purchases::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let purchases = rows
                .into_iter()
                .map(Purchase::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let live = purchases
                .iter()
                .filter(|p| p.status != PurchaseStatus::Cancelled);
            let (total_price_minor, total_paid_minor, outstanding_minor) =
                live.fold((0, 0, 0), |(price, paid, owed), p| {
                    (
                        price + p.total_price_minor,
                        paid + p.total_paid_minor,
                        owed + p.outstanding_minor,
                    )
                });
            let customer = Customer::try_from(model)?;
            Ok(CustomerStatement {
                wallet_balance_minor: customer.wallet_balance_minor,
                customer,
                purchases,
                total_price_minor,
                total_paid_minor,
                outstanding_minor,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_phones_are_rejected() {
        assert!(required_phone("12-34").is_err());
        assert_eq!(required_phone("+233 24 555 0101").unwrap(), "+233245550101");
    }
}
