//! Customers of a business and their prepaid wallet balance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{parse_opt_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub business_id: Uuid,
    /// Shop where the customer was registered, if any.
    pub shop_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    /// Sum of every confirmed wallet transaction, in minor units.
    pub wallet_balance_minor: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub shop_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub wallet_balance_minor: i64,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Customer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "customer")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            shop_id: parse_opt_uuid(model.shop_id.as_deref(), "shop")?,
            name: model.name,
            phone: model.phone,
            email: model.email,
            address: model.address,
            national_id: model.national_id,
            wallet_balance_minor: model.wallet_balance_minor,
            active: model.active,
            created_at: model.created_at,
        })
    }
}

impl From<&Customer> for ActiveModel {
    fn from(value: &Customer) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            shop_id: ActiveValue::Set(value.shop_id.map(|id| id.to_string())),
            name: ActiveValue::Set(value.name.clone()),
            phone: ActiveValue::Set(value.phone.clone()),
            email: ActiveValue::Set(value.email.clone()),
            address: ActiveValue::Set(value.address.clone()),
            national_id: ActiveValue::Set(value.national_id.clone()),
            wallet_balance_minor: ActiveValue::Set(value.wallet_balance_minor),
            active: ActiveValue::Set(value.active),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

/// Normalizes a phone number for uniqueness checks: keeps a leading `+` and
/// the digits.
pub(crate) fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(char::is_ascii_digit));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization_strips_formatting() {
        assert_eq!(normalize_phone(" +233 (24) 555-0101 "), "+233245550101");
        assert_eq!(normalize_phone("024 555 0101"), "0245550101");
    }
}
