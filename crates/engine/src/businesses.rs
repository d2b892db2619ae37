//! A `Business` is the tenant: it owns shops, customers, purchases and
//! collectors. Every route is scoped by the business slug.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError,
    util::{model_currency, parse_uuid},
};

/// Days a past-due installment may stay unpaid before the purchase is
/// declared defaulted.
pub const DEFAULT_AFTER_DAYS: i64 = 90;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: String,
    pub currency: Currency,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub default_after_days: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub owner_id: String,
    pub currency: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub default_after_days: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Business {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "business")?,
            currency: model_currency(&model.currency)?,
            name: model.name,
            slug: model.slug,
            owner_id: model.owner_id,
            phone: model.phone,
            email: model.email,
            address: model.address,
            active: model.active,
            default_after_days: model.default_after_days,
            created_at: model.created_at,
        })
    }
}

impl From<&Business> for ActiveModel {
    fn from(value: &Business) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            slug: ActiveValue::Set(value.slug.clone()),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            phone: ActiveValue::Set(value.phone.clone()),
            email: ActiveValue::Set(value.email.clone()),
            address: ActiveValue::Set(value.address.clone()),
            active: ActiveValue::Set(value.active),
            default_after_days: ActiveValue::Set(value.default_after_days),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
