use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ticket_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ticket_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TicketMessage {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ticket message")?,
            ticket_id: parse_uuid(&model.ticket_id, "ticket")?,
            author: model.author,
            body: model.body,
            created_at: model.created_at,
        })
    }
}

impl From<&TicketMessage> for ActiveModel {
    fn from(value: &TicketMessage) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ticket_id: ActiveValue::Set(value.ticket_id.to_string()),
            author: ActiveValue::Set(value.author.clone()),
            body: ActiveValue::Set(value.body.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
