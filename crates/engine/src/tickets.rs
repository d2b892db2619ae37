//! Support tickets raised by businesses and handled by platform admins.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{db_enum, parse_uuid},
};

db_enum! {
    pub enum TicketPriority("ticket priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

db_enum! {
    pub enum TicketStatus("ticket status") {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

impl TicketStatus {
    /// Checks a status change requested by `platform_admin` (true) or by a
    /// business owner (false).
    pub fn check_transition(self, to: Self, platform_admin: bool) -> ResultEngine<()> {
        if self == to {
            return Err(EngineError::InvalidStatus(format!("ticket already {to}")));
        }
        if self == Self::Closed && to != Self::Open {
            return Err(EngineError::InvalidStatus(
                "closed tickets can only be reopened".to_string(),
            ));
        }
        if !platform_admin && to != Self::Closed {
            return Err(EngineError::Forbidden(
                "only platform admins can change ticket status".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub business_id: Uuid,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Ticket {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ticket")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            subject: model.subject,
            description: model.description,
            priority: TicketPriority::try_from(model.priority.as_str())?,
            status: TicketStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            resolved_at: model.resolved_at,
        })
    }
}

impl From<&Ticket> for ActiveModel {
    fn from(value: &Ticket) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.to_string()),
            subject: ActiveValue::Set(value.subject.clone()),
            description: ActiveValue::Set(value.description.clone()),
            priority: ActiveValue::Set(value.priority.as_str().to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            resolved_at: ActiveValue::Set(value.resolved_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_may_only_close() {
        assert!(TicketStatus::Open.check_transition(TicketStatus::Closed, false).is_ok());
        assert!(matches!(
            TicketStatus::Open.check_transition(TicketStatus::Resolved, false),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn closed_tickets_only_reopen() {
        assert!(TicketStatus::Closed.check_transition(TicketStatus::Open, true).is_ok());
        assert!(matches!(
            TicketStatus::Closed.check_transition(TicketStatus::InProgress, true),
            Err(EngineError::InvalidStatus(_))
        ));
        assert!(matches!(
            TicketStatus::Closed.check_transition(TicketStatus::Open, false),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn same_status_is_rejected() {
        assert!(matches!(
            TicketStatus::Resolved.check_transition(TicketStatus::Resolved, true),
            Err(EngineError::InvalidStatus(_))
        ));
    }
}
