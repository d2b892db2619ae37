use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, NewTicketCmd, ResultEngine, Ticket, TicketMessage, TicketStatus,
    ticket_messages, tickets, util::parse_uuid,
};

use super::{
    Access, AccessRole, Engine, access::Capability, normalize_required_text, with_tx,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    /// Oldest first.
    pub messages: Vec<TicketMessage>,
}

fn require_support(access: &Access) -> ResultEngine<()> {
    if !access.allows(Capability::Support) {
        return Err(EngineError::Forbidden(format!(
            "{} cannot use support tickets",
            access.role
        )));
    }
    Ok(())
}

impl Engine {
    async fn load_ticket_detail(
        &self,
        db: &DatabaseTransaction,
        model: tickets::Model,
    ) -> ResultEngine<TicketDetail> {
        let messages = ticket_messages::Entity::find()
            .filter(ticket_messages::Column::TicketId.eq(model.id.clone()))
            .order_by_asc(ticket_messages::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(TicketMessage::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(TicketDetail {
            ticket: Ticket::try_from(model)?,
            messages,
        })
    }

    /// Opens a support ticket for the business.
    ///
    /// Suspended businesses may still open tickets.
    pub async fn open_ticket(
        &self,
        slug: &str,
        cmd: NewTicketCmd,
        user_id: &str,
    ) -> ResultEngine<Ticket> {
        let subject = normalize_required_text(&cmd.subject, "subject")?;
        let description = normalize_required_text(&cmd.description, "description")?;
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            require_support(&access)?;
            let now = Utc::now();
            let ticket = Ticket {
                id: Uuid::new_v4(),
                business_id: parse_uuid(&business.id, "business")?,
                subject,
                description,
                priority: cmd.priority,
                status: TicketStatus::Open,
                created_by: user_id.to_string(),
                created_at: now,
                updated_at: now,
                resolved_at: None,
            };
            tickets::ActiveModel::from(&ticket).insert(&db_tx).await?;
            tracing::info!(
                business = %business.slug,
                ticket = %ticket.id,
                priority = %ticket.priority,
                "ticket opened"
            );
            Ok(ticket)
        })
    }

    /// Tickets of one business, newest first.
    pub async fn list_tickets(
        &self,
        slug: &str,
        status: Option<TicketStatus>,
        user_id: &str,
    ) -> ResultEngine<Vec<Ticket>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            require_support(&access)?;
            let mut query = tickets::Entity::find()
                .filter(tickets::Column::BusinessId.eq(business.id))
                .order_by_desc(tickets::Column::CreatedAt);
            if let Some(status) = status {
                query = query.filter(tickets::Column::Status.eq(status.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Ticket::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Tickets of every business (platform admin).
    pub async fn list_all_tickets(
        &self,
        status: Option<TicketStatus>,
        user_id: &str,
    ) -> ResultEngine<Vec<Ticket>> {
        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let mut query = tickets::Entity::find().order_by_desc(tickets::Column::CreatedAt);
            if let Some(status) = status {
                query = query.filter(tickets::Column::Status.eq(status.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Ticket::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn ticket_detail(
        &self,
        slug: &str,
        ticket_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TicketDetail> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            require_support(&access)?;
            let model = self.require_ticket(&db_tx, &business.id, ticket_id).await?;
            self.load_ticket_detail(&db_tx, model).await
        })
    }

    /// Appends a message to the ticket thread. Closed tickets are read-only.
    pub async fn add_ticket_message(
        &self,
        slug: &str,
        ticket_id: Uuid,
        body: &str,
        user_id: &str,
    ) -> ResultEngine<TicketDetail> {
        let body = normalize_required_text(body, "message")?;
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            require_support(&access)?;
            let model = self.require_ticket(&db_tx, &business.id, ticket_id).await?;
            if TicketStatus::try_from(model.status.as_str())? == TicketStatus::Closed {
                return Err(EngineError::InvalidStatus("ticket is closed".to_string()));
            }
            let now = Utc::now();
            let message = TicketMessage {
                id: Uuid::new_v4(),
                ticket_id,
                author: user_id.to_string(),
                body,
                created_at: now,
            };
            ticket_messages::ActiveModel::from(&message)
                .insert(&db_tx)
                .await?;
            let mut row: tickets::ActiveModel = model.into();
            row.updated_at = ActiveValue::Set(now);
            let model = row.update(&db_tx).await?;
            self.load_ticket_detail(&db_tx, model).await
        })
    }

    /// Platform admins may move a ticket anywhere; business owners may only
    /// close it.
    pub async fn change_ticket_status(
        &self,
        slug: &str,
        ticket_id: Uuid,
        status: TicketStatus,
        user_id: &str,
    ) -> ResultEngine<Ticket> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            if !matches!(access.role, AccessRole::PlatformAdmin | AccessRole::Owner) {
                return Err(EngineError::Forbidden(
                    "only the owner can close tickets".to_string(),
                ));
            }
            let model = self.require_ticket(&db_tx, &business.id, ticket_id).await?;
            let mut ticket = Ticket::try_from(model)?;
            ticket
                .status
                .check_transition(status, access.is_platform_admin())?;

            let now = Utc::now();
            ticket.resolved_at = if status.is_settled() {
                ticket.resolved_at.or(Some(now))
            } else {
                None
            };
            ticket.status = status;
            ticket.updated_at = now;
            tickets::ActiveModel::from(&ticket).update(&db_tx).await?;
            tracing::info!(ticket = %ticket.id, status = %status, "ticket status changed");
            Ok(ticket)
        })
    }
}
