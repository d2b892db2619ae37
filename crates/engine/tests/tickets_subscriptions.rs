mod common;

use chrono::{TimeDelta, Utc};
use engine::{EngineError, NewTicketCmd, Plan, SubscriptionStatus, TicketPriority, TicketStatus};

use common::{ADMIN, OWNER, add_user, fixture};

#[tokio::test]
async fn ticket_lifecycle() {
    let fx = fixture().await;
    let ticket = fx
        .engine
        .open_ticket(
            &fx.slug,
            NewTicketCmd::new("Receipts", "Receipt numbers skip").priority(TicketPriority::High),
            OWNER,
        )
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);

    let err = fx
        .engine
        .open_ticket(&fx.slug, NewTicketCmd::new("  ", "body"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let detail = fx
        .engine
        .add_ticket_message(&fx.slug, ticket.id, "Any news?", OWNER)
        .await
        .unwrap();
    assert_eq!(detail.messages.len(), 1);
    assert_eq!(detail.messages[0].author, OWNER);

    let err = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::Resolved, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let ticket = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::Resolved, ADMIN)
        .await
        .unwrap();
    assert!(ticket.resolved_at.is_some());
    let err = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::Resolved, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    let ticket = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::Closed, OWNER)
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    let err = fx
        .engine
        .add_ticket_message(&fx.slug, ticket.id, "One more thing", OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
    let err = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::InProgress, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    let ticket = fx
        .engine
        .change_ticket_status(&fx.slug, ticket.id, TicketStatus::Open, ADMIN)
        .await
        .unwrap();
    assert!(ticket.resolved_at.is_none());

    let open = fx
        .engine
        .list_all_tickets(Some(TicketStatus::Open), ADMIN)
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    let err = fx.engine.list_all_tickets(None, OWNER).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(
        fx.engine.list_tickets(&fx.slug, None, OWNER).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn collectors_cannot_open_tickets() {
    let fx = fixture().await;
    add_user(&fx.engine, "kojo").await;
    fx.engine
        .create_collector(&fx.slug, "kojo", "Kojo", None, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .open_ticket(&fx.slug, NewTicketCmd::new("Hi", "Help"), "kojo")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn plans_limit_shops_and_collectors() {
    let fx = fixture().await;
    let current = fx
        .engine
        .current_subscription(&fx.slug, OWNER)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.plan, Plan::Trial);

    let err = fx
        .engine
        .create_shop(&fx.slug, "Second", None, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PlanLimitReached(_)));

    add_user(&fx.engine, "kojo").await;
    add_user(&fx.engine, "abena").await;
    fx.engine
        .create_collector(&fx.slug, "kojo", "Kojo", None, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .create_collector(&fx.slug, "abena", "Abena", None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PlanLimitReached(_)));

    let err = fx
        .engine
        .set_subscription(&fx.slug, Plan::Standard, 6, 60_000, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    fx.engine
        .set_subscription(&fx.slug, Plan::Standard, 6, 60_000, ADMIN)
        .await
        .unwrap();
    fx.engine
        .create_shop(&fx.slug, "Second", None, None, OWNER)
        .await
        .unwrap();

    let history = fx.engine.list_subscriptions(&fx.slug, OWNER).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Cancelled)
            .count(),
        1
    );

    fx.engine.cancel_subscription(&fx.slug, ADMIN).await.unwrap();
    let err = fx
        .engine
        .create_shop(&fx.slug, "Third", None, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SubscriptionInactive(_)));
}

#[tokio::test]
async fn ended_subscriptions_expire() {
    let fx = fixture().await;
    assert_eq!(fx.engine.expire_subscriptions(Utc::now()).await.unwrap(), 0);
    let later = Utc::now() + TimeDelta::days(15);
    assert_eq!(fx.engine.expire_subscriptions(later).await.unwrap(), 1);
    let history = fx.engine.list_subscriptions(&fx.slug, OWNER).await.unwrap();
    assert_eq!(history[0].status, SubscriptionStatus::Expired);
}
