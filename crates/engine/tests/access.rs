mod common;

use engine::{
    AccessRole, EngineError, Frequency, MemberRole, NewCustomerCmd, NewPurchaseCmd, PaymentCmd,
    PaymentMethod, PaymentStatus, Plan, PurchaseType,
};

use common::{ADMIN, OWNER, add_user, fixture, today};

#[tokio::test]
async fn strangers_do_not_see_the_business() {
    let fx = fixture().await;
    add_user(&fx.engine, "eve").await;
    let err = fx.engine.business_by_slug(&fx.slug, "eve").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(fx.engine.list_businesses("eve").await.unwrap().is_empty());

    let (_, access) = fx.engine.business_by_slug(&fx.slug, ADMIN).await.unwrap();
    assert_eq!(access.role, AccessRole::PlatformAdmin);
}

#[tokio::test]
async fn staff_sell_but_do_not_supervise() {
    let fx = fixture().await;
    add_user(&fx.engine, "esi").await;
    fx.engine
        .upsert_member(&fx.slug, "esi", MemberRole::Staff, None, OWNER)
        .await
        .unwrap();

    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(10_000)
                .installments(3, Frequency::Monthly),
            "esi",
        )
        .await
        .unwrap();
    assert_eq!(detail.purchase.created_by, "esi");

    let err = fx
        .engine
        .cancel_purchase(&fx.slug, detail.purchase.id, "oops", "esi")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx.engine.list_collectors(&fx.slug, "esi").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx
        .engine
        .delete_customer(&fx.slug, fx.customer_id, "esi")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .upsert_member(&fx.slug, OWNER, MemberRole::Staff, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRole(_)));
}

#[tokio::test]
async fn pinned_members_stay_in_their_shop() {
    let fx = fixture().await;
    fx.engine
        .set_subscription(&fx.slug, Plan::Standard, 12, 120_000, ADMIN)
        .await
        .unwrap();
    let annex = fx
        .engine
        .create_shop(&fx.slug, "Annex", Some("Market Street"), None, OWNER)
        .await
        .unwrap();
    add_user(&fx.engine, "yaw").await;
    fx.engine
        .upsert_member(&fx.slug, "yaw", MemberRole::ShopAdmin, Some(annex.id), OWNER)
        .await
        .unwrap();

    assert!(
        fx.engine
            .list_products(&fx.slug, &annex.slug, false, None, "yaw")
            .await
            .unwrap()
            .is_empty()
    );
    let err = fx
        .engine
        .list_products(&fx.slug, &fx.shop, false, None, "yaw")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 1),
            "yaw",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn collectors_record_pending_payments_on_assigned_purchases() {
    let fx = fixture().await;
    add_user(&fx.engine, "kojo").await;
    let collector = fx
        .engine
        .create_collector(&fx.slug, "kojo", "Kojo Boateng", Some("0244556677"), OWNER)
        .await
        .unwrap();

    let assigned = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .installments(4, Frequency::Weekly)
                .collector(collector.id),
            OWNER,
        )
        .await
        .unwrap();
    let other = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .installments(4, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();

    let mine = fx.engine.collector_purchases(&fx.slug, "kojo").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].purchase.id, assigned.purchase.id);
    assert!(mine[0].next_due_date.is_some());

    let err = fx
        .engine
        .purchase_detail(&fx.slug, other.purchase.id, "kojo")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(assigned.purchase.id, 5_000, PaymentMethod::Wallet),
            "kojo",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let payment = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(assigned.purchase.id, 25_000, PaymentMethod::Cash),
            "kojo",
        )
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.collector_id, Some(collector.id));

    // Pending money already counts against what can still be collected.
    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(assigned.purchase.id, 75_001, PaymentMethod::Cash),
            "kojo",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let detail = fx
        .engine
        .purchase_detail(&fx.slug, assigned.purchase.id, OWNER)
        .await
        .unwrap();
    assert_eq!(detail.purchase.outstanding_minor, 100_000);

    let pending = fx.engine.pending_payments(&fx.slug, None, OWNER).await.unwrap();
    assert_eq!(pending.len(), 1);
    let confirmed = fx
        .engine
        .confirm_payment(&fx.slug, payment.id, OWNER)
        .await
        .unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Confirmed);
    assert_eq!(confirmed.confirmed_by.as_deref(), Some(OWNER));

    let detail = fx
        .engine
        .purchase_detail(&fx.slug, assigned.purchase.id, "kojo")
        .await
        .unwrap();
    assert_eq!(detail.purchase.outstanding_minor, 75_000);

    let rejected = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(assigned.purchase.id, 5_000, PaymentMethod::Cash),
            "kojo",
        )
        .await
        .unwrap();
    fx.engine
        .reject_payment(&fx.slug, rejected.id, "no cash handed in", OWNER)
        .await
        .unwrap();

    let report = fx
        .engine
        .collector_report(&fx.slug, collector.id, None, None, "kojo")
        .await
        .unwrap();
    assert_eq!(report.assigned_purchases, 1);
    assert_eq!(report.portfolio_outstanding_minor, 75_000);
    assert_eq!(report.collected_minor, 25_000);
    assert_eq!(report.rejected_count, 1);
    assert_eq!(report.pending_count, 0);

    // Deactivated collectors lose their rights.
    fx.engine
        .set_collector_active(&fx.slug, collector.id, false, OWNER)
        .await
        .unwrap();
    let err = fx.engine.collector_purchases(&fx.slug, "kojo").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn suspended_businesses_are_read_only() {
    let fx = fixture().await;
    fx.engine
        .set_business_active(&fx.slug, false, ADMIN)
        .await
        .unwrap();

    let err = fx
        .engine
        .create_customer(&fx.slug, NewCustomerCmd::new("Kwame", "0209998888"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert!(fx.engine.customer(&fx.slug, fx.customer_id, OWNER).await.is_ok());

    let err = fx
        .engine
        .set_business_active(&fx.slug, true, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
