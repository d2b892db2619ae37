mod common;

use engine::{
    BusinessPatch, DEFAULT_AFTER_DAYS, DocumentKind, EngineError, Frequency, MemberRole,
    NewPurchaseCmd, PurchaseType,
};

use common::{OWNER, SOFA_PRICE, add_user, fixture, today};

#[tokio::test]
async fn business_settings_are_validated() {
    let fx = fixture().await;
    let business = fx
        .engine
        .update_business(
            &fx.slug,
            BusinessPatch {
                name: Some("Acme Home".to_string()),
                phone: Some("030 222 3333".to_string()),
                default_after_days: Some(30),
                ..BusinessPatch::default()
            },
            OWNER,
        )
        .await
        .unwrap();
    assert_eq!(business.name, "Acme Home");
    assert_eq!(business.slug, fx.slug);
    assert_eq!(business.default_after_days, 30);

    for days in [0, 3651] {
        let err = fx
            .engine
            .update_business(
                &fx.slug,
                BusinessPatch {
                    default_after_days: Some(days),
                    ..BusinessPatch::default()
                },
                OWNER,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
    let (business, _) = fx.engine.business_by_slug(&fx.slug, OWNER).await.unwrap();
    assert_eq!(business.default_after_days, 30);
    assert_ne!(business.default_after_days, DEFAULT_AFTER_DAYS);

    add_user(&fx.engine, "esi").await;
    fx.engine
        .upsert_member(&fx.slug, "esi", MemberRole::ShopAdmin, None, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .update_business(&fx.slug, BusinessPatch::default(), "esi")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn the_owner_cannot_be_removed() {
    let fx = fixture().await;
    add_user(&fx.engine, "yaw").await;
    fx.engine
        .upsert_member(&fx.slug, "yaw", MemberRole::Staff, None, OWNER)
        .await
        .unwrap();

    let err = fx
        .engine
        .remove_member(&fx.slug, OWNER, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRole(_)));

    fx.engine.remove_member(&fx.slug, "yaw", OWNER).await.unwrap();
    let err = fx
        .engine
        .remove_member(&fx.slug, "yaw", OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = fx
        .engine
        .business_by_slug(&fx.slug, "yaw")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn collectors_are_assigned_and_unassigned() {
    let fx = fixture().await;
    add_user(&fx.engine, "kojo").await;
    let collector = fx
        .engine
        .create_collector(&fx.slug, "kojo", "Kojo Boateng", None, OWNER)
        .await
        .unwrap();
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .installments(2, Frequency::Monthly),
            OWNER,
        )
        .await
        .unwrap();
    let purchase_id = detail.purchase.id;
    assert!(fx.engine.collector_purchases(&fx.slug, "kojo").await.unwrap().is_empty());

    let purchase = fx
        .engine
        .assign_collector(&fx.slug, purchase_id, Some(collector.id), OWNER)
        .await
        .unwrap();
    assert_eq!(purchase.collector_id, Some(collector.id));
    let mine = fx.engine.collector_purchases(&fx.slug, "kojo").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].purchase.id, purchase_id);

    let purchase = fx
        .engine
        .assign_collector(&fx.slug, purchase_id, None, OWNER)
        .await
        .unwrap();
    assert_eq!(purchase.collector_id, None);
    assert!(fx.engine.collector_purchases(&fx.slug, "kojo").await.unwrap().is_empty());

    fx.engine
        .set_collector_active(&fx.slug, collector.id, false, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .assign_collector(&fx.slug, purchase_id, Some(collector.id), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
}

#[tokio::test]
async fn documents_carry_what_a_printout_needs() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(20_000)
                .installments(4, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    let invoice = detail
        .documents
        .iter()
        .find(|d| d.kind == DocumentKind::Invoice)
        .unwrap();
    let receipt = detail
        .documents
        .iter()
        .find(|d| d.kind == DocumentKind::Receipt)
        .unwrap();

    let view = fx.engine.document(&fx.slug, invoice.id, OWNER).await.unwrap();
    assert_eq!(view.document.number, "INV-000001");
    assert_eq!(view.business.slug, fx.slug);
    assert_eq!(view.shop.slug, fx.shop);
    assert_eq!(view.customer.name, "Ama Mensah");
    assert_eq!(view.purchase.total_price_minor, SOFA_PRICE);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product_name, "Sofa");
    assert_eq!(view.installments.len(), 4);
    assert!(view.payment.is_none());

    let view = fx.engine.document(&fx.slug, receipt.id, OWNER).await.unwrap();
    assert_eq!(view.document.number, "RCT-000001");
    let payment = view.payment.unwrap();
    assert_eq!(payment.amount_minor, 20_000);
    assert_eq!(view.document.amount_minor, 20_000);

    let err = fx
        .engine
        .document(&fx.slug, uuid::Uuid::new_v4(), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
