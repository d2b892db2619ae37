mod common;

use engine::{
    EngineError, Frequency, NewPurchaseCmd, PurchaseListFilter, PurchaseStatus, PurchaseType,
};

use common::{ADMIN, OWNER, SOFA_PRICE, add_user, fixture, today};

async fn two_sales(fx: &common::Fixture) {
    fx.engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 1),
            OWNER,
        )
        .await
        .unwrap();
    fx.engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(20_000)
                .installments(4, Frequency::Monthly),
            OWNER,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn dashboard_sums_sales_and_collections() {
    let fx = fixture().await;
    two_sales(&fx).await;
    fx.engine
        .deposit(&fx.slug, fx.customer_id, 5_000, Some("MM-7"), None, OWNER)
        .await
        .unwrap();

    let dashboard = fx
        .engine
        .business_dashboard(&fx.slug, None, None, None, OWNER)
        .await
        .unwrap();
    assert_eq!(dashboard.purchase_count, 2);
    assert_eq!(dashboard.purchases_by_status[PurchaseStatus::Completed.as_str()], 1);
    assert_eq!(dashboard.purchases_by_status[PurchaseStatus::Active.as_str()], 1);
    assert_eq!(dashboard.total_sales_minor, 2 * SOFA_PRICE);
    assert_eq!(dashboard.collected_minor, SOFA_PRICE + 20_000);
    assert_eq!(dashboard.outstanding_minor, 80_000);
    assert_eq!(dashboard.overdue_minor, 0);
    assert_eq!(dashboard.collection_rate, 60.0);
    assert_eq!(dashboard.pending_deposits_count, 1);
    assert_eq!(dashboard.pending_deposits_minor, 5_000);
    assert_eq!(dashboard.wallet_balances_minor, 0);
    assert_eq!(dashboard.customer_count, 1);
    assert_eq!(dashboard.low_stock_products, 0);
    assert_eq!(dashboard.shops.len(), 1);
    assert_eq!(dashboard.shops[0].purchase_count, 2);
    assert_eq!(dashboard.shops[0].outstanding_minor, 80_000);

    let tomorrow = chrono::Utc::now() + chrono::TimeDelta::days(1);
    let later = fx
        .engine
        .business_dashboard(&fx.slug, Some(&fx.shop), Some(tomorrow), None, OWNER)
        .await
        .unwrap();
    assert_eq!(later.purchase_count, 0);
    assert_eq!(later.collected_minor, 0);
    assert_eq!(later.outstanding_minor, 80_000);

    let err = fx
        .engine
        .business_dashboard(&fx.slug, None, Some(tomorrow), Some(tomorrow), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn reports_need_permission() {
    let fx = fixture().await;
    add_user(&fx.engine, "esi").await;
    fx.engine
        .upsert_member(&fx.slug, "esi", engine::MemberRole::Staff, None, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .business_dashboard(&fx.slug, None, None, None, "esi")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx
        .engine
        .export_purchases_csv(&fx.slug, &PurchaseListFilter::default(), "esi")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx.engine.platform_analytics(OWNER).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn platform_analytics_groups_by_currency() {
    let fx = fixture().await;
    two_sales(&fx).await;
    let currency = fx
        .engine
        .business_by_slug(&fx.slug, OWNER)
        .await
        .unwrap()
        .0
        .currency
        .to_string();

    let analytics = fx.engine.platform_analytics(ADMIN).await.unwrap();
    assert_eq!(analytics.businesses_total, 1);
    assert_eq!(analytics.businesses_active, 1);
    assert_eq!(analytics.subscriptions_by_plan["trial"], 1);
    assert_eq!(analytics.purchase_count, 2);
    assert_eq!(analytics.purchase_volume_minor[&currency], 2 * SOFA_PRICE);
    assert_eq!(analytics.collected_minor[&currency], SOFA_PRICE + 20_000);
    assert_eq!(analytics.open_tickets, 0);
}

#[tokio::test]
async fn export_writes_one_row_per_purchase() {
    let fx = fixture().await;
    two_sales(&fx).await;
    let csv = fx
        .engine
        .export_purchases_csv(&fx.slug, &PurchaseListFilter::default(), OWNER)
        .await
        .unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("purchase_id,created_at,shop,customer_name"));
    assert!(lines.iter().any(|l| l.contains(",credit,active,1000.00,200.00,800.00,4,")));
    assert!(lines.iter().any(|l| l.contains(",cash,completed,1000.00,1000.00,0.00,0,")));

    let filter = PurchaseListFilter {
        purchase_type: Some(PurchaseType::Cash),
        ..PurchaseListFilter::default()
    };
    let csv = fx
        .engine
        .export_purchases_csv(&fx.slug, &filter, OWNER)
        .await
        .unwrap();
    assert_eq!(csv.lines().count(), 2);
}

#[tokio::test]
async fn import_keeps_good_rows_and_reports_bad_ones() {
    let fx = fixture().await;
    let csv = "\
customer_phone,customer_name,sku,quantity,purchase_type,down_payment,installment_count,frequency
020 111 2222,Kofi Boateng,SOFA-01,1,layaway,100.00,2,weekly
020 111 2222,Kofi Boateng,NOPE,1,cash,,,
024 000 1111,Ama Mensah,SOFA-01,1,cash,,,
";
    let report = fx
        .engine
        .import_purchases_csv(&fx.slug, &fx.shop, csv, OWNER)
        .await
        .unwrap();
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, 3);

    let layaway = fx
        .engine
        .purchase_detail(&fx.slug, report.created[0], OWNER)
        .await
        .unwrap();
    assert_eq!(layaway.purchase.purchase_type, PurchaseType::Layaway);
    assert_eq!(layaway.purchase.outstanding_minor, 90_000);
    assert_eq!(layaway.installments.len(), 2);
    assert_eq!(layaway.customer.name, "Kofi Boateng");

    let cash = fx
        .engine
        .purchase_detail(&fx.slug, report.created[1], OWNER)
        .await
        .unwrap();
    assert_eq!(cash.customer.id, fx.customer_id);

    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert_eq!(product.stock_quantity, 3);

    let err = fx
        .engine
        .import_purchases_csv(&fx.slug, &fx.shop, "customer_phone,sku\n1,2\n", OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}
