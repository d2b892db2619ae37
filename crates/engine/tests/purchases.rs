mod common;

use engine::{
    DocumentKind, EngineError, Frequency, InstallmentStatus, NewPurchaseCmd, PaymentCmd,
    PaymentMethod, PurchaseListFilter, PurchaseStatus, PurchaseType,
};

use common::{OWNER, SOFA_PRICE, days_ago, fixture, today};

#[tokio::test]
async fn cash_purchase_completes_with_invoice_and_receipt() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 2),
            OWNER,
        )
        .await
        .unwrap();

    assert_eq!(detail.purchase.status, PurchaseStatus::Completed);
    assert_eq!(detail.purchase.total_price_minor, 2 * SOFA_PRICE);
    assert_eq!(detail.purchase.total_paid_minor, 2 * SOFA_PRICE);
    assert_eq!(detail.purchase.outstanding_minor, 0);
    assert!(detail.purchase.completed_at.is_some());
    assert!(detail.installments.is_empty());
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].line_total_minor, 2 * SOFA_PRICE);

    let kinds: Vec<DocumentKind> = detail.documents.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DocumentKind::Invoice, DocumentKind::Receipt]);
    assert_eq!(detail.documents[0].number, "INV-000001");
    assert_eq!(detail.documents[1].number, "RCT-000001");

    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert_eq!(product.stock_quantity, 3);
}

#[tokio::test]
async fn credit_payments_fill_installments_in_order() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(10_000)
                .installments(3, Frequency::Monthly),
            OWNER,
        )
        .await
        .unwrap();
    let purchase_id = detail.purchase.id;
    assert_eq!(detail.purchase.status, PurchaseStatus::Active);
    assert_eq!(detail.purchase.outstanding_minor, 90_000);
    let amounts: Vec<i64> = detail.installments.iter().map(|i| i.amount_minor).collect();
    assert_eq!(amounts, vec![30_000, 30_000, 30_000]);
    assert!(detail.installments.iter().all(|i| i.paid_minor == 0));

    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 45_000, PaymentMethod::MobileMoney).reference("MM-1"),
            OWNER,
        )
        .await
        .unwrap();
    let detail = fx.engine.purchase_detail(&fx.slug, purchase_id, OWNER).await.unwrap();
    assert_eq!(detail.installments[0].status, InstallmentStatus::Paid);
    assert_eq!(detail.installments[1].status, InstallmentStatus::Partial);
    assert_eq!(detail.installments[1].paid_minor, 15_000);
    assert_eq!(detail.installments[2].status, InstallmentStatus::Pending);
    assert_eq!(detail.purchase.outstanding_minor, 45_000);
    assert_eq!(
        detail.purchase.total_paid_minor + detail.purchase.outstanding_minor,
        detail.purchase.total_price_minor
    );

    let err = fx
        .engine
        .issue_waybill(&fx.slug, purchase_id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 45_000, PaymentMethod::Cash),
            OWNER,
        )
        .await
        .unwrap();
    let detail = fx.engine.purchase_detail(&fx.slug, purchase_id, OWNER).await.unwrap();
    assert_eq!(detail.purchase.status, PurchaseStatus::Completed);
    assert!(detail.installments.iter().all(|i| i.status == InstallmentStatus::Paid));
    // Invoice, down payment receipt and two payment receipts.
    assert_eq!(detail.documents.len(), 4);

    let waybill = fx.engine.issue_waybill(&fx.slug, purchase_id, OWNER).await.unwrap();
    assert_eq!(waybill.number, "WB-000001");
    let err = fx
        .engine
        .issue_waybill(&fx.slug, purchase_id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn payments_cannot_exceed_outstanding_or_reuse_references() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Layaway, today())
                .line(fx.product_id, 1)
                .down_payment(20_000)
                .installments(4, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    let purchase_id = detail.purchase.id;

    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 80_001, PaymentMethod::Cash),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 1_000, PaymentMethod::BankTransfer).reference("BT-9"),
            OWNER,
        )
        .await
        .unwrap();
    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 1_000, PaymentMethod::BankTransfer).reference("BT-9"),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn rejected_sale_leaves_stock_untouched() {
    let fx = fixture().await;
    let err = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 3)
                .line(fx.product_id, 3),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock(_)));

    let err = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(SOFA_PRICE)
                .installments(3, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert_eq!(product.stock_quantity, 5);
    let history = fx
        .engine
        .stock_history(&fx.slug, fx.product_id, 10, OWNER)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn cancel_restocks_and_refunds_to_wallet() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 2)
                .down_payment(25_000)
                .installments(5, Frequency::Biweekly),
            OWNER,
        )
        .await
        .unwrap();
    let purchase_id = detail.purchase.id;

    let cancelled = fx
        .engine
        .cancel_purchase(&fx.slug, purchase_id, "customer changed mind", OWNER)
        .await
        .unwrap();
    assert_eq!(cancelled.purchase.status, PurchaseStatus::Cancelled);
    assert_eq!(
        cancelled.purchase.cancel_reason.as_deref(),
        Some("customer changed mind")
    );
    assert_eq!(
        cancelled.purchase.total_paid_minor + cancelled.purchase.outstanding_minor,
        cancelled.purchase.total_price_minor
    );

    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert_eq!(product.stock_quantity, 5);
    let wallet = fx
        .engine
        .wallet(&fx.slug, fx.customer_id, 10, OWNER)
        .await
        .unwrap();
    assert_eq!(wallet.balance_minor, 25_000);

    let err = fx
        .engine
        .cancel_purchase(&fx.slug, purchase_id, "again", OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(purchase_id, 1_000, PaymentMethod::Cash),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
}

#[tokio::test]
async fn refresh_moves_late_purchases_to_overdue_and_defaulted() {
    let fx = fixture().await;
    let late = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, days_ago(10))
                .line(fx.product_id, 1)
                .installments(4, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    let abandoned = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, days_ago(200))
                .line(fx.product_id, 1)
                .installments(2, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    assert_eq!(late.purchase.status, PurchaseStatus::Active);
    assert_eq!(abandoned.purchase.status, PurchaseStatus::Active);

    let summary = fx
        .engine
        .refresh_statuses(&fx.slug, today(), OWNER)
        .await
        .unwrap();
    assert_eq!(summary.installments_overdue, 3);
    assert_eq!(summary.purchases_overdue, 1);
    assert_eq!(summary.purchases_defaulted, 1);

    let late = fx.engine.purchase_detail(&fx.slug, late.purchase.id, OWNER).await.unwrap();
    assert_eq!(late.purchase.status, PurchaseStatus::Overdue);
    assert_eq!(late.installments[0].status, InstallmentStatus::Overdue);
    assert_eq!(late.installments[1].status, InstallmentStatus::Pending);

    // Paying the late installment brings the purchase back to active.
    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(late.purchase.id, 25_000, PaymentMethod::Cash),
            OWNER,
        )
        .await
        .unwrap();
    let late = fx.engine.purchase_detail(&fx.slug, late.purchase.id, OWNER).await.unwrap();
    assert_eq!(late.purchase.status, PurchaseStatus::Active);

    // A second refresh has nothing left to change.
    let summary = fx
        .engine
        .refresh_statuses(&fx.slug, today(), OWNER)
        .await
        .unwrap();
    assert_eq!(summary.installments_overdue, 0);
    assert!(!summary.purchases_changed());
}

#[tokio::test]
async fn list_purchases_paginates_newest_first() {
    let fx = fixture().await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let detail = fx
            .engine
            .create_purchase(
                &fx.slug,
                NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                    .line(fx.product_id, 1),
                OWNER,
            )
            .await
            .unwrap();
        ids.push(detail.purchase.id);
    }

    let filter = PurchaseListFilter::default();
    let (page, cursor) = fx
        .engine
        .list_purchases(&fx.slug, &filter, 2, None, OWNER)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].customer_name, "Ama Mensah");
    assert_eq!(page[0].shop_slug, fx.shop);
    let cursor = cursor.unwrap();
    let (rest, cursor) = fx
        .engine
        .list_purchases(&fx.slug, &filter, 2, Some(&cursor), OWNER)
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert!(cursor.is_none());

    let mut seen: Vec<_> = page.iter().chain(rest.iter()).map(|s| s.purchase.id).collect();
    seen.sort();
    ids.sort();
    assert_eq!(seen, ids);

    let credit_only = PurchaseListFilter {
        purchase_type: Some(PurchaseType::Credit),
        ..PurchaseListFilter::default()
    };
    let (none, _) = fx
        .engine
        .list_purchases(&fx.slug, &credit_only, 10, None, OWNER)
        .await
        .unwrap();
    assert!(none.is_empty());

    let err = fx
        .engine
        .list_purchases(&fx.slug, &filter, 2, Some("garbage!"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn tiny_financed_remainder_still_splits() {
    let fx = fixture().await;
    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Credit, today())
                .line(fx.product_id, 1)
                .down_payment(SOFA_PRICE - 1)
                .installments(3, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    assert_eq!(detail.purchase.outstanding_minor, 1);
    let amounts: Vec<i64> = detail.installments.iter().map(|i| i.amount_minor).collect();
    assert_eq!(amounts, vec![0, 0, 1]);
    assert_eq!(detail.installments[0].status, InstallmentStatus::Paid);
    assert_eq!(detail.installments[2].status, InstallmentStatus::Pending);

    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(detail.purchase.id, 1, PaymentMethod::Cash),
            OWNER,
        )
        .await
        .unwrap();
    let detail = fx
        .engine
        .purchase_detail(&fx.slug, detail.purchase.id, OWNER)
        .await
        .unwrap();
    assert_eq!(detail.purchase.status, PurchaseStatus::Completed);
    assert!(detail.installments.iter().all(|i| i.status == InstallmentStatus::Paid));
}
