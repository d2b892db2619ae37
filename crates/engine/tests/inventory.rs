mod common;

use engine::{
    DeleteOutcome, Engine, EngineError, NewPurchaseCmd, PurchaseType, StockReason,
};
use uuid::Uuid;

use common::{OWNER, fixture, today};

async fn assert_stock_matches_movements(engine: &Engine, slug: &str, product_id: Uuid) {
    let product = engine.product(slug, product_id, OWNER).await.unwrap();
    let history = engine
        .stock_history(slug, product_id, 1_000, OWNER)
        .await
        .unwrap();
    let moved: i64 = history.iter().map(|m| m.change).sum();
    assert_eq!(product.stock_quantity, moved);
}

#[tokio::test]
async fn manual_adjustments_keep_stock_and_movements_in_step() {
    let fx = fixture().await;

    let product = fx
        .engine
        .adjust_stock(&fx.slug, fx.product_id, 4, StockReason::Restock, Some("delivery"), OWNER)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 9);

    let product = fx
        .engine
        .adjust_stock(&fx.slug, fx.product_id, -2, StockReason::Adjustment, None, OWNER)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 7);

    fx.engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 3),
            OWNER,
        )
        .await
        .unwrap();

    let history = fx
        .engine
        .stock_history(&fx.slug, fx.product_id, 10, OWNER)
        .await
        .unwrap();
    let reasons: Vec<StockReason> = history.iter().map(|m| m.reason).collect();
    assert!(reasons.contains(&StockReason::Sale));
    assert!(reasons.contains(&StockReason::Adjustment));
    assert_stock_matches_movements(&fx.engine, &fx.slug, fx.product_id).await;
}

#[tokio::test]
async fn adjustments_cannot_go_negative_or_fake_sales() {
    let fx = fixture().await;

    let err = fx
        .engine
        .adjust_stock(&fx.slug, fx.product_id, -6, StockReason::Adjustment, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock(_)));

    for reason in [StockReason::Sale, StockReason::Cancellation] {
        let err = fx
            .engine
            .adjust_stock(&fx.slug, fx.product_id, 1, reason, None, OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    let err = fx
        .engine
        .adjust_stock(&fx.slug, fx.product_id, 0, StockReason::Restock, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = fx
        .engine
        .adjust_stock(&fx.slug, fx.product_id, i64::MAX, StockReason::Restock, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert_eq!(product.stock_quantity, 5);
    assert_stock_matches_movements(&fx.engine, &fx.slug, fx.product_id).await;
}

#[tokio::test]
async fn sold_products_are_archived_instead_of_deleted() {
    let fx = fixture().await;
    fx.engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 1),
            OWNER,
        )
        .await
        .unwrap();

    let outcome = fx
        .engine
        .delete_product(&fx.slug, fx.product_id, OWNER)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Archived);
    let product = fx.engine.product(&fx.slug, fx.product_id, OWNER).await.unwrap();
    assert!(product.archived);

    let listed = fx
        .engine
        .list_products(&fx.slug, &fx.shop, false, None, OWNER)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn shops_with_products_cannot_be_deleted() {
    let fx = fixture().await;

    let err = fx
        .engine
        .delete_shop(&fx.slug, &fx.shop, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    let outcome = fx
        .engine
        .delete_product(&fx.slug, fx.product_id, OWNER)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    let err = fx
        .engine
        .product(&fx.slug, fx.product_id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    fx.engine.delete_shop(&fx.slug, &fx.shop, OWNER).await.unwrap();
    let err = fx
        .engine
        .shop_by_slug(&fx.slug, &fx.shop, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn inactive_shops_refuse_purchases() {
    let fx = fixture().await;
    let shop = fx
        .engine
        .set_shop_active(&fx.slug, &fx.shop, false, OWNER)
        .await
        .unwrap();
    assert!(!shop.active);

    let err = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 1),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    fx.engine
        .set_shop_active(&fx.slug, &fx.shop, true, OWNER)
        .await
        .unwrap();
    fx.engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Cash, today())
                .line(fx.product_id, 1),
            OWNER,
        )
        .await
        .unwrap();
}
