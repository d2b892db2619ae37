mod common;

use engine::{
    EngineError, Frequency, NewPurchaseCmd, PaymentCmd, PaymentMethod, PurchaseType,
    WalletTxKind, WalletTxStatus,
};

use common::{OWNER, fixture, today};

#[tokio::test]
async fn deposits_move_the_balance_only_once_confirmed() {
    let fx = fixture().await;
    let pending = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, 50_000, Some("MM-100"), None, OWNER)
        .await
        .unwrap();
    assert_eq!(pending.status, WalletTxStatus::Pending);
    let wallet = fx.engine.wallet(&fx.slug, fx.customer_id, 10, OWNER).await.unwrap();
    assert_eq!(wallet.balance_minor, 0);
    assert_eq!(fx.engine.pending_deposits(&fx.slug, OWNER).await.unwrap().len(), 1);

    let err = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, 10_000, Some("MM-100"), None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let confirmed = fx
        .engine
        .confirm_deposit(&fx.slug, pending.id, OWNER)
        .await
        .unwrap();
    assert_eq!(confirmed.status, WalletTxStatus::Confirmed);
    assert_eq!(confirmed.balance_before_minor, Some(0));
    assert_eq!(confirmed.balance_after_minor, Some(50_000));

    let err = fx
        .engine
        .confirm_deposit(&fx.slug, pending.id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
    assert!(fx.engine.pending_deposits(&fx.slug, OWNER).await.unwrap().is_empty());

    let wallet = fx.engine.wallet(&fx.slug, fx.customer_id, 10, OWNER).await.unwrap();
    assert_eq!(wallet.balance_minor, 50_000);
}

#[tokio::test]
async fn rejected_deposits_never_count() {
    let fx = fixture().await;
    let pending = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, 7_500, None, Some("cash at counter"), OWNER)
        .await
        .unwrap();
    let rejected = fx
        .engine
        .reject_deposit(&fx.slug, pending.id, "cash never arrived", OWNER)
        .await
        .unwrap();
    assert_eq!(rejected.status, WalletTxStatus::Rejected);
    assert!(rejected.note.unwrap().contains("cash never arrived"));

    let wallet = fx.engine.wallet(&fx.slug, fx.customer_id, 10, OWNER).await.unwrap();
    assert_eq!(wallet.balance_minor, 0);
    assert_eq!(wallet.transactions.len(), 1);
}

#[tokio::test]
async fn withdrawals_and_wallet_payments_need_funds() {
    let fx = fixture().await;
    let deposit = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, 30_000, None, None, OWNER)
        .await
        .unwrap();
    fx.engine
        .confirm_deposit(&fx.slug, deposit.id, OWNER)
        .await
        .unwrap();

    let err = fx
        .engine
        .withdraw(&fx.slug, fx.customer_id, 30_001, None, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let detail = fx
        .engine
        .create_purchase(
            &fx.slug,
            NewPurchaseCmd::new(&fx.shop, fx.customer_id, PurchaseType::Layaway, today())
                .line(fx.product_id, 1)
                .installments(10, Frequency::Weekly),
            OWNER,
        )
        .await
        .unwrap();
    fx.engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(detail.purchase.id, 20_000, PaymentMethod::Wallet),
            OWNER,
        )
        .await
        .unwrap();

    let err = fx
        .engine
        .record_payment(
            &fx.slug,
            PaymentCmd::new(detail.purchase.id, 20_000, PaymentMethod::Wallet),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let withdrawal = fx
        .engine
        .withdraw(&fx.slug, fx.customer_id, 10_000, Some("closing"), OWNER)
        .await
        .unwrap();
    assert_eq!(withdrawal.kind, WalletTxKind::Withdrawal);
    assert_eq!(withdrawal.balance_after_minor, Some(0));

    // Balance equals the signed sum of confirmed transactions.
    let wallet = fx.engine.wallet(&fx.slug, fx.customer_id, 50, OWNER).await.unwrap();
    let sum: i64 = wallet
        .transactions
        .iter()
        .filter(|tx| tx.status == WalletTxStatus::Confirmed)
        .map(|tx| tx.kind.signed(tx.amount_minor))
        .sum();
    assert_eq!(wallet.balance_minor, 0);
    assert_eq!(sum, wallet.balance_minor);

    let statement = fx
        .engine
        .customer_statement(&fx.slug, fx.customer_id, OWNER)
        .await
        .unwrap();
    assert_eq!(statement.total_paid_minor, 20_000);
    assert_eq!(statement.outstanding_minor, 80_000);
}

#[tokio::test]
async fn balance_overflow_is_refused_and_rolled_back() {
    let fx = fixture().await;
    let first = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, i64::MAX, None, None, OWNER)
        .await
        .unwrap();
    fx.engine
        .confirm_deposit(&fx.slug, first.id, OWNER)
        .await
        .unwrap();

    let second = fx
        .engine
        .deposit(&fx.slug, fx.customer_id, 1, None, None, OWNER)
        .await
        .unwrap();
    let err = fx
        .engine
        .confirm_deposit(&fx.slug, second.id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let wallet = fx.engine.wallet(&fx.slug, fx.customer_id, 10, OWNER).await.unwrap();
    assert_eq!(wallet.balance_minor, i64::MAX);
    let pending = fx.engine.pending_deposits(&fx.slug, OWNER).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);
}
