mod common;

use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, Statement};

use engine::{EngineError, EntryKind, RateKind};

use common::{at, setup};

#[tokio::test]
async fn create_deposit_and_set_balance() {
    let fx = setup().await;
    let account = fx
        .engine
        .create_account(&fx.admin_ve, "Banesco", dec!(1000))
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(1000));

    let err = fx
        .engine
        .create_account(&fx.admin_ve, " Banesco ", dec!(0))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Banesco".to_string()));

    let entry = fx
        .engine
        .deposit(&fx.admin_ve, account.id, dec!(250.5), Some("recarga"))
        .await
        .unwrap();
    assert_eq!(entry.sequence, 2);
    assert_eq!(entry.balance_after, dec!(1250.5));

    let adjusted = fx
        .engine
        .set_balance(&fx.admin_ve, account.id, dec!(1200))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(adjusted.kind, EntryKind::Withdrawal);
    assert_eq!(adjusted.amount, dec!(50.5));

    let unchanged = fx
        .engine
        .set_balance(&fx.admin_ve, account.id, dec!(1200))
        .await
        .unwrap();
    assert_eq!(unchanged, None);

    let err = fx
        .engine
        .set_balance(&fx.admin_ve, account.id, dec!(-5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NegativeBalance(_)));
    assert!(err.to_string().contains(&account.id.to_string()));
    assert!(err.to_string().contains("-5"));

    let entries = fx
        .engine
        .account_entries(&fx.admin_ve, account.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    let account = fx.engine.account(&fx.admin_ve, account.id).await.unwrap();
    assert_eq!(account.balance, dec!(1200));
}

#[tokio::test]
async fn withdrawal_beyond_balance_writes_nothing() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(213500), at(3, 9)).await;

    let account = fx
        .engine
        .create_account(&fx.admin_ve, "Bicentenario", dec!(100))
        .await
        .unwrap();
    let err = fx
        .engine
        .record_withdrawal_for_transaction(&fx.admin_ve, account.id, tx.id, dec!(1000), dec!(0.3))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NegativeBalance(_)));

    let entries = fx
        .engine
        .account_entries(&fx.admin_ve, account.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let account = fx.engine.account(&fx.admin_ve, account.id).await.unwrap();
    assert_eq!(account.balance, dec!(100));

    let tx = fx.engine.transaction(&fx.admin_ve, tx.id).await.unwrap();
    assert_eq!(tx.bank_commission_percentage, None);
}

#[tokio::test]
async fn commission_update_reprojects_later_entries() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(213500), at(3, 9)).await;

    let account = fx
        .engine
        .create_account(&fx.admin_ve, "Mercantil", dec!(2000))
        .await
        .unwrap();
    let withdrawal = fx
        .engine
        .record_withdrawal_for_transaction(&fx.admin_ve, account.id, tx.id, dec!(1000), dec!(0.3))
        .await
        .unwrap();
    assert_eq!(withdrawal.amount, dec!(997));
    assert_eq!(withdrawal.gross_amount, Some(dec!(1000)));
    assert_eq!(withdrawal.balance_after, dec!(1003));

    let err = fx
        .engine
        .record_withdrawal_for_transaction(&fx.admin_ve, account.id, tx.id, dec!(10), dec!(0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    fx.engine
        .deposit(&fx.admin_ve, account.id, dec!(100), None)
        .await
        .unwrap();

    let account = fx
        .engine
        .update_commission_percentage(&fx.admin_ve, tx.id, dec!(1))
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(1110));

    let entries = fx
        .engine
        .account_entries(&fx.admin_ve, account.id)
        .await
        .unwrap();
    let after: Vec<_> = entries.iter().map(|e| e.balance_after).collect();
    assert_eq!(after, vec![dec!(2000), dec!(1010), dec!(1110)]);
    assert_eq!(entries[1].amount, dec!(990));

    let tx = fx.engine.transaction(&fx.admin_ve, tx.id).await.unwrap();
    assert_eq!(tx.bank_commission_percentage, Some(dec!(1)));
}

#[tokio::test]
async fn reprojection_never_goes_negative() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(213500), at(3, 9)).await;
    let account = fx
        .engine
        .create_account(&fx.admin_ve, "Venezuela", dec!(1000))
        .await
        .unwrap();
    fx.engine
        .record_withdrawal_for_transaction(&fx.admin_ve, account.id, tx.id, dec!(1000), dec!(50))
        .await
        .unwrap();
    fx.engine
        .set_balance(&fx.admin_ve, account.id, dec!(0))
        .await
        .unwrap();

    let err = fx
        .engine
        .update_commission_percentage(&fx.admin_ve, tx.id, dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NegativeBalance(_)));

    let err = fx
        .engine
        .update_commission_percentage(&fx.admin_ve, tx.id, dec!(101))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let account = fx.engine.account(&fx.admin_ve, account.id).await.unwrap();
    assert_eq!(account.balance, dec!(0));
    let tx = fx.engine.transaction(&fx.admin_ve, tx.id).await.unwrap();
    assert_eq!(tx.bank_commission_percentage, Some(dec!(50)));

    let err = fx
        .engine
        .deposit(&fx.admin_ve, account.id, dec!(-1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn recompute_repairs_stored_balances() {
    let fx = setup().await;
    let account = fx
        .engine
        .create_account(&fx.admin_co, "Provincial", dec!(500))
        .await
        .unwrap();
    fx.engine
        .deposit(&fx.admin_co, account.id, dec!(300), None)
        .await
        .unwrap();

    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE account_transactions SET balance_after = '1' WHERE account_id = ?",
            vec![account.id.to_string().into()],
        ))
        .await
        .unwrap();
    fx.db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE accounts SET balance = '42' WHERE id = ?",
            vec![account.id.to_string().into()],
        ))
        .await
        .unwrap();

    let repaired = fx
        .engine
        .recompute_account_balance(&fx.admin_co, account.id)
        .await
        .unwrap();
    assert_eq!(repaired.balance, dec!(800));

    let entries = fx
        .engine
        .account_entries(&fx.admin_co, account.id)
        .await
        .unwrap();
    let after: Vec<_> = entries.iter().map(|e| e.balance_after).collect();
    assert_eq!(after, vec![dec!(500), dec!(800)]);
}
