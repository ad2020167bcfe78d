mod common;

use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, Statement};

use engine::{EngineError, RateKind};

use common::setup;

#[tokio::test]
async fn current_rate_is_the_latest_quote() {
    let fx = setup().await;

    assert_eq!(
        fx.engine.current_rate(RateKind::Actual).await,
        Err(EngineError::NoRateAvailable(RateKind::Actual))
    );

    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    fx.set_rate(RateKind::Actual, dec!(215)).await;

    let current = fx.engine.current_rate(RateKind::Actual).await.unwrap();
    assert_eq!(current.sale_rate, dec!(215));
    assert_eq!(current.created_by, "ve");
}

#[tokio::test]
async fn same_timestamp_quotes_resolve_by_insertion_order() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    fx.set_rate(RateKind::Actual, dec!(215)).await;
    fx.set_rate(RateKind::Actual, dec!(214)).await;

    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_string(
            backend,
            "UPDATE exchange_rates SET created_at = (SELECT MIN(created_at) FROM exchange_rates)",
        ))
        .await
        .unwrap();

    let current = fx.engine.current_rate(RateKind::Actual).await.unwrap();
    assert_eq!(current.sale_rate, dec!(214));

    let history = fx
        .engine
        .rate_history(Some(RateKind::Actual), None)
        .await
        .unwrap();
    let sale_rates: Vec<_> = history.iter().map(|q| q.sale_rate).collect();
    assert_eq!(sale_rates, vec![dec!(214), dec!(215), dec!(213.5)]);
}

#[tokio::test]
async fn missing_kinds_do_not_hide_the_others() {
    let fx = setup().await;
    fx.set_rate(RateKind::Zelle, dec!(38.2)).await;

    let all = fx.engine.current_rates().await.unwrap();
    assert_eq!(all.zelle.as_ref().map(|q| q.sale_rate), Some(dec!(38.2)));
    assert!(all.actual.is_none());
    assert!(all.banco_central.is_none());
}

#[tokio::test]
async fn only_admin_venezuela_records_valid_rates() {
    let fx = setup().await;

    let err = fx
        .engine
        .record_rate(&fx.admin_co, RateKind::Actual, dec!(213.5), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .record_rate(&fx.admin_ve, RateKind::Actual, dec!(0), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRate(_)));

    let err = fx
        .engine
        .record_rate(&fx.admin_ve, RateKind::Actual, dec!(213.5), Some(dec!(-2)), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRate(_)));

    assert!(fx.engine.rate_history(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn amending_the_purchase_rate_appends_a_quote() {
    let fx = setup().await;

    let err = fx
        .engine
        .amend_purchase_rate(&fx.admin_ve, RateKind::Actual, dec!(210), false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NoRateAvailable(RateKind::Actual));

    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let amended = fx
        .engine
        .amend_purchase_rate(&fx.admin_ve, RateKind::Actual, dec!(210), true)
        .await
        .unwrap();
    assert_eq!(amended.sale_rate, dec!(213.5));
    assert_eq!(amended.purchase_rate, Some(dec!(210)));
    assert!(amended.purchase_rate_final);

    let history = fx
        .engine
        .rate_history(Some(RateKind::Actual), None)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, amended.id);
    assert_eq!(history[1].purchase_rate, None);
}

#[tokio::test]
async fn rate_history_is_newest_first_and_limited() {
    let fx = setup().await;
    for step in 0..12 {
        fx.set_rate(RateKind::Paypal, dec!(40) + rust_decimal::Decimal::from(step))
            .await;
    }
    fx.set_rate(RateKind::Zelle, dec!(38)).await;

    let paypal = fx
        .engine
        .rate_history(Some(RateKind::Paypal), None)
        .await
        .unwrap();
    assert_eq!(paypal.len(), 10);
    assert_eq!(paypal[0].sale_rate, dec!(51));

    let all = fx.engine.rate_history(None, Some(3)).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].kind, RateKind::Zelle);
}
