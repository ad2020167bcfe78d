mod common;

use rust_decimal_macros::dec;

use engine::{
    CreateTransactionCmd, EngineError, RateKind, StatusChangeCmd, TransactionListFilter,
    TransactionStatus, TransactionType, TransferAmount, VendorPaymentMethod,
};

use common::{RecordingNotifier, at, beneficiary, setup, setup_with_notifier};

#[tokio::test]
async fn amount_bs_is_frozen_at_creation() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;

    let tx = fx.create_normal(&fx.vendor_co, dec!(500000), at(5, 14)).await;
    assert_eq!(tx.status, TransactionStatus::Pendiente);
    assert_eq!(tx.sale_rate, dec!(213.5));
    assert_eq!(tx.amount_bs, dec!(2341.92));
    assert!(!tx.custom_rate_used);

    fx.set_rate(RateKind::Actual, dec!(250)).await;
    let reloaded = fx.engine.transaction(&fx.admin_co, tx.id).await.unwrap();
    assert_eq!(reloaded.amount_bs, dec!(2341.92));
    assert_eq!(reloaded.sale_rate, dec!(213.5));
}

#[tokio::test]
async fn creation_needs_a_rate_unless_custom() {
    let fx = setup().await;
    let cmd = CreateTransactionCmd::new(
        beneficiary("Jose Rojas"),
        TransactionType::Normal,
        TransferAmount::Cop(dec!(100000)),
        at(5, 9),
    );

    let err = fx
        .engine
        .create_transaction(&fx.vendor_ve, cmd.clone())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NoRateAvailable(RateKind::Actual));

    let tx = fx
        .engine
        .create_transaction(
            &fx.vendor_ve,
            cmd.custom_rate(dec!(200))
                .vendor_payment_method(VendorPaymentMethod::ConsignacionNequi)
                .notes("  cliente frecuente  "),
        )
        .await
        .unwrap();
    assert!(tx.custom_rate_used);
    assert_eq!(tx.amount_bs, dec!(500));
    assert_eq!(tx.notes.as_deref(), Some("cliente frecuente"));
    assert_eq!(
        tx.vendor_payment_method,
        Some(VendorPaymentMethod::ConsignacionNequi)
    );
}

#[tokio::test]
async fn usd_products_use_their_own_rate() {
    let fx = setup().await;
    fx.set_rate(RateKind::Zelle, dec!(38.25)).await;

    let tx = fx
        .engine
        .create_transaction(
            &fx.vendor_co,
            CreateTransactionCmd::new(
                beneficiary("Ana Gil"),
                TransactionType::Zelle,
                TransferAmount::Usd(dec!(100)),
                at(6, 10),
            ),
        )
        .await
        .unwrap();
    assert_eq!(tx.amount_cop, None);
    assert_eq!(tx.amount_usd, Some(dec!(100)));
    assert_eq!(tx.amount_bs, dec!(3825));
}

#[tokio::test]
async fn lifecycle_writes_history_and_notifies_owner() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(500000), at(5, 14)).await;

    let completed = fx.complete(tx.id).await;
    assert_eq!(completed.status, TransactionStatus::Completado);
    assert!(completed.last_edited_at.is_some());

    let history = fx
        .engine
        .transaction_history(&fx.vendor_co, tx.id)
        .await
        .unwrap();
    let steps: Vec<_> = history
        .iter()
        .map(|h| (h.previous_status, h.status))
        .collect();
    assert_eq!(
        steps,
        vec![
            (None, TransactionStatus::Pendiente),
            (
                Some(TransactionStatus::Pendiente),
                TransactionStatus::PendienteColombia
            ),
            (
                Some(TransactionStatus::PendienteColombia),
                TransactionStatus::PendienteVenezuela
            ),
            (
                Some(TransactionStatus::PendienteVenezuela),
                TransactionStatus::TasaCompraEstablecida
            ),
            (
                Some(TransactionStatus::TasaCompraEstablecida),
                TransactionStatus::Completado
            ),
        ]
    );

    let sent = fx.sent();
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|n| n.user_id == "vendor-co"));
    assert!(sent.iter().all(|n| n.transaction_id == Some(tx.id)));
}

#[tokio::test]
async fn rejected_transitions_write_nothing() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(100000), at(5, 14)).await;

    let err = fx
        .engine
        .transition_status(
            &fx.admin_ve,
            StatusChangeCmd::new(tx.id, TransactionStatus::Completado),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition {
            current: TransactionStatus::Pendiente,
            requested: TransactionStatus::Completado,
        }
    );

    let err = fx
        .engine
        .transition_status(
            &fx.vendor_ve,
            StatusChangeCmd::new(tx.id, TransactionStatus::CanceladoVendedor),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let history = fx
        .engine
        .transaction_history(&fx.admin_co, tx.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(fx.sent().is_empty());
    let reloaded = fx.engine.transaction(&fx.admin_co, tx.id).await.unwrap();
    assert_eq!(reloaded.status, TransactionStatus::Pendiente);
}

#[tokio::test]
async fn cancelled_transactions_are_terminal() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(100000), at(5, 14)).await;

    let cancelled = fx
        .engine
        .transition_status(
            &fx.vendor_co,
            StatusChangeCmd::new(tx.id, TransactionStatus::CanceladoVendedor)
                .note("cliente desistió"),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::CanceladoVendedor);

    let err = fx
        .engine
        .transition_status(
            &fx.admin_co,
            StatusChangeCmd::new(tx.id, TransactionStatus::PendienteColombia),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    let history = fx
        .engine
        .transaction_history(&fx.vendor_co, tx.id)
        .await
        .unwrap();
    assert_eq!(history.last().unwrap().note.as_deref(), Some("cliente desistió"));
}

#[tokio::test]
async fn failing_notifier_never_fails_the_transition() {
    let fx = setup_with_notifier(RecordingNotifier {
        fail: true,
        ..Default::default()
    })
    .await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(100000), at(5, 14)).await;

    let moved = fx
        .engine
        .transition_status(
            &fx.admin_co,
            StatusChangeCmd::new(tx.id, TransactionStatus::PendienteColombia),
        )
        .await
        .unwrap();
    assert_eq!(moved.status, TransactionStatus::PendienteColombia);
}

#[tokio::test]
async fn vendors_only_see_their_own_transactions() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let mine = fx.create_normal(&fx.vendor_co, dec!(100000), at(5, 9)).await;
    let theirs = fx.create_normal(&fx.vendor_ve, dec!(200000), at(5, 10)).await;

    let err = fx
        .engine
        .transaction(&fx.vendor_co, theirs.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let listed = fx
        .engine
        .transactions(&fx.vendor_co, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);

    let all = fx
        .engine
        .transactions(&fx.admin_ve, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, theirs.id);

    let filtered = fx
        .engine
        .transactions(
            &fx.admin_ve,
            &TransactionListFilter {
                from: Some(at(5, 10)),
                to: Some(at(6, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, theirs.id);
}
