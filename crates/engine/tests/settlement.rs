mod common;

use rust_decimal_macros::dec;

use engine::{
    CreateTransactionCmd, DateRange, EngineError, PurchaseRateAction, PurchaseRateTarget,
    RateKind, RecordPaymentCmd, TransactionStatus, TransactionType, TransferAmount,
};

use common::{at, beneficiary, setup};

fn march() -> DateRange {
    DateRange::new(at(1, 5), at(31, 5)).unwrap()
}

fn edit(rate: rust_decimal::Decimal) -> PurchaseRateAction {
    PurchaseRateAction::Edit {
        rate,
        is_final: false,
    }
}

#[tokio::test]
async fn purchase_rate_requires_a_completed_transaction() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.479)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(500000), at(5, 14)).await;

    let err = fx
        .engine
        .set_purchase_rate(&fx.admin_ve, tx.id, edit(dec!(210)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::PurchaseRateNotApplicable {
            id: tx.id,
            status: TransactionStatus::Pendiente,
        }
    );

    fx.complete(tx.id).await;
    let err = fx
        .engine
        .set_purchase_rate(&fx.admin_co, tx.id, edit(dec!(210)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .set_purchase_rate(&fx.admin_ve, tx.id, PurchaseRateAction::MarkFinal)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NoRateToFinalize(tx.id));

    let updated = fx
        .engine
        .set_purchase_rate(&fx.admin_ve, tx.id, edit(dec!(210)))
        .await
        .unwrap();
    assert_eq!(updated.purchase_rate, Some(dec!(210)));
    assert!(updated.is_purchase_rate_set);
    assert!(!updated.purchase_rate_final);
}

#[tokio::test]
async fn usd_transfers_reject_purchase_rates_by_id() {
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
    fx.complete(tx.id).await;

    let outcomes = fx
        .engine
        .apply_purchase_rate(
            &fx.admin_ve,
            edit(dec!(210)),
            PurchaseRateTarget::Ids { ids: vec![tx.id] },
        )
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].result,
        Err(EngineError::PurchaseRateNotApplicable {
            id: tx.id,
            status: TransactionStatus::Completado,
        })
    );

    let stored = fx.engine.transaction(&fx.admin_ve, tx.id).await.unwrap();
    assert_eq!(stored.purchase_rate, None);
    assert!(!stored.is_purchase_rate_set);
}

#[tokio::test]
async fn debt_summary_reference_scenario() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.479)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(500000), at(5, 14)).await;
    assert_eq!(tx.amount_bs, dec!(2342.15));
    fx.complete(tx.id).await;

    // Completed but not yet priced: excluded from debt, counted as pending.
    let summary = fx.engine.debt_summary(&fx.admin_co, march()).await.unwrap();
    assert_eq!(summary.total_debt, dec!(0));
    assert_eq!(summary.totals.pending_count, 1);
    assert!(summary.lines.is_empty());

    fx.engine
        .set_purchase_rate(&fx.admin_ve, tx.id, edit(dec!(210)))
        .await
        .unwrap();

    for amount in [dec!(100000), dec!(50000)] {
        fx.engine
            .record_payment(&fx.admin_co, RecordPaymentCmd::new(amount, at(10, 12)))
            .await
            .unwrap();
    }

    let summary = fx.engine.debt_summary(&fx.admin_ve, march()).await.unwrap();
    assert_eq!(summary.totals.settled_count, 1);
    assert_eq!(summary.totals.pending_count, 0);
    assert_eq!(summary.totals.total_investment, dec!(491851.5));
    assert_eq!(summary.totals.total_profit, dec!(8148.5));
    assert_eq!(summary.totals.total_admin_venezuela_share, dec!(4074.25));
    assert_eq!(summary.totals.total_admin_colombia_share, dec!(4074.25));
    assert_eq!(summary.total_debt, dec!(495925.75));
    assert_eq!(summary.total_paid, dec!(150000));
    assert_eq!(summary.pending_debt, dec!(345925.75));
    assert_eq!(summary.payments.len(), 2);

    let line = &summary.lines[0];
    assert_eq!(line.vendor_name.as_deref(), Some("Carla"));
    assert_eq!(line.beneficiary_name, "Maria Perez");
    assert_eq!(line.settlement.debt_to_venezuela, dec!(495925.75));

    let earnings = fx
        .engine
        .venezuela_earnings(&fx.admin_ve, march())
        .await
        .unwrap();
    assert_eq!(earnings.admin_venezuela_share, dec!(4074.25));
    assert_eq!(earnings.total_profit, dec!(8148.5));
}

#[tokio::test]
async fn overpayment_reports_negative_pending_debt() {
    let fx = setup().await;
    fx.engine
        .record_payment(
            &fx.admin_co,
            RecordPaymentCmd::new(dec!(20000), at(3, 8)).notes("anticipo"),
        )
        .await
        .unwrap();
    // Outside the range.
    fx.engine
        .record_payment(&fx.admin_co, RecordPaymentCmd::new(dec!(1), at(31, 6)))
        .await
        .unwrap();

    let summary = fx.engine.debt_summary(&fx.admin_co, march()).await.unwrap();
    assert_eq!(summary.total_paid, dec!(20000));
    assert_eq!(summary.pending_debt, dec!(-20000));

    let payments = fx.engine.payments(&fx.admin_ve, march()).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].notes.as_deref(), Some("anticipo"));
}

#[tokio::test]
async fn payments_are_admin_colombia_only_and_positive() {
    let fx = setup().await;
    let err = fx
        .engine
        .record_payment(&fx.admin_ve, RecordPaymentCmd::new(dec!(10), at(3, 8)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .record_payment(&fx.admin_co, RecordPaymentCmd::new(dec!(0), at(3, 8)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .debt_summary(&fx.vendor_co, march())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn bulk_assignment_is_best_effort() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let done = fx.create_normal(&fx.vendor_co, dec!(300000), at(4, 9)).await;
    fx.complete(done.id).await;
    let pending = fx.create_normal(&fx.vendor_co, dec!(200000), at(4, 10)).await;

    let outcomes = fx
        .engine
        .apply_purchase_rate(
            &fx.admin_ve,
            edit(dec!(209)),
            PurchaseRateTarget::Ids {
                ids: vec![done.id, pending.id, uuid::Uuid::new_v4()],
            },
        )
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert_eq!(
        outcomes[1].result,
        Err(EngineError::PurchaseRateNotApplicable {
            id: pending.id,
            status: TransactionStatus::Pendiente,
        })
    );
    assert!(matches!(outcomes[2].result, Err(EngineError::KeyNotFound(_))));

    let reloaded = fx.engine.transaction(&fx.admin_ve, done.id).await.unwrap();
    assert_eq!(reloaded.purchase_rate, Some(dec!(209)));
}

#[tokio::test]
async fn range_assignment_targets_by_mode() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let first = fx.create_normal(&fx.vendor_co, dec!(300000), at(4, 9)).await;
    let second = fx.create_normal(&fx.vendor_ve, dec!(400000), at(6, 9)).await;
    let outside = fx.create_normal(&fx.vendor_ve, dec!(400000), at(20, 9)).await;
    for id in [first.id, second.id, outside.id] {
        fx.complete(id).await;
    }
    fx.engine
        .set_purchase_rate(&fx.admin_ve, first.id, edit(dec!(205)))
        .await
        .unwrap();

    let range = DateRange::new(at(1, 0), at(10, 0)).unwrap();
    let pending = fx
        .engine
        .pending_purchase_rate(&fx.admin_co, Some(range))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);

    // Edit only touches rows lacking a rate.
    let outcomes = fx
        .engine
        .apply_purchase_rate(&fx.admin_ve, edit(dec!(210)), PurchaseRateTarget::Range { range })
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].transaction_id, second.id);

    let outcomes = fx
        .engine
        .apply_purchase_rate(
            &fx.admin_ve,
            PurchaseRateAction::MarkFinal,
            PurchaseRateTarget::Range { range },
        )
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let first = fx.engine.transaction(&fx.admin_ve, first.id).await.unwrap();
    assert_eq!(first.purchase_rate, Some(dec!(205)));
    assert!(first.purchase_rate_final);

    let outcomes = fx
        .engine
        .apply_purchase_rate(
            &fx.admin_ve,
            PurchaseRateAction::Remove,
            PurchaseRateTarget::Range { range },
        )
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    let second = fx.engine.transaction(&fx.admin_ve, second.id).await.unwrap();
    assert_eq!(second.purchase_rate, None);
    assert!(!second.purchase_rate_final);

    let outside = fx.engine.transaction(&fx.admin_ve, outside.id).await.unwrap();
    assert!(!outside.is_purchase_rate_set);
}

#[tokio::test]
async fn mark_paid_to_venezuela_keeps_first_timestamp() {
    let fx = setup().await;
    fx.set_rate(RateKind::Actual, dec!(213.5)).await;
    let tx = fx.create_normal(&fx.vendor_co, dec!(300000), at(4, 9)).await;
    fx.complete(tx.id).await;

    let first = fx
        .engine
        .mark_paid_to_venezuela(&fx.admin_co, &[tx.id])
        .await
        .unwrap();
    let second = fx
        .engine
        .mark_paid_to_venezuela(&fx.admin_co, &[tx.id])
        .await
        .unwrap();
    assert!(second[0].is_paid_to_venezuela);
    assert_eq!(first[0].paid_to_venezuela_at, second[0].paid_to_venezuela_at);

    let err = fx
        .engine
        .mark_paid_to_venezuela(&fx.admin_co, &[tx.id, uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
