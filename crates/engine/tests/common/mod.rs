#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Actor, BeneficiarySnapshot, CreateTransactionCmd, Engine, Notification, Notifier,
    NotifyError, RateKind, Role, StatusChangeCmd, Transaction, TransactionStatus,
    TransactionType, TransferAmount, User,
};
use migration::MigratorTrait;

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("sink offline".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub notifier: Arc<RecordingNotifier>,
    pub admin_co: Actor,
    pub admin_ve: Actor,
    /// Reports to admin Colombia.
    pub vendor_co: Actor,
    /// Reports to admin Venezuela.
    pub vendor_ve: Actor,
}

pub async fn setup() -> Fixture {
    setup_with_notifier(RecordingNotifier::default()).await
}

pub async fn setup_with_notifier(notifier: RecordingNotifier) -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let notifier = Arc::new(notifier);
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .build()
        .await
        .unwrap();

    let users = [
        ("co", "Admin Colombia", Role::AdminColombia, None),
        ("ve", "Admin Venezuela", Role::AdminVenezuela, None),
        ("vendor-co", "Carla", Role::Vendedor, Some("co")),
        ("vendor-ve", "Victor", Role::Vendedor, Some("ve")),
    ];
    for (id, name, role, reports_to) in users {
        engine
            .register_user(User {
                id: id.to_string(),
                name: name.to_string(),
                role,
                reports_to: reports_to.map(ToString::to_string),
            })
            .await
            .unwrap();
    }

    Fixture {
        engine,
        db,
        notifier,
        admin_co: Actor::new("co", Role::AdminColombia),
        admin_ve: Actor::new("ve", Role::AdminVenezuela),
        vendor_co: Actor::new("vendor-co", Role::Vendedor),
        vendor_ve: Actor::new("vendor-ve", Role::Vendedor),
    }
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

pub fn beneficiary(name: &str) -> BeneficiarySnapshot {
    BeneficiarySnapshot {
        full_name: name.to_string(),
        document_id: "V-12345678".to_string(),
        bank_name: "Banesco".to_string(),
        account_number: "01340000000000000000".to_string(),
        account_type: Some("corriente".to_string()),
        phone: None,
        is_pago_movil: false,
    }
}

impl Fixture {
    pub async fn set_rate(&self, kind: RateKind, sale_rate: Decimal) {
        self.engine
            .record_rate(&self.admin_ve, kind, sale_rate, None, false)
            .await
            .unwrap();
    }

    pub async fn create_normal(
        &self,
        actor: &Actor,
        amount_cop: Decimal,
        created_at: DateTime<Utc>,
    ) -> Transaction {
        self.engine
            .create_transaction(
                actor,
                CreateTransactionCmd::new(
                    beneficiary("Maria Perez"),
                    TransactionType::Normal,
                    TransferAmount::Cop(amount_cop),
                    created_at,
                ),
            )
            .await
            .unwrap()
    }

    /// Walks a transaction through the whole pipeline to `COMPLETADO`.
    pub async fn complete(&self, transaction_id: uuid::Uuid) -> Transaction {
        let steps = [
            (TransactionStatus::PendienteColombia, &self.admin_co),
            (TransactionStatus::PendienteVenezuela, &self.admin_co),
            (TransactionStatus::TasaCompraEstablecida, &self.admin_ve),
            (TransactionStatus::Completado, &self.admin_ve),
        ];
        let mut last = None;
        for (status, actor) in steps {
            last = Some(
                self.engine
                    .transition_status(actor, StatusChangeCmd::new(transaction_id, status))
                    .await
                    .unwrap(),
            );
        }
        last.unwrap()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.notifier.sent.lock().unwrap().clone()
    }
}
