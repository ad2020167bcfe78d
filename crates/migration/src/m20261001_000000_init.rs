//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: local mirror of the identity provider (role, reporting line)
//! - `exchange_rates`: append-only rate quotes per kind
//! - `transactions`: remittances with frozen amounts and rates
//! - `transaction_history`: status audit trail
//! - `venezuela_payments`: payments from Colombia to Venezuela
//! - `accounts`: bolívar bank accounts
//! - `account_transactions`: account ledger entries
//!
//! Decimal amounts and rates are TEXT columns holding canonical decimal
//! strings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Role,
    ReportsTo,
}

#[derive(Iden)]
enum ExchangeRates {
    Table,
    Id,
    RateKind,
    SaleRate,
    PurchaseRate,
    PurchaseRateFinal,
    CreatedBy,
    CreatedAt,
    Sequence,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    CreatedBy,
    BeneficiaryFullName,
    BeneficiaryDocumentId,
    BeneficiaryBankName,
    BeneficiaryAccountNumber,
    BeneficiaryAccountType,
    BeneficiaryPhone,
    BeneficiaryIsPagoMovil,
    TransactionType,
    AmountCop,
    AmountUsd,
    AmountBs,
    SaleRate,
    CustomRateUsed,
    PurchaseRate,
    IsPurchaseRateSet,
    PurchaseRateFinal,
    Status,
    VendorPaymentMethod,
    BankCommissionPercentage,
    IsPaidToVenezuela,
    PaidToVenezuelaAt,
    IsCommissionPaidToVendor,
    ClientProof,
    VenezuelaProof,
    Notes,
    CreatedAt,
    LastEditedAt,
}

#[derive(Iden)]
enum TransactionHistory {
    Table,
    Id,
    TransactionId,
    PreviousStatus,
    Status,
    Note,
    ChangedBy,
    ChangedAt,
}

#[derive(Iden)]
enum VenezuelaPayments {
    Table,
    Id,
    Amount,
    PaymentDate,
    Notes,
    ProofUrl,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    Balance,
    CreatedAt,
}

#[derive(Iden)]
enum AccountTransactions {
    Table,
    Id,
    AccountId,
    Sequence,
    Kind,
    Amount,
    GrossAmount,
    BalanceAfter,
    Description,
    LinkedTransactionId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::ReportsTo).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Exchange rates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExchangeRates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExchangeRates::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExchangeRates::RateKind).string().not_null())
                    .col(ColumnDef::new(ExchangeRates::SaleRate).string().not_null())
                    .col(ColumnDef::new(ExchangeRates::PurchaseRate).string())
                    .col(
                        ColumnDef::new(ExchangeRates::PurchaseRateFinal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ExchangeRates::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(ExchangeRates::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::Sequence)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-exchange_rates-rate_kind-created_at")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::RateKind)
                    .col(ExchangeRates::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-exchange_rates-sequence-unique")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::BeneficiaryFullName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BeneficiaryDocumentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BeneficiaryBankName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BeneficiaryAccountNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::BeneficiaryAccountType).string())
                    .col(ColumnDef::new(Transactions::BeneficiaryPhone).string())
                    .col(
                        ColumnDef::new(Transactions::BeneficiaryIsPagoMovil)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::AmountCop).string())
                    .col(ColumnDef::new(Transactions::AmountUsd).string())
                    .col(ColumnDef::new(Transactions::AmountBs).string().not_null())
                    .col(ColumnDef::new(Transactions::SaleRate).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CustomRateUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::PurchaseRate).string())
                    .col(
                        ColumnDef::new(Transactions::IsPurchaseRateSet)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Transactions::PurchaseRateFinal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::VendorPaymentMethod).string())
                    .col(ColumnDef::new(Transactions::BankCommissionPercentage).string())
                    .col(
                        ColumnDef::new(Transactions::IsPaidToVenezuela)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::PaidToVenezuelaAt).timestamp())
                    .col(
                        ColumnDef::new(Transactions::IsCommissionPaidToVendor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::ClientProof).string())
                    .col(ColumnDef::new(Transactions::VenezuelaProof).string())
                    .col(ColumnDef::new(Transactions::Notes).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::LastEditedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-created_by")
                            .from(Transactions::Table, Transactions::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-status-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-created_by-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::CreatedBy)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transaction history
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransactionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionHistory::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionHistory::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionHistory::PreviousStatus).string())
                    .col(ColumnDef::new(TransactionHistory::Status).string().not_null())
                    .col(ColumnDef::new(TransactionHistory::Note).string())
                    .col(
                        ColumnDef::new(TransactionHistory::ChangedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionHistory::ChangedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_history-transaction_id")
                            .from(TransactionHistory::Table, TransactionHistory::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_history-transaction_id")
                    .table(TransactionHistory::Table)
                    .col(TransactionHistory::TransactionId)
                    .col(TransactionHistory::ChangedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Venezuela payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(VenezuelaPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VenezuelaPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VenezuelaPayments::Amount).string().not_null())
                    .col(
                        ColumnDef::new(VenezuelaPayments::PaymentDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VenezuelaPayments::Notes).string())
                    .col(ColumnDef::new(VenezuelaPayments::ProofUrl).string())
                    .col(
                        ColumnDef::new(VenezuelaPayments::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VenezuelaPayments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-venezuela_payments-payment_date")
                    .table(VenezuelaPayments::Table)
                    .col(VenezuelaPayments::PaymentDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-name-unique")
                    .table(Accounts::Table)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Account entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AccountTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountTransactions::Sequence)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountTransactions::Kind).string().not_null())
                    .col(ColumnDef::new(AccountTransactions::Amount).string().not_null())
                    .col(ColumnDef::new(AccountTransactions::GrossAmount).string())
                    .col(
                        ColumnDef::new(AccountTransactions::BalanceAfter)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountTransactions::Description).string())
                    .col(ColumnDef::new(AccountTransactions::LinkedTransactionId).string())
                    .col(
                        ColumnDef::new(AccountTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_transactions-account_id")
                            .from(AccountTransactions::Table, AccountTransactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_transactions-linked_transaction_id")
                            .from(
                                AccountTransactions::Table,
                                AccountTransactions::LinkedTransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_transactions-account_id-sequence-unique")
                    .table(AccountTransactions::Table)
                    .col(AccountTransactions::AccountId)
                    .col(AccountTransactions::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_transactions-linked_transaction_id-unique")
                    .table(AccountTransactions::Table)
                    .col(AccountTransactions::LinkedTransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(AccountTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VenezuelaPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
