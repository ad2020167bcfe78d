use std::{fs::File, path::PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    Actor, BeneficiarySnapshot, CommissionFilter, CreateTransactionCmd, Currency, DateRange,
    DebtPeriod, Engine, Money, PurchaseRateAction, PurchaseRateTarget, RATE_SCALE, RateKind,
    RecordPaymentCmd, Role, StatusChangeCmd, Transaction, TransactionListFilter,
    TransactionStatus, TransactionType, TransferAmount, User, VendorPaymentMethod,
    parse_decimal_input,
};
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

mod export;
mod settings;

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "remesas_admin")]
#[command(about = "Admin console for the COP/VES remittance ledger")]
struct Cli {
    /// Settings file (TOML, extension optional).
    #[arg(long)]
    config: Option<String>,

    /// Overrides `[database] url`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Overrides `[actor] user_id`.
    #[arg(long = "as")]
    as_user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Rate(RateCommand),
    #[command(subcommand)]
    Tx(TxCommand),
    #[command(subcommand)]
    PurchaseRate(PurchaseRateCommand),
    #[command(subcommand)]
    Debt(DebtCommand),
    #[command(subcommand)]
    Commission(CommissionCommand),
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Mirror a user from the identity provider.
    Create {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        reports_to: Option<String>,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum RateCommand {
    /// Publish a new rate.
    Set {
        #[arg(long, value_parser = parse_rate_kind)]
        kind: RateKind,
        #[arg(long, value_parser = parse_rate)]
        sale: Decimal,
        #[arg(long, value_parser = parse_rate)]
        purchase: Option<Decimal>,
        #[arg(long = "final")]
        is_final: bool,
    },
    /// Set the purchase rate of the current quote.
    Amend {
        #[arg(long, value_parser = parse_rate_kind)]
        kind: RateKind,
        #[arg(long, value_parser = parse_rate)]
        purchase: Decimal,
        #[arg(long = "final")]
        is_final: bool,
    },
    Current,
    History {
        #[arg(long, value_parser = parse_rate_kind)]
        kind: Option<RateKind>,
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct TxCreateArgs {
    #[arg(long = "type", value_parser = parse_transaction_type, default_value = "normal")]
    transaction_type: TransactionType,
    #[arg(long, value_parser = parse_money_cop, conflicts_with_all = ["bs", "usd"])]
    cop: Option<Decimal>,
    #[arg(long, value_parser = parse_money_ves, conflicts_with = "usd")]
    bs: Option<Decimal>,
    #[arg(long, value_parser = parse_money_usd)]
    usd: Option<Decimal>,
    #[arg(long, value_parser = parse_rate)]
    custom_rate: Option<Decimal>,
    #[arg(long, value_parser = parse_payment_method)]
    payment_method: Option<VendorPaymentMethod>,
    #[arg(long)]
    beneficiary: String,
    #[arg(long)]
    document_id: String,
    #[arg(long)]
    bank: String,
    #[arg(long)]
    account_number: String,
    #[arg(long)]
    account_type: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    pago_movil: bool,
    #[arg(long)]
    client_proof: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    Create(TxCreateArgs),
    Show {
        id: Uuid,
    },
    List {
        /// `today`, `last15days`, `this_month` or `YYYY-MM-DD..YYYY-MM-DD`.
        #[arg(long, value_parser = parse_period)]
        period: Option<DebtPeriod>,
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<TransactionStatus>,
        #[arg(long = "type", value_parser = parse_transaction_type)]
        transaction_type: Option<TransactionType>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
    },
    History {
        id: Uuid,
    },
    /// Move a transaction to another status.
    Status {
        id: Uuid,
        #[arg(value_parser = parse_status)]
        status: TransactionStatus,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        proof: Option<String>,
    },
}

/// Transactions targeted by a purchase-rate command.
#[derive(Args, Debug)]
struct Targets {
    #[arg(long = "id")]
    ids: Vec<Uuid>,
    #[arg(long, value_parser = parse_period, conflicts_with = "ids")]
    period: Option<DebtPeriod>,
}

#[derive(Subcommand, Debug)]
enum PurchaseRateCommand {
    Set {
        #[arg(long, value_parser = parse_rate)]
        rate: Decimal,
        #[arg(long = "final")]
        is_final: bool,
        #[command(flatten)]
        targets: Targets,
    },
    Finalize {
        #[command(flatten)]
        targets: Targets,
    },
    Remove {
        #[command(flatten)]
        targets: Targets,
    },
    /// Completed transactions still waiting for a purchase rate.
    Pending {
        #[arg(long, value_parser = parse_period)]
        period: Option<DebtPeriod>,
    },
}

#[derive(Subcommand, Debug)]
enum DebtCommand {
    Summary {
        #[arg(long, value_parser = parse_period, default_value = "this_month")]
        period: DebtPeriod,
        /// Write the settled lines as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Record a payment from Colombia to Venezuela.
    Pay {
        #[arg(long, value_parser = parse_money_cop)]
        amount: Decimal,
        /// Payment day (Bogotá), defaults to now.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        proof_url: Option<String>,
    },
    Payments {
        #[arg(long, value_parser = parse_period, default_value = "this_month")]
        period: DebtPeriod,
    },
    MarkPaid {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    Earnings {
        #[arg(long, value_parser = parse_period, default_value = "this_month")]
        period: DebtPeriod,
    },
}

#[derive(Subcommand, Debug)]
enum CommissionCommand {
    List {
        #[arg(long, value_parser = parse_period)]
        period: Option<DebtPeriod>,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        unpaid: bool,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    MarkPaid {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create {
        name: String,
        #[arg(long, value_parser = parse_money_ves, default_value = "0")]
        initial: Decimal,
    },
    List,
    Entries {
        id: Uuid,
    },
    Deposit {
        id: Uuid,
        #[arg(value_parser = parse_money_ves)]
        amount: Decimal,
        #[arg(long)]
        description: Option<String>,
    },
    SetBalance {
        id: Uuid,
        #[arg(value_parser = parse_money_ves)]
        balance: Decimal,
    },
    /// Pay a transaction out of an account.
    Withdraw {
        #[arg(long)]
        account: Uuid,
        #[arg(long)]
        transaction: Uuid,
        #[arg(long, value_parser = parse_money_ves)]
        gross: Decimal,
        #[arg(long, value_parser = parse_rate, default_value = "0")]
        commission: Decimal,
    },
    /// Change the bank commission of a transaction's withdrawal.
    Commission {
        transaction: Uuid,
        #[arg(value_parser = parse_rate)]
        pct: Decimal,
    },
    Recompute {
        id: Uuid,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw).map_err(|err| err.to_string())
}

fn parse_rate_kind(raw: &str) -> Result<RateKind, String> {
    RateKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<TransactionStatus, String> {
    TransactionStatus::try_from(raw).map_err(|err| err.to_string())
}

fn parse_transaction_type(raw: &str) -> Result<TransactionType, String> {
    TransactionType::try_from(raw).map_err(|err| err.to_string())
}

fn parse_payment_method(raw: &str) -> Result<VendorPaymentMethod, String> {
    VendorPaymentMethod::try_from(raw).map_err(|err| err.to_string())
}

fn parse_period(raw: &str) -> Result<DebtPeriod, String> {
    DebtPeriod::try_from(raw).map_err(|err| err.to_string())
}

fn parse_rate(raw: &str) -> Result<Decimal, String> {
    parse_decimal_input(raw, RATE_SCALE).map_err(|err| err.to_string())
}

fn parse_money(raw: &str, currency: Currency) -> Result<Decimal, String> {
    Money::parse(raw, currency)
        .map(Money::amount)
        .map_err(|err| err.to_string())
}

fn parse_money_cop(raw: &str) -> Result<Decimal, String> {
    parse_money(raw, Currency::Cop)
}

fn parse_money_ves(raw: &str) -> Result<Decimal, String> {
    parse_money(raw, Currency::Ves)
}

fn parse_money_usd(raw: &str) -> Result<Decimal, String> {
    parse_money(raw, Currency::Usd)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| err.to_string())
}

fn resolve(period: DebtPeriod) -> CliResult<DateRange> {
    Ok(period.resolve(Utc::now())?)
}

fn resolve_opt(period: Option<DebtPeriod>) -> CliResult<Option<DateRange>> {
    period.map(resolve).transpose()
}

/// Midnight of `date` in Bogotá, as UTC.
fn day_start(date: NaiveDate) -> CliResult<DateTime<Utc>> {
    Ok(DebtPeriod::Custom {
        start: date,
        end: date,
    }
    .resolve(Utc::now())?
    .from)
}

fn targets(targets: Targets) -> CliResult<PurchaseRateTarget> {
    if !targets.ids.is_empty() {
        return Ok(PurchaseRateTarget::Ids { ids: targets.ids });
    }
    match targets.period {
        Some(period) => Ok(PurchaseRateTarget::Range {
            range: resolve(period)?,
        }),
        None => Err("pass --id or --period".into()),
    }
}

fn cop(amount: Decimal) -> Money {
    Money::new(amount, Currency::Cop)
}

fn ves(amount: Decimal) -> Money {
    Money::new(amount, Currency::Ves)
}

fn print_transaction(tx: &Transaction) {
    let collected = match (tx.amount_cop, tx.amount_usd) {
        (Some(amount), _) => cop(amount).to_string(),
        (None, Some(amount)) => Money::new(amount, Currency::Usd).to_string(),
        (None, None) => "-".to_string(),
    };
    let purchase = tx
        .purchase_rate
        .map_or_else(|| "-".to_string(), |rate| rate.to_string());
    println!(
        "{} {} {:<8} {:<24} {} -> {} sale={} purchase={}{} by={} to={}",
        tx.created_at.format("%Y-%m-%d %H:%M"),
        tx.id,
        tx.transaction_type.as_str(),
        tx.status.as_str(),
        collected,
        ves(tx.amount_bs),
        tx.sale_rate,
        purchase,
        if tx.purchase_rate_final { " (final)" } else { "" },
        tx.created_by,
        tx.beneficiary.full_name,
    );
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// The configured user with its stored role.
async fn actor(engine: &Engine, user_id: Option<&str>) -> CliResult<Actor> {
    let user_id = user_id.ok_or("no actor configured: set [actor] user_id or pass --as")?;
    let user = engine.user(user_id).await?;
    tracing::debug!(user_id = %user.id, role = %user.role, "acting as");
    Ok(Actor::new(user.id, user.role))
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "remesas_admin={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url.clone());
    let db = connect_db(&database_url).await?;
    let engine = Engine::builder().database(db).build().await?;
    let user_id = cli.as_user.or(settings.actor.user_id);
    run(&engine, user_id.as_deref(), cli.command).await
}

async fn run_user(engine: &Engine, command: UserCommand) -> CliResult<()> {
    match command {
        UserCommand::Create {
            id,
            name,
            role,
            reports_to,
        } => {
            let user = engine
                .register_user(User {
                    id,
                    name,
                    role,
                    reports_to,
                })
                .await?;
            println!("created user: {} ({})", user.id, user.role);
        }
        UserCommand::List => {
            for user in engine.users().await? {
                println!(
                    "{:<20} {:<16} {:<24} {}",
                    user.id,
                    user.role.as_str(),
                    user.name,
                    user.reports_to.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

/// User management runs without an actor; everything else acts as the
/// configured user.
async fn run(engine: &Engine, user_id: Option<&str>, command: Command) -> CliResult<()> {
    let acting = || actor(engine, user_id);
    match command {
        Command::User(command) => run_user(engine, command).await,
        Command::Rate(command) => run_rate(engine, &acting().await?, command).await,
        Command::Tx(command) => run_tx(engine, &acting().await?, command).await,
        Command::PurchaseRate(command) => {
            run_purchase_rate(engine, &acting().await?, command).await
        }
        Command::Debt(command) => run_debt(engine, &acting().await?, command).await,
        Command::Commission(command) => {
            run_commission(engine, &acting().await?, command).await
        }
        Command::Account(command) => run_account(engine, &acting().await?, command).await,
    }
}

async fn run_rate(engine: &Engine, actor: &Actor, command: RateCommand) -> CliResult<()> {
    match command {
        RateCommand::Set {
            kind,
            sale,
            purchase,
            is_final,
        } => {
            let quote = engine
                .record_rate(actor, kind, sale, purchase, is_final)
                .await?;
            println!("published {} sale={} ({})", quote.kind, quote.sale_rate, quote.id);
        }
        RateCommand::Amend {
            kind,
            purchase,
            is_final,
        } => {
            let quote = engine
                .amend_purchase_rate(actor, kind, purchase, is_final)
                .await?;
            println!("{} purchase={} final={}", quote.kind, purchase, quote.purchase_rate_final);
        }
        RateCommand::Current => {
            let current = engine.current_rates().await?;
            for kind in RateKind::ALL {
                match current.get(kind) {
                    Some(quote) => println!(
                        "{:<14} sale={:<10} purchase={}",
                        kind.as_str(),
                        quote.sale_rate,
                        quote
                            .purchase_rate
                            .map_or_else(|| "-".to_string(), |rate| rate.to_string())
                    ),
                    None => println!("{:<14} -", kind.as_str()),
                }
            }
        }
        RateCommand::History { kind, limit } => {
            for quote in engine.rate_history(kind, limit).await? {
                println!(
                    "{} {:<14} sale={} purchase={} by={}",
                    quote.created_at.format("%Y-%m-%d %H:%M"),
                    quote.kind.as_str(),
                    quote.sale_rate,
                    quote
                        .purchase_rate
                        .map_or_else(|| "-".to_string(), |rate| rate.to_string()),
                    quote.created_by
                );
            }
        }
    }
    Ok(())
}

async fn run_tx(engine: &Engine, actor: &Actor, command: TxCommand) -> CliResult<()> {
    match command {
        TxCommand::Create(args) => {
            let amount = match (args.cop, args.bs, args.usd) {
                (Some(cop), None, None) => TransferAmount::Cop(cop),
                (None, Some(bs), None) => TransferAmount::Bs(bs),
                (None, None, Some(usd)) => TransferAmount::Usd(usd),
                _ => return Err("pass exactly one of --cop, --bs or --usd".into()),
            };
            let beneficiary = BeneficiarySnapshot {
                full_name: args.beneficiary,
                document_id: args.document_id,
                bank_name: args.bank,
                account_number: args.account_number,
                account_type: args.account_type,
                phone: args.phone,
                is_pago_movil: args.pago_movil,
            };
            let mut cmd =
                CreateTransactionCmd::new(beneficiary, args.transaction_type, amount, Utc::now());
            if let Some(rate) = args.custom_rate {
                cmd = cmd.custom_rate(rate);
            }
            if let Some(method) = args.payment_method {
                cmd = cmd.vendor_payment_method(method);
            }
            if let Some(proof) = args.client_proof {
                cmd = cmd.client_proof(proof);
            }
            if let Some(notes) = args.notes {
                cmd = cmd.notes(notes);
            }
            let tx = engine.create_transaction(actor, cmd).await?;
            print_transaction(&tx);
        }
        TxCommand::Show { id } => {
            let tx = engine.transaction(actor, id).await?;
            print_transaction(&tx);
        }
        TxCommand::List {
            period,
            statuses,
            transaction_type,
            created_by,
            limit,
        } => {
            let range = resolve_opt(period)?;
            let filter = TransactionListFilter {
                from: range.map(|r| r.from),
                to: range.map(|r| r.to),
                statuses: (!statuses.is_empty()).then_some(statuses),
                transaction_type,
                created_by,
                limit,
            };
            for tx in engine.transactions(actor, &filter).await? {
                print_transaction(&tx);
            }
        }
        TxCommand::History { id } => {
            for entry in engine.transaction_history(actor, id).await? {
                println!(
                    "{} {:>24} -> {:<24} by={} {}",
                    entry.changed_at.format("%Y-%m-%d %H:%M:%S"),
                    entry
                        .previous_status
                        .map_or("-", |s| s.as_str()),
                    entry.status.as_str(),
                    entry.changed_by,
                    entry.note.as_deref().unwrap_or("")
                );
            }
        }
        TxCommand::Status {
            id,
            status,
            note,
            proof,
        } => {
            let mut cmd = StatusChangeCmd::new(id, status);
            if let Some(note) = note {
                cmd = cmd.note(note);
            }
            if let Some(proof) = proof {
                cmd = cmd.venezuela_proof(proof);
            }
            let tx = engine.transition_status(actor, cmd).await?;
            print_transaction(&tx);
        }
    }
    Ok(())
}

async fn apply(
    engine: &Engine,
    actor: &Actor,
    action: PurchaseRateAction,
    target: Targets,
) -> CliResult<()> {
    let outcomes = engine
        .apply_purchase_rate(actor, action, targets(target)?)
        .await?;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(tx) => print_transaction(tx),
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", outcome.transaction_id);
            }
        }
    }
    println!(
        "{}: {} updated, {failed} failed",
        action.as_str(),
        outcomes.len() - failed
    );
    Ok(())
}

async fn run_purchase_rate(
    engine: &Engine,
    actor: &Actor,
    command: PurchaseRateCommand,
) -> CliResult<()> {
    match command {
        PurchaseRateCommand::Set {
            rate,
            is_final,
            targets,
        } => apply(engine, actor, PurchaseRateAction::Edit { rate, is_final }, targets).await,
        PurchaseRateCommand::Finalize { targets } => {
            apply(engine, actor, PurchaseRateAction::MarkFinal, targets).await
        }
        PurchaseRateCommand::Remove { targets } => {
            apply(engine, actor, PurchaseRateAction::Remove, targets).await
        }
        PurchaseRateCommand::Pending { period } => {
            for tx in engine
                .pending_purchase_rate(actor, resolve_opt(period)?)
                .await?
            {
                print_transaction(&tx);
            }
            Ok(())
        }
    }
}

async fn run_debt(engine: &Engine, actor: &Actor, command: DebtCommand) -> CliResult<()> {
    match command {
        DebtCommand::Summary { period, csv } => {
            let summary = engine.debt_summary_for(actor, period).await?;
            if let Some(path) = csv {
                export::write_debt_summary(&summary, File::create(&path)?)?;
                tracing::info!(path = %path.display(), lines = summary.lines.len(), "debt summary exported");
            }
            let totals = &summary.totals;
            println!("period:            {} .. {}", summary.from, summary.to);
            println!("settled:           {}", totals.settled_count);
            println!("pending rate:      {}", totals.pending_count);
            println!("collected:         {}", cop(totals.total_amount_cop));
            println!("paid out:          {}", ves(totals.total_amount_bs));
            println!("investment:        {}", cop(totals.total_investment));
            println!("profit:            {}", cop(totals.total_profit));
            println!("admin Venezuela:   {}", cop(totals.total_admin_venezuela_share));
            println!("admin Colombia:    {}", cop(totals.total_admin_colombia_share));
            println!("debt:              {}", cop(summary.total_debt));
            println!("paid:              {}", cop(summary.total_paid));
            println!("pending debt:      {}", cop(summary.pending_debt));
            if totals.usd_volume.count > 0 {
                println!(
                    "usd volume:        {} in {} transactions",
                    Money::new(totals.usd_volume.amount_usd, Currency::Usd),
                    totals.usd_volume.count
                );
            }
        }
        DebtCommand::Pay {
            amount,
            date,
            notes,
            proof_url,
        } => {
            let payment_date = match date {
                Some(date) => day_start(date)?,
                None => Utc::now(),
            };
            let mut cmd = RecordPaymentCmd::new(amount, payment_date);
            if let Some(notes) = notes {
                cmd = cmd.notes(notes);
            }
            if let Some(url) = proof_url {
                cmd = cmd.proof_url(url);
            }
            let payment = engine.record_payment(actor, cmd).await?;
            println!("recorded payment {} of {}", payment.id, cop(payment.amount));
        }
        DebtCommand::Payments { period } => {
            for payment in engine.payments(actor, resolve(period)?).await? {
                println!(
                    "{} {} {} {}",
                    payment.payment_date.format("%Y-%m-%d"),
                    payment.id,
                    cop(payment.amount),
                    payment.notes.as_deref().unwrap_or("")
                );
            }
        }
        DebtCommand::MarkPaid { ids } => {
            let updated = engine.mark_paid_to_venezuela(actor, &ids).await?;
            println!("{} transactions marked paid to Venezuela", updated.len());
        }
        DebtCommand::Earnings { period } => {
            let earnings = engine.venezuela_earnings(actor, resolve(period)?).await?;
            println!("settled:         {}", earnings.settled_count);
            println!("pending rate:    {}", earnings.pending_count);
            println!("profit:          {}", cop(earnings.total_profit));
            println!("admin Venezuela: {}", cop(earnings.admin_venezuela_share));
        }
    }
    Ok(())
}

async fn run_commission(
    engine: &Engine,
    actor: &Actor,
    command: CommissionCommand,
) -> CliResult<()> {
    match command {
        CommissionCommand::List {
            period,
            vendor,
            unpaid,
            csv,
        } => {
            let filter = CommissionFilter {
                range: resolve_opt(period)?,
                vendor_id: vendor,
                unpaid_only: unpaid,
            };
            let report = engine.vendor_commissions(actor, &filter).await?;
            if let Some(path) = csv {
                export::write_commissions(&report, File::create(&path)?)?;
            }
            for vendor in &report.vendors {
                println!(
                    "{:<20} {:<24} {:>4} total={} unpaid={}",
                    vendor.vendor_id,
                    vendor.vendor_name,
                    vendor.count,
                    cop(vendor.total),
                    cop(vendor.unpaid)
                );
            }
            println!("total={} unpaid={}", cop(report.total), cop(report.unpaid));
        }
        CommissionCommand::MarkPaid { ids } => {
            let updated = engine.mark_commission_paid(actor, &ids).await?;
            println!("{} commissions marked paid", updated.len());
        }
    }
    Ok(())
}

async fn run_account(engine: &Engine, actor: &Actor, command: AccountCommand) -> CliResult<()> {
    match command {
        AccountCommand::Create { name, initial } => {
            let account = engine.create_account(actor, &name, initial).await?;
            println!("created account {} ({}) {}", account.name, account.id, ves(account.balance));
        }
        AccountCommand::List => {
            for account in engine.accounts(actor).await? {
                println!("{} {:<24} {}", account.id, account.name, ves(account.balance));
            }
        }
        AccountCommand::Entries { id } => {
            for entry in engine.account_entries(actor, id).await? {
                println!(
                    "{:>4} {} {:<10} {:>18} -> {:>18} {}",
                    entry.sequence,
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.kind.as_str(),
                    ves(entry.amount),
                    ves(entry.balance_after),
                    entry.description.as_deref().unwrap_or("")
                );
            }
        }
        AccountCommand::Deposit {
            id,
            amount,
            description,
        } => {
            let entry = engine
                .deposit(actor, id, amount, description.as_deref())
                .await?;
            println!("balance: {}", ves(entry.balance_after));
        }
        AccountCommand::SetBalance { id, balance } => {
            match engine.set_balance(actor, id, balance).await? {
                Some(entry) => println!(
                    "{} {} -> {}",
                    entry.kind.as_str(),
                    ves(entry.amount),
                    ves(entry.balance_after)
                ),
                None => println!("balance unchanged"),
            }
        }
        AccountCommand::Withdraw {
            account,
            transaction,
            gross,
            commission,
        } => {
            let entry = engine
                .record_withdrawal_for_transaction(actor, account, transaction, gross, commission)
                .await?;
            println!(
                "withdrew {} (gross {}), balance {}",
                ves(entry.amount),
                ves(gross),
                ves(entry.balance_after)
            );
        }
        AccountCommand::Commission { transaction, pct } => {
            let account = engine
                .update_commission_percentage(actor, transaction, pct)
                .await?;
            println!("{} balance {}", account.name, ves(account.balance));
        }
        AccountCommand::Recompute { id } => {
            let account = engine.recompute_account_balance(actor, id).await?;
            println!("{} balance {}", account.name, ves(account.balance));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn only_user_commands_run_without_an_actor() {
        let db = connect_db("sqlite::memory:").await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();

        let create = Cli::try_parse_from([
            "remesas_admin",
            "user",
            "create",
            "--id",
            "ve",
            "--name",
            "Valeria",
            "--role",
            "admin_venezuela",
        ])
        .unwrap();
        run(&engine, None, create.command).await.unwrap();

        let current = Cli::try_parse_from(["remesas_admin", "rate", "current"]).unwrap();
        let err = run(&engine, None, current.command).await.unwrap_err();
        assert!(err.to_string().contains("no actor configured"));

        let current = Cli::try_parse_from(["remesas_admin", "rate", "current"]).unwrap();
        run(&engine, Some("ve"), current.command).await.unwrap();
    }

    #[test]
    fn amounts_follow_currency_scale() {
        assert_eq!(parse_money_cop("500000,5"), Ok(dec!(500000.5)));
        assert!(parse_money_ves("1.234").is_err());
        assert_eq!(parse_rate("213.479"), Ok(dec!(213.479)));
    }

    #[test]
    fn purchase_rate_targets_need_ids_or_period() {
        let cli = Cli::try_parse_from(["remesas_admin", "purchase-rate", "finalize"]).unwrap();
        let Command::PurchaseRate(PurchaseRateCommand::Finalize { targets: t }) = cli.command
        else {
            panic!("unexpected command");
        };
        assert!(targets(t).is_err());

        let cli = Cli::try_parse_from([
            "remesas_admin",
            "purchase-rate",
            "set",
            "--rate",
            "210",
            "--period",
            "2026-03-01..2026-03-31",
        ])
        .unwrap();
        let Command::PurchaseRate(PurchaseRateCommand::Set { rate, targets: t, .. }) =
            cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(rate, dec!(210));
        assert!(matches!(targets(t), Ok(PurchaseRateTarget::Range { .. })));
    }
}
