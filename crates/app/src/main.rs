use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    AccountType, Clock, CreateAccountCmd, CreateGoalCmd, CreateRecurringCmd, CreateTransactionCmd,
    Engine, Frequency, GoalType, MoneyCents, SystemClock, TransactionListFilter, TransferCmd,
    UpdateAccountCmd, UpdateRecurringCmd, UpdateTransactionCmd,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Personal finance ledger: balances, cash flow, forecasts and goals")]
struct Cli {
    /// Settings file name, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    /// Overrides the configured database (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a user.
    CreateUser { username: String },
    /// Create the default shared categories.
    Seed,
    Account(AccountArgs),
    /// Record an income.
    Income(FlowArgs),
    /// Record an expense.
    Expense(FlowArgs),
    Transfer(TransferArgs),
    Invest(TransferArgs),
    /// Edit a transaction; one leg of a transfer edits the pair.
    Edit(EditArgs),
    Subscription(SubscriptionArgs),
    Installments(InstallmentArgs),
    /// Edit a subscription or an installment plan.
    EditRecurring(EditRecurringArgs),
    Goal(GoalArgs),
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_account_type, default_value = "bank")]
        kind: AccountType,
        #[arg(long, value_parser = parse_money, default_value = "0")]
        initial_balance: MoneyCents,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    List {
        #[arg(long)]
        user: String,
    },
    /// Align the derived balance with the statement balance.
    Reconcile {
        #[arg(long)]
        user: String,
        #[arg(long)]
        account: Uuid,
        #[arg(long, value_parser = parse_money)]
        balance: MoneyCents,
    },
}

#[derive(Args, Debug)]
struct FlowArgs {
    #[arg(long)]
    user: String,
    #[arg(long, value_parser = parse_money)]
    amount: MoneyCents,
    #[arg(long)]
    description: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    account: Option<Uuid>,
    #[arg(long)]
    category: Option<Uuid>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    from: Uuid,
    #[arg(long)]
    to: Uuid,
    #[arg(long, value_parser = parse_money)]
    amount: MoneyCents,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    id: Uuid,
    #[arg(long, value_parser = parse_money)]
    amount: Option<MoneyCents>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    category: Option<Uuid>,
}

#[derive(Args, Debug)]
struct EditRecurringArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    id: Uuid,
    /// Periodic charge, or plan total for installments.
    #[arg(long, value_parser = parse_money)]
    amount: Option<MoneyCents>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<Uuid>,
}

#[derive(Args, Debug)]
struct SubscriptionArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    description: String,
    #[arg(long, value_parser = parse_money)]
    amount: MoneyCents,
    #[arg(long)]
    yearly: bool,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    category: Option<Uuid>,
    #[arg(long)]
    account: Option<Uuid>,
}

#[derive(Args, Debug)]
struct InstallmentArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    description: String,
    /// Plan total.
    #[arg(long, value_parser = parse_money)]
    total: MoneyCents,
    #[arg(long)]
    count: u32,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    category: Option<Uuid>,
    #[arg(long)]
    account: Option<Uuid>,
}

#[derive(Args, Debug)]
struct GoalArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_money)]
    target: MoneyCents,
    #[arg(long)]
    target_date: NaiveDate,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    net_worth: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    user: String,
    #[command(subcommand)]
    report: Report,
}

#[derive(Subcommand, Debug)]
enum Report {
    NetWorth,
    AssetsLiabilities,
    Transactions,
    Monthly { year: i32, month: u32 },
    Yearly { year: i32 },
    SavingsRates,
    BurnRate,
    CashFlow {
        #[arg(default_value_t = 6)]
        months: u32,
    },
    DailyExpenses { year: i32, month: u32 },
    NetWorthHistory {
        #[arg(default_value_t = 12)]
        months: u32,
    },
    Forecast,
    Projection { months: Option<u32> },
    Commitment,
    MonthlyCommitment,
    Categories { year: i32, month: u32 },
    Recurring,
    Goals,
}

fn parse_money(raw: &str) -> Result<MoneyCents, engine::EngineError> {
    raw.parse()
}

fn parse_account_type(raw: &str) -> Result<AccountType, engine::EngineError> {
    AccountType::try_from(raw)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_db(
    url: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledger={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&url).await?;
    let engine = Engine::builder().database(db).build().await?;
    let today = SystemClock.today();

    match cli.command {
        Command::CreateUser { username } => {
            let id = engine.create_user(&username).await?;
            tracing::info!(%id, "created user {username}");
            print_json(&id)?;
        }
        Command::Seed => {
            let created = engine.seed_default_categories().await?;
            print_json(&created)?;
        }
        Command::Account(AccountArgs { command }) => match command {
            AccountCommand::Create {
                user,
                name,
                kind,
                initial_balance,
                date,
            } => {
                let user_id = engine.user_id(&user).await?;
                let cmd = CreateAccountCmd::new(user_id, name, kind, date.unwrap_or(today))
                    .initial_balance(initial_balance);
                print_json(&engine.create_account(cmd).await?)?;
            }
            AccountCommand::List { user } => {
                let user_id = engine.user_id(&user).await?;
                print_json(&engine.list_accounts(user_id).await?)?;
            }
            AccountCommand::Reconcile {
                user,
                account,
                balance,
            } => {
                let user_id = engine.user_id(&user).await?;
                let cmd = UpdateAccountCmd::new(user_id, account).current_balance(balance);
                print_json(&engine.update_account(cmd).await?)?;
            }
        },
        Command::Income(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let cmd = flow_cmd(
                CreateTransactionCmd::income(
                    user_id,
                    args.amount,
                    args.date.unwrap_or(today),
                    args.description,
                ),
                args.account,
                args.category,
            );
            print_json(&engine.create_transaction(cmd).await?)?;
        }
        Command::Expense(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let cmd = flow_cmd(
                CreateTransactionCmd::expense(
                    user_id,
                    args.amount,
                    args.date.unwrap_or(today),
                    args.description,
                ),
                args.account,
                args.category,
            );
            print_json(&engine.create_transaction(cmd).await?)?;
        }
        Command::Transfer(args) => {
            let cmd = transfer_cmd(&engine, args, today).await?;
            print_json(&engine.create_transfer(cmd).await?)?;
        }
        Command::Invest(args) => {
            let cmd = transfer_cmd(&engine, args, today).await?;
            print_json(&engine.create_investment(cmd).await?)?;
        }
        Command::Edit(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let mut cmd = UpdateTransactionCmd::new(user_id, args.id);
            if let Some(amount) = args.amount {
                cmd = cmd.amount(amount);
            }
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            if let Some(date) = args.date {
                cmd = cmd.date(date);
            }
            if let Some(category) = args.category {
                cmd = cmd.category_id(category);
            }
            print_json(&engine.update_transaction(cmd).await?)?;
        }
        Command::Subscription(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let frequency = if args.yearly {
                Frequency::Yearly
            } else {
                Frequency::Monthly
            };
            let mut cmd = CreateRecurringCmd::subscription(
                user_id,
                args.description,
                args.amount,
                frequency,
                args.start.unwrap_or(today),
            );
            if let Some(category) = args.category {
                cmd = cmd.category_id(category);
            }
            if let Some(account) = args.account {
                cmd = cmd.account_id(account);
            }
            print_json(&engine.create_recurring_expense(cmd).await?)?;
        }
        Command::Installments(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let mut cmd = CreateRecurringCmd::installment(
                user_id,
                args.description,
                args.total,
                args.count,
                args.start.unwrap_or(today),
            );
            if let Some(category) = args.category {
                cmd = cmd.category_id(category);
            }
            if let Some(account) = args.account {
                cmd = cmd.account_id(account);
            }
            print_json(&engine.create_recurring_expense(cmd).await?)?;
        }
        Command::EditRecurring(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let mut cmd = UpdateRecurringCmd::new(user_id, args.id);
            if let Some(amount) = args.amount {
                cmd = cmd.amount(amount);
            }
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            if let Some(category) = args.category {
                cmd = cmd.category_id(category);
            }
            print_json(&engine.update_recurring_expense(cmd).await?)?;
        }
        Command::Goal(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let goal_type = if args.net_worth {
                GoalType::NetWorth
            } else {
                GoalType::Savings
            };
            let cmd = CreateGoalCmd::new(
                user_id,
                args.name,
                args.target,
                args.start.unwrap_or(today),
                args.target_date,
            )
            .goal_type(goal_type);
            print_json(&engine.create_goal(cmd).await?)?;
        }
        Command::Report(ReportArgs { user, report }) => {
            let user_id = engine.user_id(&user).await?;
            run_report(&engine, user_id, report).await?;
        }
    }

    Ok(())
}

fn flow_cmd(
    mut cmd: CreateTransactionCmd,
    account: Option<Uuid>,
    category: Option<Uuid>,
) -> CreateTransactionCmd {
    if let Some(account) = account {
        cmd = cmd.account_id(account);
    }
    if let Some(category) = category {
        cmd = cmd.category_id(category);
    }
    cmd
}

async fn transfer_cmd(
    engine: &Engine,
    args: TransferArgs,
    today: NaiveDate,
) -> Result<TransferCmd, Box<dyn Error + Send + Sync>> {
    let user_id = engine.user_id(&args.user).await?;
    Ok(TransferCmd::new(
        user_id,
        args.from,
        args.to,
        args.amount,
        args.date.unwrap_or(today),
    )
    .description(args.description))
}

async fn run_report(
    engine: &Engine,
    user_id: Uuid,
    report: Report,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match report {
        Report::NetWorth => print_json(&engine.net_worth(user_id).await?),
        Report::AssetsLiabilities => print_json(&engine.assets_liabilities(user_id).await?),
        Report::Transactions => print_json(
            &engine
                .list_transactions(user_id, &TransactionListFilter::default())
                .await?,
        ),
        Report::Monthly { year, month } => {
            print_json(&engine.monthly_totals(user_id, year, month).await?)
        }
        Report::Yearly { year } => print_json(&engine.yearly_totals(user_id, year).await?),
        Report::SavingsRates => print_json(&engine.savings_rates(user_id).await?),
        Report::BurnRate => print_json(&engine.burn_rate(user_id).await?),
        Report::CashFlow { months } => {
            print_json(&engine.cash_flow_evolution(user_id, months).await?)
        }
        Report::DailyExpenses { year, month } => {
            print_json(&engine.daily_expenses(user_id, year, month).await?)
        }
        Report::NetWorthHistory { months } => {
            print_json(&engine.net_worth_history(user_id, months).await?)
        }
        Report::Forecast => print_json(&engine.forecast(user_id).await?),
        Report::Projection { months } => print_json(&engine.projection(user_id, months).await?),
        Report::Commitment => print_json(&engine.commitment_summary(user_id).await?),
        Report::MonthlyCommitment => print_json(&engine.monthly_commitment(user_id).await?),
        Report::Categories { year, month } => {
            print_json(&engine.list_categories(user_id, year, month).await?)
        }
        Report::Recurring => print_json(&engine.list_recurring_expenses(user_id).await?),
        Report::Goals => print_json(&engine.goal_progress(user_id).await?),
    }
}
