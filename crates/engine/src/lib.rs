//! Ledger and balance computation engine.
//!
//! Balances are always derived from an account's initial balance and its
//! live transactions; net worth, operational totals, burn rate, forecasts and
//! goal progress are computed on top of them. Every operation is scoped to a
//! user and every multi-row write is atomic.

pub use accounts::{Account, AccountType, AccountView, Classification};
pub use analytics::{
    BurnRate, DailyExpenses, DailyPoint, MonthlyTotals, OperationalMonth, SavingsRate, Trend,
};
pub use balance_history::BalanceSnapshot;
pub use balances::{
    AccountBalance, AssetsLiabilities, NetWorth, NetWorthPoint, account_balance,
};
pub use categories::{
    ADJUSTMENT_CATEGORY_NAME, Category, CategoryType, CategoryView, DEFAULT_EXPENSE_CATEGORIES,
    DEFAULT_INCOME_CATEGORIES,
};
pub use category_overrides::CategoryOverride;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{
    CategoryPatch, CreateAccountCmd, CreateCategoryCmd, CreateGoalCmd, CreateRecurringCmd,
    CreateTransactionCmd, FlowKind, TransferCmd, UpdateAccountCmd, UpdateRecurringCmd,
    UpdateTransactionCmd,
};
pub use commitment::{CommitmentSummary, MonthlyCommitment};
pub use error::EngineError;
pub use forecast::{Forecast, ProjectionItem, ProjectionMonth};
pub use goals::{Goal, GoalProgress, GoalType};
pub use money::MoneyCents;
pub use ops::{
    DEFAULT_PROJECTION_MONTHS, Engine, EngineBuilder, MAX_HISTORY_MONTHS, TransactionListFilter,
};
pub use recurring_expenses::{
    Frequency, Installment, MAX_INSTALLMENTS, RecurringExpense, RecurringType,
};
pub use transactions::{Transaction, TransactionNature};

mod accounts;
mod analytics;
mod balance_history;
mod balances;
mod categories;
mod category_overrides;
mod clock;
mod commands;
mod commitment;
mod error;
mod forecast;
mod goals;
mod money;
mod ops;
mod recurring_expenses;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
