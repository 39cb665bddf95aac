//! Command structs for engine operations.
//!
//! These types group parameters for write operations (accounts, transactions,
//! transfers, recurring expenses, categories, goals), keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountType, CategoryType, Frequency, GoalType, MoneyCents, RecurringType};

/// Create an account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountType,
    pub initial_balance: MoneyCents,
    pub initial_balance_date: NaiveDate,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        kind: AccountType,
        initial_balance_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            kind,
            initial_balance: MoneyCents::ZERO,
            initial_balance_date,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, amount: MoneyCents) -> Self {
        self.initial_balance = amount;
        self
    }
}

/// Patch an account. Unset fields are left untouched.
///
/// `current_balance` is the balance the user reads on the bank statement:
/// when it differs from the derived one the engine books the difference as a
/// system adjustment.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub kind: Option<AccountType>,
    pub initial_balance: Option<MoneyCents>,
    pub initial_balance_date: Option<NaiveDate>,
    pub current_balance: Option<MoneyCents>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(user_id: Uuid, account_id: Uuid) -> Self {
        Self {
            user_id,
            account_id,
            name: None,
            kind: None,
            initial_balance: None,
            initial_balance_date: None,
            current_balance: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountType) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, amount: MoneyCents) -> Self {
        self.initial_balance = Some(amount);
        self
    }

    #[must_use]
    pub fn initial_balance_date(mut self, date: NaiveDate) -> Self {
        self.initial_balance_date = Some(date);
        self
    }

    #[must_use]
    pub fn current_balance(mut self, amount: MoneyCents) -> Self {
        self.current_balance = Some(amount);
        self
    }
}

/// Direction of a single-row transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowKind {
    Income,
    Expense,
}

/// Create an income or expense.
///
/// `amount` is a magnitude (> 0); the engine signs it from `kind`.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: Uuid,
    pub kind: FlowKind,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub description: String,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn income(
        user_id: Uuid,
        amount: MoneyCents,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self::new(user_id, FlowKind::Income, amount, date, description)
    }

    #[must_use]
    pub fn expense(
        user_id: Uuid,
        amount: MoneyCents,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self::new(user_id, FlowKind::Expense, amount, date, description)
    }

    fn new(
        user_id: Uuid,
        kind: FlowKind,
        amount: MoneyCents,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            amount,
            date,
            description: description.into(),
            account_id: None,
            category_id: None,
        }
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Patch an income, expense, transfer or investment. Unset fields are left
/// untouched.
///
/// `amount` is a magnitude (> 0); the engine keeps the direction of each row.
/// Editing one leg of a transfer or investment edits the whole pair, which
/// carries no category.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub amount: Option<MoneyCents>,
    pub date: Option<NaiveDate>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: Uuid, transaction_id: Uuid) -> Self {
        Self {
            user_id,
            transaction_id,
            description: None,
            category_id: None,
            amount: None,
            date: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Move money between two accounts of the same user (transfer or
/// investment).
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub description: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: MoneyCents,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            from_account_id,
            to_account_id,
            amount,
            date,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Create a subscription or an installment plan.
#[derive(Clone, Debug)]
pub struct CreateRecurringCmd {
    pub user_id: Uuid,
    pub description: String,
    /// Periodic charge for a subscription, plan total for installments.
    pub amount: MoneyCents,
    pub kind: RecurringType,
    pub frequency: Option<Frequency>,
    pub total_installments: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
}

impl CreateRecurringCmd {
    #[must_use]
    pub fn subscription(
        user_id: Uuid,
        description: impl Into<String>,
        amount: MoneyCents,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            description: description.into(),
            amount,
            kind: RecurringType::Subscription,
            frequency: Some(frequency),
            total_installments: None,
            start_date,
            end_date: None,
            category_id: None,
            account_id: None,
        }
    }

    #[must_use]
    pub fn installment(
        user_id: Uuid,
        description: impl Into<String>,
        total: MoneyCents,
        total_installments: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            description: description.into(),
            amount: total,
            kind: RecurringType::Installment,
            frequency: None,
            total_installments: Some(total_installments),
            start_date,
            end_date: None,
            category_id: None,
            account_id: None,
        }
    }

    /// Ignored for installment plans: their end date is the last installment.
    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// Patch a recurring expense. Unset fields are left untouched.
///
/// `amount` has the meaning it has at creation: the periodic charge of a
/// subscription, the plan total of an installment plan.
#[derive(Clone, Debug)]
pub struct UpdateRecurringCmd {
    pub user_id: Uuid,
    pub recurring_id: Uuid,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub amount: Option<MoneyCents>,
}

impl UpdateRecurringCmd {
    #[must_use]
    pub fn new(user_id: Uuid, recurring_id: Uuid) -> Self {
        Self {
            user_id,
            recurring_id,
            description: None,
            category_id: None,
            amount: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Create a user-owned category.
#[derive(Clone, Debug)]
pub struct CreateCategoryCmd {
    pub user_id: Uuid,
    pub name: String,
    pub kind: CategoryType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub monthly_budget: Option<MoneyCents>,
}

impl CreateCategoryCmd {
    #[must_use]
    pub fn new(user_id: Uuid, name: impl Into<String>, kind: CategoryType) -> Self {
        Self {
            user_id,
            name: name.into(),
            kind,
            icon: None,
            color: None,
            monthly_budget: None,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn monthly_budget(mut self, budget: MoneyCents) -> Self {
        self.monthly_budget = Some(budget);
        self
    }
}

/// Display fields a user can change on a category.
///
/// Used both to patch an owned category and to override a shared one.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub monthly_budget: Option<MoneyCents>,
}

impl CategoryPatch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn monthly_budget(mut self, budget: MoneyCents) -> Self {
        self.monthly_budget = Some(budget);
        self
    }
}

/// Create a financial goal.
#[derive(Clone, Debug)]
pub struct CreateGoalCmd {
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: MoneyCents,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub goal_type: GoalType,
}

impl CreateGoalCmd {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        target_amount: MoneyCents,
        start_date: NaiveDate,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            target_amount,
            start_date,
            target_date,
            goal_type: GoalType::Savings,
        }
    }

    #[must_use]
    pub fn goal_type(mut self, goal_type: GoalType) -> Self {
        self.goal_type = goal_type;
        self
    }
}
