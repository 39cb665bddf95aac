//! How much of the income recurring obligations take.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    MoneyCents, RecurringExpense, RecurringType, Transaction, TransactionNature,
    analytics::is_operational,
    util::{month_end, month_start, round_to},
};

/// Totals over the active recurring records of a user.
///
/// `total_recurring`, `total_subscriptions` and `total_installments` add up
/// the declared amounts (the whole plan for an installment). The percentage
/// instead uses `monthly_commitment`, where each plan only counts one
/// installment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CommitmentSummary {
    pub total_recurring: MoneyCents,
    pub total_subscriptions: MoneyCents,
    pub total_installments: MoneyCents,
    pub monthly_commitment: MoneyCents,
    pub avg_income_last_3m: MoneyCents,
    /// Whole percent of the average income; `None` without income.
    pub commitment_percentage: Option<f64>,
}

impl CommitmentSummary {
    pub fn compute<'a, I>(recurring: I, avg_income_last_3m: MoneyCents) -> Self
    where
        I: IntoIterator<Item = &'a RecurringExpense>,
    {
        let mut total_subscriptions = MoneyCents::ZERO;
        let mut total_installments = MoneyCents::ZERO;
        let mut monthly_commitment = MoneyCents::ZERO;
        for item in recurring.into_iter().filter(|r| r.active) {
            match item.kind {
                RecurringType::Subscription => total_subscriptions += item.amount,
                RecurringType::Installment => total_installments += item.amount,
            }
            monthly_commitment += item.effective_monthly_charge();
        }

        let commitment_percentage = if avg_income_last_3m.is_positive() {
            monthly_commitment
                .ratio(avg_income_last_3m)
                .map(|r| round_to(r * 100.0, 0))
        } else {
            None
        };

        Self {
            total_recurring: total_subscriptions + total_installments,
            total_subscriptions,
            total_installments,
            monthly_commitment,
            avg_income_last_3m,
            commitment_percentage,
        }
    }
}

/// The current month seen from `today`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MonthlyCommitment {
    /// Operational expense already dated on or before today.
    pub spent_to_date: MoneyCents,
    /// Recurring-linked expense still to come this month.
    pub upcoming_recurring: MoneyCents,
    /// Recurring-linked income of the month.
    pub expected_income: MoneyCents,
    pub committed_percentage: f64,
    pub projected_balance: MoneyCents,
}

impl MonthlyCommitment {
    pub fn compute<'a, I>(transactions: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let first = month_start(today);
        let last = month_end(today);

        let mut spent = MoneyCents::ZERO;
        let mut upcoming = MoneyCents::ZERO;
        let mut expected_income = MoneyCents::ZERO;
        for tx in transactions
            .into_iter()
            .filter(|tx| is_operational(tx) && tx.date >= first && tx.date <= last)
        {
            let recurring = tx.recurring_expense_id.is_some();
            match tx.nature {
                TransactionNature::Expense if tx.date <= today => spent += tx.amount,
                TransactionNature::Expense if recurring => upcoming += tx.amount,
                TransactionNature::Income if recurring => expected_income += tx.amount,
                _ => {}
            }
        }
        let spent_to_date = spent.abs();
        let upcoming_recurring = upcoming.abs();
        let committed = spent_to_date + upcoming_recurring;

        let committed_percentage = if expected_income.is_positive() {
            committed
                .ratio(expected_income)
                .map_or(0.0, |r| round_to(r * 100.0, 2))
        } else {
            0.0
        };

        Self {
            spent_to_date,
            upcoming_recurring,
            expected_income,
            committed_percentage,
            projected_balance: expected_income - committed,
        }
    }
}
