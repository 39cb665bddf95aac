//! Forward-looking projections.
//!
//! [`Forecast`] is a straight-line extrapolation of net worth from the
//! trailing operational result. [`project`] is the detailed month-by-month
//! walk that applies each recurring obligation in the month it falls due.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use crate::{
    MoneyCents, RecurringExpense, Transaction,
    util::{add_months, month_end, month_start, round_to},
};

/// Days counted for the fractional part of a month.
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub current_net_worth: MoneyCents,
    pub avg_monthly_result_last_3m: MoneyCents,
    pub projected_3m: MoneyCents,
    pub projected_6m: MoneyCents,
    pub projected_12m: MoneyCents,
    /// Only set when the average result is negative.
    pub months_until_zero: Option<f64>,
    pub projected_date_of_zero: Option<NaiveDate>,
}

impl Forecast {
    pub fn compute(
        current_net_worth: MoneyCents,
        avg_monthly_result: MoneyCents,
        today: NaiveDate,
    ) -> Self {
        let (months_until_zero, projected_date_of_zero) = if avg_monthly_result.is_negative() {
            if current_net_worth.cents() <= 0 {
                (Some(0.0), Some(today))
            } else {
                let months = current_net_worth
                    .ratio(avg_monthly_result)
                    .map(f64::abs)
                    .unwrap_or(0.0);
                (Some(round_to(months, 2)), Some(date_after_months(today, months)))
            }
        } else {
            (None, None)
        };

        Self {
            current_net_worth,
            avg_monthly_result_last_3m: avg_monthly_result,
            projected_3m: current_net_worth + avg_monthly_result * 3,
            projected_6m: current_net_worth + avg_monthly_result * 6,
            projected_12m: current_net_worth + avg_monthly_result * 12,
            months_until_zero,
            projected_date_of_zero,
        }
    }
}

/// `today` plus the whole months of `months`, then the fraction as days.
fn date_after_months(today: NaiveDate, months: f64) -> NaiveDate {
    let whole = months.trunc();
    let days = ((months - whole) * DAYS_PER_MONTH).round();
    let whole = if whole >= f64::from(u32::MAX) { u32::MAX } else { whole as u32 };
    today
        .checked_add_months(Months::new(whole))
        .and_then(|d| d.checked_add_days(Days::new(days as u64)))
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectionItem {
    pub description: String,
    pub amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectionMonth {
    /// First day of the projected month.
    pub month: NaiveDate,
    pub initial_balance: MoneyCents,
    pub income: MoneyCents,
    pub income_items: Vec<ProjectionItem>,
    pub recurring_items: Vec<ProjectionItem>,
    pub installment_items: Vec<ProjectionItem>,
    pub variable_expenses: MoneyCents,
    pub projected_balance: MoneyCents,
}

/// Everything the month-by-month walk needs, already loaded and scoped to a
/// single user.
#[derive(Clone, Debug)]
pub struct ProjectionInput<'a> {
    pub starting_balance: MoneyCents,
    /// Trailing average of operational income not tied to a recurring entry.
    pub avg_variable_income: MoneyCents,
    /// Trailing average of operational expense not tied to a recurring entry.
    pub avg_variable_expense: MoneyCents,
    pub recurring_income: &'a [RecurringExpense],
    pub recurring_expense: &'a [RecurringExpense],
    /// Generated installment rows, positive or negative.
    pub installments: &'a [Transaction],
}

/// Label of the averaged income line.
pub const AVERAGE_INCOME_LABEL: &str = "Average income";

/// Walks `months` months forward, starting with the month after `today`.
pub fn project(
    input: &ProjectionInput<'_>,
    today: NaiveDate,
    months: u32,
) -> Vec<ProjectionMonth> {
    let mut out = Vec::with_capacity(months as usize);
    let mut balance = input.starting_balance;

    for offset in 1..=months {
        let first = add_months(month_start(today), offset as i32);
        let last = month_end(first);

        let mut income_items = vec![ProjectionItem {
            description: AVERAGE_INCOME_LABEL.to_string(),
            amount: input.avg_variable_income,
        }];
        income_items.extend(
            input
                .recurring_income
                .iter()
                .filter(|r| r.bills_in_month(first, last))
                .map(|r| ProjectionItem {
                    description: r.description.clone(),
                    amount: r.amount,
                }),
        );
        let month_installments: Vec<&Transaction> = input
            .installments
            .iter()
            .filter(|tx| !tx.is_deleted() && tx.date >= first && tx.date <= last)
            .collect();
        // Installments booked as income add to the month's income.
        income_items.extend(
            month_installments
                .iter()
                .filter(|tx| tx.amount.is_positive())
                .map(|tx| ProjectionItem {
                    description: tx.description.clone(),
                    amount: tx.amount,
                }),
        );
        let income: MoneyCents = income_items.iter().map(|i| i.amount).sum();

        let recurring_items: Vec<ProjectionItem> = input
            .recurring_expense
            .iter()
            .filter(|r| r.bills_in_month(first, last))
            .map(|r| ProjectionItem {
                description: r.description.clone(),
                amount: r.amount,
            })
            .collect();

        let installment_items: Vec<ProjectionItem> = month_installments
            .iter()
            .filter(|tx| tx.amount.is_negative())
            .map(|tx| ProjectionItem {
                description: tx.description.clone(),
                amount: tx.amount.abs(),
            })
            .collect();

        let outflow: MoneyCents = recurring_items
            .iter()
            .chain(installment_items.iter())
            .map(|i| i.amount)
            .sum();
        let projected_balance = balance + income - outflow - input.avg_variable_expense;

        out.push(ProjectionMonth {
            month: first,
            initial_balance: balance,
            income,
            income_items,
            recurring_items,
            installment_items,
            variable_expenses: input.avg_variable_expense,
            projected_balance,
        });
        balance = projected_balance;
    }
    out
}
