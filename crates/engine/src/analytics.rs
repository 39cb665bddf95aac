//! Operational aggregation.
//!
//! "Operational" means income and expense only: transfers, investments and
//! system adjustments are internal movement or reconciliation and never reach
//! any total computed here. Every function filters through
//! [`is_operational`] so the rule is enforced in one place.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    MoneyCents, Transaction, TransactionNature,
    util::{add_months, month_end, month_start, round_to},
};

/// A live income or expense row.
pub fn is_operational(tx: &Transaction) -> bool {
    !tx.is_deleted() && tx.nature.is_operational()
}

/// Income, expense and net result of a period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    pub income: MoneyCents,
    /// Absolute value of the expense sum.
    pub expense: MoneyCents,
    /// `income + signed expense`.
    pub result: MoneyCents,
}

impl MonthlyTotals {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut income = MoneyCents::ZERO;
        let mut expense_signed = MoneyCents::ZERO;
        for tx in transactions.into_iter().filter(|tx| is_operational(tx)) {
            match tx.nature {
                TransactionNature::Income => income += tx.amount,
                TransactionNature::Expense => expense_signed += tx.amount,
                _ => {}
            }
        }
        Self {
            income,
            expense: expense_signed.abs(),
            result: income + expense_signed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OperationalMonth {
    /// First day of the month.
    pub month: NaiveDate,
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub net_result: MoneyCents,
}

impl OperationalMonth {
    fn new(month: NaiveDate, totals: MonthlyTotals) -> Self {
        Self {
            month,
            total_income: totals.income,
            total_expense: totals.expense,
            net_result: totals.result,
        }
    }
}

/// Groups operational transactions by calendar month, oldest first.
///
/// Months without any operational row are absent.
pub fn operational_months<'a, I>(transactions: I) -> Vec<OperationalMonth>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut by_month: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions.into_iter().filter(|tx| is_operational(tx)) {
        by_month.entry(month_start(tx.date)).or_default().push(tx);
    }
    by_month
        .into_iter()
        .map(|(month, txs)| OperationalMonth::new(month, MonthlyTotals::from_transactions(txs)))
        .collect()
}

/// The last `count` calendar months up to and including the one containing
/// `today`, zero-filled, oldest first.
pub fn cash_flow_evolution(
    months: &[OperationalMonth],
    today: NaiveDate,
    count: u32,
) -> Vec<OperationalMonth> {
    let current = month_start(today);
    let by_month: BTreeMap<NaiveDate, &OperationalMonth> =
        months.iter().map(|m| (m.month, m)).collect();
    (0..count)
        .rev()
        .map(|back| {
            let month = add_months(current, -(back as i32));
            by_month.get(&month).map_or(
                OperationalMonth::new(month, MonthlyTotals::default()),
                |m| **m,
            )
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SavingsRate {
    pub month: NaiveDate,
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub net_result: MoneyCents,
    /// `net_result / total_income` rounded to 4 digits, 0 without income.
    pub savings_rate: f64,
}

impl From<&OperationalMonth> for SavingsRate {
    fn from(month: &OperationalMonth) -> Self {
        let savings_rate = if month.total_income.is_positive() {
            month
                .net_result
                .ratio(month.total_income)
                .map_or(0.0, |r| round_to(r, 4))
        } else {
            0.0
        };
        Self {
            month: month.month,
            total_income: month.total_income,
            total_expense: month.total_expense,
            net_result: month.net_result,
            savings_rate,
        }
    }
}

/// Closed months in `[current - skip - len, current - skip)`, where `current`
/// is the month containing `today`.
///
/// `skip = 0, len = 3` is "the last three closed months".
pub fn closed_window(
    months: &[OperationalMonth],
    today: NaiveDate,
    skip: u32,
    len: u32,
) -> Vec<OperationalMonth> {
    let current = month_start(today);
    let end = add_months(current, -(skip as i32));
    let start = add_months(current, -((skip + len) as i32));
    months
        .iter()
        .filter(|m| m.month >= start && m.month < end)
        .copied()
        .collect()
}

/// Mean of `values` rounded half-to-even to the cent, 0 when empty.
pub fn average<I>(values: I) -> MoneyCents
where
    I: IntoIterator<Item = MoneyCents>,
{
    let (sum, count) = values
        .into_iter()
        .fold((MoneyCents::ZERO, 0i64), |(sum, n), v| (sum + v, n + 1));
    sum.checked_div_rounded(count).unwrap_or(MoneyCents::ZERO)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// `UP` at +5% or more, `DOWN` at -5% or less, `STABLE` otherwise and
    /// whenever `previous` is zero.
    pub fn classify(last: MoneyCents, previous: MoneyCents) -> Self {
        if previous.is_zero() {
            return Self::Stable;
        }
        let last = i128::from(last.cents()) * 100;
        let previous = i128::from(previous.cents());
        if last >= previous * 105 {
            Self::Up
        } else if last <= previous * 95 {
            Self::Down
        } else {
            Self::Stable
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BurnRate {
    pub avg_last_3m: MoneyCents,
    pub avg_prev_3m: MoneyCents,
    pub trend: Trend,
}

impl BurnRate {
    /// Average expense of the last three closed months against the three
    /// before them. The current month is always left out.
    pub fn compute(months: &[OperationalMonth], today: NaiveDate) -> Self {
        let avg_last_3m = average(
            closed_window(months, today, 0, 3)
                .iter()
                .map(|m| m.total_expense),
        );
        let avg_prev_3m = average(
            closed_window(months, today, 3, 3)
                .iter()
                .map(|m| m.total_expense),
        );
        Self {
            avg_last_3m,
            avg_prev_3m,
            trend: Trend::classify(avg_last_3m, avg_prev_3m),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub day: u32,
    pub cumulative: MoneyCents,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DailyExpenses {
    pub current_month: Vec<DailyPoint>,
    pub previous_month: Vec<DailyPoint>,
}

/// Running total of operational expense for each day of the month starting
/// at `month`, up to and including `until` (clamped to the month).
pub fn cumulative_daily_expenses<'a, I>(
    transactions: I,
    month: NaiveDate,
    until: NaiveDate,
) -> Vec<DailyPoint>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let first = month_start(month);
    let last = month_end(month).min(until);
    if last < first {
        return Vec::new();
    }

    let mut per_day: BTreeMap<u32, MoneyCents> = BTreeMap::new();
    for tx in transactions.into_iter().filter(|tx| {
        is_operational(tx)
            && tx.nature == TransactionNature::Expense
            && tx.date >= first
            && tx.date <= last
    }) {
        *per_day.entry(tx.date.day()).or_default() += tx.amount.abs();
    }

    let mut running = MoneyCents::ZERO;
    (1..=last.day())
        .map(|day| {
            running += per_day.get(&day).copied().unwrap_or_default();
            DailyPoint {
                day,
                cumulative: running,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(nature: TransactionNature, amount: i64, on: NaiveDate) -> Transaction {
        Transaction::new(
            Uuid::nil(),
            "t".to_string(),
            MoneyCents::new(amount),
            nature,
            on,
            Utc::now(),
        )
    }

    fn month(m: NaiveDate, income: i64, expense: i64) -> OperationalMonth {
        OperationalMonth {
            month: m,
            total_income: MoneyCents::new(income),
            total_expense: MoneyCents::new(expense),
            net_result: MoneyCents::new(income - expense),
        }
    }

    #[test]
    fn totals_exclude_internal_movement() {
        let on = date(2026, 4, 10);
        let mut deleted = tx(TransactionNature::Expense, -70_00, on);
        deleted.deleted_at = Some(Utc::now());
        let txs = vec![
            tx(TransactionNature::Income, 2000_00, on),
            tx(TransactionNature::Expense, -500_00, on),
            tx(TransactionNature::Transfer, -300_00, on),
            tx(TransactionNature::Transfer, 300_00, on),
            tx(TransactionNature::Investment, -100_00, on),
            tx(TransactionNature::SystemAdjustment, 42_00, on),
            deleted,
        ];
        let totals = MonthlyTotals::from_transactions(&txs);
        assert_eq!(totals.income, MoneyCents::new(2000_00));
        assert_eq!(totals.expense, MoneyCents::new(500_00));
        assert_eq!(totals.result, MoneyCents::new(1500_00));
    }

    #[test]
    fn months_group_and_skip_non_operational() {
        let txs = vec![
            tx(TransactionNature::Income, 100_00, date(2026, 1, 3)),
            tx(TransactionNature::Transfer, 50_00, date(2026, 2, 3)),
            tx(TransactionNature::Expense, -30_00, date(2026, 3, 9)),
            tx(TransactionNature::Expense, -20_00, date(2026, 3, 30)),
        ];
        let months = operational_months(&txs);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, date(2026, 1, 1));
        assert_eq!(months[1].total_expense, MoneyCents::new(50_00));
        assert_eq!(months[1].net_result, MoneyCents::new(-50_00));
    }

    #[test]
    fn savings_rate_guards_zero_income() {
        let with_income = SavingsRate::from(&month(date(2026, 1, 1), 3000_00, 1000_00));
        assert_eq!(with_income.savings_rate, 0.6667);
        let without = SavingsRate::from(&month(date(2026, 1, 1), 0, 1000_00));
        assert_eq!(without.savings_rate, 0.0);
    }

    #[test]
    fn trend_thresholds() {
        let prev = MoneyCents::new(1000_00);
        assert_eq!(Trend::classify(MoneyCents::new(1050_00), prev), Trend::Up);
        assert_eq!(Trend::classify(MoneyCents::new(1049_99), prev), Trend::Stable);
        assert_eq!(Trend::classify(MoneyCents::new(950_00), prev), Trend::Down);
        assert_eq!(Trend::classify(MoneyCents::new(950_01), prev), Trend::Stable);
        assert_eq!(Trend::classify(MoneyCents::new(5000_00), MoneyCents::ZERO), Trend::Stable);
    }

    #[test]
    fn burn_rate_uses_closed_months_only() {
        let today = date(2026, 7, 15);
        let months = vec![
            month(date(2026, 1, 1), 0, 100_00),
            month(date(2026, 2, 1), 0, 100_00),
            month(date(2026, 3, 1), 0, 100_00),
            month(date(2026, 4, 1), 0, 200_00),
            month(date(2026, 5, 1), 0, 200_00),
            month(date(2026, 6, 1), 0, 200_00),
            month(date(2026, 7, 1), 0, 9999_00),
        ];
        let burn = BurnRate::compute(&months, today);
        assert_eq!(burn.avg_last_3m, MoneyCents::new(200_00));
        assert_eq!(burn.avg_prev_3m, MoneyCents::new(100_00));
        assert_eq!(burn.trend, Trend::Up);
    }

    #[test]
    fn burn_rate_is_stable_without_history() {
        let today = date(2026, 7, 15);
        let months = vec![month(date(2026, 6, 1), 0, 800_00)];
        let burn = BurnRate::compute(&months, today);
        assert_eq!(burn.avg_prev_3m, MoneyCents::ZERO);
        assert_eq!(burn.trend, Trend::Stable);
    }

    #[test]
    fn evolution_is_zero_filled() {
        let months = vec![month(date(2026, 5, 1), 10_00, 5_00)];
        let evolution = cash_flow_evolution(&months, date(2026, 6, 20), 3);
        let keys: Vec<NaiveDate> = evolution.iter().map(|m| m.month).collect();
        assert_eq!(keys, vec![date(2026, 4, 1), date(2026, 5, 1), date(2026, 6, 1)]);
        assert_eq!(evolution[0].total_income, MoneyCents::ZERO);
        assert_eq!(evolution[1].net_result, MoneyCents::new(5_00));
    }

    #[test]
    fn daily_curve_accumulates_expenses() {
        let txs = vec![
            tx(TransactionNature::Expense, -10_00, date(2026, 2, 2)),
            tx(TransactionNature::Expense, -5_00, date(2026, 2, 2)),
            tx(TransactionNature::Income, 500_00, date(2026, 2, 3)),
            tx(TransactionNature::Expense, -1_00, date(2026, 2, 4)),
        ];
        let curve = cumulative_daily_expenses(&txs, date(2026, 2, 1), date(2026, 2, 4));
        let values: Vec<i64> = curve.iter().map(|p| p.cumulative.cents()).collect();
        assert_eq!(values, vec![0, 15_00, 15_00, 16_00]);

        let full = cumulative_daily_expenses(&txs, date(2026, 2, 1), date(2026, 12, 31));
        assert_eq!(full.len(), 28);
        assert_eq!(full[27].cumulative, MoneyCents::new(16_00));
    }
}
