use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    AccountType, BurnRate, DailyExpenses, EngineError, MonthlyTotals, NetWorthPoint,
    OperationalMonth, ResultEngine, SavingsRate, Transaction,
    analytics::{cash_flow_evolution, cumulative_daily_expenses, operational_months},
    balances::net_worth_at,
    util::{add_months, first_of_month, month_end, month_start},
};

use super::Engine;

/// Longest history window served by the month-by-month reports.
pub const MAX_HISTORY_MONTHS: u32 = 120;

fn history_span(months: u32) -> ResultEngine<i32> {
    if !(1..=MAX_HISTORY_MONTHS).contains(&months) {
        return Err(EngineError::InvalidAmount(format!(
            "history months must be within 1..={MAX_HISTORY_MONTHS}"
        )));
    }
    Ok(months as i32)
}

impl Engine {
    /// Operational income, expense and result of one calendar month.
    pub async fn monthly_totals(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthlyTotals> {
        let first = first_of_month(year, month)?;
        let txs = self
            .live_transactions(&self.database, user_id, Some(first), Some(month_end(first)))
            .await?;
        let totals = MonthlyTotals::from_transactions(&txs);
        tracing::debug!(%user_id, year, month, result = %totals.result, "monthly totals computed");
        Ok(totals)
    }

    /// Operational income, expense and result of one calendar year.
    pub async fn yearly_totals(&self, user_id: Uuid, year: i32) -> ResultEngine<MonthlyTotals> {
        let first = first_of_month(year, 1)?;
        let last = month_end(first_of_month(year, 12)?);
        let txs = self
            .live_transactions(&self.database, user_id, Some(first), Some(last))
            .await?;
        Ok(MonthlyTotals::from_transactions(&txs))
    }

    /// Every month with operational activity, oldest first.
    pub async fn operational_monthly(&self, user_id: Uuid) -> ResultEngine<Vec<OperationalMonth>> {
        let txs = self
            .live_transactions(&self.database, user_id, None, None)
            .await?;
        Ok(operational_months(&txs))
    }

    pub async fn savings_rates(&self, user_id: Uuid) -> ResultEngine<Vec<SavingsRate>> {
        let months = self.operational_monthly(user_id).await?;
        Ok(months.iter().map(SavingsRate::from).collect())
    }

    /// Average expense of the last three closed months against the three
    /// before them.
    pub async fn burn_rate(&self, user_id: Uuid) -> ResultEngine<BurnRate> {
        let months = self.operational_monthly(user_id).await?;
        let burn_rate = BurnRate::compute(&months, self.clock.today());
        tracing::debug!(
            %user_id,
            last = %burn_rate.avg_last_3m,
            previous = %burn_rate.avg_prev_3m,
            "burn rate computed"
        );
        Ok(burn_rate)
    }

    /// The last `months` calendar months including the current one,
    /// zero-filled. `months` must be within `1..=`[`MAX_HISTORY_MONTHS`].
    pub async fn cash_flow_evolution(
        &self,
        user_id: Uuid,
        months: u32,
    ) -> ResultEngine<Vec<OperationalMonth>> {
        let span = history_span(months)?;
        let today = self.clock.today();
        let from = add_months(month_start(today), 1 - span);
        let txs = self
            .live_transactions(&self.database, user_id, Some(from), Some(month_end(today)))
            .await?;
        Ok(cash_flow_evolution(&operational_months(&txs), today, months))
    }

    /// Day by day cumulative expense of a month and of the month before.
    ///
    /// The current month stops at today.
    pub async fn daily_expenses(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> ResultEngine<DailyExpenses> {
        let first = first_of_month(year, month)?;
        let previous = add_months(first, -1);
        let last = month_end(first);
        let txs = self
            .live_transactions(&self.database, user_id, Some(previous), Some(last))
            .await?;
        let today = self.clock.today();
        let until = if month_start(today) == first { today } else { last };

        Ok(DailyExpenses {
            current_month: cumulative_daily_expenses(&txs, first, until),
            previous_month: cumulative_daily_expenses(&txs, previous, month_end(previous)),
        })
    }

    /// Month-end net worth of the last `months` months (current included),
    /// rebuilt from balance snapshots.
    pub async fn net_worth_history(
        &self,
        user_id: Uuid,
        months: u32,
    ) -> ResultEngine<Vec<NetWorthPoint>> {
        let span = history_span(months)?;
        let kinds: HashMap<Uuid, AccountType> = self
            .load_accounts(&self.database, user_id)
            .await?
            .into_iter()
            .map(|account| (account.id, account.kind))
            .collect();
        let snapshots = self.balance_history(user_id).await?;
        let current = month_start(self.clock.today());

        Ok((0..span)
            .rev()
            .map(|back| {
                let month = add_months(current, -back);
                NetWorthPoint {
                    month,
                    totals: net_worth_at(&snapshots, &kinds, month_end(month)),
                }
            })
            .collect())
    }

    /// Live transactions of the `window` closed months before the current
    /// one.
    pub(super) async fn closed_window_transactions(
        &self,
        user_id: Uuid,
        window: u32,
    ) -> ResultEngine<Vec<Transaction>> {
        let current = month_start(self.clock.today());
        let from = add_months(current, -(window as i32));
        let Some(to) = current.pred_opt() else {
            return Ok(Vec::new());
        };
        self.live_transactions(&self.database, user_id, Some(from), Some(to))
            .await
    }
}
