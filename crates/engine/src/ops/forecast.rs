use uuid::Uuid;

use crate::{
    EngineError, Forecast, MoneyCents, ProjectionMonth, RecurringExpense, ResultEngine,
    Transaction,
    analytics::{average, operational_months},
    forecast::{ProjectionInput, project},
};

use super::Engine;

/// Months walked by [`Engine::projection`] when the caller does not say.
pub const DEFAULT_PROJECTION_MONTHS: u32 = 12;
const MAX_PROJECTION_MONTHS: u32 = 60;
/// Closed months behind every trailing average.
pub(super) const TRAILING_WINDOW: u32 = 3;

impl Engine {
    /// Straight-line extrapolation of the current net worth from the average
    /// operational result of the last three closed months.
    pub async fn forecast(&self, user_id: Uuid) -> ResultEngine<Forecast> {
        let net_worth = self.net_worth(user_id).await?;
        let window = self
            .closed_window_transactions(user_id, TRAILING_WINDOW)
            .await?;
        let avg_result = average(operational_months(&window).iter().map(|m| m.net_result));

        let forecast = Forecast::compute(net_worth.net_worth, avg_result, self.clock.today());
        tracing::debug!(
            %user_id,
            avg_result = %avg_result,
            months_until_zero = ?forecast.months_until_zero,
            "forecast computed"
        );
        Ok(forecast)
    }

    /// Month by month cash projection starting from the available balance.
    ///
    /// `months` defaults to [`DEFAULT_PROJECTION_MONTHS`] and must be within
    /// `1..=60`.
    pub async fn projection(
        &self,
        user_id: Uuid,
        months: Option<u32>,
    ) -> ResultEngine<Vec<ProjectionMonth>> {
        let months = months.unwrap_or(DEFAULT_PROJECTION_MONTHS);
        if !(1..=MAX_PROJECTION_MONTHS).contains(&months) {
            return Err(EngineError::InvalidAmount(format!(
                "projection months must be within 1..={MAX_PROJECTION_MONTHS}"
            )));
        }
        let today = self.clock.today();

        let starting_balance = self.available_balance(user_id).await?;

        let window: Vec<Transaction> = self
            .closed_window_transactions(user_id, TRAILING_WINDOW)
            .await?
            .into_iter()
            .filter(|tx| tx.recurring_expense_id.is_none())
            .collect();
        let variable = operational_months(&window);
        let avg_variable_income = average(variable.iter().map(|m| m.total_income));
        let avg_variable_expense = average(variable.iter().map(|m| m.total_expense));

        let income_categories = self.income_category_ids(user_id).await?;
        let (recurring_income, recurring_expense): (Vec<RecurringExpense>, Vec<RecurringExpense>) =
            self.list_recurring_expenses(user_id)
                .await?
                .into_iter()
                .filter(|r| r.active)
                .partition(|r| {
                    r.category_id
                        .is_some_and(|id| income_categories.contains(&id))
                });

        let installments: Vec<Transaction> = self
            .live_transactions(&self.database, user_id, Some(today), None)
            .await?
            .into_iter()
            .filter(|tx| tx.installment_number.is_some())
            .collect();

        let input = ProjectionInput {
            starting_balance,
            avg_variable_income,
            avg_variable_expense,
            recurring_income: &recurring_income,
            recurring_expense: &recurring_expense,
            installments: &installments,
        };
        let out = project(&input, today, months);
        tracing::debug!(
            %user_id,
            months,
            last = %out.last().map_or(MoneyCents::ZERO, |m| m.projected_balance),
            "projection computed"
        );
        Ok(out)
    }
}
