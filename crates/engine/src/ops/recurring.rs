use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CategoryType, CommitmentSummary, CreateRecurringCmd, EngineError, MoneyCents,
    MonthlyCommitment, RecurringExpense, RecurringType, ResultEngine, Transaction,
    TransactionNature, UpdateRecurringCmd,
    analytics::{average, operational_months},
    recurring_expenses::{self, MAX_INSTALLMENTS, installment_end_date, installment_schedule},
    transactions,
    util::{month_end, month_start, normalize_required_name, positive_amount},
};

use super::{Engine, forecast::TRAILING_WINDOW, with_tx};

/// Income rows are stored positive, everything else negative.
fn signed(nature: TransactionNature, amount: MoneyCents) -> MoneyCents {
    match nature {
        TransactionNature::Income => amount,
        _ => -amount,
    }
}

fn installment_description(description: &str, number: u32, count: u32) -> String {
    format!("{description} ({number}/{count})")
}

impl Engine {
    /// Creates a subscription or an installment plan together with the
    /// transactions it generates.
    ///
    /// A subscription books its first charge on `start_date`; an installment
    /// plan books every installment upfront, one per month. The generated
    /// rows are income when the category is an income category and expense
    /// otherwise.
    pub async fn create_recurring_expense(
        &self,
        cmd: CreateRecurringCmd,
    ) -> ResultEngine<RecurringExpense> {
        let description = normalize_required_name(&cmd.description, "description")?;
        let amount = positive_amount(cmd.amount, "amount")?;
        let end_date = match cmd.kind {
            RecurringType::Subscription => {
                if cmd.frequency.is_none() {
                    return Err(EngineError::InvalidName(
                        "subscriptions need a frequency".to_string(),
                    ));
                }
                if cmd.end_date.is_some_and(|end| end < cmd.start_date) {
                    return Err(EngineError::InvalidDate(
                        "end_date must be >= start_date".to_string(),
                    ));
                }
                cmd.end_date
            }
            RecurringType::Installment => {
                let count = cmd.total_installments.unwrap_or(0);
                if !(1..=MAX_INSTALLMENTS).contains(&count) {
                    return Err(EngineError::InvalidAmount(format!(
                        "total_installments must be within 1..={MAX_INSTALLMENTS}"
                    )));
                }
                Some(installment_end_date(cmd.start_date, count))
            }
        };
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.user_id).await?;
            if let Some(account_id) = cmd.account_id {
                self.require_account(&db_tx, cmd.user_id, account_id)
                    .await?;
            }
            let nature = match cmd.category_id {
                Some(category_id) => {
                    self.generated_nature(&db_tx, cmd.user_id, category_id)
                        .await?
                }
                None => TransactionNature::Expense,
            };

            let recurring = RecurringExpense {
                id: Uuid::new_v4(),
                user_id: cmd.user_id,
                description,
                category_id: cmd.category_id,
                account_id: cmd.account_id,
                amount,
                kind: cmd.kind,
                frequency: match cmd.kind {
                    RecurringType::Subscription => cmd.frequency,
                    RecurringType::Installment => None,
                },
                total_installments: match cmd.kind {
                    RecurringType::Subscription => None,
                    RecurringType::Installment => cmd.total_installments,
                },
                start_date: cmd.start_date,
                end_date,
                active: true,
                created_at: now,
                updated_at: now,
            };
            recurring_expenses::ActiveModel::from(&recurring)
                .insert(&db_tx)
                .await?;

            let generated = match (recurring.kind, recurring.total_installments) {
                (RecurringType::Installment, Some(count)) => {
                    installment_schedule(recurring.amount, count, recurring.start_date)?
                        .into_iter()
                        .map(|installment| {
                            let mut tx = Transaction::new(
                                recurring.user_id,
                                installment_description(
                                    &recurring.description,
                                    installment.number,
                                    count,
                                ),
                                signed(nature, installment.amount),
                                nature,
                                installment.date,
                                now,
                            );
                            tx.installment_number = i32::try_from(installment.number).ok();
                            tx
                        })
                        .collect()
                }
                _ => vec![Transaction::new(
                    recurring.user_id,
                    recurring.description.clone(),
                    signed(nature, recurring.amount),
                    nature,
                    recurring.start_date,
                    now,
                )],
            };

            let count = generated.len();
            for mut tx in generated {
                tx.category_id = recurring.category_id;
                tx.account_id = recurring.account_id;
                tx.recurring_expense_id = Some(recurring.id);
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            }

            tracing::info!(
                id = %recurring.id,
                kind = recurring.kind.as_str(),
                generated = count,
                "recurring expense created"
            );
            Ok(recurring)
        })
    }

    /// Edits the description, category or amount of a recurring expense.
    ///
    /// The `active` flag is left as it is: a terminated record stays
    /// terminated. Generated transactions dated after today follow the
    /// record (description, category, direction and amount); past ones are
    /// history and are kept. The total of an installment plan can only
    /// change while none of its installments is due.
    pub async fn update_recurring_expense(
        &self,
        cmd: UpdateRecurringCmd,
    ) -> ResultEngine<RecurringExpense> {
        let UpdateRecurringCmd {
            user_id,
            recurring_id,
            description,
            category_id,
            amount,
        } = cmd;
        let description = description
            .as_deref()
            .map(|d| normalize_required_name(d, "description"))
            .transpose()?;
        let amount = amount.map(|a| positive_amount(a, "amount")).transpose()?;
        let today = self.clock.today();
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            let mut recurring = self
                .require_recurring(&db_tx, user_id, recurring_id)
                .await?;
            let nature = match category_id {
                Some(category_id) => Some(
                    self.generated_nature(&db_tx, user_id, category_id)
                        .await?,
                ),
                None => None,
            };

            let generated: Vec<Transaction> = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::RecurringExpenseId.eq(recurring_id))
                .filter(transactions::Column::DeletedAt.is_null())
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<_>>()?;

            let mut schedule: HashMap<u32, MoneyCents> = HashMap::new();
            if let (Some(amount), RecurringType::Installment, Some(count)) =
                (amount, recurring.kind, recurring.total_installments)
            {
                if amount != recurring.amount && generated.iter().any(|tx| tx.date <= today) {
                    return Err(EngineError::InvalidState(
                        "installment plan already started; its total is fixed".to_string(),
                    ));
                }
                schedule = installment_schedule(amount, count, recurring.start_date)?
                    .into_iter()
                    .map(|installment| (installment.number, installment.amount))
                    .collect();
            }

            if let Some(description) = description {
                recurring.description = description;
            }
            if category_id.is_some() {
                recurring.category_id = category_id;
            }
            if let Some(amount) = amount {
                recurring.amount = amount;
            }
            recurring.updated_at = now;
            recurring_expenses::ActiveModel::from(&recurring)
                .update(&db_tx)
                .await?;

            let mut followed = 0_u64;
            for mut tx in generated.into_iter().filter(|tx| tx.date > today) {
                let number = tx
                    .installment_number
                    .and_then(|n| u32::try_from(n).ok());
                tx.description = match (number, recurring.total_installments) {
                    (Some(number), Some(count)) => {
                        installment_description(&recurring.description, number, count)
                    }
                    _ => recurring.description.clone(),
                };
                tx.category_id = recurring.category_id;
                let magnitude = match (recurring.kind, number) {
                    (RecurringType::Installment, Some(number)) => schedule
                        .get(&number)
                        .copied()
                        .unwrap_or_else(|| tx.amount.abs()),
                    _ => amount.unwrap_or_else(|| tx.amount.abs()),
                };
                let nature = nature.unwrap_or(tx.nature);
                tx.nature = nature;
                tx.amount = signed(nature, magnitude);
                transactions::ActiveModel::from(&tx).update(&db_tx).await?;
                followed += 1;
            }

            tracing::info!(%recurring_id, followed, "recurring expense updated");
            Ok(recurring)
        })
    }

    pub async fn recurring_expense(
        &self,
        user_id: Uuid,
        recurring_id: Uuid,
    ) -> ResultEngine<RecurringExpense> {
        self.require_recurring(&self.database, user_id, recurring_id)
            .await
    }

    /// Every recurring expense of the user, active or not, by start date.
    pub async fn list_recurring_expenses(
        &self,
        user_id: Uuid,
    ) -> ResultEngine<Vec<RecurringExpense>> {
        recurring_expenses::Entity::find()
            .filter(recurring_expenses::Column::UserId.eq(user_id))
            .order_by_asc(recurring_expenses::Column::StartDate)
            .order_by_asc(recurring_expenses::Column::Description)
            .all(&self.database)
            .await?
            .into_iter()
            .map(RecurringExpense::try_from)
            .collect()
    }

    /// Stops a recurring expense.
    ///
    /// The record stays, marked inactive and ending today at the latest;
    /// generated transactions dated after today are removed, past ones are
    /// kept. Returns the number of removed transactions.
    pub async fn terminate_recurring_expense(
        &self,
        user_id: Uuid,
        recurring_id: Uuid,
    ) -> ResultEngine<u64> {
        let today = self.clock.today();
        let now = self.clock.now();
        with_tx!(self, |db_tx| {
            let mut recurring = self
                .require_recurring(&db_tx, user_id, recurring_id)
                .await?;
            if !recurring.active {
                return Err(EngineError::InvalidState(
                    "recurring expense already terminated".to_string(),
                ));
            }

            let res = transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::RecurringExpenseId.eq(recurring_id))
                .filter(transactions::Column::Date.gt(today))
                .exec(&db_tx)
                .await?;

            recurring.active = false;
            recurring.end_date = Some(recurring.end_date.map_or(today, |end| end.min(today)));
            recurring.updated_at = now;
            recurring_expenses::ActiveModel::from(&recurring)
                .update(&db_tx)
                .await?;

            tracing::info!(%recurring_id, removed = res.rows_affected, "recurring expense terminated");
            Ok(res.rows_affected)
        })
    }

    /// Deletes a recurring expense and every transaction it generated.
    ///
    /// Returns the number of removed transactions.
    pub async fn remove_recurring_expense(
        &self,
        user_id: Uuid,
        recurring_id: Uuid,
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.require_recurring(&db_tx, user_id, recurring_id)
                .await?;

            let res = transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::RecurringExpenseId.eq(recurring_id))
                .exec(&db_tx)
                .await?;
            recurring_expenses::Entity::delete_by_id(recurring_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(%recurring_id, removed = res.rows_affected, "recurring expense removed");
            Ok(res.rows_affected)
        })
    }

    /// Share of the trailing average income taken by active recurring
    /// obligations.
    ///
    /// Entries in income categories are income, not obligations, and are
    /// left out.
    pub async fn commitment_summary(&self, user_id: Uuid) -> ResultEngine<CommitmentSummary> {
        let income_categories = self.income_category_ids(user_id).await?;
        let obligations: Vec<RecurringExpense> = self
            .list_recurring_expenses(user_id)
            .await?
            .into_iter()
            .filter(|r| {
                !r.category_id
                    .is_some_and(|id| income_categories.contains(&id))
            })
            .collect();
        let window = self
            .closed_window_transactions(user_id, TRAILING_WINDOW)
            .await?;
        let avg_income = average(operational_months(&window).iter().map(|m| m.total_income));
        Ok(CommitmentSummary::compute(&obligations, avg_income))
    }

    /// Spending and commitments of the current month.
    pub async fn monthly_commitment(&self, user_id: Uuid) -> ResultEngine<MonthlyCommitment> {
        let today = self.clock.today();
        let txs = self
            .live_transactions(
                &self.database,
                user_id,
                Some(month_start(today)),
                Some(month_end(today)),
            )
            .await?;
        Ok(MonthlyCommitment::compute(&txs, today))
    }
}

impl Engine {
    /// Direction of the rows generated in `category_id`: income for an income
    /// category, expense otherwise. System categories are refused.
    async fn generated_nature<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<TransactionNature> {
        let category = self
            .require_visible_category(db, user_id, category_id)
            .await?;
        if category.is_system {
            return Err(EngineError::SystemCategory(
                "system categories are reserved for balance adjustments".to_string(),
            ));
        }
        Ok(match category.kind {
            CategoryType::Income => TransactionNature::Income,
            CategoryType::Expense => TransactionNature::Expense,
        })
    }
}
