use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, FlowKind, ResultEngine, Transaction, TransactionNature,
    TransferCmd, UpdateTransactionCmd, transactions,
    util::{normalize_optional_text, normalize_required_name, positive_amount},
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    /// If present, acts as an allow-list of natures to return.
    pub natures: Option<Vec<TransactionNature>>,
    /// If true, includes soft-deleted transactions (default: false).
    pub include_deleted: bool,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidDate(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.natures.as_ref().is_some_and(|n| n.is_empty()) {
        return Err(EngineError::InvalidName(
            "natures must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Records an income or an expense.
    ///
    /// The amount is a magnitude: incomes are stored positive, expenses
    /// negative. System categories are reserved for the engine.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let CreateTransactionCmd {
            user_id,
            kind,
            amount,
            date,
            description,
            account_id,
            category_id,
        } = cmd;
        let amount = positive_amount(amount, "amount")?;
        let description = normalize_required_name(&description, "description")?;
        let (nature, signed) = match kind {
            FlowKind::Income => (TransactionNature::Income, amount),
            FlowKind::Expense => (TransactionNature::Expense, -amount),
        };
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if let Some(account_id) = account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
            }
            if let Some(category_id) = category_id {
                let category = self
                    .require_visible_category(&db_tx, user_id, category_id)
                    .await?;
                if category.is_system {
                    return Err(EngineError::SystemCategory(
                        "system categories are reserved for balance adjustments".to_string(),
                    ));
                }
            }

            let mut tx = Transaction::new(user_id, description, signed, nature, date, now);
            tx.account_id = account_id;
            tx.category_id = category_id;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx)
        })
    }

    /// Moves money between two accounts of the user.
    ///
    /// Returns the `transfer_group_id` shared by the two rows.
    pub async fn create_transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        self.create_pair(cmd, TransactionNature::Transfer).await
    }

    /// Moves money into an investment account. Same dual entry as a transfer.
    pub async fn create_investment(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        self.create_pair(cmd, TransactionNature::Investment).await
    }

    async fn create_pair(&self, cmd: TransferCmd, nature: TransactionNature) -> ResultEngine<Uuid> {
        let TransferCmd {
            user_id,
            from_account_id,
            to_account_id,
            amount,
            date,
            description,
        } = cmd;
        if from_account_id == to_account_id {
            return Err(EngineError::InvalidId(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        let amount = positive_amount(amount, "amount")?;
        let description = normalize_optional_text(Some(&description)).unwrap_or_else(|| {
            match nature {
                TransactionNature::Investment => "Investment",
                _ => "Transfer",
            }
            .to_string()
        });
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, from_account_id)
                .await?;
            self.require_account(&db_tx, user_id, to_account_id)
                .await?;

            let group_id = Uuid::new_v4();
            for (account_id, signed) in [(from_account_id, -amount), (to_account_id, amount)] {
                let mut leg = Transaction::new(user_id, description.clone(), signed, nature, date, now);
                leg.account_id = Some(account_id);
                leg.transfer_group_id = Some(group_id);
                transactions::ActiveModel::from(&leg).insert(&db_tx).await?;
            }
            tracing::debug!(%group_id, nature = nature.as_str(), %amount, "dual entry recorded");
            Ok(group_id)
        })
    }

    /// Edits a live transaction.
    ///
    /// Income stays positive and expense negative whatever the new amount.
    /// A leg of a transfer or investment carries the whole pair: description,
    /// amount and date change on both rows and each leg keeps its direction.
    /// Balance adjustments are owned by the engine and cannot be edited.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        let UpdateTransactionCmd {
            user_id,
            transaction_id,
            description,
            category_id,
            amount,
            date,
        } = cmd;
        let description = description
            .as_deref()
            .map(|d| normalize_required_name(d, "description"))
            .transpose()?;
        let amount = amount.map(|a| positive_amount(a, "amount")).transpose()?;

        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id)
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let tx = Transaction::try_from(model)?;

            let rows = match (tx.nature, tx.transfer_group_id) {
                (TransactionNature::SystemAdjustment, _) => {
                    return Err(EngineError::InvalidState(
                        "balance adjustments cannot be edited".to_string(),
                    ));
                }
                (nature, Some(group_id)) if nature.is_paired() => {
                    if category_id.is_some() {
                        return Err(EngineError::InvalidState(
                            "transfers and investments carry no category".to_string(),
                        ));
                    }
                    transactions::Entity::find()
                        .filter(transactions::Column::UserId.eq(user_id))
                        .filter(transactions::Column::TransferGroupId.eq(group_id))
                        .filter(transactions::Column::DeletedAt.is_null())
                        .all(&db_tx)
                        .await?
                        .into_iter()
                        .map(Transaction::try_from)
                        .collect::<ResultEngine<Vec<_>>>()?
                }
                _ => {
                    if let Some(category_id) = category_id {
                        let category = self
                            .require_visible_category(&db_tx, user_id, category_id)
                            .await?;
                        if category.is_system {
                            return Err(EngineError::SystemCategory(
                                "system categories are reserved for balance adjustments"
                                    .to_string(),
                            ));
                        }
                    }
                    vec![tx]
                }
            };

            let mut edited = None;
            for mut row in rows {
                if let Some(description) = &description {
                    row.description = description.clone();
                }
                if category_id.is_some() {
                    row.category_id = category_id;
                }
                if let Some(amount) = amount {
                    row.amount = match row.nature {
                        TransactionNature::Income => amount,
                        TransactionNature::Expense => -amount,
                        _ if row.amount.is_negative() => -amount,
                        _ => amount,
                    };
                }
                if let Some(date) = date {
                    row.date = date;
                }
                transactions::ActiveModel::from(&row).update(&db_tx).await?;
                if row.id == transaction_id {
                    edited = Some(row);
                }
            }

            tracing::info!(%transaction_id, "transaction updated");
            edited.ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
        })
    }

    /// Soft-deletes a transaction.
    ///
    /// A member of a transfer group takes every row of the group with it.
    /// Returns the number of rows marked deleted.
    pub async fn delete_transaction(&self, user_id: Uuid, transaction_id: Uuid) -> ResultEngine<u64> {
        let now = self.clock.now();
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id)
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let scope = match model.transfer_group_id {
                Some(group_id) => transactions::Column::TransferGroupId.eq(group_id),
                None => transactions::Column::Id.eq(model.id),
            };
            let res = transactions::Entity::update_many()
                .col_expr(transactions::Column::DeletedAt, Expr::value(Some(now)))
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::DeletedAt.is_null())
                .filter(scope)
                .exec(&db_tx)
                .await?;

            tracing::info!(%transaction_id, rows = res.rows_affected, "transaction deleted");
            Ok(res.rows_affected)
        })
    }

    /// Lists transactions of the user, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id));
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::Date.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(natures) = &filter.natures {
            let natures: Vec<&str> = natures.iter().map(|n| n.as_str()).collect();
            query = query.filter(transactions::Column::Nature.is_in(natures));
        }
        if !filter.include_deleted {
            query = query.filter(transactions::Column::DeletedAt.is_null());
        }

        query
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Live transactions of the user dated in `[from, to]`.
    pub(super) async fn live_transactions<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::DeletedAt.is_null());
        if let Some(from) = from {
            query = query.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(transactions::Column::Date.lte(to));
        }
        query
            .order_by_asc(transactions::Column::Date)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
