use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    ADJUSTMENT_CATEGORY_NAME, Account, AccountBalance, AccountView, AssetsLiabilities,
    BalanceSnapshot, CreateAccountCmd, EngineError, MoneyCents, NetWorth, ResultEngine,
    Transaction, TransactionNature, UpdateAccountCmd, accounts, balance_history, balances,
    recurring_expenses, transactions,
    util::{normalize_name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates an account and records its first balance snapshot.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let CreateAccountCmd {
            user_id,
            name,
            kind,
            initial_balance,
            initial_balance_date,
        } = cmd;
        let name = normalize_required_name(&name, "account name")?;
        let initial_balance = initial_balance.within_limit()?;
        let now = self.clock.now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_account_name_free(&db_tx, user_id, &name, None)
                .await?;

            let account = Account {
                id: Uuid::new_v4(),
                user_id,
                name,
                kind,
                initial_balance,
                initial_balance_date,
                created_at: now,
                updated_at: now,
            };
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            self.upsert_snapshot(
                &db_tx,
                user_id,
                account.id,
                initial_balance_date,
                initial_balance,
            )
            .await?;
            tracing::info!(account_id = %account.id, kind = account.kind.as_str(), "account created");
            Ok(account)
        })
    }

    /// Applies a patch to an account.
    ///
    /// When `current_balance` differs from the derived balance, one
    /// `SYSTEM_ADJUSTMENT` transaction dated today books the difference in the
    /// shared adjustment category. Any change that moves the balance upserts
    /// today's snapshot, so repeated corrections on the same day keep a
    /// single history row.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<AccountView> {
        let UpdateAccountCmd {
            user_id,
            account_id,
            name,
            kind,
            initial_balance,
            initial_balance_date,
            current_balance,
        } = cmd;
        let name = name
            .as_deref()
            .map(|n| normalize_required_name(n, "account name"))
            .transpose()?;
        let initial_balance = initial_balance.map(MoneyCents::within_limit).transpose()?;
        let current_balance = current_balance.map(MoneyCents::within_limit).transpose()?;
        let today = self.clock.today();
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, user_id, account_id).await?;

            if let Some(name) = name {
                if normalize_name_key(&name) != normalize_name_key(&account.name) {
                    self.ensure_account_name_free(&db_tx, user_id, &name, Some(account.id))
                        .await?;
                }
                account.name = name;
            }
            if let Some(kind) = kind {
                account.kind = kind;
            }

            let mut balance_moved = false;
            if let Some(amount) = initial_balance
                && amount != account.initial_balance
            {
                account.initial_balance = amount;
                balance_moved = true;
            }
            if let Some(date) = initial_balance_date
                && date != account.initial_balance_date
            {
                account.initial_balance_date = date;
                balance_moved = true;
            }
            account.updated_at = now;
            accounts::ActiveModel::from(&account).update(&db_tx).await?;

            let mut balance = self.derived_balance(&db_tx, &account).await?;
            if let Some(target) = current_balance {
                let diff = target - balance;
                if !diff.is_zero() {
                    let (category, _) = self.adjustment_category(&db_tx).await?;
                    let mut adjustment = Transaction::new(
                        user_id,
                        ADJUSTMENT_CATEGORY_NAME.to_string(),
                        diff,
                        TransactionNature::SystemAdjustment,
                        today,
                        now,
                    );
                    adjustment.account_id = Some(account.id);
                    adjustment.category_id = Some(category.id);
                    transactions::ActiveModel::from(&adjustment)
                        .insert(&db_tx)
                        .await?;
                    tracing::info!(
                        account_id = %account.id,
                        %diff,
                        "balance adjustment booked"
                    );
                    balance = self.derived_balance(&db_tx, &account).await?;
                    balance_moved = true;
                }
            }

            if balance_moved {
                self.upsert_snapshot(&db_tx, user_id, account.id, today, balance)
                    .await?;
            }
            Ok(AccountView { account, balance })
        })
    }

    /// Hard-deletes an account.
    ///
    /// Its transactions and recurring expenses are kept but lose the account
    /// link; balance snapshots are kept as they are.
    pub async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::AccountId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;
            recurring_expenses::Entity::update_many()
                .col_expr(
                    recurring_expenses::Column::AccountId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(recurring_expenses::Column::UserId.eq(user_id))
                .filter(recurring_expenses::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(%account_id, "account deleted");
            Ok(())
        })
    }

    /// Returns one account with its derived balance.
    pub async fn account(&self, user_id: Uuid, account_id: Uuid) -> ResultEngine<AccountView> {
        let account = self
            .require_account(&self.database, user_id, account_id)
            .await?;
        let balance = self.derived_balance(&self.database, &account).await?;
        Ok(AccountView { account, balance })
    }

    /// Returns every account of the user with its derived balance, by name.
    pub async fn list_accounts(&self, user_id: Uuid) -> ResultEngine<Vec<AccountView>> {
        self.account_views(&self.database, user_id).await
    }

    /// Derived balance of an account.
    ///
    /// An unknown account (or one owned by another user) has balance 0.
    pub async fn account_balance(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        let model = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?;
        let Some(model) = model else {
            tracing::warn!(%account_id, "balance requested for unknown account");
            return Ok(MoneyCents::ZERO);
        };
        let account = Account::try_from(model)?;
        self.derived_balance(&self.database, &account).await
    }

    /// Sum of the balances of the user's liquid accounts.
    pub async fn available_balance(&self, user_id: Uuid) -> ResultEngine<MoneyCents> {
        let views = self.account_views(&self.database, user_id).await?;
        Ok(balances::available_balance(
            views.iter().map(|v| (v.account.kind, v.balance)),
        ))
    }

    /// Assets, liabilities and their difference.
    pub async fn net_worth(&self, user_id: Uuid) -> ResultEngine<NetWorth> {
        let views = self.account_views(&self.database, user_id).await?;
        let net_worth = NetWorth::from_balances(views.iter().map(|v| (v.account.kind, v.balance)));
        tracing::debug!(%user_id, net_worth = %net_worth.net_worth, "net worth computed");
        Ok(net_worth)
    }

    /// Accounts grouped by balance sheet side.
    pub async fn assets_liabilities(&self, user_id: Uuid) -> ResultEngine<AssetsLiabilities> {
        let views = self.account_views(&self.database, user_id).await?;
        Ok(AssetsLiabilities::from_views(views))
    }

    pub async fn account_balances(&self, user_id: Uuid) -> ResultEngine<Vec<AccountBalance>> {
        let views = self.account_views(&self.database, user_id).await?;
        Ok(views.iter().map(AccountBalance::from).collect())
    }

    /// Balance snapshots of the user, oldest first.
    pub async fn balance_history(&self, user_id: Uuid) -> ResultEngine<Vec<BalanceSnapshot>> {
        let models = balance_history::Entity::find()
            .filter(balance_history::Column::UserId.eq(user_id))
            .order_by_asc(balance_history::Column::Date)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(BalanceSnapshot::from).collect())
    }

    pub(super) async fn load_accounts<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub(super) async fn account_views<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<Vec<AccountView>> {
        let accounts = self.load_accounts(db, user_id).await?;
        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::AccountId.is_not_null())
            .filter(transactions::Column::DeletedAt.is_null())
            .all(db)
            .await?;

        let mut by_account: HashMap<Uuid, Vec<Transaction>> = HashMap::new();
        for row in rows {
            let tx = Transaction::try_from(row)?;
            if let Some(account_id) = tx.account_id {
                by_account.entry(account_id).or_default().push(tx);
            }
        }

        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = by_account
                    .get(&account.id)
                    .map_or(account.initial_balance, |txs| {
                        balances::account_balance(&account, txs)
                    });
                AccountView { account, balance }
            })
            .collect())
    }

    pub(super) async fn derived_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        account: &Account,
    ) -> ResultEngine<MoneyCents> {
        let txs: Vec<Transaction> = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(account.user_id))
            .filter(transactions::Column::AccountId.eq(account.id))
            .filter(transactions::Column::DeletedAt.is_null())
            .filter(transactions::Column::Date.gte(account.initial_balance_date))
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<_>>()?;
        Ok(balances::account_balance(account, &txs))
    }

    /// One snapshot per account and day: an existing row is overwritten.
    async fn upsert_snapshot<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        account_id: Uuid,
        date: NaiveDate,
        balance: MoneyCents,
    ) -> ResultEngine<()> {
        let existing = balance_history::Entity::find()
            .filter(balance_history::Column::AccountId.eq(account_id))
            .filter(balance_history::Column::Date.eq(date))
            .one(db)
            .await?;
        match existing {
            Some(model) => {
                balance_history::ActiveModel {
                    id: ActiveValue::Unchanged(model.id),
                    balance_minor: ActiveValue::Set(balance.cents()),
                    ..Default::default()
                }
                .update(db)
                .await?;
            }
            None => {
                let snapshot = BalanceSnapshot {
                    id: Uuid::new_v4(),
                    user_id,
                    account_id,
                    date,
                    balance,
                };
                balance_history::ActiveModel::from(&snapshot)
                    .insert(db)
                    .await?;
            }
        }
        Ok(())
    }

    async fn ensure_account_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let key = normalize_name_key(name);
        let clash = self
            .load_accounts(db, user_id)
            .await?
            .into_iter()
            .any(|a| Some(a.id) != except && normalize_name_key(&a.name) == key);
        if clash {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
