//! Balance derivation.
//!
//! Pure functions: callers load the rows and compose the results with their
//! entities, nothing here touches storage or mutates an [`Account`].

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, AccountType, AccountView, BalanceSnapshot, MoneyCents, Transaction,
    accounts::Classification,
};

/// Whether `tx` moves the balance of `account`.
///
/// Soft-deleted rows and rows dated before the initial-balance cutoff never
/// count: the initial balance already captures everything before it.
pub fn counts_for(account: &Account, tx: &Transaction) -> bool {
    tx.account_id == Some(account.id)
        && !tx.is_deleted()
        && tx.date >= account.initial_balance_date
}

/// `initial_balance + Σ amount` over the qualifying transactions.
pub fn account_balance<'a, I>(account: &Account, transactions: I) -> MoneyCents
where
    I: IntoIterator<Item = &'a Transaction>,
{
    account.initial_balance
        + transactions
            .into_iter()
            .filter(|tx| counts_for(account, tx))
            .map(|tx| tx.amount)
            .sum::<MoneyCents>()
}

/// Sum of the balances of liquid accounts.
pub fn available_balance<I>(balances: I) -> MoneyCents
where
    I: IntoIterator<Item = (AccountType, MoneyCents)>,
{
    balances
        .into_iter()
        .filter(|(kind, _)| kind.is_liquid())
        .map(|(_, balance)| balance)
        .sum()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NetWorth {
    pub assets: MoneyCents,
    pub liabilities: MoneyCents,
    pub net_worth: MoneyCents,
}

impl NetWorth {
    /// Folds account balances into assets and liabilities.
    ///
    /// A liability account with a negative balance adds its magnitude to
    /// `liabilities`; a positive one (e.g. a card paid in credit) reduces it.
    pub fn from_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (AccountType, MoneyCents)>,
    {
        let mut assets = MoneyCents::ZERO;
        let mut liabilities = MoneyCents::ZERO;
        for (kind, balance) in balances {
            match kind.classification() {
                Classification::Asset => assets += balance,
                Classification::Liability => {
                    if balance.is_negative() {
                        liabilities += balance.abs();
                    } else {
                        liabilities -= balance;
                    }
                }
            }
        }
        Self {
            assets,
            liabilities,
            net_worth: assets - liabilities,
        }
    }
}

/// Balance of one account, without the rest of the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: Uuid,
    pub kind: AccountType,
    pub balance: MoneyCents,
}

impl From<&AccountView> for AccountBalance {
    fn from(view: &AccountView) -> Self {
        Self {
            account_id: view.account.id,
            kind: view.account.kind,
            balance: view.balance,
        }
    }
}

/// Accounts split by balance sheet side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssetsLiabilities {
    pub assets: Vec<AccountView>,
    pub liabilities: Vec<AccountView>,
    pub totals: NetWorth,
}

impl AssetsLiabilities {
    pub fn from_views(views: Vec<AccountView>) -> Self {
        let totals = NetWorth::from_balances(views.iter().map(|v| (v.account.kind, v.balance)));
        let (assets, liabilities) = views
            .into_iter()
            .partition(|v| v.account.kind.classification() == Classification::Asset);
        Self {
            assets,
            liabilities,
            totals,
        }
    }
}

/// Net worth at the end of a month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NetWorthPoint {
    /// First day of the month.
    pub month: NaiveDate,
    #[serde(flatten)]
    pub totals: NetWorth,
}

/// Net worth as of `as_of` from the latest snapshot of each account on or
/// before that day.
///
/// Snapshots of accounts missing from `kinds` (deleted accounts) cannot be
/// classified and are left out.
pub fn net_worth_at(
    snapshots: &[BalanceSnapshot],
    kinds: &HashMap<Uuid, AccountType>,
    as_of: NaiveDate,
) -> NetWorth {
    let mut latest: HashMap<Uuid, &BalanceSnapshot> = HashMap::new();
    for snapshot in snapshots.iter().filter(|s| s.date <= as_of) {
        latest
            .entry(snapshot.account_id)
            .and_modify(|current| {
                if snapshot.date > current.date {
                    *current = snapshot;
                }
            })
            .or_insert(snapshot);
    }
    NetWorth::from_balances(latest.values().filter_map(|snapshot| {
        kinds
            .get(&snapshot.account_id)
            .map(|kind| (*kind, snapshot.balance))
    }))
}
