//! The module contains the `Account` struct and its persistence model.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

/// Kind of account. Drives the asset/liability classification and liquidity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Bank,
    Wallet,
    Savings,
    Investment,
    CreditCard,
    OtherAsset,
    OtherLiability,
}

/// Side of the balance sheet an account type lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Asset,
    Liability,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Wallet => "wallet",
            Self::Savings => "savings",
            Self::Investment => "investment",
            Self::CreditCard => "credit_card",
            Self::OtherAsset => "other_asset",
            Self::OtherLiability => "other_liability",
        }
    }

    pub fn classification(self) -> Classification {
        match self {
            Self::Bank | Self::Wallet | Self::Savings | Self::Investment | Self::OtherAsset => {
                Classification::Asset
            }
            Self::CreditCard | Self::OtherLiability => Classification::Liability,
        }
    }

    /// Liquid accounts make up the available balance.
    pub fn is_liquid(self) -> bool {
        matches!(self, Self::Bank | Self::Wallet | Self::Savings)
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "wallet" => Ok(Self::Wallet),
            "savings" => Ok(Self::Savings),
            "investment" => Ok(Self::Investment),
            "credit_card" => Ok(Self::CreditCard),
            "other_asset" => Ok(Self::OtherAsset),
            "other_liability" => Ok(Self::OtherLiability),
            other => Err(EngineError::InvalidName(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

/// An account.
///
/// The current balance is never stored: it is derived from
/// `initial_balance` plus every qualifying transaction (see
/// [`account_balance`](crate::balances::account_balance)).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: AccountType,
    pub initial_balance: MoneyCents,
    /// Transactions dated before this day are already captured by
    /// `initial_balance`.
    pub initial_balance_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account paired with its derived balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub account: Account,
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: String,
    pub initial_balance_minor: i64,
    pub initial_balance_date: Date,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            initial_balance_minor: ActiveValue::Set(value.initial_balance.cents()),
            initial_balance_date: ActiveValue::Set(value.initial_balance_date),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: AccountType::try_from(model.kind.as_str())?,
            initial_balance: MoneyCents::new(model.initial_balance_minor),
            initial_balance_date: model.initial_balance_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
