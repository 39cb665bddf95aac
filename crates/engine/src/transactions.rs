//! Transaction primitives.
//!
//! A `Transaction` is one signed row of the unified ledger. The sign of
//! `amount` encodes the direction (positive = inflow, negative = outflow) and
//! `nature` its economic role. Transfers and investments are always two rows
//! sharing a `transfer_group_id`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionNature {
    Income,
    Expense,
    Investment,
    Transfer,
    SystemAdjustment,
}

impl TransactionNature {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Investment => "INVESTMENT",
            Self::Transfer => "TRANSFER",
            Self::SystemAdjustment => "SYSTEM_ADJUSTMENT",
        }
    }

    /// Only income and expense are real economic flows; transfers,
    /// investments and adjustments are internal movement or reconciliation.
    pub fn is_operational(self) -> bool {
        matches!(self, Self::Income | Self::Expense)
    }

    /// Natures recorded as a dual-entry pair.
    pub fn is_paired(self) -> bool {
        matches!(self, Self::Transfer | Self::Investment)
    }
}

impl TryFrom<&str> for TransactionNature {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            "INVESTMENT" => Ok(Self::Investment),
            "TRANSFER" => Ok(Self::Transfer),
            "SYSTEM_ADJUSTMENT" => Ok(Self::SystemAdjustment),
            other => Err(EngineError::InvalidName(format!(
                "invalid transaction nature: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: MoneyCents,
    pub nature: TransactionNature,
    pub date: NaiveDate,
    pub recurring_expense_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub transfer_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Build a new, not yet persisted row.
    pub fn new(
        user_id: Uuid,
        description: String,
        amount: MoneyCents,
        nature: TransactionNature,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            description,
            category_id: None,
            account_id: None,
            amount,
            nature,
            date,
            recurring_expense_id: None,
            installment_number: None,
            transfer_group_id: None,
            created_at,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount_minor: i64,
    pub nature: String,
    pub date: Date,
    pub recurring_expense_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub transfer_group_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::recurring_expenses::Entity",
        from = "Column::RecurringExpenseId",
        to = "super::recurring_expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    RecurringExpenses,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::recurring_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id),
            description: ActiveValue::Set(tx.description.clone()),
            category_id: ActiveValue::Set(tx.category_id),
            account_id: ActiveValue::Set(tx.account_id),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            nature: ActiveValue::Set(tx.nature.as_str().to_string()),
            date: ActiveValue::Set(tx.date),
            recurring_expense_id: ActiveValue::Set(tx.recurring_expense_id),
            installment_number: ActiveValue::Set(tx.installment_number),
            transfer_group_id: ActiveValue::Set(tx.transfer_group_id),
            created_at: ActiveValue::Set(tx.created_at),
            deleted_at: ActiveValue::Set(tx.deleted_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            description: model.description,
            category_id: model.category_id,
            account_id: model.account_id,
            amount: MoneyCents::new(model.amount_minor),
            nature: TransactionNature::try_from(model.nature.as_str())?,
            date: model.date,
            recurring_expense_id: model.recurring_expense_id,
            installment_number: model.installment_number,
            transfer_group_id: model.transfer_group_id,
            created_at: model.created_at,
            deleted_at: model.deleted_at,
        })
    }
}
