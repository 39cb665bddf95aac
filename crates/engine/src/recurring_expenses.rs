//! Recurring expenses: subscriptions and installment plans.
//!
//! A subscription materializes only its first charge on creation. An
//! installment plan is expanded upfront into one transaction per month whose
//! amounts add up exactly to the plan total (see [`installment_schedule`]).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::add_months};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringType {
    Subscription,
    Installment,
}

impl RecurringType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Installment => "installment",
        }
    }
}

impl TryFrom<&str> for RecurringType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "subscription" => Ok(Self::Subscription),
            "installment" => Ok(Self::Installment),
            other => Err(EngineError::InvalidName(format!(
                "invalid recurring type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidName(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// A recurring obligation.
///
/// `amount` is a positive magnitude: the periodic charge for a subscription,
/// the whole plan total for an installment plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecurringExpense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: MoneyCents,
    pub kind: RecurringType,
    /// Subscriptions only.
    pub frequency: Option<Frequency>,
    /// Installment plans only.
    pub total_installments: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringExpense {
    /// What this obligation costs in a single month.
    ///
    /// Yearly subscriptions are spread over twelve months; installment plans
    /// count one installment, never the plan total.
    pub fn effective_monthly_charge(&self) -> MoneyCents {
        match (self.kind, self.frequency, self.total_installments) {
            (RecurringType::Subscription, Some(Frequency::Yearly), _) => {
                self.amount.checked_div_rounded(12).unwrap_or(self.amount)
            }
            (RecurringType::Subscription, _, _) => self.amount,
            (RecurringType::Installment, _, Some(n)) if n > 0 => self
                .amount
                .checked_div_rounded(i64::from(n))
                .unwrap_or(self.amount),
            (RecurringType::Installment, _, _) => self.amount,
        }
    }

    /// Whether a subscription bills in the month starting at `month_start`.
    ///
    /// Monthly subscriptions bill every month in their validity window,
    /// yearly ones only in the calendar month of `start_date`.
    pub fn bills_in_month(&self, month_start: NaiveDate, month_end: NaiveDate) -> bool {
        if !self.active || self.kind != RecurringType::Subscription {
            return false;
        }
        if self.start_date > month_end {
            return false;
        }
        if self.end_date.is_some_and(|end| end < month_start) {
            return false;
        }
        match self.frequency {
            Some(Frequency::Yearly) => self.start_date.month() == month_start.month(),
            _ => true,
        }
    }
}

/// Longest installment plan accepted (fifty years of monthly payments).
pub const MAX_INSTALLMENTS: u32 = 600;

/// One generated installment of a plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installment {
    /// 1-based.
    pub number: u32,
    pub date: NaiveDate,
    pub amount: MoneyCents,
}

/// Splits `total` into `count` monthly installments starting at `start`.
///
/// Every installment is `total / count` rounded half-to-even to the cent; the
/// rounding remainder goes entirely to the first one so the amounts always
/// add up to `total`. Dates keep the day of `start`, clamped to the month
/// length.
pub fn installment_schedule(
    total: MoneyCents,
    count: u32,
    start: NaiveDate,
) -> ResultEngine<Vec<Installment>> {
    if !(1..=MAX_INSTALLMENTS).contains(&count) {
        return Err(EngineError::InvalidAmount(format!(
            "total_installments must be within 1..={MAX_INSTALLMENTS}"
        )));
    }
    if !total.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    let count_i64 = i64::from(count);
    let base = total
        .checked_div_rounded(count_i64)
        .ok_or_else(|| EngineError::InvalidAmount("invalid installment split".to_string()))?;
    let remainder = total - base * count_i64;

    let mut out = Vec::with_capacity(count as usize);
    for number in 1..=count {
        let amount = if number == 1 { base + remainder } else { base };
        let offset = i32::try_from(number - 1)
            .map_err(|_| EngineError::InvalidAmount("too many installments".to_string()))?;
        out.push(Installment {
            number,
            date: add_months(start, offset),
            amount,
        });
    }
    Ok(out)
}

/// Date of the last installment of a plan.
pub fn installment_end_date(start: NaiveDate, count: u32) -> NaiveDate {
    let offset = i32::try_from(count.saturating_sub(1)).unwrap_or(i32::MAX);
    add_months(start, offset)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount_minor: i64,
    pub kind: String,
    pub frequency: Option<String>,
    pub total_installments: Option<i32>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringExpense> for ActiveModel {
    fn from(value: &RecurringExpense) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            description: ActiveValue::Set(value.description.clone()),
            category_id: ActiveValue::Set(value.category_id),
            account_id: ActiveValue::Set(value.account_id),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            frequency: ActiveValue::Set(value.frequency.map(|f| f.as_str().to_string())),
            total_installments: ActiveValue::Set(
                value
                    .total_installments
                    .map(|n| i32::try_from(n).unwrap_or(i32::MAX)),
            ),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            active: ActiveValue::Set(value.active),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for RecurringExpense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let total_installments = model
            .total_installments
            .map(|n| {
                u32::try_from(n).map_err(|_| {
                    EngineError::InvalidAmount("invalid total_installments".to_string())
                })
            })
            .transpose()?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            description: model.description,
            category_id: model.category_id,
            account_id: model.account_id,
            amount: MoneyCents::new(model.amount_minor),
            kind: RecurringType::try_from(model.kind.as_str())?,
            frequency: model
                .frequency
                .as_deref()
                .map(Frequency::try_from)
                .transpose()?,
            total_installments,
            start_date: model.start_date,
            end_date: model.end_date,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
