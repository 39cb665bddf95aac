//! Financial goals and their progress.
//!
//! Progress is never stored: [`GoalProgress::compute`] derives it from the
//! current net worth every time it is requested.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::round_to};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    Savings,
    NetWorth,
}

impl GoalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Savings => "SAVINGS",
            Self::NetWorth => "NET_WORTH",
        }
    }
}

impl TryFrom<&str> for GoalType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SAVINGS" => Ok(Self::Savings),
            "NET_WORTH" => Ok(Self::NetWorth),
            other => Err(EngineError::InvalidName(format!(
                "invalid goal type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: MoneyCents,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub goal_type: GoalType,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub current_amount: MoneyCents,
    pub percentage_completed: f64,
    pub remaining_amount: MoneyCents,
    pub days_remaining: i64,
    pub on_track: bool,
}

impl GoalProgress {
    pub fn compute(goal: Goal, current_amount: MoneyCents, today: NaiveDate) -> Self {
        let target = goal.target_amount;

        let percentage_completed = if target.is_positive() && today >= goal.start_date {
            current_amount
                .ratio(target)
                .map(|r| round_to(r * 100.0, 2))
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let remaining_amount = if current_amount < target {
            target - current_amount
        } else {
            MoneyCents::ZERO
        };

        let days_remaining = (goal.target_date - today).num_days().max(0);

        let on_track = if today < goal.start_date {
            true
        } else if today > goal.target_date {
            current_amount >= target
        } else {
            let total_days = (goal.target_date - goal.start_date).num_days();
            if total_days <= 0 {
                current_amount >= target
            } else {
                // current >= target * elapsed / total, kept in integers.
                let elapsed = (today - goal.start_date).num_days();
                i128::from(current_amount.cents()) * i128::from(total_days)
                    >= i128::from(target.cents()) * i128::from(elapsed)
            }
        };

        Self {
            goal,
            current_amount,
            percentage_completed,
            remaining_amount,
            days_remaining,
            on_track,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_amount_minor: i64,
    pub start_date: Date,
    pub target_date: Date,
    pub goal_type: String,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(value: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            target_amount_minor: ActiveValue::Set(value.target_amount.cents()),
            start_date: ActiveValue::Set(value.start_date),
            target_date: ActiveValue::Set(value.target_date),
            goal_type: ActiveValue::Set(value.goal_type.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            target_amount: MoneyCents::new(model.target_amount_minor),
            start_date: model.start_date,
            target_date: model.target_date,
            goal_type: GoalType::try_from(model.goal_type.as_str())?,
            created_at: model.created_at,
            deleted_at: model.deleted_at,
        })
    }
}
