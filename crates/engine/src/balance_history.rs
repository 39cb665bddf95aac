//! Per-account, per-day snapshots of the derived balance.
//!
//! Rows outlive their account: they carry the history needed to rebuild the
//! net-worth trend without replaying the whole ledger.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "balance_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date: Date,
    pub balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BalanceSnapshot> for ActiveModel {
    fn from(value: &BalanceSnapshot) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            account_id: ActiveValue::Set(value.account_id),
            date: ActiveValue::Set(value.date),
            balance_minor: ActiveValue::Set(value.balance.cents()),
        }
    }
}

impl From<Model> for BalanceSnapshot {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            account_id: model.account_id,
            date: model.date,
            balance: MoneyCents::new(model.balance_minor),
        }
    }
}
