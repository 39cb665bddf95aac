#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    AccountType, CreateAccountCmd, CreateTransactionCmd, Engine, FixedClock, MoneyCents,
};
use migration::MigratorTrait;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The frozen "today" of every engine built here.
pub fn today() -> NaiveDate {
    date(2026, 6, 15)
}

pub fn money(raw: &str) -> MoneyCents {
    raw.parse().unwrap()
}

pub async fn engine_with_db_on(today: NaiveDate) -> (Engine, DatabaseConnection, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .clock(FixedClock::new(today))
        .build()
        .await
        .unwrap();
    let alice = engine.create_user("alice").await.unwrap();
    (engine, db, alice)
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection, Uuid) {
    engine_with_db_on(today()).await
}

pub async fn engine() -> (Engine, Uuid) {
    let (engine, _db, alice) = engine_with_db().await;
    (engine, alice)
}

pub async fn account(
    engine: &Engine,
    user_id: Uuid,
    name: &str,
    kind: AccountType,
    initial: &str,
    since: NaiveDate,
) -> Uuid {
    engine
        .create_account(
            CreateAccountCmd::new(user_id, name, kind, since).initial_balance(money(initial)),
        )
        .await
        .unwrap()
        .id
}

pub async fn income(
    engine: &Engine,
    user_id: Uuid,
    account_id: Uuid,
    amount: &str,
    on: NaiveDate,
) -> Uuid {
    engine
        .create_transaction(
            CreateTransactionCmd::income(user_id, money(amount), on, "income")
                .account_id(account_id),
        )
        .await
        .unwrap()
        .id
}

pub async fn expense(
    engine: &Engine,
    user_id: Uuid,
    account_id: Uuid,
    amount: &str,
    on: NaiveDate,
) -> Uuid {
    engine
        .create_transaction(
            CreateTransactionCmd::expense(user_id, money(amount), on, "expense")
                .account_id(account_id),
        )
        .await
        .unwrap()
        .id
}
