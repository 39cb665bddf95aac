use engine::{
    AccountType, CategoryType, CreateAccountCmd, CreateCategoryCmd, CreateTransactionCmd,
    EngineError, MoneyCents, TransactionListFilter, TransactionNature, TransferCmd,
    UpdateAccountCmd, UpdateTransactionCmd,
};
use sea_orm::ConnectionTrait;

mod common;

use common::{account, date, engine, engine_with_db, expense, income, money, today};

#[tokio::test]
async fn net_worth_splits_assets_and_liabilities() {
    let (engine, alice) = engine().await;

    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", today()).await;
    income(&engine, alice, bank, "2000.00", today()).await;
    expense(&engine, alice, bank, "500.00", today()).await;
    let card = account(&engine, alice, "Card", AccountType::CreditCard, "0", today()).await;
    expense(&engine, alice, card, "300.00", today()).await;

    let net_worth = engine.net_worth(alice).await.unwrap();
    assert_eq!(net_worth.net_worth, money("2200.00"));
    assert_eq!(net_worth.assets, money("2500.00"));
    assert_eq!(net_worth.liabilities, money("300.00"));
    assert_eq!(
        net_worth.assets - net_worth.liabilities,
        net_worth.net_worth
    );

    // Only liquid accounts are available.
    assert_eq!(
        engine.available_balance(alice).await.unwrap(),
        money("2500.00")
    );

    let split = engine.assets_liabilities(alice).await.unwrap();
    assert_eq!(split.assets.len(), 1);
    assert_eq!(split.liabilities.len(), 1);
    assert_eq!(split.liabilities[0].balance, money("-300.00"));
    assert_eq!(split.totals, net_worth);
}

#[tokio::test]
async fn balance_ignores_rows_before_the_cutoff() {
    let (engine, alice) = engine().await;
    let bank = account(
        &engine,
        alice,
        "Bank",
        AccountType::Bank,
        "100.00",
        date(2026, 6, 1),
    )
    .await;

    income(&engine, alice, bank, "50.00", date(2026, 5, 31)).await;
    expense(&engine, alice, bank, "20.00", date(2026, 6, 2)).await;

    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("80.00")
    );
    let view = engine.account(alice, bank).await.unwrap();
    assert_eq!(view.balance, money("80.00"));
    assert_eq!(view.account.initial_balance, money("100.00"));
}

#[tokio::test]
async fn soft_deleted_rows_are_excluded_everywhere() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "0", today()).await;

    income(&engine, alice, bank, "100.00", today()).await;
    let coffee = expense(&engine, alice, bank, "40.00", today()).await;
    assert_eq!(engine.delete_transaction(alice, coffee).await.unwrap(), 1);

    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("100.00")
    );
    let totals = engine.monthly_totals(alice, 2026, 6).await.unwrap();
    assert_eq!(totals.income, money("100.00"));
    assert_eq!(totals.expense, MoneyCents::ZERO);
    assert_eq!(totals.result, money("100.00"));

    let err = engine.delete_transaction(alice, coffee).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("transaction not exists".to_string())
    );

    let live = engine
        .list_transactions(alice, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
    let all = engine
        .list_transactions(
            alice,
            &TransactionListFilter {
                include_deleted: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|tx| tx.id == coffee && tx.is_deleted()));
}

#[tokio::test]
async fn expenses_are_stored_negative_and_amounts_must_be_positive() {
    let (engine, alice) = engine().await;

    let tx = engine
        .create_transaction(CreateTransactionCmd::expense(
            alice,
            money("12.50"),
            today(),
            "Lunch",
        ))
        .await
        .unwrap();
    assert_eq!(tx.amount, money("-12.50"));
    assert_eq!(tx.nature, TransactionNature::Expense);

    let err = engine
        .create_transaction(CreateTransactionCmd::income(
            alice,
            MoneyCents::ZERO,
            today(),
            "Nothing",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_transaction(CreateTransactionCmd::income(
            alice,
            money("-5"),
            today(),
            "Negative",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn transfer_is_a_linked_pair_deleted_together() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", today()).await;
    let savings = account(&engine, alice, "Savings", AccountType::Savings, "0", today()).await;

    let group = engine
        .create_transfer(
            TransferCmd::new(alice, bank, savings, money("250.00"), today())
                .description("Monthly saving"),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("750.00")
    );
    assert_eq!(
        engine.account_balance(alice, savings).await.unwrap(),
        money("250.00")
    );

    let legs = engine
        .list_transactions(
            alice,
            &TransactionListFilter {
                natures: Some(vec![TransactionNature::Transfer]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|tx| tx.transfer_group_id == Some(group)));
    assert_eq!(
        legs.iter().map(|tx| tx.amount).sum::<MoneyCents>(),
        MoneyCents::ZERO
    );

    // Internal movement never reaches operational totals.
    let totals = engine.monthly_totals(alice, 2026, 6).await.unwrap();
    assert_eq!(totals.income, MoneyCents::ZERO);
    assert_eq!(totals.expense, MoneyCents::ZERO);

    assert_eq!(engine.delete_transaction(alice, legs[0].id).await.unwrap(), 2);
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("1000.00")
    );
    assert_eq!(
        engine.account_balance(alice, savings).await.unwrap(),
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn investment_moves_money_without_touching_net_worth() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", today()).await;
    let broker = account(
        &engine,
        alice,
        "Broker",
        AccountType::Investment,
        "0",
        today(),
    )
    .await;

    engine
        .create_investment(TransferCmd::new(alice, bank, broker, money("400.00"), today()))
        .await
        .unwrap();

    let net_worth = engine.net_worth(alice).await.unwrap();
    assert_eq!(net_worth.net_worth, money("1000.00"));
    // Investment accounts are not liquid.
    assert_eq!(
        engine.available_balance(alice).await.unwrap(),
        money("600.00")
    );
    let totals = engine.monthly_totals(alice, 2026, 6).await.unwrap();
    assert_eq!(totals.result, MoneyCents::ZERO);
}

#[tokio::test]
async fn transfer_validation() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "100", today()).await;
    let wallet = account(&engine, alice, "Wallet", AccountType::Wallet, "0", today()).await;
    let bobs = account(&engine, bob, "Bank", AccountType::Bank, "0", today()).await;

    let err = engine
        .create_transfer(TransferCmd::new(alice, bank, bank, money("1"), today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidId(_)));

    let err = engine
        .create_transfer(TransferCmd::new(alice, bank, wallet, MoneyCents::ZERO, today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_transfer(TransferCmd::new(alice, bank, bobs, money("1"), today()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("account not exists".to_string())
    );

    // Nothing was written by the rejected calls.
    assert!(
        engine
            .list_transactions(alice, &TransactionListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reconciliation_books_the_difference_once_per_change() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "100.00", today()).await;

    let view = engine
        .update_account(UpdateAccountCmd::new(alice, bank).current_balance(money("150.00")))
        .await
        .unwrap();
    assert_eq!(view.balance, money("150.00"));

    let adjustments = TransactionListFilter {
        natures: Some(vec![TransactionNature::SystemAdjustment]),
        ..Default::default()
    };
    let rows = engine.list_transactions(alice, &adjustments).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, money("50.00"));
    assert_eq!(rows[0].date, today());

    let (category, created) = engine.find_or_create_adjustment_category().await.unwrap();
    assert!(!created);
    assert!(category.is_system);
    assert_eq!(rows[0].category_id, Some(category.id));

    engine
        .update_account(UpdateAccountCmd::new(alice, bank).current_balance(money("120.00")))
        .await
        .unwrap();
    // Already aligned: no further adjustment.
    engine
        .update_account(UpdateAccountCmd::new(alice, bank).current_balance(money("120.00")))
        .await
        .unwrap();
    let rows = engine.list_transactions(alice, &adjustments).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("120.00")
    );

    // Adjustments are not operational.
    let totals = engine.monthly_totals(alice, 2026, 6).await.unwrap();
    assert_eq!(totals.income, MoneyCents::ZERO);
    assert_eq!(totals.expense, MoneyCents::ZERO);

    // One snapshot per account and day.
    let history = engine.balance_history(alice).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].date, today());
    assert_eq!(history[0].balance, money("120.00"));
}

#[tokio::test]
async fn moving_the_cutoff_rederives_the_balance() {
    let (engine, alice) = engine().await;
    let bank = account(
        &engine,
        alice,
        "Bank",
        AccountType::Bank,
        "100.00",
        date(2026, 6, 1),
    )
    .await;
    expense(&engine, alice, bank, "30.00", date(2026, 6, 10)).await;
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("70.00")
    );

    let view = engine
        .update_account(
            UpdateAccountCmd::new(alice, bank)
                .initial_balance_date(date(2026, 6, 11))
                .name("Main bank"),
        )
        .await
        .unwrap();
    assert_eq!(view.balance, money("100.00"));
    assert_eq!(view.account.name, "Main bank");

    let history = engine.balance_history(alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].date, today());
    assert_eq!(history[1].balance, money("100.00"));
}

#[tokio::test]
async fn account_names_are_unique_per_user() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    account(&engine, alice, "Bank", AccountType::Bank, "0", today()).await;

    let err = engine
        .create_account(CreateAccountCmd::new(alice, "  bank ", AccountType::Wallet, today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .create_account(CreateAccountCmd::new(alice, "   ", AccountType::Wallet, today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    // Another user can reuse the name.
    account(&engine, bob, "Bank", AccountType::Bank, "0", today()).await;
}

#[tokio::test]
async fn deleting_an_account_keeps_its_history() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "10.00", today()).await;
    income(&engine, alice, bank, "5.00", today()).await;

    engine.delete_account(alice, bank).await.unwrap();

    assert!(engine.list_accounts(alice).await.unwrap().is_empty());
    let txs = engine
        .list_transactions(alice, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].account_id, None);
    assert_eq!(engine.balance_history(alice).await.unwrap().len(), 1);

    let err = engine.delete_account(alice, bank).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("account not exists".to_string())
    );
}

#[tokio::test]
async fn users_never_see_each_other() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "500.00", today()).await;
    let tx = income(&engine, alice, bank, "10.00", today()).await;

    assert!(matches!(
        engine.account(bob, bank).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert_eq!(
        engine.account_balance(bob, bank).await.unwrap(),
        MoneyCents::ZERO
    );
    assert!(engine.list_accounts(bob).await.unwrap().is_empty());
    assert!(matches!(
        engine.delete_transaction(bob, tx).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    let err = engine
        .create_transaction(
            CreateTransactionCmd::expense(bob, money("1"), today(), "sneaky").account_id(bank),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(
        engine.net_worth(bob).await.unwrap().net_worth,
        MoneyCents::ZERO
    );
    assert_eq!(
        engine.net_worth(alice).await.unwrap().net_worth,
        money("510.00")
    );
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (engine, alice) = engine().await;
    assert_eq!(engine.user_id(" alice ").await.unwrap(), alice);
    assert_eq!(
        engine.create_user("alice").await.unwrap_err(),
        EngineError::ExistingKey("alice".to_string())
    );
}

#[tokio::test]
async fn list_filters_by_range_and_account() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "0", date(2026, 1, 1)).await;
    let wallet = account(
        &engine,
        alice,
        "Wallet",
        AccountType::Wallet,
        "0",
        date(2026, 1, 1),
    )
    .await;
    income(&engine, alice, bank, "1", date(2026, 3, 1)).await;
    income(&engine, alice, bank, "2", date(2026, 4, 1)).await;
    income(&engine, alice, wallet, "3", date(2026, 4, 2)).await;

    let april = engine
        .list_transactions(
            alice,
            &TransactionListFilter {
                from: Some(date(2026, 4, 1)),
                to: Some(date(2026, 4, 30)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(april.len(), 2);
    // Newest first.
    assert_eq!(april[0].date, date(2026, 4, 2));

    let bank_only = engine
        .list_transactions(
            alice,
            &TransactionListFilter {
                account_id: Some(bank),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(bank_only.len(), 2);

    let err = engine
        .list_transactions(
            alice,
            &TransactionListFilter {
                from: Some(date(2026, 5, 1)),
                to: Some(date(2026, 4, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn amounts_above_the_limit_are_rejected() {
    let (engine, alice) = engine().await;
    let too_much = MoneyCents::MAX_AMOUNT + MoneyCents::new(1);

    let err = engine
        .create_account(
            CreateAccountCmd::new(alice, "Vault", AccountType::Savings, today())
                .initial_balance(too_much),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let bank = engine
        .create_account(
            CreateAccountCmd::new(alice, "Bank", AccountType::Bank, today())
                .initial_balance(MoneyCents::MAX_AMOUNT),
        )
        .await
        .unwrap()
        .id;
    let wallet = account(&engine, alice, "Wallet", AccountType::Wallet, "0", today()).await;

    let err = engine
        .create_transaction(
            CreateTransactionCmd::income(alice, too_much, today(), "jackpot").account_id(bank),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_transfer(TransferCmd::new(alice, bank, wallet, too_much, today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .update_account(UpdateAccountCmd::new(alice, bank).current_balance(-too_much))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // Two amounts at the limit still add up without overflow.
    engine
        .create_transaction(
            CreateTransactionCmd::income(alice, MoneyCents::MAX_AMOUNT, today(), "bonus")
                .account_id(bank),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        MoneyCents::MAX_AMOUNT * 2
    );
    assert_eq!(
        engine.net_worth(alice).await.unwrap().net_worth,
        MoneyCents::MAX_AMOUNT * 2
    );
}

#[tokio::test]
async fn editing_a_transaction_keeps_its_direction() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "500.00", date(2026, 1, 1)).await;
    let food = engine
        .create_category(CreateCategoryCmd::new(alice, "Food", CategoryType::Expense))
        .await
        .unwrap();
    let lunch = expense(&engine, alice, bank, "30.00", today()).await;
    let pay = income(&engine, alice, bank, "100.00", today()).await;

    let edited = engine
        .update_transaction(
            UpdateTransactionCmd::new(alice, lunch)
                .description("  Groceries ")
                .category_id(food.id)
                .amount(money("45.00"))
                .date(date(2026, 6, 2)),
        )
        .await
        .unwrap();
    assert_eq!(edited.description, "Groceries");
    assert_eq!(edited.category_id, Some(food.id));
    assert_eq!(edited.amount, money("-45.00"));
    assert_eq!(edited.nature, TransactionNature::Expense);
    assert_eq!(edited.date, date(2026, 6, 2));

    let edited = engine
        .update_transaction(UpdateTransactionCmd::new(alice, pay).amount(money("200.00")))
        .await
        .unwrap();
    assert_eq!(edited.amount, money("200.00"));
    assert_eq!(edited.description, "income");
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("655.00")
    );

    let (adjustment, _) = engine.find_or_create_adjustment_category().await.unwrap();
    let rejected = [
        (
            UpdateTransactionCmd::new(alice, lunch).amount(MoneyCents::ZERO),
            "zero",
        ),
        (
            UpdateTransactionCmd::new(alice, lunch).amount(MoneyCents::MAX_AMOUNT + money("0.01")),
            "over the limit",
        ),
        (UpdateTransactionCmd::new(alice, lunch).description("  "), "blank"),
        (
            UpdateTransactionCmd::new(alice, lunch)
                .amount(money("1.00"))
                .category_id(adjustment.id),
            "system category",
        ),
        (UpdateTransactionCmd::new(bob, lunch).amount(money("1.00")), "foreign"),
    ];
    for (cmd, case) in rejected {
        let err = engine.update_transaction(cmd).await.unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::InvalidAmount(_)
                    | EngineError::InvalidName(_)
                    | EngineError::SystemCategory(_)
                    | EngineError::KeyNotFound(_)
            ),
            "{case}: {err:?}"
        );
    }
    // Nothing above reached the row.
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("655.00")
    );

    engine.delete_transaction(alice, lunch).await.unwrap();
    assert!(matches!(
        engine
            .update_transaction(UpdateTransactionCmd::new(alice, lunch).amount(money("1.00")))
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn editing_one_leg_edits_the_whole_transfer() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", date(2026, 1, 1)).await;
    let savings =
        account(&engine, alice, "Savings", AccountType::Savings, "0", date(2026, 1, 1)).await;
    let group = engine
        .create_transfer(TransferCmd::new(alice, bank, savings, money("250.00"), today()))
        .await
        .unwrap();
    let transfers = TransactionListFilter {
        natures: Some(vec![TransactionNature::Transfer]),
        ..Default::default()
    };
    let legs = engine.list_transactions(alice, &transfers).await.unwrap();
    let incoming = legs.iter().find(|tx| tx.amount.is_positive()).unwrap();

    let edited = engine
        .update_transaction(
            UpdateTransactionCmd::new(alice, incoming.id)
                .amount(money("300.00"))
                .date(date(2026, 6, 10))
                .description("Rainy day fund"),
        )
        .await
        .unwrap();
    assert_eq!(edited.amount, money("300.00"));

    let legs = engine.list_transactions(alice, &transfers).await.unwrap();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|tx| tx.transfer_group_id == Some(group)
        && tx.date == date(2026, 6, 10)
        && tx.description == "Rainy day fund"));
    assert_eq!(
        legs.iter().map(|tx| tx.amount).sum::<MoneyCents>(),
        MoneyCents::ZERO
    );
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("700.00")
    );
    assert_eq!(
        engine.account_balance(alice, savings).await.unwrap(),
        money("300.00")
    );

    let food = engine
        .create_category(CreateCategoryCmd::new(alice, "Food", CategoryType::Expense))
        .await
        .unwrap();
    assert!(matches!(
        engine
            .update_transaction(UpdateTransactionCmd::new(alice, incoming.id).category_id(food.id))
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));

    engine
        .update_account(UpdateAccountCmd::new(alice, bank).current_balance(money("650.00")))
        .await
        .unwrap();
    let adjustments = TransactionListFilter {
        natures: Some(vec![TransactionNature::SystemAdjustment]),
        ..Default::default()
    };
    let adjustment = &engine.list_transactions(alice, &adjustments).await.unwrap()[0];
    assert!(matches!(
        engine
            .update_transaction(
                UpdateTransactionCmd::new(alice, adjustment.id).amount(money("1.00"))
            )
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));
}

#[tokio::test]
async fn failed_transfer_writes_neither_leg() {
    let (engine, db, alice) = engine_with_db().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", date(2026, 1, 1)).await;
    let savings =
        account(&engine, alice, "Savings", AccountType::Savings, "0", date(2026, 1, 1)).await;
    // The outgoing leg is written first; the incoming one is refused.
    db.execute_unprepared(
        "CREATE TRIGGER refuse_incoming_leg BEFORE INSERT ON transactions \
         WHEN NEW.nature = 'TRANSFER' AND NEW.amount_minor > 0 \
         BEGIN SELECT RAISE(ABORT, 'incoming leg refused'); END;",
    )
    .await
    .unwrap();

    let err = engine
        .create_transfer(TransferCmd::new(alice, bank, savings, money("250.00"), today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)), "{err:?}");

    let rows = engine
        .list_transactions(alice, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("1000.00")
    );
}

#[tokio::test]
async fn failed_pair_edit_keeps_both_legs() {
    let (engine, db, alice) = engine_with_db().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "1000.00", date(2026, 1, 1)).await;
    let savings =
        account(&engine, alice, "Savings", AccountType::Savings, "0", date(2026, 1, 1)).await;
    engine
        .create_transfer(TransferCmd::new(alice, bank, savings, money("250.00"), today()))
        .await
        .unwrap();
    // The first leg update goes through, the second one is refused.
    for sql in [
        "CREATE TABLE leg_updates (n INTEGER)",
        "CREATE TRIGGER count_leg_updates AFTER UPDATE ON transactions \
         BEGIN INSERT INTO leg_updates VALUES (1); END",
        "CREATE TRIGGER refuse_second_leg BEFORE UPDATE ON transactions \
         WHEN (SELECT count(*) FROM leg_updates) > 0 \
         BEGIN SELECT RAISE(ABORT, 'second leg refused'); END",
    ] {
        db.execute_unprepared(sql).await.unwrap();
    }

    let legs = engine
        .list_transactions(alice, &TransactionListFilter::default())
        .await
        .unwrap();
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(alice, legs[0].id).amount(money("400.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)), "{err:?}");

    let after = engine
        .list_transactions(alice, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(after.iter().all(|tx| tx.amount.abs() == money("250.00")));
    assert_eq!(
        engine.account_balance(alice, bank).await.unwrap(),
        money("750.00")
    );
    assert_eq!(
        engine.account_balance(alice, savings).await.unwrap(),
        money("250.00")
    );
}
