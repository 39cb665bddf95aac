use engine::{
    ADJUSTMENT_CATEGORY_NAME, AccountType, CategoryPatch, CategoryType, CategoryView,
    CreateCategoryCmd, CreateTransactionCmd, DEFAULT_EXPENSE_CATEGORIES,
    DEFAULT_INCOME_CATEGORIES, EngineError,
};

mod common;

use common::{account, date, engine, money, today};

fn find<'a>(views: &'a [CategoryView], name: &str) -> &'a CategoryView {
    views
        .iter()
        .find(|view| view.category.name == name)
        .unwrap_or_else(|| panic!("category {name} not listed"))
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let (engine, alice) = engine().await;

    let created = engine.seed_default_categories().await.unwrap();
    assert_eq!(
        created,
        DEFAULT_EXPENSE_CATEGORIES.len() + DEFAULT_INCOME_CATEGORIES.len() + 1
    );
    assert_eq!(created, 17);
    assert_eq!(engine.seed_default_categories().await.unwrap(), 0);

    let views = engine.list_categories(alice, 2026, 6).await.unwrap();
    assert_eq!(views.len(), 17);
    let adjustment = find(&views, ADJUSTMENT_CATEGORY_NAME);
    assert!(adjustment.category.is_system);
    assert!(adjustment.category.is_shared());
    assert_eq!(find(&views, "Salário").category.kind, CategoryType::Income);

    let (again, created) = engine.find_or_create_adjustment_category().await.unwrap();
    assert!(!created);
    assert_eq!(again.id, adjustment.category.id);
}

#[tokio::test]
async fn reserved_name_is_rejected_in_any_spelling() {
    let (engine, alice) = engine().await;

    for name in ["Ajuste de Saldo", "  ajuste   DE saldo ", "AJUSTE DE SALDO"] {
        let err = engine
            .create_category(CreateCategoryCmd::new(alice, name, CategoryType::Expense))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ReservedName(_)), "{name}");
    }

    let food = engine
        .create_category(CreateCategoryCmd::new(alice, "Food", CategoryType::Expense))
        .await
        .unwrap();
    let err = engine
        .update_category(alice, food.id, CategoryPatch::default().name("ajuste de saldo"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReservedName(_)));
}

#[tokio::test]
async fn names_are_unique_among_visible_categories() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    engine.seed_default_categories().await.unwrap();

    let err = engine
        .create_category(CreateCategoryCmd::new(alice, "alimentação", CategoryType::Expense))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .create_category(CreateCategoryCmd::new(alice, "Hobbies", CategoryType::Expense))
        .await
        .unwrap();
    engine
        .create_category(CreateCategoryCmd::new(bob, "Hobbies", CategoryType::Expense))
        .await
        .unwrap();
}

#[tokio::test]
async fn shared_and_system_categories_are_read_only() {
    let (engine, alice) = engine().await;
    engine.seed_default_categories().await.unwrap();
    let views = engine.list_categories(alice, 2026, 6).await.unwrap();
    let shared = find(&views, "Lazer").category.id;
    let adjustment = find(&views, ADJUSTMENT_CATEGORY_NAME).category.id;

    for id in [shared, adjustment] {
        assert!(matches!(
            engine
                .update_category(alice, id, CategoryPatch::default().color("#000"))
                .await
                .unwrap_err(),
            EngineError::SystemCategory(_)
        ));
        assert!(matches!(
            engine.delete_category(alice, id).await.unwrap_err(),
            EngineError::SystemCategory(_)
        ));
    }
    assert!(matches!(
        engine
            .set_category_override(alice, adjustment, CategoryPatch::default().icon("x"))
            .await
            .unwrap_err(),
        EngineError::SystemCategory(_)
    ));
}

#[tokio::test]
async fn adjustment_category_cannot_tag_user_transactions() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "0", date(2026, 1, 1)).await;
    let (adjustment, _) = engine.find_or_create_adjustment_category().await.unwrap();

    let err = engine
        .create_transaction(
            CreateTransactionCmd::income(alice, money("10"), today(), "gift")
                .account_id(bank)
                .category_id(adjustment.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SystemCategory(_)));
}

#[tokio::test]
async fn overrides_are_per_user() {
    let (engine, alice) = engine().await;
    let bob = engine.create_user("bob").await.unwrap();
    engine.seed_default_categories().await.unwrap();
    let views = engine.list_categories(alice, 2026, 6).await.unwrap();
    let leisure = find(&views, "Lazer").category.id;

    let patch = engine
        .set_category_override(
            alice,
            leisure,
            CategoryPatch::default()
                .name("Fun")
                .monthly_budget(money("300")),
        )
        .await
        .unwrap();
    assert_eq!(patch.name.as_deref(), Some("Fun"));

    // Replaces the previous override.
    engine
        .set_category_override(
            alice,
            leisure,
            CategoryPatch::default()
                .name("Fun stuff")
                .monthly_budget(money("250")),
        )
        .await
        .unwrap();

    let alice_view = engine.list_categories(alice, 2026, 6).await.unwrap();
    let fun = find(&alice_view, "Fun stuff");
    assert!(fun.has_override);
    assert_eq!(fun.category.id, leisure);
    assert_eq!(fun.category.monthly_budget, Some(money("250")));

    let bob_view = engine.list_categories(bob, 2026, 6).await.unwrap();
    assert!(!find(&bob_view, "Lazer").has_override);

    let own = engine
        .create_category(CreateCategoryCmd::new(alice, "Books", CategoryType::Expense))
        .await
        .unwrap();
    assert!(matches!(
        engine
            .set_category_override(alice, own.id, CategoryPatch::default().icon("b"))
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));

    assert!(engine.clear_category_override(alice, leisure).await.unwrap());
    assert!(!engine.clear_category_override(alice, leisure).await.unwrap());
    let alice_view = engine.list_categories(alice, 2026, 6).await.unwrap();
    assert!(!find(&alice_view, "Lazer").has_override);
}

#[tokio::test]
async fn current_spending_counts_the_month_expenses() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "0", date(2026, 1, 1)).await;
    let food = engine
        .create_category(CreateCategoryCmd::new(alice, "Food", CategoryType::Expense))
        .await
        .unwrap();
    let salary = engine
        .create_category(CreateCategoryCmd::new(alice, "Salary", CategoryType::Income))
        .await
        .unwrap();

    let lunches = [
        ("12.50", date(2026, 6, 2)),
        ("7.50", date(2026, 6, 9)),
        ("99", date(2026, 5, 30)),
    ];
    for (amount, on) in lunches {
        engine
            .create_transaction(
                CreateTransactionCmd::expense(alice, money(amount), on, "lunch")
                    .account_id(bank)
                    .category_id(food.id),
            )
            .await
            .unwrap();
    }
    let deleted = engine
        .create_transaction(
            CreateTransactionCmd::expense(alice, money("40"), date(2026, 6, 3), "dinner")
                .account_id(bank)
                .category_id(food.id),
        )
        .await
        .unwrap();
    engine.delete_transaction(alice, deleted.id).await.unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::income(alice, money("1000"), date(2026, 6, 5), "pay")
                .account_id(bank)
                .category_id(salary.id),
        )
        .await
        .unwrap();

    let views = engine.list_categories(alice, 2026, 6).await.unwrap();
    assert_eq!(find(&views, "Food").current_spending, money("20.00"));
    assert_eq!(find(&views, "Salary").current_spending, money("0"));
}

#[tokio::test]
async fn deleting_a_category_uncategorizes_its_transactions() {
    let (engine, alice) = engine().await;
    let bank = account(&engine, alice, "Bank", AccountType::Bank, "0", date(2026, 1, 1)).await;
    let food = engine
        .create_category(CreateCategoryCmd::new(alice, "Food", CategoryType::Expense))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::expense(alice, money("5"), today(), "snack")
                .account_id(bank)
                .category_id(food.id),
        )
        .await
        .unwrap();

    engine.delete_category(alice, food.id).await.unwrap();

    let rows = engine
        .list_transactions(alice, &Default::default())
        .await
        .unwrap();
    let row = rows.iter().find(|row| row.id == tx.id).unwrap();
    assert_eq!(row.category_id, None);
    assert!(matches!(
        engine.delete_category(alice, food.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}
