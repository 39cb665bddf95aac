use std::collections::{HashMap, HashSet};

use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    ADJUSTMENT_CATEGORY_NAME, Category, CategoryOverride, CategoryPatch, CategoryType,
    CategoryView, CreateCategoryCmd, EngineError, MoneyCents, ResultEngine, TransactionNature,
    analytics::is_operational,
    categories::{
        self, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES, is_reserved_name,
    },
    category_overrides, recurring_expenses, transactions,
    util::{
        first_of_month, month_end, normalize_name_key, normalize_optional_text,
        normalize_required_name,
    },
};

use super::{Engine, access::visible_to, with_tx};

fn reject_reserved(name: &str) -> ResultEngine<()> {
    if is_reserved_name(name) {
        return Err(EngineError::ReservedName(format!(
            "\"{ADJUSTMENT_CATEGORY_NAME}\" is reserved for balance adjustments"
        )));
    }
    Ok(())
}

fn reject_system(category: &Category) -> ResultEngine<()> {
    if category.is_system {
        return Err(EngineError::SystemCategory(format!(
            "category {} is managed by the engine",
            category.id
        )));
    }
    Ok(())
}

impl Engine {
    /// Creates a category owned by the user.
    ///
    /// The name must be unique among the categories the user can see and
    /// never matches the reserved adjustment name.
    pub async fn create_category(&self, cmd: CreateCategoryCmd) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "category name")?;
        reject_reserved(&name)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.user_id).await?;
            self.ensure_category_name_free(&db_tx, cmd.user_id, &name, None)
                .await?;

            let category = Category {
                id: Uuid::new_v4(),
                user_id: Some(cmd.user_id),
                name,
                kind: cmd.kind,
                is_system: false,
                icon: normalize_optional_text(cmd.icon.as_deref()),
                color: normalize_optional_text(cmd.color.as_deref()),
                monthly_budget: cmd.monthly_budget,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Patches a category owned by the user.
    ///
    /// Shared categories are customized through
    /// [`set_category_override`](Self::set_category_override) instead.
    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let mut category = self
                .require_visible_category(&db_tx, user_id, category_id)
                .await?;
            reject_system(&category)?;
            if category.is_shared() {
                return Err(EngineError::SystemCategory(
                    "shared categories can only be overridden".to_string(),
                ));
            }

            if let Some(name) = &patch.name {
                let name = normalize_required_name(name, "category name")?;
                reject_reserved(&name)?;
                self.ensure_category_name_free(&db_tx, user_id, &name, Some(category_id))
                    .await?;
                category.name = name;
            }
            if let Some(icon) = normalize_optional_text(patch.icon.as_deref()) {
                category.icon = Some(icon);
            }
            if let Some(color) = normalize_optional_text(patch.color.as_deref()) {
                category.color = Some(color);
            }
            if let Some(budget) = patch.monthly_budget {
                category.monthly_budget = Some(budget);
            }

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Deletes a category owned by the user.
    ///
    /// Transactions and recurring expenses pointing at it become
    /// uncategorized.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let category = self
                .require_visible_category(&db_tx, user_id, category_id)
                .await?;
            reject_system(&category)?;
            if category.is_shared() {
                return Err(EngineError::SystemCategory(
                    "shared categories cannot be deleted".to_string(),
                ));
            }

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            recurring_expenses::Entity::update_many()
                .col_expr(
                    recurring_expenses::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(recurring_expenses::Column::UserId.eq(user_id))
                .filter(recurring_expenses::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(%category_id, name = %category.name, "category deleted");
            Ok(())
        })
    }

    /// Returns the shared balance adjustment category, creating it on first
    /// use. The flag tells whether this call created it.
    pub async fn find_or_create_adjustment_category(&self) -> ResultEngine<(Category, bool)> {
        with_tx!(self, |db_tx| self.adjustment_category(&db_tx).await)
    }

    /// Creates the missing default shared categories, the adjustment one
    /// included. Returns how many were created.
    pub async fn seed_default_categories(&self) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let (_, created) = self.adjustment_category(&db_tx).await?;
            let mut created = usize::from(created);

            let defaults = DEFAULT_EXPENSE_CATEGORIES
                .iter()
                .map(|name| (*name, CategoryType::Expense))
                .chain(
                    DEFAULT_INCOME_CATEGORIES
                        .iter()
                        .map(|name| (*name, CategoryType::Income)),
                );
            for (name, kind) in defaults {
                let exists = categories::Entity::find()
                    .filter(categories::Column::UserId.is_null())
                    .filter(categories::Column::NameNorm.eq(normalize_name_key(name)))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    continue;
                }
                let category = Category {
                    id: Uuid::new_v4(),
                    user_id: None,
                    name: name.to_string(),
                    kind,
                    is_system: false,
                    icon: None,
                    color: None,
                    monthly_budget: None,
                };
                categories::ActiveModel::from(&category)
                    .insert(&db_tx)
                    .await?;
                created += 1;
            }
            tracing::info!(created, "default categories seeded");
            Ok(created)
        })
    }

    /// Stores (or replaces) the user's customization of a shared category.
    pub async fn set_category_override(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<CategoryOverride> {
        let name = normalize_optional_text(patch.name.as_deref());
        if let Some(name) = &name {
            reject_reserved(name)?;
        }

        with_tx!(self, |db_tx| {
            let category = self
                .require_visible_category(&db_tx, user_id, category_id)
                .await?;
            reject_system(&category)?;
            if !category.is_shared() {
                return Err(EngineError::InvalidState(
                    "only shared categories take overrides".to_string(),
                ));
            }

            let existing = category_overrides::Entity::find()
                .filter(category_overrides::Column::UserId.eq(user_id))
                .filter(category_overrides::Column::CategoryId.eq(category_id))
                .one(&db_tx)
                .await?;
            let patch = CategoryOverride {
                id: existing.as_ref().map_or_else(Uuid::new_v4, |model| model.id),
                user_id,
                category_id,
                name,
                icon: normalize_optional_text(patch.icon.as_deref()),
                color: normalize_optional_text(patch.color.as_deref()),
                monthly_budget: patch.monthly_budget,
            };
            let model = category_overrides::ActiveModel::from(&patch);
            if existing.is_some() {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(patch)
        })
    }

    /// Drops the user's customization of a category. Returns whether one
    /// existed.
    pub async fn clear_category_override(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<bool> {
        let res = category_overrides::Entity::delete_many()
            .filter(category_overrides::Column::UserId.eq(user_id))
            .filter(category_overrides::Column::CategoryId.eq(category_id))
            .exec(&self.database)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Every category the user can see, overrides applied, with the
    /// operational spending of the given month.
    pub async fn list_categories(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> ResultEngine<Vec<CategoryView>> {
        let first = first_of_month(year, month)?;
        let last = month_end(first);

        let overrides: HashMap<Uuid, CategoryOverride> = category_overrides::Entity::find()
            .filter(category_overrides::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| (model.category_id, CategoryOverride::from(model)))
            .collect();

        let mut spending: HashMap<Uuid, MoneyCents> = HashMap::new();
        for tx in self
            .live_transactions(&self.database, user_id, Some(first), Some(last))
            .await?
            .iter()
            .filter(|tx| is_operational(tx) && tx.nature == TransactionNature::Expense)
        {
            if let Some(category_id) = tx.category_id {
                *spending.entry(category_id).or_default() += tx.amount.abs();
            }
        }

        categories::Entity::find()
            .filter(visible_to(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| {
                let category = Category::try_from(model)?;
                let patch = overrides.get(&category.id);
                let current_spending = match category.kind {
                    CategoryType::Expense => spending
                        .get(&category.id)
                        .copied()
                        .unwrap_or(MoneyCents::ZERO),
                    CategoryType::Income => MoneyCents::ZERO,
                };
                Ok(CategoryView {
                    category: patch.map_or_else(|| category.clone(), |p| category.with_override(p)),
                    has_override: patch.is_some(),
                    current_spending,
                })
            })
            .collect()
    }

    /// Ids of the income categories the user can see.
    pub(super) async fn income_category_ids(&self, user_id: Uuid) -> ResultEngine<HashSet<Uuid>> {
        Ok(categories::Entity::find()
            .filter(visible_to(user_id))
            .filter(categories::Column::Kind.eq(CategoryType::Income.as_str()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect())
    }

    pub(super) async fn adjustment_category<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> ResultEngine<(Category, bool)> {
        let found = categories::Entity::find()
            .filter(categories::Column::UserId.is_null())
            .filter(categories::Column::IsSystem.eq(true))
            .filter(categories::Column::NameNorm.eq(normalize_name_key(ADJUSTMENT_CATEGORY_NAME)))
            .one(db)
            .await?;
        if let Some(model) = found {
            return Ok((Category::try_from(model)?, false));
        }

        let category = Category {
            id: Uuid::new_v4(),
            user_id: None,
            name: ADJUSTMENT_CATEGORY_NAME.to_string(),
            kind: CategoryType::Income,
            is_system: true,
            icon: None,
            color: None,
            monthly_budget: None,
        };
        categories::ActiveModel::from(&category).insert(db).await?;
        tracing::info!(id = %category.id, "adjustment category created");
        Ok((category, true))
    }

    async fn ensure_category_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(visible_to(user_id))
            .filter(categories::Column::NameNorm.eq(normalize_name_key(name)));
        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
