use sea_orm::{ConnectionTrait, Condition, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Account, Category, EngineError, Goal, RecurringExpense, ResultEngine, accounts, categories,
    goals, recurring_expenses, users,
};

use super::Engine;

/// Generates a `require_*` lookup for an entity owned by a user.
///
/// A row that exists but belongs to someone else is reported exactly like a
/// missing one.
macro_rules! impl_require_owned {
    ($require_fn:ident, $entity:path, $user_col:expr, $domain:ty, $err_msg:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: Uuid,
            id: Uuid,
        ) -> ResultEngine<$domain> {
            let model = <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))?;
            <$domain>::try_from(model)
        }
    };
}

impl Engine {
    impl_require_owned!(
        require_account,
        accounts::Entity,
        accounts::Column::UserId,
        Account,
        "account not exists"
    );

    impl_require_owned!(
        require_recurring,
        recurring_expenses::Entity,
        recurring_expenses::Column::UserId,
        RecurringExpense,
        "recurring expense not exists"
    );

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(user_id).one(db).await?.is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// A live (not soft-deleted) goal of the user.
    pub(super) async fn require_goal<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(id)
            .filter(goals::Column::UserId.eq(user_id))
            .filter(goals::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        Goal::try_from(model)
    }

    /// A category the user can see: a shared one or one of their own.
    pub(super) async fn require_visible_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(id)
            .filter(visible_to(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }
}

/// Shared categories plus the ones owned by `user_id`.
pub(super) fn visible_to(user_id: Uuid) -> Condition {
    Condition::any()
        .add(categories::Column::UserId.is_null())
        .add(categories::Column::UserId.eq(user_id))
}
