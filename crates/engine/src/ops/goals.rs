use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateGoalCmd, EngineError, Goal, GoalProgress, ResultEngine, goals,
    util::{normalize_required_name, positive_amount},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn create_goal(&self, cmd: CreateGoalCmd) -> ResultEngine<Goal> {
        let name = normalize_required_name(&cmd.name, "goal name")?;
        let target_amount = positive_amount(cmd.target_amount, "target_amount")?;
        if cmd.target_date <= cmd.start_date {
            return Err(EngineError::InvalidDate(
                "target_date must be after start_date".to_string(),
            ));
        }
        let now = self.clock.now();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.user_id).await?;
            let goal = Goal {
                id: Uuid::new_v4(),
                user_id: cmd.user_id,
                name,
                target_amount,
                start_date: cmd.start_date,
                target_date: cmd.target_date,
                goal_type: cmd.goal_type,
                created_at: now,
                deleted_at: None,
            };
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;
            Ok(goal)
        })
    }

    /// Soft-deletes a goal.
    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> ResultEngine<()> {
        let now = self.clock.now();
        with_tx!(self, |db_tx| {
            let mut goal = self.require_goal(&db_tx, user_id, goal_id).await?;
            goal.deleted_at = Some(now);
            goals::ActiveModel::from(&goal).update(&db_tx).await?;
            tracing::info!(%goal_id, "goal deleted");
            Ok(())
        })
    }

    /// Live goals of the user, nearest target date first.
    pub async fn goals(&self, user_id: Uuid) -> ResultEngine<Vec<Goal>> {
        goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id))
            .filter(goals::Column::DeletedAt.is_null())
            .order_by_asc(goals::Column::TargetDate)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    /// Progress of every live goal against the current net worth.
    pub async fn goal_progress(&self, user_id: Uuid) -> ResultEngine<Vec<GoalProgress>> {
        let goals = self.goals(user_id).await?;
        if goals.is_empty() {
            return Ok(Vec::new());
        }
        let current = self.net_worth(user_id).await?.net_worth;
        let today = self.clock.today();
        Ok(goals
            .into_iter()
            .map(|goal| GoalProgress::compute(goal, current, today))
            .collect())
    }
}
