use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, users, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a tenant and returns its id.
    pub async fn create_user(&self, username: &str) -> ResultEngine<Uuid> {
        let username = normalize_required_name(username, "username")?;
        let now = self.clock.now();
        with_tx!(self, |db_tx| {
            let taken = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(username));
            }
            let id = Uuid::new_v4();
            users::ActiveModel {
                id: ActiveValue::Set(id),
                username: ActiveValue::Set(username.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(%id, %username, "user created");
            Ok(id)
        })
    }

    /// Looks a user up by name.
    pub async fn user_id(&self, username: &str) -> ResultEngine<Uuid> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .map(|model| model.id)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
