use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, User,
    users::{self, hash_password, verify_password},
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Creates a platform user with an Argon2-hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        super_admin: bool,
    ) -> ResultEngine<User> {
        let username = normalize_required_text(username, "username")?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = hash_password(password)?;

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            let model = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password_hash: ActiveValue::Set(password_hash),
                super_admin: ActiveValue::Set(super_admin),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(%username, super_admin, "user created");
            Ok(User::from(model))
        })
    }

    /// Checks credentials. Unknown users and wrong passwords are
    /// indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let denied = || EngineError::Forbidden("invalid credentials".to_string());
        let model = with_tx!(self, |db_tx| {
            users::Entity::find_by_id(username.trim().to_string())
                .one(&db_tx)
                .await
                .map_err(EngineError::from)
        })?
        .ok_or_else(denied)?;
        if !verify_password(password, &model.password_hash) {
            return Err(denied());
        }
        Ok(User::from(model))
    }

    /// Grants or revokes platform administration.
    pub async fn set_super_admin(&self, username: &str, super_admin: bool) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, username.trim()).await?;
            let mut active: users::ActiveModel = model.into();
            active.super_admin = ActiveValue::Set(super_admin);
            let model = active.update(&db_tx).await?;
            tracing::info!(username = %model.username, super_admin, "platform admin flag changed");
            Ok(User::from(model))
        })
    }

    pub async fn user(&self, username: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, username.trim()).await?;
            Ok(User::from(model))
        })
    }
}
