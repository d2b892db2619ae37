use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MemberRole, ResultEngine, memberships, shops,
    util::parse_opt_uuid,
};

use super::{Engine, access::Capability, with_tx};

/// A business member as listed to the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub username: String,
    pub role: MemberRole,
    pub shop_id: Option<Uuid>,
}

impl TryFrom<memberships::Model> for Member {
    type Error = EngineError;

    fn try_from(model: memberships::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: MemberRole::try_from(model.role.as_str())?,
            shop_id: parse_opt_uuid(model.shop_id.as_deref(), "shop")?,
            username: model.user_id,
        })
    }
}

impl Engine {
    /// Adds a member or changes an existing member's role (owner-only).
    ///
    /// `shop_id` pins the member to one shop of the business.
    pub async fn upsert_member(
        &self,
        slug: &str,
        username: &str,
        role: MemberRole,
        shop_id: Option<Uuid>,
        user_id: &str,
    ) -> ResultEngine<Member> {
        if role == MemberRole::Owner {
            return Err(EngineError::InvalidRole(
                "owner role cannot be granted".to_string(),
            ));
        }
        let username = username.trim().to_string();

        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            self.require_user(&db_tx, &username).await?;
            if username == business.owner_id {
                return Err(EngineError::InvalidRole(
                    "the owner's role cannot be changed".to_string(),
                ));
            }
            if let Some(shop_id) = shop_id {
                shops::Entity::find_by_id(shop_id.to_string())
                    .filter(shops::Column::BusinessId.eq(business.id.clone()))
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("shop not exists".to_string()))?;
            }

            let active = memberships::ActiveModel {
                business_id: ActiveValue::Set(business.id.clone()),
                user_id: ActiveValue::Set(username.clone()),
                role: ActiveValue::Set(role.as_str().to_string()),
                shop_id: ActiveValue::Set(shop_id.map(|id| id.to_string())),
            };
            let model = match memberships::Entity::find_by_id((business.id.clone(), username.clone()))
                .one(&db_tx)
                .await?
            {
                Some(_) => active.update(&db_tx).await?,
                None => active.insert(&db_tx).await?,
            };
            tracing::info!(business = %business.slug, member = %username, role = %role, "member upserted");
            Member::try_from(model)
        })
    }

    /// Removes a member (owner-only). The owner cannot be removed.
    pub async fn remove_member(&self, slug: &str, username: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            if username == business.owner_id {
                return Err(EngineError::InvalidRole(
                    "cannot remove business owner".to_string(),
                ));
            }
            let res = memberships::Entity::delete_by_id((business.id.clone(), username.to_string()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("member not exists".to_string()));
            }
            Ok(())
        })
    }

    /// Lists members, the owner included (owner-only).
    pub async fn list_members(&self, slug: &str, user_id: &str) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            let (business, _) = self
                .require_business(&db_tx, slug, user_id, Capability::ManageBusiness)
                .await?;
            let rows = memberships::Entity::find()
                .filter(memberships::Column::BusinessId.eq(business.id))
                .order_by_asc(memberships::Column::UserId)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Member::try_from).collect()
        })
    }
}
