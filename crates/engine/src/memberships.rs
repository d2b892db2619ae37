//! Business memberships.
//!
//! The owner is stored on the business row itself; this table holds the
//! other staff roles, optionally pinned to a single shop.

use sea_orm::entity::prelude::*;

use crate::util::db_enum;

db_enum! {
    /// Role granted to a member of a business.
    pub enum MemberRole("membership role") {
        Owner => "owner",
        ShopAdmin => "shop_admin",
        Staff => "staff",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "business_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub business_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub role: String,
    pub shop_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
