//! `SeaORM` Entity for subgroups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "subgroups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub main_group_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::main_groups::Entity",
        from = "Column::MainGroupId",
        to = "super::main_groups::Column::Id"
    )]
    MainGroups,
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::main_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MainGroups.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
