//! `SeaORM` Entity for the categories table.
//!
//! The `kind` column is stored as text (`revenue`, `expenditure`,
//! `financing`); conversion to `CategoryKind` happens at the repository
//! boundary so the schema stays portable across backends.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Parent category, one level shallower. None only at level 1.
    pub parent_id: Option<Uuid>,
    /// Category type: revenue, expenditure, or financing.
    pub kind: String,
    pub name: String,
    /// Hierarchical code such as "4.1.2", unique per kind when present.
    pub code: Option<String>,
    /// Depth 1..=3; only level 3 accepts manual transactions.
    pub level: i16,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
