//! `SeaORM` Entity for the transactions table.
//!
//! At most one transaction per (year_id, category_id) pair, enforced by
//! a unique index. Rows under level-1/2 categories are derived by the
//! rollup engine and never written by clients.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year_id: Uuid,
    pub category_id: Uuid,
    /// Non-negative budget amount.
    pub amount: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_years::Entity",
        from = "Column::YearId",
        to = "super::budget_years::Column::Id"
    )]
    BudgetYears,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
}

impl Related<super::budget_years::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetYears.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
