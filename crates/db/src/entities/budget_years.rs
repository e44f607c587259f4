//! `SeaORM` Entity for the budget_years table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_years")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Fiscal year, unique.
    pub year: i32,
    /// Number of the regional regulation enacting this budget.
    pub regulation_number: Option<String>,
    pub enactment_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_one = "super::year_summaries::Entity")]
    YearSummaries,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::year_summaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::YearSummaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
