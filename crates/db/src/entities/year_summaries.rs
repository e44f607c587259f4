//! `SeaORM` Entity for the year_summaries table.
//!
//! One fully derived row per year. Written only by the summary engine,
//! always recomputed whole.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "year_summaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique: at most one summary per year.
    pub year_id: Uuid,
    pub total_revenue: Decimal,
    pub total_expenditure: Decimal,
    pub surplus_deficit: Decimal,
    pub financing_receipts: Decimal,
    pub financing_disbursements: Decimal,
    pub net_financing: Decimal,
    /// SILPA.
    pub ending_balance: Decimal,
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
}

impl Related<super::budget_years::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetYears.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
