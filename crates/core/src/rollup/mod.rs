//! Rollup planning for derived level-2 and level-1 transactions.
//!
//! Level-3 transactions are the only manually entered facts. Totals for
//! levels 2 and 1 are derived by summing child transactions per parent
//! category and are recomputed from scratch on every change (no
//! incremental deltas, by design: recomputation cannot drift).
//!
//! This module is pure: it takes the current child rows and the existing
//! derived rows and produces a [`RollupPlan`] of upserts and deletes. The
//! persistence layer applies the plan and repeats it one level up.

mod plan;

pub use plan::{ChildRow, DerivedRow, RollupPlan, RollupUpsert, plan_level};
