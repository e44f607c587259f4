//! Year summary computation and financing classification.
//!
//! A year's summary row is derived entirely from its level-1 Revenue and
//! Expenditure transactions and its level-2 Financing transactions. The
//! summary is always recomputed whole, never patched field by field.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Code prefix of the financing receipt branch.
pub const RECEIPT_CODE_PREFIX: &str = "6.1";
/// Code prefix of the financing disbursement branch.
pub const DISBURSEMENT_CODE_PREFIX: &str = "6.2";

/// A level-2 Financing transaction joined with its category's name and code.
#[derive(Debug, Clone)]
pub struct FinancingRow {
    /// Category ID, carried for anomaly reporting.
    pub category_id: Uuid,
    /// Category name.
    pub name: String,
    /// Category code, if assigned.
    pub code: Option<String>,
    /// Transaction amount.
    pub amount: Decimal,
}

/// True when the category classifies as a financing receipt.
///
/// Matched by name substring OR code prefix, so a miscoded category still
/// lands on one side. A row can match both sides; see
/// [`classify_financing`].
#[must_use]
pub fn is_receipt(name: &str, code: Option<&str>) -> bool {
    name.to_lowercase().contains("receipt")
        || code.is_some_and(|c| c.starts_with(RECEIPT_CODE_PREFIX))
}

/// True when the category classifies as a financing disbursement.
#[must_use]
pub fn is_disbursement(name: &str, code: Option<&str>) -> bool {
    name.to_lowercase().contains("disbursement")
        || code.is_some_and(|c| c.starts_with(DISBURSEMENT_CODE_PREFIX))
}

/// Sums of the financing sides, plus any rows that matched both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancingTotals {
    /// Sum of receipt-side rows.
    pub receipts: Decimal,
    /// Sum of disbursement-side rows.
    pub disbursements: Decimal,
    /// Categories that matched both sides (name says one, code says the
    /// other). Counted on both sides; callers should log these.
    pub ambiguous: Vec<Uuid>,
}

/// Splits level-2 Financing rows into receipt and disbursement totals.
///
/// A row matching both sides contributes to both totals and is reported
/// in [`FinancingTotals::ambiguous`].
#[must_use]
pub fn classify_financing(rows: &[FinancingRow]) -> FinancingTotals {
    let mut totals = FinancingTotals::default();

    for row in rows {
        let code = row.code.as_deref();
        let receipt = is_receipt(&row.name, code);
        let disbursement = is_disbursement(&row.name, code);

        if receipt {
            totals.receipts += row.amount;
        }
        if disbursement {
            totals.disbursements += row.amount;
        }
        if receipt && disbursement {
            totals.ambiguous.push(row.category_id);
        }
    }

    totals
}

/// Aggregates feeding the summary computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryInputs {
    /// Sum of level-1 Revenue transactions for the year.
    pub total_revenue: Decimal,
    /// Sum of level-1 Expenditure transactions for the year.
    pub total_expenditure: Decimal,
    /// Receipt-side financing total.
    pub financing_receipts: Decimal,
    /// Disbursement-side financing total.
    pub financing_disbursements: Decimal,
    /// Count of all transactions for the year, any level.
    pub transaction_count: u64,
}

/// The seven derived summary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryValues {
    /// Sum of level-1 Revenue transactions.
    pub total_revenue: Decimal,
    /// Sum of level-1 Expenditure transactions.
    pub total_expenditure: Decimal,
    /// Revenue minus expenditure, per the one-sided rule below.
    pub surplus_deficit: Decimal,
    /// Receipt-side financing total.
    pub financing_receipts: Decimal,
    /// Disbursement-side financing total.
    pub financing_disbursements: Decimal,
    /// Receipts minus disbursements, per the one-sided rule below.
    pub net_financing: Decimal,
    /// SILPA: surplus/deficit combined with net financing.
    pub ending_balance: Decimal,
}

/// When only one operand is present, it passes through (negated for the
/// outflow side) instead of being diffed against a meaningless zero.
fn one_sided_diff(positive: Decimal, negative: Decimal) -> Decimal {
    if positive > Decimal::ZERO && negative > Decimal::ZERO {
        positive - negative
    } else if positive > Decimal::ZERO {
        positive
    } else if negative > Decimal::ZERO {
        -negative
    } else {
        Decimal::ZERO
    }
}

/// Computes the year summary from its aggregates.
///
/// Returns `None` when the year has no transactions at all: an all-zero
/// summary row is never materialized, and the caller removes any stale
/// row instead. With at least one transaction, the summary is always
/// produced, even if every derived value is zero.
#[must_use]
pub fn compute(inputs: &SummaryInputs) -> Option<SummaryValues> {
    if inputs.transaction_count == 0 {
        return None;
    }

    let surplus_deficit = one_sided_diff(inputs.total_revenue, inputs.total_expenditure);
    let net_financing =
        one_sided_diff(inputs.financing_receipts, inputs.financing_disbursements);

    let ending_balance = if surplus_deficit != Decimal::ZERO && net_financing != Decimal::ZERO {
        surplus_deficit + net_financing
    } else if surplus_deficit != Decimal::ZERO {
        surplus_deficit
    } else {
        net_financing
    };

    Some(SummaryValues {
        total_revenue: inputs.total_revenue,
        total_expenditure: inputs.total_expenditure,
        surplus_deficit,
        financing_receipts: inputs.financing_receipts,
        financing_disbursements: inputs.financing_disbursements,
        net_financing,
        ending_balance,
    })
}
