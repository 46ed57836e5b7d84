use serde::{Deserialize, Serialize};

use super::domain::BankAnalysis;

const CALENDAR_DAYS_PER_MONTH: f64 = 30.0;

/// Secondary health indicators derived from a bank analysis snapshot.
/// Descriptive rather than gating: they feed the risk scorer and are
/// surfaced verbatim for human review. Ratios whose denominator is zero
/// are reported as `None`, never as infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankMetrics {
    pub nsf_per_month: Option<f64>,
    pub overdrafts_per_month: Option<f64>,
    pub deposit_day_coverage: Option<f64>,
    pub balance_volatility: Option<f64>,
}

/// Derive ratio indicators from raw statement aggregates. Pure function.
pub fn analyze_bank_metrics(analysis: &BankAnalysis) -> BankMetrics {
    let months = analysis.months_analyzed;

    let (nsf_per_month, overdrafts_per_month, deposit_day_coverage) = if months == 0 {
        (None, None, None)
    } else {
        let months_f = f64::from(months);
        (
            Some(f64::from(analysis.nsf_count) / months_f),
            Some(f64::from(analysis.overdraft_count) / months_f),
            Some(f64::from(analysis.deposit_days) / (months_f * CALENDAR_DAYS_PER_MONTH)),
        )
    };

    let balance_volatility = if analysis.average_daily_balance > 0.0 {
        Some((analysis.max_daily_balance - analysis.min_daily_balance) / analysis.average_daily_balance)
    } else {
        None
    };

    BankMetrics {
        nsf_per_month,
        overdrafts_per_month,
        deposit_day_coverage,
        balance_volatility,
    }
}
