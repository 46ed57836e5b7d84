use super::super::bank::analyze_bank_metrics;
use super::super::domain::{
    BankAnalysis, Deal, IndustryRiskTier, MerchantSnapshot, OwnerSnapshot, RevenueTrend,
};
use super::config::ScoringConfig;
use super::{RiskFactor, ScoreComponent, ScoringError};

pub(crate) struct ScoreSignals {
    pub reduced_confidence: bool,
}

pub(crate) fn score_factors(
    merchant: &MerchantSnapshot,
    primary_owner: Option<&OwnerSnapshot>,
    bank_analysis: Option<&BankAnalysis>,
    deal: &Deal,
    config: &ScoringConfig,
) -> Result<(Vec<ScoreComponent>, i16, ScoreSignals), ScoringError> {
    let mut components = Vec::new();
    let mut total: i16 = 0;
    fn push(
        components: &mut Vec<ScoreComponent>,
        factor: RiskFactor,
        score: i16,
        notes: String,
    ) -> i16 {
        components.push(ScoreComponent {
            factor,
            score,
            notes,
        });
        score
    }

    // Time in business. Below the viability floor the merchant is treated
    // as not yet fundable on tenure alone.
    total += match merchant.months_in_business {
        None => push(
            &mut components,
            RiskFactor::TimeInBusiness,
            -5,
            "time in business unverified".to_string(),
        ),
        Some(months) if months < config.min_viability_months => push(
            &mut components,
            RiskFactor::TimeInBusiness,
            -20,
            format!(
                "{months} months below viability floor of {}",
                config.min_viability_months
            ),
        ),
        Some(months) => {
            let score = if months < 12 {
                -8
            } else if months < 24 {
                4
            } else if months < 60 {
                10
            } else {
                15
            };
            push(
                &mut components,
                RiskFactor::TimeInBusiness,
                score,
                format!("{months} months in business"),
            )
        }
    };

    // Monthly revenue, banded so very large and very small merchants do
    // not produce degenerate contributions.
    total += match merchant.monthly_revenue {
        None => push(
            &mut components,
            RiskFactor::MonthlyRevenue,
            -5,
            "monthly revenue unknown".to_string(),
        ),
        Some(revenue) if revenue < 0.0 => {
            return Err(ScoringError::NegativeRevenue { amount: revenue })
        }
        Some(revenue) => {
            let score = if revenue < 10_000.0 {
                -10
            } else if revenue < 20_000.0 {
                4
            } else if revenue < 50_000.0 {
                8
            } else if revenue < 100_000.0 {
                12
            } else {
                15
            };
            push(
                &mut components,
                RiskFactor::MonthlyRevenue,
                score,
                format!("${revenue:.0} monthly revenue"),
            )
        }
    };

    total += match merchant.industry_risk {
        IndustryRiskTier::Low => push(
            &mut components,
            RiskFactor::IndustryRisk,
            5,
            "low-risk industry".to_string(),
        ),
        IndustryRiskTier::Medium => push(
            &mut components,
            RiskFactor::IndustryRisk,
            0,
            "medium-risk industry".to_string(),
        ),
        IndustryRiskTier::High => push(
            &mut components,
            RiskFactor::IndustryRisk,
            -10,
            "high-risk industry".to_string(),
        ),
    };

    // Primary owner credit. A missing bureau score is penalized lightly,
    // never treated as zero.
    if let Some(owner) = primary_owner {
        if !(0.0..=100.0).contains(&owner.ownership_pct) {
            return Err(ScoringError::InvalidOwnershipPercentage {
                pct: owner.ownership_pct,
            });
        }
    }
    let primary_fico = primary_owner.and_then(|owner| owner.fico_score);
    total += match primary_fico {
        None => push(
            &mut components,
            RiskFactor::OwnerCredit,
            -5,
            "no bureau score on file for primary owner".to_string(),
        ),
        Some(fico) => {
            let score = if fico >= 720 {
                18
            } else if fico >= 680 {
                14
            } else if fico >= 640 {
                8
            } else if fico >= 600 {
                2
            } else {
                -15
            };
            push(
                &mut components,
                RiskFactor::OwnerCredit,
                score,
                format!("primary owner FICO {fico}"),
            )
        }
    };

    // Bank-derived indicators, skipped entirely (not zeroed) when no
    // analysis exists.
    if let Some(analysis) = bank_analysis {
        let metrics = analyze_bank_metrics(analysis);

        if let Some(volatility) = metrics.balance_volatility {
            let score = if volatility <= 0.5 {
                5
            } else if volatility <= 1.5 {
                0
            } else {
                -8
            };
            total += push(
                &mut components,
                RiskFactor::BalanceStability,
                score,
                format!("balance volatility {volatility:.2}"),
            );
        }

        if let (Some(nsf), Some(overdrafts)) =
            (metrics.nsf_per_month, metrics.overdrafts_per_month)
        {
            let incidents = nsf + overdrafts;
            let score = if incidents == 0.0 {
                4
            } else if incidents <= 0.5 {
                -2
            } else if incidents <= 1.5 {
                -6
            } else {
                -12
            };
            total += push(
                &mut components,
                RiskFactor::NsfActivity,
                score,
                format!("{incidents:.1} NSF/overdraft incidents per month"),
            );
        }

        if let Some(coverage) = metrics.deposit_day_coverage {
            let score = if coverage >= 0.8 {
                5
            } else if coverage >= 0.5 {
                2
            } else if coverage >= 0.3 {
                -3
            } else {
                -8
            };
            total += push(
                &mut components,
                RiskFactor::DepositConsistency,
                score,
                format!("deposits on {:.0}% of calendar days", coverage * 100.0),
            );
        }

        let (trend_score, trend_note) = match analysis.revenue_trend {
            RevenueTrend::Increasing => (4, "deposit volume increasing"),
            RevenueTrend::Stable => (0, "deposit volume stable"),
            RevenueTrend::Declining => (-8, "deposit volume declining"),
        };
        total += push(
            &mut components,
            RiskFactor::RevenueTrend,
            trend_score,
            trend_note.to_string(),
        );
    }

    // Existing leverage: each open position drags the score down, and a
    // positive stacking determination compounds it.
    let positions = deal.existing_positions;
    total += if positions == 0 && !deal.stacking_detected {
        push(
            &mut components,
            RiskFactor::ExistingPositions,
            3,
            "no existing advance positions".to_string(),
        )
    } else {
        let mut score = -(positions as i16) * config.position_penalty;
        let mut notes = format!("{positions} existing position(s)");
        if deal.stacking_detected {
            score -= config.stacking_penalty;
            notes.push_str(", stacking detected");
        }
        push(&mut components, RiskFactor::ExistingPositions, score, notes)
    };

    let signals = ScoreSignals {
        reduced_confidence: primary_owner.is_none(),
    };

    Ok((components, total, signals))
}
