mod config;
mod rules;

pub use config::ScoringConfig;

use serde::{Deserialize, Serialize};

use super::domain::{select_primary_owner, BankAnalysis, Deal, MerchantSnapshot, OwnerSnapshot, PaperGrade};

/// Factors permitted to contribute to a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    TimeInBusiness,
    MonthlyRevenue,
    IndustryRisk,
    OwnerCredit,
    BalanceStability,
    NsfActivity,
    DepositConsistency,
    RevenueTrend,
    ExistingPositions,
}

/// Discrete contribution to a risk score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RiskFactor,
    pub score: i16,
    pub notes: String,
}

/// Composite scoring result: the clamped 0-100 score, its paper grade,
/// and the per-factor trail behind both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub grade: PaperGrade,
    pub components: Vec<ScoreComponent>,
    /// Set when no owner data was available; the score stands but the
    /// desk should treat it as lower-confidence output.
    pub reduced_confidence: bool,
}

/// Raised only for structurally invalid input. Missing optional data is
/// never an error here.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("monthly revenue cannot be negative: {amount}")]
    NegativeRevenue { amount: f64 },
    #[error("ownership percentage out of range: {pct}")]
    InvalidOwnershipPercentage { pct: f64 },
}

/// Stateless scorer applying the configured weights and grade cut lines.
/// Side-effect free: identical inputs always produce identical output.
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn assess(
        &self,
        merchant: &MerchantSnapshot,
        owners: &[OwnerSnapshot],
        bank_analysis: Option<&BankAnalysis>,
        deal: &Deal,
    ) -> Result<RiskAssessment, ScoringError> {
        let primary_owner = select_primary_owner(owners);
        let (components, total, signals) =
            rules::score_factors(merchant, primary_owner, bank_analysis, deal, &self.config)?;

        let score = (self.config.base_score + total).clamp(0, 100) as u8;

        Ok(RiskAssessment {
            score,
            grade: self.grade_for(score),
            components,
            reduced_confidence: signals.reduced_confidence,
        })
    }

    fn grade_for(&self, score: u8) -> PaperGrade {
        if score >= self.config.grade_a_floor {
            PaperGrade::A
        } else if score >= self.config.grade_b_floor {
            PaperGrade::B
        } else if score >= self.config.grade_c_floor {
            PaperGrade::C
        } else {
            PaperGrade::D
        }
    }
}
