use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bank::{analyze_bank_metrics, BankMetrics};
use super::domain::{Deal, DealBundle, DealId, DealStage, PaperGrade, StageHistoryEntry};
use super::offer::{
    CustomOfferTerms, FundingOffer, GradeConstraints, OfferCalculator, OfferError, OfferTier,
};
use super::policy::OfferPolicy;
use super::repository::{
    DealRepository, DecisionNotice, NotificationError, NotificationPublisher, RepositoryError,
};
use super::scoring::{RiskAssessment, RiskScorer, ScoringConfig, ScoringError};
use super::stacking::{detect_stacking, StackingAnalysis};
use super::stage::{advance_stage, apply_decision, Decision, DecisionRequest};

/// Facade composing the pure engine components over the persistence
/// boundary. `analyze` and `offer` are read-only and idempotent; `decide`
/// and `advance` are the only write paths.
pub struct UnderwritingService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    scorer: RiskScorer,
    offers: OfferCalculator,
}

/// Advisory output of a full engine pass over one deal.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub deal_id: DealId,
    pub merchant_name: String,
    pub risk: RiskAssessment,
    pub stacking: StackingAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_metrics: Option<BankMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<FundingOffer>,
    pub generated_at: DateTime<Utc>,
}

/// Offer-sheet request: an optional grade override plus optional explicit
/// terms for an ad-hoc custom offer alongside the standard ladder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferRequest {
    pub grade: Option<PaperGrade>,
    pub custom_amount: Option<f64>,
    pub custom_factor_rate: Option<f64>,
    pub custom_term_days: Option<u32>,
}

impl OfferRequest {
    fn wants_custom(&self) -> bool {
        self.custom_amount.is_some()
            || self.custom_factor_rate.is_some()
            || self.custom_term_days.is_some()
    }
}

/// Standard offer, tier ladder, optional custom offer, and the policy
/// envelope they were priced inside.
#[derive(Debug, Clone, Serialize)]
pub struct OfferSheet {
    pub deal_id: DealId,
    pub grade: PaperGrade,
    pub standard: FundingOffer,
    pub tiers: Vec<OfferTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<FundingOffer>,
    pub constraints: GradeConstraints,
}

/// Result of an applied decision: the persisted deal, the history row the
/// transition appended, and a human-readable summary.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub deal: Deal,
    pub history: StageHistoryEntry,
    pub message: String,
}

/// Error raised by the underwriting service.
#[derive(Debug, thiserror::Error)]
pub enum UnderwritingServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Offer(#[from] OfferError),
    #[error(transparent)]
    Transition(#[from] super::stage::TransitionError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("deal {deal_id} has no known monthly revenue; an offer cannot be priced")]
    MissingRevenue { deal_id: String },
}

impl<R, N> UnderwritingService<R, N>
where
    R: DealRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        scoring_config: ScoringConfig,
        offer_policy: OfferPolicy,
    ) -> Self {
        Self {
            repository,
            notifications,
            scorer: RiskScorer::new(scoring_config),
            offers: OfferCalculator::new(offer_policy),
        }
    }

    /// Run the full advisory engine over one deal. Read-only and safe to
    /// call repeatedly; an offer is included only when monthly revenue is
    /// known.
    pub fn analyze(&self, id: &DealId) -> Result<AnalysisReport, UnderwritingServiceError> {
        let bundle = self.load(id)?;
        let risk = self.scorer.assess(
            &bundle.merchant,
            &bundle.owners,
            bundle.bank_analysis.as_ref(),
            &bundle.deal,
        )?;
        let stacking = detect_stacking(bundle.bank_analysis.as_ref(), &bundle.ucc_filings);
        let bank_metrics = bundle.bank_analysis.as_ref().map(analyze_bank_metrics);

        let offer = match bundle.merchant.monthly_revenue {
            Some(revenue) if revenue > 0.0 && bundle.deal.requested_amount > 0.0 => {
                Some(self.offers.calculate(
                    risk.grade,
                    bundle.deal.requested_amount,
                    revenue,
                    bundle.deal.existing_positions,
                    existing_daily_load(&bundle),
                    bundle.broker.as_ref().map(|broker| broker.commission_rate),
                )?)
            }
            _ => None,
        };

        debug!(
            deal = %bundle.deal.deal_id.0,
            score = risk.score,
            grade = risk.grade.label(),
            stacked = stacking.stacking_detected,
            "analysis complete"
        );

        Ok(AnalysisReport {
            deal_id: bundle.deal.deal_id.clone(),
            merchant_name: bundle.merchant.legal_name.clone(),
            risk,
            stacking,
            bank_metrics,
            offer,
            generated_at: Utc::now(),
        })
    }

    /// Build the offer sheet for a deal. Grade resolution order: explicit
    /// request override, then the grade already on the deal, then a fresh
    /// scoring pass. Requires known monthly revenue.
    pub fn offer(
        &self,
        id: &DealId,
        request: &OfferRequest,
    ) -> Result<OfferSheet, UnderwritingServiceError> {
        let bundle = self.load(id)?;
        let revenue = bundle
            .merchant
            .monthly_revenue
            .filter(|revenue| *revenue > 0.0)
            .ok_or_else(|| UnderwritingServiceError::MissingRevenue {
                deal_id: id.0.clone(),
            })?;

        let grade = match (request.grade, bundle.deal.paper_grade) {
            (Some(grade), _) => grade,
            (None, Some(grade)) => grade,
            (None, None) => {
                self.scorer
                    .assess(
                        &bundle.merchant,
                        &bundle.owners,
                        bundle.bank_analysis.as_ref(),
                        &bundle.deal,
                    )?
                    .grade
            }
        };

        let load = existing_daily_load(&bundle);
        let commission = bundle.broker.as_ref().map(|broker| broker.commission_rate);
        let standard = self.offers.calculate(
            grade,
            bundle.deal.requested_amount,
            revenue,
            bundle.deal.existing_positions,
            load,
            commission,
        )?;
        let tiers = self
            .offers
            .tiers(grade, bundle.deal.requested_amount, revenue)?;

        // Partial overrides fall back to the standard point for the
        // missing pieces.
        let custom = if request.wants_custom() {
            let defaults = self.offers.policy().terms(grade);
            Some(self.offers.custom(
                grade,
                CustomOfferTerms {
                    amount: request.custom_amount.unwrap_or(bundle.deal.requested_amount),
                    factor_rate: request.custom_factor_rate.unwrap_or(defaults.factor_rate),
                    term_days: request.custom_term_days.unwrap_or(defaults.term_days),
                },
                revenue,
                bundle.deal.existing_positions,
                load,
                commission,
            )?)
        } else {
            None
        };

        let constraints = self.offers.constraints(grade, revenue, load)?;

        Ok(OfferSheet {
            deal_id: bundle.deal.deal_id.clone(),
            grade,
            standard,
            tiers,
            custom,
            constraints,
        })
    }

    /// Apply an underwriting decision. Validation happens before any state
    /// is touched; the repository then persists the stage update, history
    /// row, and audit comment as one atomic unit, failing with `Conflict`
    /// if the deal moved underneath the caller.
    pub fn decide(
        &self,
        id: &DealId,
        actor: &str,
        request: &DecisionRequest,
    ) -> Result<DecisionOutcome, UnderwritingServiceError> {
        let bundle = self.load(id)?;
        let transition = apply_decision(&bundle.deal, request, actor, Utc::now())?;
        let deal = self.repository.apply_transition(&transition)?;

        let template = match request.decision {
            Decision::Approve | Decision::Counter => "deal_approved",
            Decision::Decline => "deal_declined",
        };
        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), request.decision.label().to_string());
        details.insert("message".to_string(), transition.message.clone());
        self.notifications.publish(DecisionNotice {
            template: template.to_string(),
            deal_id: deal.deal_id.clone(),
            details,
        })?;

        info!(
            deal = %deal.deal_id.0,
            decision = request.decision.label(),
            stage = deal.stage.label(),
            "decision applied"
        );

        Ok(DecisionOutcome {
            history: transition.history,
            message: transition.message,
            deal,
        })
    }

    /// Move a deal along the pipeline outside the decision path.
    pub fn advance(
        &self,
        id: &DealId,
        actor: &str,
        to_stage: DealStage,
        note: Option<String>,
    ) -> Result<DecisionOutcome, UnderwritingServiceError> {
        let bundle = self.load(id)?;
        let transition = advance_stage(&bundle.deal, to_stage, actor, note, Utc::now());
        let deal = self.repository.apply_transition(&transition)?;

        info!(deal = %deal.deal_id.0, stage = deal.stage.label(), "stage advanced");

        Ok(DecisionOutcome {
            history: transition.history,
            message: transition.message,
            deal,
        })
    }

    /// Fetch a deal's current state for API responses.
    pub fn get(&self, id: &DealId) -> Result<DealBundle, UnderwritingServiceError> {
        self.load(id)
    }

    fn load(&self, id: &DealId) -> Result<DealBundle, UnderwritingServiceError> {
        Ok(self
            .repository
            .load(id)?
            .ok_or(RepositoryError::NotFound)?)
    }
}

fn existing_daily_load(bundle: &DealBundle) -> f64 {
    bundle
        .bank_analysis
        .as_ref()
        .map(|analysis| analysis.existing_daily_load)
        .unwrap_or(0.0)
}
