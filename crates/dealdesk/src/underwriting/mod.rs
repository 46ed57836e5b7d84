//! Merchant cash advance underwriting core: risk scoring, stacking
//! detection, bank health metrics, offer pricing, and the deal stage
//! lifecycle with its append-only history.
//!
//! The scorer, stacking detector, bank analyzer, and offer calculator are
//! pure and freely concurrent. The stage state machine is the single write
//! path; its transitions persist atomically through [`DealRepository`].

pub mod bank;
pub mod domain;
pub mod offer;
pub mod policy;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod stacking;
pub mod stage;

#[cfg(test)]
mod tests;

pub use bank::{analyze_bank_metrics, BankMetrics};
pub use domain::{
    select_primary_owner, ApprovedTerms, BankAnalysis, BrokerSnapshot, Deal, DealBundle, DealId,
    DealStage, DecisionComment, DetectedPaymentPattern, IndustryRiskTier, MerchantSnapshot,
    OwnerSnapshot, PaperGrade, PaymentFrequency, RevenueTrend, StageHistoryEntry, UccFiling,
};
pub use offer::{
    CustomOfferTerms, FundingOffer, GradeConstraints, OfferCalculator, OfferError, OfferTier,
};
pub use policy::{GradeTerms, OfferPolicy, DEFAULT_COMMISSION_RATE};
pub use repository::{
    DealRepository, DealStatusView, DecisionNotice, NotificationError, NotificationPublisher,
    RepositoryError,
};
pub use router::underwriting_router;
pub use scoring::{
    RiskAssessment, RiskFactor, RiskScorer, ScoreComponent, ScoringConfig, ScoringError,
};
pub use service::{
    AnalysisReport, DecisionOutcome, OfferRequest, OfferSheet, UnderwritingService,
    UnderwritingServiceError,
};
pub use stacking::{detect_stacking, StackingAnalysis, StackingSignal};
pub use stage::{
    advance_stage, apply_decision, Decision, DecisionRequest, StageTransition, TransitionError,
};
