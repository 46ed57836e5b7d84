use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApprovedTerms, Deal, DealStage, DecisionComment, PaperGrade, StageHistoryEntry,
};
use super::policy::BUSINESS_DAYS_PER_WEEK;

/// Underwriter verdict applied to a deal. A counter-offer is an approval
/// with different terms, not a distinct stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approve,
    Counter,
    Decline,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Counter => "COUNTER",
            Decision::Decline => "DECLINE",
        }
    }
}

/// Decision payload as received at the boundary. Term fields are required
/// for approvals and counters; reasons are required for declines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    pub paper_grade: Option<PaperGrade>,
    pub risk_score: Option<u8>,
    pub approved_amount: Option<f64>,
    pub factor_rate: Option<f64>,
    pub term_days: Option<u32>,
    pub daily_payment: Option<f64>,
    pub weekly_payment: Option<f64>,
    pub payback_amount: Option<f64>,
    #[serde(default)]
    pub decline_reasons: Vec<String>,
    pub notes: Option<String>,
}

/// Rejected before any state is touched: a failed validation leaves the
/// deal exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("{decision} decision requires {field}")]
    MissingField {
        decision: &'static str,
        field: &'static str,
    },
    #[error("a decline requires at least one reason")]
    MissingDeclineReasons,
    #[error("approved amount must be positive, got {amount}")]
    InvalidAmount { amount: f64 },
    #[error("factor rate must exceed 1.0, got {rate}")]
    InvalidFactorRate { rate: f64 },
    #[error("term must be at least one day")]
    InvalidTerm,
}

/// The atomic unit a repository persists: the updated deal, exactly one
/// history row, and at most one audit comment. `expected_version` is the
/// version the transition was computed against; a store must refuse to
/// apply it against anything newer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub expected_version: u64,
    pub deal: Deal,
    pub history: StageHistoryEntry,
    pub comment: Option<DecisionComment>,
    pub message: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require<T: Copy>(
    value: Option<T>,
    decision: Decision,
    field: &'static str,
) -> Result<T, TransitionError> {
    value.ok_or(TransitionError::MissingField {
        decision: decision.label(),
        field,
    })
}

/// Apply an underwriting decision to a deal, producing the transition to
/// persist. Pure: validates fail-fast, then computes the updated deal,
/// history row, and audit comment without touching any store.
///
/// The machine does not restrict which stages a decision may be applied
/// from; re-deciding a terminal deal produces a further transition and
/// history row rather than an error.
pub fn apply_decision(
    deal: &Deal,
    request: &DecisionRequest,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<StageTransition, TransitionError> {
    match request.decision {
        Decision::Approve | Decision::Counter => apply_approval(deal, request, actor, now),
        Decision::Decline => apply_decline(deal, request, actor, now),
    }
}

fn apply_approval(
    deal: &Deal,
    request: &DecisionRequest,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<StageTransition, TransitionError> {
    let decision = request.decision;
    let grade = require(request.paper_grade, decision, "paper_grade")?;
    let score = require(request.risk_score, decision, "risk_score")?;
    let amount = require(request.approved_amount, decision, "approved_amount")?;
    let factor_rate = require(request.factor_rate, decision, "factor_rate")?;
    let term_days = require(request.term_days, decision, "term_days")?;

    if amount <= 0.0 {
        return Err(TransitionError::InvalidAmount { amount });
    }
    if factor_rate <= 1.0 {
        return Err(TransitionError::InvalidFactorRate { rate: factor_rate });
    }
    if term_days == 0 {
        return Err(TransitionError::InvalidTerm);
    }

    // Derived payment fields default to the standard schedule math when the
    // caller did not override them.
    let payback_amount = request
        .payback_amount
        .unwrap_or_else(|| round2(amount * factor_rate));
    let daily_payment = request
        .daily_payment
        .unwrap_or_else(|| round2(amount * factor_rate / f64::from(term_days)));
    let weekly_payment = request
        .weekly_payment
        .unwrap_or_else(|| round2(daily_payment * BUSINESS_DAYS_PER_WEEK));

    let mut updated = deal.clone();
    updated.stage = DealStage::Approved;
    updated.paper_grade = Some(grade);
    updated.risk_score = Some(score);
    updated.approved_terms = Some(ApprovedTerms {
        amount,
        factor_rate,
        term_days,
        daily_payment,
        weekly_payment,
        payback_amount,
    });
    updated.decision_notes = request.notes.clone();
    updated.decline_reasons = Vec::new();
    updated.underwriter = Some(actor.to_string());
    updated.stage_changed_at = Some(now);
    updated.decision_at = Some(now);
    updated.version = deal.version + 1;

    let verb = match decision {
        Decision::Counter => "countered",
        _ => "approved",
    };
    let mut message = format!(
        "{verb} ${amount:.2} at {factor_rate:.2} over {term_days} days (grade {}, score {score})",
        grade.label()
    );
    if let Some(notes) = &request.notes {
        message.push_str(&format!(" - {notes}"));
    }

    Ok(StageTransition {
        expected_version: deal.version,
        history: StageHistoryEntry {
            deal_id: deal.deal_id.clone(),
            from_stage: Some(deal.stage),
            to_stage: DealStage::Approved,
            actor: actor.to_string(),
            occurred_at: now,
            note: request.notes.clone(),
        },
        comment: Some(DecisionComment {
            deal_id: deal.deal_id.clone(),
            author: actor.to_string(),
            body: format!("{}: {message}", decision.label()),
            created_at: now,
        }),
        deal: updated,
        message,
    })
}

fn apply_decline(
    deal: &Deal,
    request: &DecisionRequest,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<StageTransition, TransitionError> {
    if request.decline_reasons.is_empty() {
        return Err(TransitionError::MissingDeclineReasons);
    }

    let mut updated = deal.clone();
    updated.stage = DealStage::Declined;
    updated.decline_reasons = request.decline_reasons.clone();
    updated.decision_notes = request.notes.clone();
    updated.underwriter = Some(actor.to_string());
    updated.stage_changed_at = Some(now);
    updated.decision_at = Some(now);
    updated.version = deal.version + 1;

    let mut message = format!("declined: {}", request.decline_reasons.join("; "));
    if let Some(notes) = &request.notes {
        message.push_str(&format!(" - {notes}"));
    }

    Ok(StageTransition {
        expected_version: deal.version,
        history: StageHistoryEntry {
            deal_id: deal.deal_id.clone(),
            from_stage: Some(deal.stage),
            to_stage: DealStage::Declined,
            actor: actor.to_string(),
            occurred_at: now,
            note: request.notes.clone(),
        },
        comment: Some(DecisionComment {
            deal_id: deal.deal_id.clone(),
            author: actor.to_string(),
            body: format!("{}: {message}", Decision::Decline.label()),
            created_at: now,
        }),
        deal: updated,
        message,
    })
}

/// Move a deal along the pipeline outside the decision path (documents
/// requested, contract sent, funding, and so on). Appends the same history
/// record as a decision but no audit comment. Reaching `Funded` stamps the
/// funded date once.
pub fn advance_stage(
    deal: &Deal,
    to_stage: DealStage,
    actor: &str,
    note: Option<String>,
    now: DateTime<Utc>,
) -> StageTransition {
    let mut updated = deal.clone();
    updated.stage = to_stage;
    updated.stage_changed_at = Some(now);
    if to_stage == DealStage::Funded && updated.funded_at.is_none() {
        updated.funded_at = Some(now);
    }
    updated.version = deal.version + 1;

    StageTransition {
        expected_version: deal.version,
        history: StageHistoryEntry {
            deal_id: deal.deal_id.clone(),
            from_stage: Some(deal.stage),
            to_stage,
            actor: actor.to_string(),
            occurred_at: now,
            note,
        },
        comment: None,
        message: format!("stage moved to {}", to_stage.label()),
        deal: updated,
    }
}
