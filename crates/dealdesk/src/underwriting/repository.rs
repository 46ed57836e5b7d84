use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApprovedTerms, Deal, DealBundle, DealId, DecisionComment, StageHistoryEntry};
use super::stage::StageTransition;

/// Storage abstraction so the engine can be exercised without a real
/// database. Implementations own all querying and persistence.
pub trait DealRepository: Send + Sync {
    /// Load everything the engine reads for one deal.
    fn load(&self, id: &DealId) -> Result<Option<DealBundle>, RepositoryError>;

    /// Persist a transition as one atomic unit: the deal update, the
    /// history append, and the comment append succeed or fail together.
    /// Must refuse with `Conflict` when the stored deal's version no
    /// longer matches `transition.expected_version`, leaving the deal and
    /// both logs untouched.
    fn apply_transition(&self, transition: &StageTransition) -> Result<Deal, RepositoryError>;

    /// Stage history for a deal, oldest first.
    fn history(&self, id: &DealId) -> Result<Vec<StageHistoryEntry>, RepositoryError>;

    /// Audit comments for a deal, oldest first.
    fn comments(&self, id: &DealId) -> Result<Vec<DecisionComment>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("deal not found")]
    NotFound,
    #[error("deal was modified concurrently; reload and retry")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound decision notification hooks (e-mail, SMS, or
/// CRM adapters live behind it).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError>;
}

/// Templated notice emitted when a decision lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub template: String,
    pub deal_id: DealId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a deal's externally visible state.
#[derive(Debug, Clone, Serialize)]
pub struct DealStatusView {
    pub deal_id: DealId,
    pub stage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_terms: Option<ApprovedTerms>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decline_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_notes: Option<String>,
}

impl Deal {
    pub fn status_view(&self) -> DealStatusView {
        DealStatusView {
            deal_id: self.deal_id.clone(),
            stage: self.stage.label(),
            grade: self.paper_grade.map(|grade| grade.label()),
            risk_score: self.risk_score,
            approved_terms: self.approved_terms.clone(),
            decline_reasons: self.decline_reasons.clone(),
            decision_notes: self.decision_notes.clone(),
        }
    }
}
