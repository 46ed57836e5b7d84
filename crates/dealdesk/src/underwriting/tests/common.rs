use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::underwriting::domain::{
    BankAnalysis, BrokerSnapshot, Deal, DealBundle, DealId, DecisionComment,
    DetectedPaymentPattern, IndustryRiskTier, MerchantSnapshot, OwnerSnapshot, PaymentFrequency,
    RevenueTrend, StageHistoryEntry, UccFiling,
};
use crate::underwriting::policy::OfferPolicy;
use crate::underwriting::repository::{
    DealRepository, DecisionNotice, NotificationError, NotificationPublisher, RepositoryError,
};
use crate::underwriting::scoring::ScoringConfig;
use crate::underwriting::service::UnderwritingService;
use crate::underwriting::stage::{Decision, DecisionRequest, StageTransition};

pub(super) fn merchant() -> MerchantSnapshot {
    MerchantSnapshot {
        legal_name: "Riverbend Diner LLC".to_string(),
        months_in_business: Some(36),
        monthly_revenue: Some(75_000.0),
        industry_risk: IndustryRiskTier::Medium,
    }
}

pub(super) fn owners() -> Vec<OwnerSnapshot> {
    vec![OwnerSnapshot {
        name: "Dana Reyes".to_string(),
        fico_score: Some(680),
        ownership_pct: 100.0,
        is_primary: true,
    }]
}

pub(super) fn bank_analysis() -> BankAnalysis {
    BankAnalysis {
        average_daily_balance: 9_500.0,
        min_daily_balance: 4_200.0,
        max_daily_balance: 15_800.0,
        total_deposits: 228_000.0,
        deposit_count: 96,
        average_deposit: 2_375.0,
        deposit_days: 78,
        nsf_count: 0,
        overdraft_count: 0,
        months_analyzed: 3,
        revenue_trend: RevenueTrend::Stable,
        existing_daily_load: 0.0,
        detected_patterns: Vec::new(),
    }
}

pub(super) fn mca_pattern() -> DetectedPaymentPattern {
    DetectedPaymentPattern {
        amount: 449.0,
        frequency: PaymentFrequency::Daily,
        occurrences: 18,
    }
}

pub(super) fn active_filing() -> UccFiling {
    UccFiling {
        secured_party: "Rapid Capital Funding".to_string(),
        filed_on: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        active: true,
    }
}

pub(super) fn deal(id: &str) -> Deal {
    Deal::new_lead(DealId(id.to_string()), 50_000.0)
}

pub(super) fn bundle(id: &str) -> DealBundle {
    DealBundle {
        deal: deal(id),
        merchant: merchant(),
        owners: owners(),
        bank_analysis: None,
        broker: None,
        ucc_filings: Vec::new(),
    }
}

pub(super) fn broker() -> BrokerSnapshot {
    BrokerSnapshot {
        name: "Harborline Advisors".to_string(),
        commission_rate: 0.08,
    }
}

pub(super) fn approve_request() -> DecisionRequest {
    DecisionRequest {
        decision: Decision::Approve,
        paper_grade: Some(crate::underwriting::domain::PaperGrade::B),
        risk_score: Some(78),
        approved_amount: Some(42_000.0),
        factor_rate: Some(1.30),
        term_days: Some(120),
        daily_payment: None,
        weekly_payment: None,
        payback_amount: None,
        decline_reasons: Vec::new(),
        notes: Some("solid deposits, clean statements".to_string()),
    }
}

pub(super) fn decline_request() -> DecisionRequest {
    DecisionRequest {
        decision: Decision::Decline,
        paper_grade: None,
        risk_score: None,
        approved_amount: None,
        factor_rate: None,
        term_days: None,
        daily_payment: None,
        weekly_payment: None,
        payback_amount: None,
        decline_reasons: vec!["insufficient revenue".to_string()],
        notes: None,
    }
}

struct SeededDeal {
    bundle: DealBundle,
    history: Vec<StageHistoryEntry>,
    comments: Vec<DecisionComment>,
}

/// In-memory repository applying transitions under one lock so the
/// version check and both appends are atomic.
#[derive(Default)]
pub(super) struct MemoryDealRepository {
    state: Mutex<HashMap<DealId, SeededDeal>>,
}

impl MemoryDealRepository {
    pub(super) fn seed(&self, bundle: DealBundle) {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.insert(
            bundle.deal.deal_id.clone(),
            SeededDeal {
                bundle,
                history: Vec::new(),
                comments: Vec::new(),
            },
        );
    }
}

impl DealRepository for MemoryDealRepository {
    fn load(&self, id: &DealId) -> Result<Option<DealBundle>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).map(|seeded| seeded.bundle.clone()))
    }

    fn apply_transition(&self, transition: &StageTransition) -> Result<Deal, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let seeded = guard
            .get_mut(&transition.deal.deal_id)
            .ok_or(RepositoryError::NotFound)?;
        if seeded.bundle.deal.version != transition.expected_version {
            return Err(RepositoryError::Conflict);
        }
        seeded.bundle.deal = transition.deal.clone();
        seeded.history.push(transition.history.clone());
        if let Some(comment) = &transition.comment {
            seeded.comments.push(comment.clone());
        }
        Ok(transition.deal.clone())
    }

    fn history(&self, id: &DealId) -> Result<Vec<StageHistoryEntry>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).map(|seeded| seeded.history.clone()).unwrap_or_default())
    }

    fn comments(&self, id: &DealId) -> Result<Vec<DecisionComment>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).map(|seeded| seeded.comments.clone()).unwrap_or_default())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<DecisionNotice>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) fn build_service() -> (
    UnderwritingService<MemoryDealRepository, MemoryNotifications>,
    Arc<MemoryDealRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryDealRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = UnderwritingService::new(
        repository.clone(),
        notifications.clone(),
        ScoringConfig::default(),
        OfferPolicy::standard(),
    );
    (service, repository, notifications)
}
