use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

use dealdesk::underwriting::{
    BankAnalysis, BrokerSnapshot, Deal, DealBundle, DealId, DealRepository, DecisionComment,
    DecisionNotice, DetectedPaymentPattern, IndustryRiskTier, MerchantSnapshot, NotificationError,
    NotificationPublisher, OwnerSnapshot, PaymentFrequency, RepositoryError, RevenueTrend,
    StageHistoryEntry, StageTransition, UccFiling,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct DealRecord {
    bundle: DealBundle,
    history: Vec<StageHistoryEntry>,
    comments: Vec<DecisionComment>,
}

/// Reference repository keeping deals, history, and comments behind one
/// lock so every transition applies atomically and version conflicts are
/// detected rather than overwritten.
#[derive(Default)]
pub(crate) struct InMemoryDealRepository {
    records: Mutex<HashMap<DealId, DealRecord>>,
}

impl InMemoryDealRepository {
    pub(crate) fn seed(&self, bundle: DealBundle) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(
            bundle.deal.deal_id.clone(),
            DealRecord {
                bundle,
                history: Vec::new(),
                comments: Vec::new(),
            },
        );
    }
}

impl DealRepository for InMemoryDealRepository {
    fn load(&self, id: &DealId) -> Result<Option<DealBundle>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).map(|record| record.bundle.clone()))
    }

    fn apply_transition(&self, transition: &StageTransition) -> Result<Deal, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard
            .get_mut(&transition.deal.deal_id)
            .ok_or(RepositoryError::NotFound)?;
        if record.bundle.deal.version != transition.expected_version {
            return Err(RepositoryError::Conflict);
        }
        record.bundle.deal = transition.deal.clone();
        record.history.push(transition.history.clone());
        if let Some(comment) = &transition.comment {
            record.comments.push(comment.clone());
        }
        Ok(transition.deal.clone())
    }

    fn history(&self, id: &DealId) -> Result<Vec<StageHistoryEntry>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(id)
            .map(|record| record.history.clone())
            .unwrap_or_default())
    }

    fn comments(&self, id: &DealId) -> Result<Vec<DecisionComment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(id)
            .map(|record| record.comments.clone())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Mutex<Vec<DecisionNotice>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Representative deal used by the demo command and the serve-time seed: a
/// three-year-old restaurant asking for $50k with one prior advance still
/// paying down.
pub(crate) fn sample_bundle(id: &str, with_stacking: bool) -> DealBundle {
    let mut deal = Deal::new_lead(DealId(id.to_string()), 50_000.0);
    let mut detected_patterns = Vec::new();
    let mut ucc_filings = Vec::new();
    let mut existing_daily_load = 0.0;

    if with_stacking {
        deal.existing_positions = 1;
        existing_daily_load = 285.0;
        detected_patterns.push(DetectedPaymentPattern {
            amount: 285.0,
            frequency: PaymentFrequency::Daily,
            occurrences: 24,
        });
        ucc_filings.push(UccFiling {
            secured_party: "Rapid Capital Funding".to_string(),
            filed_on: NaiveDate::from_ymd_opt(2025, 2, 11).expect("valid date"),
            active: true,
        });
    }

    DealBundle {
        deal,
        merchant: MerchantSnapshot {
            legal_name: "Riverbend Diner LLC".to_string(),
            months_in_business: Some(42),
            monthly_revenue: Some(82_000.0),
            industry_risk: IndustryRiskTier::Medium,
        },
        owners: vec![
            OwnerSnapshot {
                name: "Dana Reyes".to_string(),
                fico_score: Some(694),
                ownership_pct: 60.0,
                is_primary: true,
            },
            OwnerSnapshot {
                name: "Sam Whitfield".to_string(),
                fico_score: Some(655),
                ownership_pct: 40.0,
                is_primary: false,
            },
        ],
        bank_analysis: Some(BankAnalysis {
            average_daily_balance: 11_400.0,
            min_daily_balance: 3_800.0,
            max_daily_balance: 19_200.0,
            total_deposits: 247_500.0,
            deposit_count: 101,
            average_deposit: 2_450.5,
            deposit_days: 81,
            nsf_count: 1,
            overdraft_count: 0,
            months_analyzed: 3,
            revenue_trend: RevenueTrend::Increasing,
            existing_daily_load,
            detected_patterns,
        }),
        broker: Some(BrokerSnapshot {
            name: "Harborline Advisors".to_string(),
            commission_rate: 0.08,
        }),
        ucc_filings,
    }
}
