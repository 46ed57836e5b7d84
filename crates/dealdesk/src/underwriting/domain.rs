use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for funding deals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

/// Ordinal risk classification driving pricing policy. `A` prices best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaperGrade {
    A,
    B,
    C,
    D,
}

impl PaperGrade {
    pub const ALL: [PaperGrade; 4] = [PaperGrade::A, PaperGrade::B, PaperGrade::C, PaperGrade::D];

    pub const fn label(self) -> &'static str {
        match self {
            PaperGrade::A => "A",
            PaperGrade::B => "B",
            PaperGrade::C => "C",
            PaperGrade::D => "D",
        }
    }
}

/// Industry exposure bucket assigned during merchant onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndustryRiskTier {
    Low,
    Medium,
    High,
}

/// Direction of deposit volume across the analyzed statement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueTrend {
    Increasing,
    Stable,
    Declining,
}

/// Merchant state at the moment of analysis. Owned by the merchant record;
/// the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSnapshot {
    pub legal_name: String,
    pub months_in_business: Option<u32>,
    pub monthly_revenue: Option<f64>,
    pub industry_risk: IndustryRiskTier,
}

/// Beneficial owner attached to a merchant. FICO may be absent when no
/// bureau pull has happened yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    pub name: String,
    pub fico_score: Option<u16>,
    pub ownership_pct: f64,
    pub is_primary: bool,
}

/// Cadence of a recurring debit pattern surfaced by statement analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFrequency {
    Daily,
    Weekly,
}

impl PaymentFrequency {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentFrequency::Daily => "daily",
            PaymentFrequency::Weekly => "weekly",
        }
    }
}

/// A recurring fixed-amount debit consistent with factor-rate financing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPaymentPattern {
    pub amount: f64,
    pub frequency: PaymentFrequency,
    pub occurrences: u32,
}

/// Pre-aggregated bank statement snapshot. At most one exists per deal and
/// it may be entirely absent while documents are still arriving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAnalysis {
    pub average_daily_balance: f64,
    pub min_daily_balance: f64,
    pub max_daily_balance: f64,
    pub total_deposits: f64,
    pub deposit_count: u32,
    pub average_deposit: f64,
    pub deposit_days: u32,
    pub nsf_count: u32,
    pub overdraft_count: u32,
    pub months_analyzed: u32,
    pub revenue_trend: RevenueTrend,
    pub existing_daily_load: f64,
    pub detected_patterns: Vec<DetectedPaymentPattern>,
}

/// Public lien filing evidencing a creditor's claim on merchant receivables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UccFiling {
    pub secured_party: String,
    pub filed_on: NaiveDate,
    pub active: bool,
}

/// Referring broker. Commission rate is a pricing input only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSnapshot {
    pub name: String,
    pub commission_rate: f64,
}

/// Pipeline position of a deal. `Funded`, `Declined`, and `Dead` are
/// terminal; `Declined` and `Dead` are reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStage {
    NewLead,
    DocsRequested,
    DocsReceived,
    InUnderwriting,
    Approved,
    ContractSent,
    ContractSigned,
    Funded,
    Declined,
    Dead,
}

impl DealStage {
    pub const fn label(self) -> &'static str {
        match self {
            DealStage::NewLead => "new_lead",
            DealStage::DocsRequested => "docs_requested",
            DealStage::DocsReceived => "docs_received",
            DealStage::InUnderwriting => "in_underwriting",
            DealStage::Approved => "approved",
            DealStage::ContractSent => "contract_sent",
            DealStage::ContractSigned => "contract_signed",
            DealStage::Funded => "funded",
            DealStage::Declined => "declined",
            DealStage::Dead => "dead",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, DealStage::Funded | DealStage::Declined | DealStage::Dead)
    }
}

/// Terms locked in by an approval or counter decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedTerms {
    pub amount: f64,
    pub factor_rate: f64,
    pub term_days: u32,
    pub daily_payment: f64,
    pub weekly_payment: f64,
    pub payback_amount: f64,
}

/// The deal record. Stage, terms, and decision fields are mutated solely by
/// the stage state machine; everything else arrives from intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub deal_id: DealId,
    pub requested_amount: f64,
    pub existing_positions: u32,
    pub stacking_detected: bool,
    pub stage: DealStage,
    pub paper_grade: Option<PaperGrade>,
    pub risk_score: Option<u8>,
    pub approved_terms: Option<ApprovedTerms>,
    pub decision_notes: Option<String>,
    pub decline_reasons: Vec<String>,
    pub underwriter: Option<String>,
    pub stage_changed_at: Option<DateTime<Utc>>,
    pub decision_at: Option<DateTime<Utc>>,
    pub funded_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token; bumped by every applied transition.
    pub version: u64,
}

impl Deal {
    /// Fresh deal entering the pipeline with only intake data populated.
    pub fn new_lead(deal_id: DealId, requested_amount: f64) -> Self {
        Self {
            deal_id,
            requested_amount,
            existing_positions: 0,
            stacking_detected: false,
            stage: DealStage::NewLead,
            paper_grade: None,
            risk_score: None,
            approved_terms: None,
            decision_notes: None,
            decline_reasons: Vec::new(),
            underwriter: None,
            stage_changed_at: None,
            decision_at: None,
            funded_at: None,
            version: 0,
        }
    }
}

/// Append-only record of a single stage transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub deal_id: DealId,
    pub from_stage: Option<DealStage>,
    pub to_stage: DealStage,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Append-only audit note summarizing a decision's rationale. Human-readable
/// only; never consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionComment {
    pub deal_id: DealId,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the engine reads for one deal, loaded in a single round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealBundle {
    pub deal: Deal,
    pub merchant: MerchantSnapshot,
    pub owners: Vec<OwnerSnapshot>,
    pub bank_analysis: Option<BankAnalysis>,
    pub broker: Option<BrokerSnapshot>,
    pub ucc_filings: Vec<UccFiling>,
}

impl DealBundle {
    pub fn primary_owner(&self) -> Option<&OwnerSnapshot> {
        select_primary_owner(&self.owners)
    }
}

/// Deterministic primary-owner selection: among owners flagged primary the
/// highest ownership percentage wins, ties broken by input order; with no
/// flagged owner the largest stake stands in.
pub fn select_primary_owner(owners: &[OwnerSnapshot]) -> Option<&OwnerSnapshot> {
    fn largest_stake<'a>(
        best: Option<&'a OwnerSnapshot>,
        owner: &'a OwnerSnapshot,
    ) -> Option<&'a OwnerSnapshot> {
        match best {
            Some(current) if current.ownership_pct >= owner.ownership_pct => Some(current),
            _ => Some(owner),
        }
    }

    owners
        .iter()
        .filter(|owner| owner.is_primary)
        .fold(None, largest_stake)
        .or_else(|| owners.iter().fold(None, largest_stake))
}
