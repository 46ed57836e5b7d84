use serde::{Deserialize, Serialize};

use super::domain::{BankAnalysis, PaymentFrequency, UccFiling};

/// A recurring debit needs this many counted occurrences before it is
/// treated as an MCA repayment signature rather than noise.
const MIN_PATTERN_OCCURRENCES: u32 = 3;

/// One piece of evidence behind a stacking determination, kept so a human
/// can audit why the flag was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StackingSignal {
    RecurringDebit {
        amount: f64,
        frequency: PaymentFrequency,
        occurrences: u32,
    },
    ActiveUccFiling {
        secured_party: String,
        filed_on: chrono::NaiveDate,
    },
}

impl StackingSignal {
    pub fn summary(&self) -> String {
        match self {
            StackingSignal::RecurringDebit {
                amount,
                frequency,
                occurrences,
            } => format!(
                "recurring {} debit of ${amount:.2} observed {occurrences} times",
                frequency.label()
            ),
            StackingSignal::ActiveUccFiling {
                secured_party,
                filed_on,
            } => format!("active UCC filing by {secured_party} dated {filed_on}"),
        }
    }
}

/// Existing-position determination with its supporting signal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingAnalysis {
    pub stacking_detected: bool,
    pub signals: Vec<StackingSignal>,
}

/// Combine bank-derived repayment signatures with active UCC filings.
/// Either source alone is sufficient; absent bank data falls back to
/// UCC-only, an empty filing list falls back to bank-only, and both
/// missing means not stacked.
pub fn detect_stacking(
    bank_analysis: Option<&BankAnalysis>,
    ucc_filings: &[UccFiling],
) -> StackingAnalysis {
    let mut signals = Vec::new();

    if let Some(analysis) = bank_analysis {
        for pattern in &analysis.detected_patterns {
            if pattern.amount > 0.0 && pattern.occurrences >= MIN_PATTERN_OCCURRENCES {
                signals.push(StackingSignal::RecurringDebit {
                    amount: pattern.amount,
                    frequency: pattern.frequency,
                    occurrences: pattern.occurrences,
                });
            }
        }
    }

    for filing in ucc_filings {
        if filing.active {
            signals.push(StackingSignal::ActiveUccFiling {
                secured_party: filing.secured_party.clone(),
                filed_on: filing.filed_on,
            });
        }
    }

    StackingAnalysis {
        stacking_detected: !signals.is_empty(),
        signals,
    }
}
