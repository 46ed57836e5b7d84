use super::common::*;
use crate::underwriting::stacking::{detect_stacking, StackingSignal};

#[test]
fn no_bank_data_and_no_filings_means_not_stacked() {
    let analysis = detect_stacking(None, &[]);
    assert!(!analysis.stacking_detected);
    assert!(analysis.signals.is_empty());
}

#[test]
fn single_active_filing_is_sufficient_without_bank_data() {
    let analysis = detect_stacking(None, &[active_filing()]);
    assert!(analysis.stacking_detected);
    assert_eq!(analysis.signals.len(), 1);
    assert!(matches!(
        analysis.signals[0],
        StackingSignal::ActiveUccFiling { .. }
    ));
}

#[test]
fn inactive_filings_are_ignored() {
    let mut filing = active_filing();
    filing.active = false;
    let analysis = detect_stacking(None, &[filing]);
    assert!(!analysis.stacking_detected);
}

#[test]
fn recurring_debit_pattern_is_sufficient_without_filings() {
    let mut bank = bank_analysis();
    bank.detected_patterns.push(mca_pattern());
    let analysis = detect_stacking(Some(&bank), &[]);
    assert!(analysis.stacking_detected);
    match &analysis.signals[0] {
        StackingSignal::RecurringDebit {
            amount,
            occurrences,
            ..
        } => {
            assert_eq!(*amount, 449.0);
            assert_eq!(*occurrences, 18);
        }
        other => panic!("expected recurring debit signal, got {other:?}"),
    }
}

#[test]
fn sparse_patterns_do_not_count_as_positions() {
    let mut bank = bank_analysis();
    let mut pattern = mca_pattern();
    pattern.occurrences = 2;
    bank.detected_patterns.push(pattern);
    let analysis = detect_stacking(Some(&bank), &[]);
    assert!(!analysis.stacking_detected);
}

#[test]
fn both_sources_contribute_signals() {
    let mut bank = bank_analysis();
    bank.detected_patterns.push(mca_pattern());
    let analysis = detect_stacking(Some(&bank), &[active_filing()]);
    assert!(analysis.stacking_detected);
    assert_eq!(analysis.signals.len(), 2);
    assert!(analysis.signals.iter().all(|signal| !signal.summary().is_empty()));
}
