use chrono::{Duration, Utc};

use super::common::*;
use crate::underwriting::domain::{DealStage, PaperGrade};
use crate::underwriting::stage::{
    advance_stage, apply_decision, Decision, TransitionError,
};

#[test]
fn decline_moves_a_new_lead_to_declined_with_a_full_audit_trail() {
    let deal = deal("deal-100");
    let now = Utc::now();

    let transition =
        apply_decision(&deal, &decline_request(), "t.alvarez", now).expect("decline applies");

    assert_eq!(transition.deal.stage, DealStage::Declined);
    assert_eq!(transition.deal.decline_reasons, vec!["insufficient revenue"]);
    assert_eq!(transition.deal.version, 1);
    assert_eq!(transition.expected_version, 0);
    assert_eq!(transition.deal.decision_at, Some(now));

    assert_eq!(transition.history.from_stage, Some(DealStage::NewLead));
    assert_eq!(transition.history.to_stage, DealStage::Declined);
    assert_eq!(transition.history.actor, "t.alvarez");

    let comment = transition.comment.expect("decline appends a comment");
    assert!(comment.body.contains("insufficient revenue"));
    assert!(comment.body.starts_with("DECLINE"));
}

#[test]
fn approval_locks_terms_and_computes_the_payment_schedule() {
    let deal = deal("deal-101");
    let transition = apply_decision(&deal, &approve_request(), "t.alvarez", Utc::now())
        .expect("approval applies");

    assert_eq!(transition.deal.stage, DealStage::Approved);
    assert_eq!(transition.deal.paper_grade, Some(PaperGrade::B));
    assert_eq!(transition.deal.risk_score, Some(78));
    assert_eq!(transition.deal.underwriter.as_deref(), Some("t.alvarez"));

    let terms = transition.deal.approved_terms.expect("terms locked");
    assert_eq!(terms.amount, 42_000.0);
    assert!((terms.payback_amount - 54_600.0).abs() < 0.01);
    assert!((terms.daily_payment - 455.0).abs() < 0.01);
    assert!((terms.weekly_payment - 2_275.0).abs() < 0.01);
    assert!(transition.message.contains("42000.00"));
}

#[test]
fn counter_is_an_approval_with_different_terms() {
    let deal = deal("deal-102");
    let mut request = approve_request();
    request.decision = Decision::Counter;
    request.approved_amount = Some(30_000.0);

    let transition =
        apply_decision(&deal, &request, "t.alvarez", Utc::now()).expect("counter applies");
    assert_eq!(transition.deal.stage, DealStage::Approved);
    assert!(transition.message.starts_with("countered"));
    assert_eq!(
        transition.deal.approved_terms.expect("terms locked").amount,
        30_000.0
    );
}

#[test]
fn approval_missing_terms_fails_before_any_mutation() {
    let deal = deal("deal-103");
    let mut request = approve_request();
    request.approved_amount = None;

    match apply_decision(&deal, &request, "t.alvarez", Utc::now()) {
        Err(TransitionError::MissingField { field, .. }) => {
            assert_eq!(field, "approved_amount");
        }
        other => panic!("expected missing field error, got {other:?}"),
    }
}

#[test]
fn decline_without_reasons_is_rejected() {
    let deal = deal("deal-104");
    let mut request = decline_request();
    request.decline_reasons.clear();

    assert!(matches!(
        apply_decision(&deal, &request, "t.alvarez", Utc::now()),
        Err(TransitionError::MissingDeclineReasons)
    ));
}

#[test]
fn terminal_deals_accept_further_decisions() {
    // The machine deliberately does not gate on the current stage; a
    // funded deal can still be re-decided and the history records it.
    let mut deal = deal("deal-105");
    deal.stage = DealStage::Funded;
    deal.version = 4;

    let transition = apply_decision(&deal, &approve_request(), "t.alvarez", Utc::now())
        .expect("terminal re-decision applies");
    assert_eq!(transition.history.from_stage, Some(DealStage::Funded));
    assert_eq!(transition.history.to_stage, DealStage::Approved);
    assert_eq!(transition.deal.version, 5);
}

#[test]
fn advancing_to_funded_stamps_the_funded_date_once() {
    let deal = deal("deal-106");
    let first = Utc::now();

    let funded = advance_stage(&deal, DealStage::Funded, "ops", None, first);
    assert_eq!(funded.deal.funded_at, Some(first));
    assert!(funded.comment.is_none());

    let later = first + Duration::days(2);
    let again = advance_stage(&funded.deal, DealStage::Funded, "ops", None, later);
    assert_eq!(again.deal.funded_at, Some(first));
    assert_eq!(again.deal.stage_changed_at, Some(later));
}

#[test]
fn pipeline_moves_record_history_without_comments() {
    let deal = deal("deal-107");
    let transition = advance_stage(
        &deal,
        DealStage::DocsRequested,
        "intake",
        Some("requested 3 months of statements".to_string()),
        Utc::now(),
    );
    assert_eq!(transition.deal.stage, DealStage::DocsRequested);
    assert_eq!(transition.history.note.as_deref(), Some("requested 3 months of statements"));
    assert!(transition.comment.is_none());
    assert_eq!(transition.message, "stage moved to docs_requested");
}
