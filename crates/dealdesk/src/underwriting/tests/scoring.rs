use super::common::*;
use crate::underwriting::domain::{IndustryRiskTier, OwnerSnapshot, PaperGrade, RevenueTrend};
use crate::underwriting::scoring::{RiskFactor, RiskScorer, ScoringConfig, ScoringError};

fn scorer() -> RiskScorer {
    RiskScorer::new(ScoringConfig::default())
}

#[test]
fn established_merchant_without_bank_data_grades_mid_tier() {
    let bundle = bundle("deal-001");
    let assessment = scorer()
        .assess(&bundle.merchant, &bundle.owners, None, &bundle.deal)
        .expect("scoring succeeds");

    assert!(
        matches!(assessment.grade, PaperGrade::B | PaperGrade::C),
        "expected mid-tier grade, got {:?} (score {})",
        assessment.grade,
        assessment.score
    );
    assert!(!assessment.components.is_empty());
    assert!(!assessment.reduced_confidence);
}

#[test]
fn scoring_is_deterministic() {
    let bundle = bundle("deal-002");
    let scorer = scorer();
    let first = scorer
        .assess(&bundle.merchant, &bundle.owners, Some(&bank_analysis()), &bundle.deal)
        .expect("scoring succeeds");
    let second = scorer
        .assess(&bundle.merchant, &bundle.owners, Some(&bank_analysis()), &bundle.deal)
        .expect("scoring succeeds");
    assert_eq!(first, second);
}

#[test]
fn score_never_increases_with_additional_positions() {
    let bundle = bundle("deal-003");
    let scorer = scorer();
    let mut previous = u8::MAX;
    for positions in 0..6 {
        let mut deal = bundle.deal.clone();
        deal.existing_positions = positions;
        let assessment = scorer
            .assess(&bundle.merchant, &bundle.owners, None, &deal)
            .expect("scoring succeeds");
        assert!(
            assessment.score <= previous,
            "score rose from {previous} to {} at {positions} positions",
            assessment.score
        );
        previous = assessment.score;
    }
}

#[test]
fn stacking_flag_drags_the_score_down() {
    let bundle = bundle("deal-004");
    let scorer = scorer();
    let clean = scorer
        .assess(&bundle.merchant, &bundle.owners, None, &bundle.deal)
        .expect("scoring succeeds");

    let mut stacked_deal = bundle.deal.clone();
    stacked_deal.stacking_detected = true;
    let stacked = scorer
        .assess(&bundle.merchant, &bundle.owners, None, &stacked_deal)
        .expect("scoring succeeds");

    assert!(stacked.score < clean.score);
}

#[test]
fn zero_owners_flags_reduced_confidence_without_failing() {
    let bundle = bundle("deal-005");
    let assessment = scorer()
        .assess(&bundle.merchant, &[], None, &bundle.deal)
        .expect("merchant-only scoring succeeds");
    assert!(assessment.reduced_confidence);
    assert!(assessment
        .components
        .iter()
        .any(|component| component.factor == RiskFactor::OwnerCredit && component.score < 0));
}

#[test]
fn missing_fico_is_penalized_not_zeroed() {
    let bundle = bundle("deal-006");
    let owners = vec![OwnerSnapshot {
        name: "Lee Ortega".to_string(),
        fico_score: None,
        ownership_pct: 100.0,
        is_primary: true,
    }];
    let assessment = scorer()
        .assess(&bundle.merchant, &owners, None, &bundle.deal)
        .expect("scoring succeeds");
    let credit = assessment
        .components
        .iter()
        .find(|component| component.factor == RiskFactor::OwnerCredit)
        .expect("owner credit component present");
    assert_eq!(credit.score, -5);
}

#[test]
fn multiple_primary_owners_resolve_to_largest_stake() {
    let bundle = bundle("deal-007");
    let owners = vec![
        OwnerSnapshot {
            name: "Minority Partner".to_string(),
            fico_score: Some(560),
            ownership_pct: 30.0,
            is_primary: true,
        },
        OwnerSnapshot {
            name: "Majority Partner".to_string(),
            fico_score: Some(740),
            ownership_pct: 70.0,
            is_primary: true,
        },
    ];
    let assessment = scorer()
        .assess(&bundle.merchant, &owners, None, &bundle.deal)
        .expect("scoring succeeds");
    let credit = assessment
        .components
        .iter()
        .find(|component| component.factor == RiskFactor::OwnerCredit)
        .expect("owner credit component present");
    assert!(credit.notes.contains("740"));
}

#[test]
fn missing_bank_analysis_skips_bank_factors_entirely() {
    let bundle = bundle("deal-008");
    let assessment = scorer()
        .assess(&bundle.merchant, &bundle.owners, None, &bundle.deal)
        .expect("scoring succeeds");
    assert!(!assessment.components.iter().any(|component| matches!(
        component.factor,
        RiskFactor::BalanceStability
            | RiskFactor::NsfActivity
            | RiskFactor::DepositConsistency
            | RiskFactor::RevenueTrend
    )));
}

#[test]
fn declining_deposits_penalize_the_score() {
    let bundle = bundle("deal-009");
    let scorer = scorer();
    let stable = scorer
        .assess(&bundle.merchant, &bundle.owners, Some(&bank_analysis()), &bundle.deal)
        .expect("scoring succeeds");

    let mut declining_bank = bank_analysis();
    declining_bank.revenue_trend = RevenueTrend::Declining;
    let declining = scorer
        .assess(&bundle.merchant, &bundle.owners, Some(&declining_bank), &bundle.deal)
        .expect("scoring succeeds");

    assert!(declining.score < stable.score);
}

#[test]
fn strong_profile_earns_grade_a() {
    let mut bundle = bundle("deal-010");
    bundle.merchant.months_in_business = Some(84);
    bundle.merchant.monthly_revenue = Some(140_000.0);
    bundle.merchant.industry_risk = IndustryRiskTier::Low;
    bundle.owners[0].fico_score = Some(760);

    let assessment = scorer()
        .assess(
            &bundle.merchant,
            &bundle.owners,
            Some(&bank_analysis()),
            &bundle.deal,
        )
        .expect("scoring succeeds");
    assert_eq!(assessment.grade, PaperGrade::A);
}

#[test]
fn negative_revenue_is_a_structural_error() {
    let mut bundle = bundle("deal-011");
    bundle.merchant.monthly_revenue = Some(-1_000.0);
    let result = scorer().assess(&bundle.merchant, &bundle.owners, None, &bundle.deal);
    assert!(matches!(
        result,
        Err(ScoringError::NegativeRevenue { .. })
    ));
}

#[test]
fn score_stays_clamped_to_the_hundred_point_scale() {
    let mut bundle = bundle("deal-012");
    bundle.merchant.months_in_business = Some(2);
    bundle.merchant.monthly_revenue = Some(4_000.0);
    bundle.merchant.industry_risk = IndustryRiskTier::High;
    bundle.owners[0].fico_score = Some(510);
    bundle.deal.existing_positions = 8;
    bundle.deal.stacking_detected = true;

    let assessment = scorer()
        .assess(&bundle.merchant, &bundle.owners, None, &bundle.deal)
        .expect("scoring succeeds");
    assert!(assessment.score <= 100);
    assert_eq!(assessment.grade, PaperGrade::D);
}
