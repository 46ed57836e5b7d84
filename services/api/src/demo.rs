use std::sync::Arc;

use clap::Args;

use dealdesk::error::AppError;
use dealdesk::underwriting::{
    DealId, DealRepository, Decision, DecisionRequest, OfferPolicy, OfferRequest, ScoringConfig,
    UnderwritingService, UnderwritingServiceError,
};

use crate::infra::{sample_bundle, InMemoryDealRepository, InMemoryNotificationPublisher};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Give the sample merchant an existing advance position and an active
    /// UCC filing so the stacking path is exercised.
    #[arg(long)]
    pub(crate) with_stacking: bool,
    /// Record a decline instead of an approval.
    #[arg(long)]
    pub(crate) decline: bool,
    /// Stop after the offer sheet without recording a decision.
    #[arg(long)]
    pub(crate) skip_decision: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryDealRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = UnderwritingService::new(
        repository.clone(),
        notifications.clone(),
        ScoringConfig::default(),
        OfferPolicy::standard(),
    );

    let id = DealId("deal-demo".to_string());
    repository.seed(sample_bundle(&id.0, args.with_stacking));

    println!("Deal desk underwriting demo");

    let report = service.analyze(&id)?;
    println!(
        "\nAnalysis for {} ({})",
        report.deal_id.0, report.merchant_name
    );
    println!(
        "- Risk score {} -> grade {}{}",
        report.risk.score,
        report.risk.grade.label(),
        if report.risk.reduced_confidence {
            " (reduced confidence)"
        } else {
            ""
        }
    );
    println!("- Score components:");
    for component in &report.risk.components {
        println!(
            "    {:?}: {:+} ({})",
            component.factor, component.score, component.notes
        );
    }

    if report.stacking.stacking_detected {
        println!("- Stacking detected:");
        for signal in &report.stacking.signals {
            println!("    {}", signal.summary());
        }
    } else {
        println!("- Stacking: none detected");
    }

    if let Some(metrics) = &report.bank_metrics {
        println!("- Bank metrics:");
        if let Some(nsf) = metrics.nsf_per_month {
            println!("    NSF per month: {nsf:.2}");
        }
        if let Some(overdrafts) = metrics.overdrafts_per_month {
            println!("    Overdrafts per month: {overdrafts:.2}");
        }
        if let Some(coverage) = metrics.deposit_day_coverage {
            println!("    Deposit day coverage: {:.0}%", coverage * 100.0);
        }
        if let Some(volatility) = metrics.balance_volatility {
            println!("    Balance volatility: {volatility:.2}");
        }
    }

    let sheet = service.offer(&id, &OfferRequest::default())?;
    println!("\nOffer sheet (grade {})", sheet.grade.label());
    println!(
        "- Standard: ${:.2} at {:.2} over {} days | daily ${:.2} | holdback {:.1}% | commission ${:.2}",
        sheet.standard.approved_amount,
        sheet.standard.factor_rate,
        sheet.standard.term_days,
        sheet.standard.daily_payment,
        sheet.standard.holdback_pct,
        sheet.standard.commission
    );
    for tier in &sheet.tiers {
        println!(
            "- {}: {:.2} x {} days -> payback ${:.2}, daily ${:.2}",
            tier.label,
            tier.offer.factor_rate,
            tier.offer.term_days,
            tier.offer.payback_amount,
            tier.offer.daily_payment
        );
    }
    println!(
        "- Constraints: max ${:.2}, rate {:.2}-{:.2}, term {}-{} days, daily capacity ${:.2}",
        sheet.constraints.max_amount,
        sheet.constraints.factor_rate_min,
        sheet.constraints.factor_rate_max,
        sheet.constraints.term_days_min,
        sheet.constraints.term_days_max,
        sheet.constraints.daily_payment_capacity
    );

    if args.skip_decision {
        return Ok(());
    }

    let request = if args.decline {
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
            decline_reasons: vec!["over-leveraged: existing positions".to_string()],
            notes: Some("demo decline".to_string()),
        }
    } else {
        DecisionRequest {
            decision: Decision::Approve,
            paper_grade: Some(report.risk.grade),
            risk_score: Some(report.risk.score),
            approved_amount: Some(sheet.standard.approved_amount),
            factor_rate: Some(sheet.standard.factor_rate),
            term_days: Some(sheet.standard.term_days),
            daily_payment: Some(sheet.standard.daily_payment),
            weekly_payment: Some(sheet.standard.weekly_payment),
            payback_amount: Some(sheet.standard.payback_amount),
            decline_reasons: Vec::new(),
            notes: Some("demo approval at standard terms".to_string()),
        }
    };

    let outcome = service.decide(&id, "demo-underwriter", &request)?;
    println!("\nDecision recorded: {}", outcome.message);
    println!("- Stage: {}", outcome.deal.stage.label());

    let history = repository.history(&id).map_err(UnderwritingServiceError::from)?;
    println!("- Stage history:");
    for entry in &history {
        let from = entry
            .from_stage
            .map(|stage| stage.label())
            .unwrap_or("(start)");
        println!(
            "    {} -> {} by {} at {}",
            from,
            entry.to_stage.label(),
            entry.actor,
            entry.occurred_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    let comments = repository.comments(&id).map_err(UnderwritingServiceError::from)?;
    println!("- Audit comments:");
    for comment in &comments {
        println!("    [{}] {}", comment.author, comment.body);
    }

    let events = notifications.events();
    if events.is_empty() {
        println!("- Outbound notices: none dispatched");
    } else {
        println!("- Outbound notices:");
        for notice in events {
            println!("    template={} -> {}", notice.template, notice.deal_id.0);
        }
    }

    match serde_json::to_string_pretty(&outcome.deal.status_view()) {
        Ok(json) => println!("\nPublic status payload:\n{json}"),
        Err(err) => println!("\nPublic status payload unavailable: {err}"),
    }

    Ok(())
}
