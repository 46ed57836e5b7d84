use serde::{Deserialize, Serialize};

use super::domain::PaperGrade;
use super::policy::{
    OfferPolicy, BUSINESS_DAYS_PER_MONTH, BUSINESS_DAYS_PER_WEEK, DEFAULT_COMMISSION_RATE,
};

/// Raised when pricing inputs are structurally unusable. Missing optional
/// context (broker, bank data) never lands here.
#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("monthly revenue must be positive to price an offer, got {amount}")]
    InvalidRevenue { amount: f64 },
    #[error("requested amount must be positive, got {amount}")]
    InvalidAmount { amount: f64 },
    #[error("factor rate must exceed 1.0, got {rate}")]
    InvalidFactorRate { rate: f64 },
    #[error("term must be at least one day")]
    InvalidTerm,
}

/// One priced funding offer. All monetary fields are rounded to cents at
/// construction; intermediate math stays unrounded to avoid compounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingOffer {
    pub grade: PaperGrade,
    pub approved_amount: f64,
    pub factor_rate: f64,
    pub term_days: u32,
    pub payback_amount: f64,
    pub daily_payment: f64,
    pub weekly_payment: f64,
    /// Share of a business day's revenue committed to this advance plus
    /// existing obligations, as a percentage. The core affordability metric.
    pub holdback_pct: f64,
    /// Ordinal this advance would occupy in the merchant's stack.
    pub position: u32,
    pub commission: f64,
    /// Set when the revenue-multiple cap, not the request, sized the offer.
    pub capped_by_policy: bool,
}

/// A labeled point in the grade's allowed rate/term space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferTier {
    pub label: String,
    pub offer: FundingOffer,
}

/// Policy envelope for a grade, surfaced so reviewers see the bounds an
/// offer was priced inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeConstraints {
    pub grade: PaperGrade,
    pub max_amount: f64,
    pub factor_rate_min: f64,
    pub factor_rate_max: f64,
    pub term_days_min: u32,
    pub term_days_max: u32,
    /// Daily revenue capacity remaining after existing obligations.
    pub daily_payment_capacity: f64,
}

/// Explicit overrides for the ad-hoc custom offer path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomOfferTerms {
    pub amount: f64,
    pub factor_rate: f64,
    pub term_days: u32,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stateless calculator pricing offers from the injected policy table.
pub struct OfferCalculator {
    policy: OfferPolicy,
}

impl OfferCalculator {
    pub fn new(policy: OfferPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OfferPolicy {
        &self.policy
    }

    /// Price the canonical offer for a grade: the grade's default factor
    /// rate and term, capped at the grade's revenue multiple.
    pub fn calculate(
        &self,
        grade: PaperGrade,
        requested_amount: f64,
        monthly_revenue: f64,
        existing_positions: u32,
        existing_daily_load: f64,
        broker_commission_rate: Option<f64>,
    ) -> Result<FundingOffer, OfferError> {
        let terms = self.policy.terms(grade);
        self.build(
            grade,
            terms.factor_rate,
            terms.term_days,
            requested_amount,
            monthly_revenue,
            existing_positions,
            existing_daily_load,
            broker_commission_rate,
        )
    }

    /// Ladder of alternatives inside the grade's allowed ranges, so a
    /// reviewer can present options without recomputing by hand.
    pub fn tiers(
        &self,
        grade: PaperGrade,
        requested_amount: f64,
        monthly_revenue: f64,
    ) -> Result<Vec<OfferTier>, OfferError> {
        let terms = *self.policy.terms(grade);
        let points = [
            ("extended", terms.factor_rate_min, terms.term_days_max),
            ("standard", terms.factor_rate, terms.term_days),
            ("accelerated", terms.factor_rate_max, terms.term_days_min),
        ];

        points
            .into_iter()
            .map(|(label, rate, term_days)| {
                self.build(
                    grade,
                    rate,
                    term_days,
                    requested_amount,
                    monthly_revenue,
                    0,
                    0.0,
                    None,
                )
                .map(|offer| OfferTier {
                    label: label.to_string(),
                    offer,
                })
            })
            .collect()
    }

    /// Ad-hoc offer from explicit rate/term/amount overrides. Overrides are
    /// accepted verbatim unless the policy's `clamp_custom_terms` flag pulls
    /// them into the grade's allowed ranges; payback, payments, and holdback
    /// are recomputed identically to the standard path.
    pub fn custom(
        &self,
        grade: PaperGrade,
        terms: CustomOfferTerms,
        monthly_revenue: f64,
        existing_positions: u32,
        existing_daily_load: f64,
        broker_commission_rate: Option<f64>,
    ) -> Result<FundingOffer, OfferError> {
        if terms.factor_rate <= 1.0 {
            return Err(OfferError::InvalidFactorRate {
                rate: terms.factor_rate,
            });
        }
        if terms.term_days == 0 {
            return Err(OfferError::InvalidTerm);
        }

        let (factor_rate, term_days) = if self.policy.clamp_custom_terms {
            let bounds = self.policy.terms(grade);
            (
                terms.factor_rate.clamp(bounds.factor_rate_min, bounds.factor_rate_max),
                terms.term_days.clamp(bounds.term_days_min, bounds.term_days_max),
            )
        } else {
            (terms.factor_rate, terms.term_days)
        };

        self.build(
            grade,
            factor_rate,
            term_days,
            terms.amount,
            monthly_revenue,
            existing_positions,
            existing_daily_load,
            broker_commission_rate,
        )
    }

    pub fn constraints(
        &self,
        grade: PaperGrade,
        monthly_revenue: f64,
        existing_daily_load: f64,
    ) -> Result<GradeConstraints, OfferError> {
        if monthly_revenue <= 0.0 {
            return Err(OfferError::InvalidRevenue {
                amount: monthly_revenue,
            });
        }
        let terms = self.policy.terms(grade);
        let daily_revenue = monthly_revenue / BUSINESS_DAYS_PER_MONTH;
        Ok(GradeConstraints {
            grade,
            max_amount: round2(monthly_revenue * terms.max_revenue_multiple),
            factor_rate_min: terms.factor_rate_min,
            factor_rate_max: terms.factor_rate_max,
            term_days_min: terms.term_days_min,
            term_days_max: terms.term_days_max,
            daily_payment_capacity: round2(daily_revenue - existing_daily_load),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        grade: PaperGrade,
        factor_rate: f64,
        term_days: u32,
        requested_amount: f64,
        monthly_revenue: f64,
        existing_positions: u32,
        existing_daily_load: f64,
        broker_commission_rate: Option<f64>,
    ) -> Result<FundingOffer, OfferError> {
        if monthly_revenue <= 0.0 {
            return Err(OfferError::InvalidRevenue {
                amount: monthly_revenue,
            });
        }
        if requested_amount <= 0.0 {
            return Err(OfferError::InvalidAmount {
                amount: requested_amount,
            });
        }

        let cap = monthly_revenue * self.policy.terms(grade).max_revenue_multiple;
        let approved_amount = requested_amount.min(cap);
        let payback_amount = approved_amount * factor_rate;
        let daily_payment = payback_amount / f64::from(term_days);
        let weekly_payment = daily_payment * BUSINESS_DAYS_PER_WEEK;
        let daily_revenue = monthly_revenue / BUSINESS_DAYS_PER_MONTH;
        let holdback_pct = (daily_payment + existing_daily_load) / daily_revenue * 100.0;
        let commission_rate = broker_commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);

        Ok(FundingOffer {
            grade,
            approved_amount: round2(approved_amount),
            factor_rate,
            term_days,
            payback_amount: round2(payback_amount),
            daily_payment: round2(daily_payment),
            weekly_payment: round2(weekly_payment),
            holdback_pct: round2(holdback_pct),
            position: existing_positions + 1,
            commission: round2(approved_amount * commission_rate),
            capped_by_policy: requested_amount > cap,
        })
    }
}
