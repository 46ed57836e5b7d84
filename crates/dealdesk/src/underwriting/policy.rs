use serde::{Deserialize, Serialize};

use super::domain::PaperGrade;

/// Commission applied when no broker is attached to the deal.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.10;

/// Payment scheduling assumes a five-business-day week.
pub const BUSINESS_DAYS_PER_WEEK: f64 = 5.0;

/// Holdback is measured against a 22-business-day revenue month.
pub const BUSINESS_DAYS_PER_MONTH: f64 = 22.0;

/// Pricing terms for one paper grade: the default point plus the allowed
/// factor-rate and term ranges, and the revenue multiple capping approvals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeTerms {
    pub factor_rate: f64,
    pub factor_rate_min: f64,
    pub factor_rate_max: f64,
    pub term_days: u32,
    pub term_days_min: u32,
    pub term_days_max: u32,
    pub max_revenue_multiple: f64,
}

/// Immutable, versioned pricing table injected into the offer calculator.
/// Swapping the policy never touches algorithmic code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPolicy {
    pub version: String,
    pub grade_a: GradeTerms,
    pub grade_b: GradeTerms,
    pub grade_c: GradeTerms,
    pub grade_d: GradeTerms,
    /// When set, custom-offer overrides are clamped into the grade's
    /// allowed ranges instead of being accepted verbatim.
    pub clamp_custom_terms: bool,
}

impl OfferPolicy {
    /// The desk's standard rate card.
    pub fn standard() -> Self {
        Self {
            version: "2025-Q3".to_string(),
            grade_a: GradeTerms {
                factor_rate: 1.18,
                factor_rate_min: 1.12,
                factor_rate_max: 1.26,
                term_days: 160,
                term_days_min: 120,
                term_days_max: 220,
                max_revenue_multiple: 1.5,
            },
            grade_b: GradeTerms {
                factor_rate: 1.30,
                factor_rate_min: 1.24,
                factor_rate_max: 1.38,
                term_days: 120,
                term_days_min: 100,
                term_days_max: 160,
                max_revenue_multiple: 1.2,
            },
            grade_c: GradeTerms {
                factor_rate: 1.40,
                factor_rate_min: 1.32,
                factor_rate_max: 1.46,
                term_days: 100,
                term_days_min: 80,
                term_days_max: 120,
                max_revenue_multiple: 1.0,
            },
            grade_d: GradeTerms {
                factor_rate: 1.49,
                factor_rate_min: 1.42,
                factor_rate_max: 1.49,
                term_days: 70,
                term_days_min: 60,
                term_days_max: 90,
                max_revenue_multiple: 0.8,
            },
            clamp_custom_terms: false,
        }
    }

    pub fn terms(&self, grade: PaperGrade) -> &GradeTerms {
        match grade {
            PaperGrade::A => &self.grade_a,
            PaperGrade::B => &self.grade_b,
            PaperGrade::C => &self.grade_c,
            PaperGrade::D => &self.grade_d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_terms_tighten_down_the_ladder() {
        let policy = OfferPolicy::standard();
        let mut previous: Option<GradeTerms> = None;
        for grade in PaperGrade::ALL {
            let terms = *policy.terms(grade);
            assert!(terms.factor_rate_min <= terms.factor_rate);
            assert!(terms.factor_rate <= terms.factor_rate_max);
            assert!(terms.term_days_min <= terms.term_days);
            assert!(terms.term_days <= terms.term_days_max);
            if let Some(better) = previous {
                assert!(terms.factor_rate > better.factor_rate);
                assert!(terms.term_days < better.term_days);
                assert!(terms.max_revenue_multiple < better.max_revenue_multiple);
            }
            previous = Some(terms);
        }
    }
}
