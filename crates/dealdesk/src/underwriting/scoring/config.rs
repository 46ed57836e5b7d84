use serde::{Deserialize, Serialize};

/// Policy knobs for the risk scorer: the neutral starting point, the
/// viability floor for time in business, the fixed grade cut lines, and
/// the per-position leverage penalties. Band weights live in the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_score: i16,
    pub min_viability_months: u32,
    pub grade_a_floor: u8,
    pub grade_b_floor: u8,
    pub grade_c_floor: u8,
    pub position_penalty: i16,
    pub stacking_penalty: i16,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 40,
            min_viability_months: 6,
            grade_a_floor: 85,
            grade_b_floor: 70,
            grade_c_floor: 55,
            position_penalty: 6,
            stacking_penalty: 10,
        }
    }
}
