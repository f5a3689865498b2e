use serde::{Deserialize, Serialize};

/// Weights for the positional terms of the heuristic evaluator. Material
/// values are fixed per piece kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub dragon_circle: i32,
    pub construction: i32,
    pub interior_pawn: i32,
    pub interior_knight: i32,
    /// Per point of boost, for knights with boost 2 to 4.
    pub knight_boost: i32,
    pub dragon_claim: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            dragon_circle: 25,
            construction: 10,
            interior_pawn: 2,
            interior_knight: 3,
            knight_boost: 2,
            dragon_claim: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: u8,
    /// Seed for the depth-0 random pick. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub weights: EvalWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            seed: None,
            weights: EvalWeights::default(),
        }
    }
}

impl SearchConfig {
    pub fn load_from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
