//! Ranked actions for actionable hypotheses

use insight_validate::{ConfidenceTier, RecommendedAction, ValidationReport};
use serde::{Deserialize, Serialize};

/// One action to take, ranked by confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based, highest confidence first
    pub rank: usize,
    pub hypothesis_id: String,
    /// `dimension=value`, or `all` for unsegmented hypotheses
    pub segment: String,
    pub action: RecommendedAction,
    pub description: String,
    pub confidence: f64,
    pub priority: ConfidenceTier,
}

/// One recommendation per actionable hypothesis, in report order
pub fn recommend(report: &ValidationReport) -> Vec<Recommendation> {
    report
        .actionable()
        .enumerate()
        .map(|(i, v)| Recommendation {
            rank: i + 1,
            hypothesis_id: v.id.clone(),
            segment: v
                .segment
                .as_ref()
                .map_or_else(|| "all".to_string(), ToString::to_string),
            action: v.recommended_action,
            description: v.recommended_action.description().to_string(),
            confidence: v.confidence,
            priority: v.tier(),
        })
        .collect()
}
