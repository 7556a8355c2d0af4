use crate::models::cell::Cell;

/// Ephemeral per-cell scoring output, produced fresh for each allocator
/// run and discarded once selection finishes. Selection consumes a sorted
/// snapshot; candidates are never mutated in place.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub cell: &'a Cell,
    pub efficiency_score: f64,
    pub setup_cost: f64,
    pub recurring_cost: f64,
    pub expected_impact: f64,
}
