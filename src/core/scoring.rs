use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::constants::{MAX_SCORING_WORKERS, SCORING_CHUNK_SIZE};
use crate::config::optimizer_config::{CostModel, ScoringConfig};
use crate::models::candidate::ScoredCandidate;
use crate::models::cell::Cell;

/// Pure per-cell scorer: weighted multi-factor efficiency plus the capped
/// cost model and double-capped impact estimate. One instance per tier,
/// since the tiers price facilities differently.
pub struct EfficiencyScorer<'cfg> {
    scoring: &'cfg ScoringConfig,
    cost_model: &'cfg CostModel,
}

impl<'cfg> EfficiencyScorer<'cfg> {
    pub fn new(scoring: &'cfg ScoringConfig, cost_model: &'cfg CostModel) -> Self {
        Self { scoring, cost_model }
    }

    /// Scores one cell. Unpopulated and malformed cells produce no
    /// candidate; one bad record never aborts a run.
    pub fn score_cell<'a>(&self, cell: &'a Cell) -> Option<ScoredCandidate<'a>> {
        if cell.population == 0 {
            return None;
        }
        if !cell.is_well_formed() {
            debug!(cell = %cell.id, "skipping malformed cell");
            return None;
        }

        let need_factor = cell.need_index / self.scoring.need_normalization;
        let access_barrier_factor = 1.0 - cell.vehicle_access_rate;
        let poverty_factor = cell.poverty_rate;

        let weights = &self.scoring.weights;
        let efficiency_score = weights.need * need_factor
            + weights.access_barrier * access_barrier_factor
            + weights.poverty * poverty_factor;

        // Capped by how much need exists and by how many people the
        // facility's catchment can physically hold.
        let expected_impact = (cell.need_index * self.scoring.serve_fraction)
            .min(cell.population as f64 * self.scoring.population_cap_fraction);

        Some(ScoredCandidate {
            cell,
            efficiency_score,
            setup_cost: self.cost_model.setup_cost(expected_impact),
            recurring_cost: self.cost_model.recurring_cost(expected_impact),
            expected_impact,
        })
    }

    /// Scores a candidate pool in fixed-size chunks on a bounded worker
    /// pool. Chunks share no mutable state and concatenate in any order;
    /// the caller sorts afterwards. A chunk that yields nothing simply
    /// contributes nothing.
    pub fn score_cells<'a>(&self, cells: &[&'a Cell]) -> Vec<ScoredCandidate<'a>> {
        if cells.len() <= SCORING_CHUNK_SIZE {
            return cells
                .iter()
                .copied()
                .filter_map(|cell| self.score_cell(cell))
                .collect();
        }

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_SCORING_WORKERS);

        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| {
                cells
                    .par_chunks(SCORING_CHUNK_SIZE)
                    .flat_map_iter(|chunk| {
                        chunk.iter().copied().filter_map(|cell| self.score_cell(cell))
                    })
                    .collect()
            }),
            Err(e) => {
                warn!("failed to build scoring thread pool ({}), scoring sequentially", e);
                cells
                    .iter()
                    .copied()
                    .filter_map(|cell| self.score_cell(cell))
                    .collect()
            }
        }
    }
}
