use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::analysis::metrics::OptimizationResult;
use crate::config::optimizer_config::OptimizerConfig;
use crate::core::allocator::FacilityAllocator;
use crate::core::coverage::{filter_by_depot_coverage, link_served_facilities};
use crate::core::depot_strategy::depot_anchor_candidates;
use crate::core::error::OptimizeError;
use crate::core::scoring::EfficiencyScorer;
use crate::core::validator::validate;
use crate::models::cell::Cell;
use crate::models::facility::FacilityTier;
use crate::utils::progress::{NullObserver, Phase, ProgressEvent, ProgressObserver};

/// Sequences scorer -> depot allocation -> coverage filter -> distribution
/// allocation -> validation over an in-memory cell pool. The pipeline owns
/// no I/O and no datastore handle; cells and configuration arrive as plain
/// arguments and the result is a plain value.
pub struct OptimizationPipeline<'a> {
    config: &'a OptimizerConfig,
    observer: &'a dyn ProgressObserver,
    deadline: Option<Instant>,
}

impl<'a> OptimizationPipeline<'a> {
    pub fn new(config: &'a OptimizerConfig, observer: &'a dyn ProgressObserver) -> Self {
        Self {
            config,
            observer,
            deadline: None,
        }
    }

    /// Caps wall-clock time for the allocation passes. The cap is honored
    /// between rounds only, so the final state is always consistent.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.deadline = limit.map(|d| Instant::now() + d);
        self
    }

    /// Runs the full two-tier optimization. Recoverable conditions (no
    /// candidates, exhausted budget, empty depot tier) produce a success
    /// result with accurate metrics; only configuration errors and broken
    /// numeric invariants yield a failed status.
    pub fn run(&self, cells: &[Cell]) -> OptimizationResult {
        match self.run_inner(cells) {
            Ok(result) => result,
            Err(e) => {
                error!("optimization failed: {}", e);
                OptimizationResult::failed(e.to_string())
            }
        }
    }

    fn run_inner(&self, cells: &[Cell]) -> Result<OptimizationResult, OptimizeError> {
        self.config.validate()?;

        let depot_budget = self.config.total_budget * self.config.depot_budget_fraction;
        let distribution_budget = self.config.total_budget - depot_budget;
        info!(
            cells = cells.len(),
            total_budget = self.config.total_budget,
            depot_budget,
            distribution_budget,
            "starting optimization"
        );

        // Depot tier: coarse quadrant anchors through the shared engine.
        self.emit_started(
            Phase::DepotAllocation,
            format!("Allocating depots across {} cells", cells.len()),
        );
        let depot_scorer =
            EfficiencyScorer::new(&self.config.scoring, &self.config.depot.cost_model);
        let depot_candidates: Vec<_> = depot_anchor_candidates(cells)
            .into_iter()
            .filter_map(|cell| depot_scorer.score_cell(cell))
            .collect();
        let depot_allocator = FacilityAllocator::new(
            FacilityTier::Depot,
            &self.config.depot,
            self.config.budget_floor_fraction,
        )
        .with_deadline(self.deadline);
        let depot_outcome =
            depot_allocator.allocate(depot_candidates, depot_budget, &HashSet::new())?;
        self.emit_completed(
            Phase::DepotAllocation,
            format!(
                "Selected {} depot locations, ${:.0} remaining",
                depot_outcome.facilities.len(),
                depot_outcome.budget_remaining
            ),
        );

        // Restrict the second tier to depot coverage.
        self.emit_started(
            Phase::Coverage,
            "Restricting candidates to depot coverage".to_string(),
        );
        let coverage = filter_by_depot_coverage(&depot_outcome.facilities, cells);
        self.emit_completed(
            Phase::Coverage,
            if coverage.fallback {
                "Coverage constraint waived; using the full cell pool".to_string()
            } else {
                format!("{} of {} cells within depot coverage", coverage.cells.len(), cells.len())
            },
        );

        // Distribution tier over the filtered pool. Depot anchors are
        // passed along as already used so no cell anchors two facilities.
        self.emit_started(
            Phase::DistributionAllocation,
            format!(
                "Allocating distribution points across {} cells",
                coverage.cells.len()
            ),
        );
        let distribution_scorer =
            EfficiencyScorer::new(&self.config.scoring, &self.config.distribution.cost_model);
        let distribution_candidates = distribution_scorer.score_cells(&coverage.cells);
        let depot_anchor_ids: HashSet<String> = depot_outcome
            .facilities
            .iter()
            .map(|f| f.id.clone())
            .collect();
        let distribution_allocator = FacilityAllocator::new(
            FacilityTier::Distribution,
            &self.config.distribution,
            self.config.budget_floor_fraction,
        )
        .with_deadline(self.deadline);
        let distribution_outcome = distribution_allocator.allocate(
            distribution_candidates,
            distribution_budget,
            &depot_anchor_ids,
        )?;
        self.emit_completed(
            Phase::DistributionAllocation,
            format!(
                "Selected {} distribution points, ${:.0} remaining",
                distribution_outcome.facilities.len(),
                distribution_outcome.budget_remaining
            ),
        );

        let mut depots = depot_outcome.facilities;
        link_served_facilities(
            &mut depots,
            &distribution_outcome.facilities,
            &coverage.serving_depot,
        );

        // Independent feasibility and coverage re-check.
        self.emit_started(
            Phase::Validation,
            format!(
                "Validating {} proposed facilities",
                depots.len() + distribution_outcome.facilities.len()
            ),
        );
        let proposed: Vec<_> = depots
            .into_iter()
            .chain(distribution_outcome.facilities)
            .collect();
        let report = validate(proposed, cells, self.config.total_budget, self.config);
        self.emit_completed(
            Phase::Validation,
            format!(
                "{} facilities approved, {} adjustments, {:.1}% coverage",
                report.facilities.len(),
                report.adjustments_made,
                report.coverage_percentage
            ),
        );

        let iterations = depot_outcome.rounds + distribution_outcome.rounds;
        Ok(OptimizationResult::success(
            report,
            self.config.total_budget,
            iterations,
        ))
    }

    fn emit_started(&self, phase: Phase, message: String) {
        self.observer
            .on_event(&ProgressEvent::PhaseStarted { phase, message });
    }

    fn emit_completed(&self, phase: Phase, message: String) {
        self.observer
            .on_event(&ProgressEvent::PhaseCompleted { phase, message });
    }
}

/// One-call entry point with no progress reporting.
pub fn optimize(cells: &[Cell], config: &OptimizerConfig) -> OptimizationResult {
    OptimizationPipeline::new(config, &NullObserver).run(cells)
}
