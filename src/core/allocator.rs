use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::constants::AMORTIZATION_SETUP_GUARD;
use crate::config::optimizer_config::TierConfig;
use crate::core::decluster::{ZoneGrid, ZoneKey};
use crate::core::error::OptimizeError;
use crate::models::candidate::ScoredCandidate;
use crate::models::facility::{Facility, FacilityTier};
use crate::utils::geo::Positioned;

/// Mutable bookkeeping scoped to a single allocator run.
#[derive(Debug)]
pub struct SelectionState {
    pub remaining_budget: f64,
    pub original_budget: f64,
    pub used_cell_ids: HashSet<String>,
    pub zone_occupancy: HashMap<ZoneKey, usize>,
    /// Insertion order is selection order; it matters for reproducibility
    /// and for the convergence reporting downstream.
    pub selected: Vec<Facility>,
}

impl SelectionState {
    fn new(budget: f64, already_used: &HashSet<String>) -> Self {
        Self {
            remaining_budget: budget,
            original_budget: budget,
            used_cell_ids: already_used.clone(),
            zone_occupancy: HashMap::new(),
            selected: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub facilities: Vec<Facility>,
    /// Number of full passes over the sorted candidate list.
    pub rounds: usize,
    pub budget_remaining: f64,
    pub mean_efficiency: f64,
}

/// Greedy, budget- and distance-constrained site selector. One engine
/// serves both tiers; tier behavior (radius, cost model, amortization,
/// declustering) comes entirely from the configuration.
pub struct FacilityAllocator<'cfg> {
    tier: FacilityTier,
    config: &'cfg TierConfig,
    budget_floor_fraction: f64,
    deadline: Option<Instant>,
}

impl<'cfg> FacilityAllocator<'cfg> {
    pub fn new(tier: FacilityTier, config: &'cfg TierConfig, budget_floor_fraction: f64) -> Self {
        Self {
            tier,
            config,
            budget_floor_fraction,
            deadline: None,
        }
    }

    /// A deadline aborts the run between rounds, never mid-round, so the
    /// selection state is always left valid and reportable.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs round-based greedy selection over the candidate snapshot.
    ///
    /// Candidates rejected for distance or zone-saturation reasons stay in
    /// the list and are retried on the next pass: as budget drains and
    /// occupancy fills in, the declustering pressure relaxes, so a rejection
    /// is not permanent. Only anchoring a cell consumes it.
    pub fn allocate(
        &self,
        mut candidates: Vec<ScoredCandidate<'_>>,
        budget: f64,
        already_used: &HashSet<String>,
    ) -> Result<AllocationOutcome, OptimizeError> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(OptimizeError::InvariantViolation(format!(
                "allocation budget must be a non-negative number, got {}",
                budget
            )));
        }

        // Descending efficiency, ties broken by ascending cell id so runs
        // are reproducible.
        candidates.sort_by(|a, b| {
            b.efficiency_score
                .partial_cmp(&a.efficiency_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cell.id.cmp(&b.cell.id))
        });

        let zone_grid = self.config.decluster.clone().and_then(|cfg| {
            ZoneGrid::from_coordinates(candidates.iter().map(|c| c.cell.coordinate()), cfg)
        });

        let mut state = SelectionState::new(budget, already_used);
        let budget_floor = budget * self.budget_floor_fraction;
        let mut rounds = 0usize;

        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    debug!(tier = %self.tier, rounds, "allocation deadline reached");
                    break;
                }
            }
            if state.selected.len() >= self.config.max_facilities
                || state.remaining_budget < budget_floor
            {
                break;
            }

            rounds += 1;
            let added = self.run_round(&candidates, zone_grid.as_ref(), budget_floor, &mut state)?;
            if added == 0 {
                break;
            }
        }

        let mean_efficiency = if state.selected.is_empty() {
            0.0
        } else {
            state.selected.iter().map(|f| f.efficiency_score).sum::<f64>()
                / state.selected.len() as f64
        };

        info!(
            tier = %self.tier,
            selected = state.selected.len(),
            rounds,
            budget_remaining = state.remaining_budget,
            "allocation finished"
        );

        Ok(AllocationOutcome {
            facilities: state.selected,
            rounds,
            budget_remaining: state.remaining_budget,
            mean_efficiency,
        })
    }

    /// One pass over the sorted candidates. Returns how many facilities
    /// the pass added.
    fn run_round(
        &self,
        candidates: &[ScoredCandidate<'_>],
        zone_grid: Option<&ZoneGrid>,
        budget_floor: f64,
        state: &mut SelectionState,
    ) -> Result<usize, OptimizeError> {
        let mut added = 0usize;

        for candidate in candidates {
            if state.selected.len() >= self.config.max_facilities
                || state.remaining_budget < budget_floor
            {
                break;
            }
            if state.used_cell_ids.contains(&candidate.cell.id) {
                continue;
            }

            let coord = candidate.cell.coordinate();
            let zone = zone_grid.map(|grid| grid.zone_of(&coord));
            if let (Some(grid), Some(zone)) = (zone_grid, zone) {
                if !grid.admits(zone, &state.zone_occupancy, state.selected.len()) {
                    continue;
                }
            }

            let too_close = state.selected.iter().any(|facility| {
                coord.distance_miles(&facility.coordinate()) < self.config.min_distance_miles
            });
            if too_close {
                continue;
            }

            let Some((cost, months)) = self.try_afford(candidate, state)? else {
                continue;
            };

            let facility = Facility::from_candidate(
                candidate,
                self.tier,
                self.config.service_radius_miles,
                cost,
                months,
            );
            state.remaining_budget -= cost;
            state.used_cell_ids.insert(candidate.cell.id.clone());
            if let Some(zone) = zone {
                *state.zone_occupancy.entry(zone).or_insert(0) += 1;
            }
            state.selected.push(facility);
            added += 1;
        }

        Ok(added)
    }

    /// Two-tier amortization fallback: try the primary horizon first; when
    /// that alone exceeds the remaining budget, retry a shorter but still
    /// defensible horizon, provided significant budget remains. This keeps
    /// a conservative horizon from terminating selection early.
    fn try_afford(
        &self,
        candidate: &ScoredCandidate<'_>,
        state: &SelectionState,
    ) -> Result<Option<(f64, u32)>, OptimizeError> {
        if !candidate.setup_cost.is_finite()
            || !candidate.recurring_cost.is_finite()
            || candidate.setup_cost < 0.0
            || candidate.recurring_cost < 0.0
        {
            return Err(OptimizeError::InvariantViolation(format!(
                "non-numeric cost for cell {}",
                candidate.cell.id
            )));
        }

        let schedule = &self.config.amortization;
        let primary = schedule.primary_cost(candidate.setup_cost, candidate.recurring_cost);
        if primary <= state.remaining_budget {
            return Ok(Some((primary, schedule.primary_months)));
        }

        if state.remaining_budget > AMORTIZATION_SETUP_GUARD * candidate.setup_cost
            && state.remaining_budget > self.budget_floor_fraction * state.original_budget
        {
            let fallback = schedule.fallback_cost(candidate.setup_cost, candidate.recurring_cost);
            if fallback <= state.remaining_budget {
                return Ok(Some((fallback, schedule.fallback_months)));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::optimizer_config::{
        AmortizationSchedule, CostModel, DeclusterConfig, ScoringConfig, TierConfig,
    };
    use crate::core::scoring::EfficiencyScorer;
    use crate::models::cell::Cell;

    fn flat_cost_tier(setup: f64, recurring: f64) -> TierConfig {
        TierConfig {
            service_radius_miles: 1.5,
            min_distance_miles: 0.5,
            max_facilities: 100,
            cost_model: CostModel {
                setup_base: setup,
                setup_per_unit: 0.0,
                setup_cap: 0.0,
                recurring_base: recurring,
                recurring_per_unit: 0.0,
                recurring_cap: 0.0,
            },
            amortization: AmortizationSchedule {
                primary_months: 12,
                fallback_months: 6,
            },
            decluster: None,
        }
    }

    fn score_all<'a>(cells: &'a [Cell], tier: &TierConfig, scoring: &ScoringConfig) -> Vec<ScoredCandidate<'a>> {
        let scorer = EfficiencyScorer::new(scoring, &tier.cost_model);
        cells.iter().filter_map(|c| scorer.score_cell(c)).collect()
    }

    #[test]
    fn test_empty_pool_gives_empty_result() {
        let tier = flat_cost_tier(10_000.0, 1_000.0);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let outcome = allocator.allocate(Vec::new(), 100_000.0, &HashSet::new()).unwrap();
        assert!(outcome.facilities.is_empty());
    }

    #[test]
    fn test_budget_below_cheapest_gives_empty_result() {
        let tier = flat_cost_tier(50_000.0, 5_000.0);
        let scoring = ScoringConfig::default();
        let cells = vec![Cell::new("a", 34.0, -118.0, 1000, 2.0)];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let outcome = allocator.allocate(candidates, 1_000.0, &HashSet::new()).unwrap();
        assert!(outcome.facilities.is_empty());
    }

    #[test]
    fn test_min_distance_selects_exactly_one_when_all_close() {
        let tier = flat_cost_tier(10_000.0, 1_000.0);
        let scoring = ScoringConfig::default();
        // Three cells within ~0.1 miles of each other, min distance 0.5.
        let cells = vec![
            Cell::new("a", 34.0000, -118.0000, 1000, 2.0),
            Cell::new("b", 34.0005, -118.0005, 1000, 2.0),
            Cell::new("c", 34.0010, -118.0010, 1000, 2.0),
        ];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let outcome = allocator.allocate(candidates, 1_000_000.0, &HashSet::new()).unwrap();
        assert_eq!(outcome.facilities.len(), 1);
    }

    #[test]
    fn test_tie_broken_by_ascending_id() {
        let tier = flat_cost_tier(10_000.0, 1_000.0);
        let scoring = ScoringConfig::default();
        // Identical cells far enough apart; budget for one only.
        let cells = vec![
            Cell::new("b", 34.1, -118.0, 1000, 2.0),
            Cell::new("a", 34.0, -118.0, 1000, 2.0),
        ];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let outcome = allocator.allocate(candidates, 23_000.0, &HashSet::new()).unwrap();
        assert_eq!(outcome.facilities.len(), 1);
        assert_eq!(outcome.facilities[0].id, "a");
    }

    #[test]
    fn test_fallback_horizon_used_when_primary_unaffordable() {
        // 12-month cost 290k, 6-month cost 170k; budget covers only the
        // fallback, and the guard conditions hold (170k > 2 * 50k).
        let tier = flat_cost_tier(50_000.0, 20_000.0);
        let scoring = ScoringConfig::default();
        let cells = vec![Cell::new("a", 34.0, -118.0, 1000, 2.0)];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let outcome = allocator.allocate(candidates, 170_000.0, &HashSet::new()).unwrap();
        assert_eq!(outcome.facilities.len(), 1);
        let facility = &outcome.facilities[0];
        assert_eq!(facility.amortization_months, 6);
        assert_eq!(facility.committed_cost, 170_000.0);
        assert!(outcome.budget_remaining.abs() < 1e-9);
    }

    #[test]
    fn test_fallback_denied_without_setup_headroom() {
        // Remaining budget below twice the setup cost: no fallback retry.
        let tier = flat_cost_tier(100_000.0, 20_000.0);
        let scoring = ScoringConfig::default();
        let cells = vec![Cell::new("a", 34.0, -118.0, 1000, 2.0)];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        // 6-month cost would be 220k <= ... but guard needs > 200k; use 195k.
        let outcome = allocator.allocate(candidates, 195_000.0, &HashSet::new()).unwrap();
        assert!(outcome.facilities.is_empty());
    }

    #[test]
    fn test_used_cells_are_not_reselected() {
        let tier = flat_cost_tier(10_000.0, 1_000.0);
        let scoring = ScoringConfig::default();
        let cells = vec![
            Cell::new("a", 34.0, -118.0, 1000, 2.0),
            Cell::new("b", 34.1, -118.0, 900, 2.0),
        ];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let mut used = HashSet::new();
        used.insert("a".to_string());
        let outcome = allocator.allocate(candidates, 1_000_000.0, &used).unwrap();
        assert_eq!(outcome.facilities.len(), 1);
        assert_eq!(outcome.facilities[0].id, "b");
    }

    #[test]
    fn test_zone_rejection_retried_in_later_round() {
        // Two high-need cells share a zone; capacity is 1 until two
        // facilities exist, then 2. A third cell sits in another zone.
        // Round 1 places "a" and "c"; round 2 can then admit "b".
        let mut tier = flat_cost_tier(10_000.0, 1_000.0);
        tier.decluster = Some(DeclusterConfig {
            grid_dim: 2,
            capacity_steps: vec![(2, 1)],
            capacity_final: 2,
            neighbor_saturation: 1.1, // never relax within a round
        });
        let scoring = ScoringConfig::default();
        let cells = vec![
            Cell::new("a", 34.00, -118.00, 1000, 3.0),
            Cell::new("b", 34.02, -118.00, 1000, 2.5),
            Cell::new("c", 34.40, -118.40, 1000, 2.0),
        ];
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.0);
        let outcome = allocator.allocate(candidates, 1_000_000.0, &HashSet::new()).unwrap();

        let ids: Vec<&str> = outcome.facilities.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert!(outcome.rounds >= 2);
    }

    #[test]
    fn test_non_finite_cost_is_invariant_violation() {
        let tier = flat_cost_tier(10_000.0, 1_000.0);
        let cell = Cell::new("a", 34.0, -118.0, 1000, 2.0);
        let candidates = vec![ScoredCandidate {
            cell: &cell,
            efficiency_score: 1.0,
            setup_cost: f64::NAN,
            recurring_cost: 1_000.0,
            expected_impact: 100.0,
        }];
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.1);
        let result = allocator.allocate(candidates, 100_000.0, &HashSet::new());
        assert!(matches!(result, Err(OptimizeError::InvariantViolation(_))));
    }

    #[test]
    fn test_budget_floor_stops_run() {
        let tier = flat_cost_tier(10_000.0, 0.0);
        let scoring = ScoringConfig::default();
        let cells: Vec<Cell> = (0..10)
            .map(|i| Cell::new(format!("c{}", i), 34.0 + i as f64 * 0.1, -118.0, 1000, 2.0))
            .collect();
        let candidates = score_all(&cells, &tier, &scoring);
        let allocator = FacilityAllocator::new(FacilityTier::Distribution, &tier, 0.5);
        // Floor is 50k of 100k; each facility costs 10k, so selection must
        // stop once remaining drops below 50k.
        let outcome = allocator.allocate(candidates, 100_000.0, &HashSet::new()).unwrap();
        assert!(outcome.budget_remaining >= 40_000.0);
        assert!(outcome.facilities.len() <= 6);
    }
}
