use std::collections::HashSet;

use tracing::info;

use crate::config::constants::AMORTIZATION_SETUP_GUARD;
use crate::config::optimizer_config::OptimizerConfig;
use crate::models::cell::Cell;
use crate::models::facility::{Facility, FacilityTier};
use crate::utils::geo::Positioned;

const COST_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Surviving facilities, depots first, selection order within a tier.
    pub facilities: Vec<Facility>,
    /// Facilities dropped or re-amortized by this pass.
    pub adjustments_made: usize,
    pub cells_covered: usize,
    /// Share of input cells within a surviving facility's radius, 0-100.
    pub coverage_percentage: f64,
    pub total_impact: f64,
    pub budget_used: f64,
}

/// Re-checks every proposed facility independently of the allocator's
/// bookkeeping: it must serve at least one cell, and its cost must fit the
/// budget when committed costs are summed depots-then-distribution with
/// the same amortization fallback the allocator used. Re-deriving the
/// totals from scratch catches composition bugs where each tier fit its
/// own share but the tiers jointly overshoot.
pub fn validate(
    proposed: Vec<Facility>,
    cells: &[Cell],
    total_budget: f64,
    config: &OptimizerConfig,
) -> ValidationReport {
    let (depots, points): (Vec<Facility>, Vec<Facility>) = proposed
        .into_iter()
        .partition(|f| f.tier == FacilityTier::Depot);

    let mut survivors: Vec<Facility> = Vec::new();
    let mut adjustments_made = 0usize;
    let mut budget_used = 0.0f64;

    for mut facility in depots.into_iter().chain(points) {
        let serves_any = cells
            .iter()
            .any(|cell| cell.within_miles(&facility, facility.service_radius_miles));
        if !serves_any {
            adjustments_made += 1;
            continue;
        }

        let schedule = match facility.tier {
            FacilityTier::Depot => &config.depot.amortization,
            FacilityTier::Distribution => &config.distribution.amortization,
        };
        let remaining = total_budget - budget_used;
        let primary = schedule.primary_cost(facility.setup_cost, facility.recurring_cost_monthly);
        let fallback = schedule.fallback_cost(facility.setup_cost, facility.recurring_cost_monthly);

        // Validation may shorten a horizon but never lengthens one, so a
        // tier's committed total can only shrink from what its allocator
        // spent and per-tier budget shares stay respected.
        let committed = if facility.amortization_months >= schedule.primary_months {
            if primary <= remaining {
                Some((primary, schedule.primary_months))
            } else if remaining > AMORTIZATION_SETUP_GUARD * facility.setup_cost
                && remaining > config.budget_floor_fraction * total_budget
            {
                (fallback <= remaining).then_some((fallback, schedule.fallback_months))
            } else {
                None
            }
        } else {
            (fallback <= remaining).then_some((fallback, schedule.fallback_months))
        };

        match committed {
            None => adjustments_made += 1,
            Some((cost, months)) => {
                if months != facility.amortization_months
                    || (cost - facility.committed_cost).abs() > COST_TOLERANCE
                {
                    facility.amortization_months = months;
                    facility.committed_cost = cost;
                    adjustments_made += 1;
                }
                budget_used += cost;
                survivors.push(facility);
            }
        }
    }

    // Drop depot links that point at facilities this pass removed.
    let surviving_ids: HashSet<&str> = survivors.iter().map(|f| f.id.as_str()).collect();
    let mut pruned_links: Vec<(usize, Vec<String>)> = Vec::new();
    for (index, facility) in survivors.iter().enumerate() {
        if facility.served_facility_ids.iter().any(|id| !surviving_ids.contains(id.as_str())) {
            let kept = facility
                .served_facility_ids
                .iter()
                .filter(|id| surviving_ids.contains(id.as_str()))
                .cloned()
                .collect();
            pruned_links.push((index, kept));
        }
    }
    for (index, kept) in pruned_links {
        survivors[index].served_facility_ids = kept;
    }

    let covered: usize = cells
        .iter()
        .filter(|cell| {
            survivors
                .iter()
                .any(|f| cell.within_miles(f, f.service_radius_miles))
        })
        .count();
    let coverage_percentage = if cells.is_empty() {
        0.0
    } else {
        covered as f64 / cells.len() as f64 * 100.0
    };
    let total_impact = survivors.iter().map(|f| f.expected_impact).sum();

    info!(
        validated = survivors.len(),
        adjustments_made,
        coverage_percentage,
        "validation complete"
    );

    ValidationReport {
        facilities: survivors,
        adjustments_made,
        cells_covered: covered,
        coverage_percentage,
        total_impact,
        budget_used,
    }
}
