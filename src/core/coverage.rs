use std::collections::HashMap;

use tracing::info;

use crate::models::cell::Cell;
use crate::models::facility::Facility;
use crate::utils::geo::Positioned;

/// Candidate pool restricted to depot coverage, plus the cell-to-depot
/// serving relationship. Returned by value; no component communicates the
/// used-cell set through hidden shared state.
#[derive(Debug, Clone)]
pub struct CoverageMap<'a> {
    pub cells: Vec<&'a Cell>,
    /// Cell id -> id of the depot serving it.
    pub serving_depot: HashMap<String, String>,
    /// True when the depot constraint was waived and the full pool kept.
    pub fallback: bool,
}

/// Restricts the cell pool to cells within at least one depot's service
/// radius. When a cell falls inside several radii, the depot with the
/// higher expected impact serves it; the filter expresses a budget-tier
/// dependency, not nearest-hub routing.
///
/// With no depots, or depots that cover nothing, the constraint is waived
/// and the full pool is returned so the pipeline cannot degenerate to zero
/// output just because the optional first tier came up empty.
pub fn filter_by_depot_coverage<'a>(depots: &[Facility], cells: &'a [Cell]) -> CoverageMap<'a> {
    if depots.is_empty() {
        info!("no depot facilities; coverage constraint waived");
        return unfiltered(cells);
    }

    let mut kept: Vec<&Cell> = Vec::new();
    let mut serving_depot = HashMap::new();

    for cell in cells {
        let mut best: Option<&Facility> = None;
        for depot in depots {
            if !cell.within_miles(depot, depot.service_radius_miles) {
                continue;
            }
            best = match best {
                None => Some(depot),
                Some(current) => {
                    if depot.expected_impact > current.expected_impact
                        || (depot.expected_impact == current.expected_impact
                            && depot.id < current.id)
                    {
                        Some(depot)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        if let Some(depot) = best {
            serving_depot.insert(cell.id.clone(), depot.id.clone());
            kept.push(cell);
        }
    }

    if kept.is_empty() {
        info!("depot radii cover no cells; coverage constraint waived");
        return unfiltered(cells);
    }

    info!(
        kept = kept.len(),
        total = cells.len(),
        "candidate pool restricted to depot coverage"
    );
    CoverageMap {
        cells: kept,
        serving_depot,
        fallback: false,
    }
}

fn unfiltered(cells: &[Cell]) -> CoverageMap<'_> {
    CoverageMap {
        cells: cells.iter().collect(),
        serving_depot: HashMap::new(),
        fallback: true,
    }
}

/// Records, on each depot, the distribution facilities that ended up inside
/// its coverage. Runs after the second tier is allocated; this is the only
/// post-construction mutation a facility sees before validation.
pub fn link_served_facilities(
    depots: &mut [Facility],
    distribution: &[Facility],
    serving_depot: &HashMap<String, String>,
) {
    for facility in distribution {
        let Some(depot_id) = serving_depot.get(&facility.id) else {
            continue;
        };
        if let Some(depot) = depots.iter_mut().find(|d| &d.id == depot_id) {
            depot.served_facility_ids.push(facility.id.clone());
        }
    }
}
