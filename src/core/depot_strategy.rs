use std::cmp::Ordering;

use tracing::debug;

use crate::models::cell::Cell;
use crate::utils::geo::{Coordinate, Positioned};

/// Coarse placement strategy for the depot tier: partition the region into
/// quadrants and pick one representative anchor per quadrant, near that
/// quadrant's need-weighted centroid.
///
/// The representative is drawn from the cells at or below the quadrant's
/// median need so a depot does not consume a prime distribution-tier site.
/// Quadrants are returned highest total need first.
pub fn depot_anchor_candidates(cells: &[Cell]) -> Vec<&Cell> {
    let populated: Vec<&Cell> = cells.iter().filter(|c| c.population > 0).collect();
    if populated.is_empty() {
        return Vec::new();
    }

    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    for cell in &populated {
        min_lat = min_lat.min(cell.lat);
        max_lat = max_lat.max(cell.lat);
        min_lon = min_lon.min(cell.lon);
        max_lon = max_lon.max(cell.lon);
    }
    let mid_lat = (min_lat + max_lat) / 2.0;
    let mid_lon = (min_lon + max_lon) / 2.0;

    let mut quadrants: [Vec<&Cell>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for cell in populated {
        let index = (cell.lat >= mid_lat) as usize * 2 + (cell.lon >= mid_lon) as usize;
        quadrants[index].push(cell);
    }

    let mut ranked: Vec<(f64, &Cell)> = Vec::new();
    for quadrant in quadrants.iter().filter(|q| !q.is_empty()) {
        let total_need: f64 = quadrant.iter().map(|c| c.need_index).sum();
        let centroid = need_weighted_centroid(quadrant, total_need);
        let median_need = median(quadrant.iter().map(|c| c.need_index).collect());

        let representative = quadrant
            .iter()
            .filter(|c| c.need_index <= median_need)
            .min_by(|a, b| {
                let da = a.coordinate().distance_miles(&centroid);
                let db = b.coordinate().distance_miles(&centroid);
                da.partial_cmp(&db)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .copied();

        if let Some(cell) = representative {
            ranked.push((total_need, cell));
        }
    }

    // Highest-need quadrants first so depot budget reaches the neediest
    // sub-regions before the count cap bites.
    ranked.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    debug!(candidates = ranked.len(), "depot anchor candidates selected");
    ranked.into_iter().map(|(_, cell)| cell).collect()
}

fn need_weighted_centroid(cells: &[&Cell], total_need: f64) -> Coordinate {
    if total_need > 0.0 {
        let lat = cells.iter().map(|c| c.lat * c.need_index).sum::<f64>() / total_need;
        let lon = cells.iter().map(|c| c.lon * c.need_index).sum::<f64>() / total_need;
        Coordinate::new(lat, lon)
    } else {
        let n = cells.len() as f64;
        let lat = cells.iter().map(|c| c.lat).sum::<f64>() / n;
        let lon = cells.iter().map(|c| c.lon).sum::<f64>() / n;
        Coordinate::new(lat, lon)
    }
}

// Lower median, so a two-cell quadrant still filters out its heavier half.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values[(values.len() - 1) / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(depot_anchor_candidates(&[]).is_empty());
    }

    #[test]
    fn test_one_representative_per_quadrant() {
        let cells = vec![
            Cell::new("sw", 34.00, -118.40, 500, 2.0),
            Cell::new("se", 34.00, -118.00, 500, 2.0),
            Cell::new("nw", 34.40, -118.40, 500, 2.0),
            Cell::new("ne", 34.40, -118.00, 500, 2.0),
        ];
        let reps = depot_anchor_candidates(&cells);
        assert_eq!(reps.len(), 4);
        let mut ids: Vec<&str> = reps.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["ne", "nw", "se", "sw"]);
    }

    #[test]
    fn test_prefers_lower_need_anchor() {
        // Both cells land in the same quadrant; the prime high-need site
        // must be left for the distribution tier.
        let cells = vec![
            Cell::new("prime", 34.00, -118.40, 5000, 5.0),
            Cell::new("modest", 34.01, -118.39, 500, 1.0),
        ];
        let reps = depot_anchor_candidates(&cells);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].id, "modest");
    }

    #[test]
    fn test_unpopulated_cells_are_ignored() {
        let cells = vec![
            Cell::new("empty", 34.00, -118.40, 0, 5.0),
            Cell::new("lived-in", 34.40, -118.00, 100, 1.0),
        ];
        let reps = depot_anchor_candidates(&cells);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].id, "lived-in");
    }

    #[test]
    fn test_quadrants_ranked_by_total_need() {
        let cells = vec![
            // Southwest quadrant: low need.
            Cell::new("sw", 34.00, -118.40, 100, 1.0),
            // Northeast quadrant: high need overall, anchored modestly.
            Cell::new("ne-heavy", 34.40, -118.00, 4000, 5.0),
            Cell::new("ne-light", 34.39, -118.01, 200, 1.0),
        ];
        let reps = depot_anchor_candidates(&cells);
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].id, "ne-light");
        assert_eq!(reps[1].id, "sw");
    }
}
