use std::collections::HashMap;

use crate::config::optimizer_config::DeclusterConfig;
use crate::utils::geo::Coordinate;

pub type ZoneKey = (usize, usize);

/// Fixed N x N partition of the candidate bounding box, used to keep early
/// selections spread out. Zone capacity grows with the total number of
/// facilities placed, so later rounds may cluster where need concentrates.
#[derive(Debug, Clone)]
pub struct ZoneGrid {
    config: DeclusterConfig,
    min_lat: f64,
    min_lon: f64,
    lat_span: f64,
    lon_span: f64,
}

impl ZoneGrid {
    /// Builds the grid over the bounding box of the given coordinates.
    /// Returns None for an empty pool.
    pub fn from_coordinates<I>(coords: I, config: DeclusterConfig) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut seen = false;

        for coord in coords {
            seen = true;
            min_lat = min_lat.min(coord.lat);
            max_lat = max_lat.max(coord.lat);
            min_lon = min_lon.min(coord.lon);
            max_lon = max_lon.max(coord.lon);
        }

        if !seen {
            return None;
        }

        Some(Self {
            config,
            min_lat,
            min_lon,
            lat_span: max_lat - min_lat,
            lon_span: max_lon - min_lon,
        })
    }

    pub fn zone_of(&self, coord: &Coordinate) -> ZoneKey {
        let dim = self.config.grid_dim;
        let row = Self::axis_index(coord.lat - self.min_lat, self.lat_span, dim);
        let col = Self::axis_index(coord.lon - self.min_lon, self.lon_span, dim);
        (row, col)
    }

    fn axis_index(offset: f64, span: f64, dim: usize) -> usize {
        if span <= 0.0 {
            return 0;
        }
        let index = ((offset / span) * dim as f64).floor() as usize;
        index.min(dim - 1)
    }

    /// Whether a candidate in `zone` may be selected given the current
    /// occupancy and the total number of facilities placed so far.
    ///
    /// A saturated zone gets one overflow slot once most of its neighbors
    /// are occupied, i.e. when the spread has plausibly plateaued and the
    /// residual demand is genuinely local.
    pub fn admits(
        &self,
        zone: ZoneKey,
        occupancy: &HashMap<ZoneKey, usize>,
        total_selected: usize,
    ) -> bool {
        let capacity = self.config.capacity_for(total_selected);
        let occupied = occupancy.get(&zone).copied().unwrap_or(0);
        if occupied < capacity {
            return true;
        }
        occupied < capacity + 1
            && self.neighbor_occupied_fraction(zone, occupancy) >= self.config.neighbor_saturation
    }

    fn neighbor_occupied_fraction(
        &self,
        zone: ZoneKey,
        occupancy: &HashMap<ZoneKey, usize>,
    ) -> f64 {
        let dim = self.config.grid_dim as isize;
        let (row, col) = (zone.0 as isize, zone.1 as isize);
        let mut neighbors = 0usize;
        let mut occupied = 0usize;

        for dr in -1..=1isize {
            for dc in -1..=1isize {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (nr, nc) = (row + dr, col + dc);
                if nr < 0 || nc < 0 || nr >= dim || nc >= dim {
                    continue;
                }
                neighbors += 1;
                if occupancy.get(&(nr as usize, nc as usize)).copied().unwrap_or(0) > 0 {
                    occupied += 1;
                }
            }
        }

        if neighbors == 0 {
            return 0.0;
        }
        occupied as f64 / neighbors as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(dim: usize) -> ZoneGrid {
        let config = DeclusterConfig {
            grid_dim: dim,
            ..DeclusterConfig::default()
        };
        ZoneGrid::from_coordinates(
            vec![Coordinate::new(34.0, -118.4), Coordinate::new(34.4, -118.0)],
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_pool_has_no_grid() {
        assert!(ZoneGrid::from_coordinates(Vec::new(), DeclusterConfig::default()).is_none());
    }

    #[test]
    fn test_corners_map_to_opposite_zones() {
        let grid = grid(6);
        assert_eq!(grid.zone_of(&Coordinate::new(34.0, -118.4)), (0, 0));
        assert_eq!(grid.zone_of(&Coordinate::new(34.4, -118.0)), (5, 5));
    }

    #[test]
    fn test_admits_under_capacity() {
        let grid = grid(6);
        let occupancy = HashMap::new();
        assert!(grid.admits((2, 2), &occupancy, 0));
    }

    #[test]
    fn test_rejects_at_capacity_with_empty_neighbors() {
        let grid = grid(6);
        let mut occupancy = HashMap::new();
        occupancy.insert((2, 2), 1);
        // capacity is 1 for the first selections and no neighbor is occupied
        assert!(!grid.admits((2, 2), &occupancy, 1));
    }

    #[test]
    fn test_overflow_allowed_once_neighbors_fill() {
        let grid = grid(6);
        let mut occupancy = HashMap::new();
        occupancy.insert((2, 2), 1);
        // Occupy 6 of the 8 neighbors (75% > 70% saturation threshold).
        for zone in [(1, 1), (1, 2), (1, 3), (2, 1), (2, 3), (3, 1)] {
            occupancy.insert(zone, 1);
        }
        assert!(grid.admits((2, 2), &occupancy, 7));

        // The overflow slot is a single extra facility, not open-ended.
        occupancy.insert((2, 2), 2);
        assert!(!grid.admits((2, 2), &occupancy, 8));
    }

    #[test]
    fn test_degenerate_extent_collapses_to_single_zone() {
        let config = DeclusterConfig::default();
        let grid = ZoneGrid::from_coordinates(
            vec![Coordinate::new(34.0, -118.0), Coordinate::new(34.0, -118.0)],
            config,
        )
        .unwrap();
        assert_eq!(grid.zone_of(&Coordinate::new(34.0, -118.0)), (0, 0));
    }
}
