use serde::{Deserialize, Serialize};

use crate::utils::geo::{Coordinate, Positioned};

/// Immutable unit of geography with demographic attributes.
///
/// Cells are read-only inputs for the whole optimization run. Risk-factor
/// fields are ratios in [0, 1]; `need_index` is a count-like measure
/// (population weighted by risk) and defaults to `population * risk_score`
/// when the source data does not supply it independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub population: u32,
    pub risk_score: f64,
    pub poverty_rate: f64,
    pub benefit_rate: f64,
    pub vehicle_access_rate: f64,
    pub need_index: f64,
}

impl Cell {
    /// Convenience constructor with neutral risk-factor ratios and the
    /// `population * risk_score` need fallback applied.
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, population: u32, risk_score: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            population,
            risk_score,
            poverty_rate: 0.0,
            benefit_rate: 0.0,
            vehicle_access_rate: 1.0,
            need_index: population as f64 * risk_score,
        }
    }

    /// Whether every numeric field satisfies the scorer's preconditions.
    /// Malformed cells are skipped, never propagated.
    pub fn is_well_formed(&self) -> bool {
        self.coordinate().is_valid()
            && self.risk_score.is_finite()
            && self.risk_score >= 0.0
            && self.need_index.is_finite()
            && self.need_index >= 0.0
            && is_ratio(self.poverty_rate)
            && is_ratio(self.benefit_rate)
            && is_ratio(self.vehicle_access_rate)
    }
}

impl Positioned for Cell {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

fn is_ratio(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_need_fallback() {
        let cell = Cell::new("06037-1", 34.05, -118.24, 500, 3.0);
        assert_eq!(cell.need_index, 1500.0);
    }

    #[test]
    fn test_well_formed_rejects_bad_fields() {
        let mut cell = Cell::new("a", 34.0, -118.0, 100, 2.0);
        assert!(cell.is_well_formed());

        cell.poverty_rate = 1.5;
        assert!(!cell.is_well_formed());

        cell.poverty_rate = 0.2;
        cell.need_index = f64::NAN;
        assert!(!cell.is_well_formed());

        cell.need_index = 10.0;
        cell.lat = 120.0;
        assert!(!cell.is_well_formed());
    }
}
