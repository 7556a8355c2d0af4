use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::candidate::ScoredCandidate;
use crate::utils::geo::{Coordinate, Positioned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityTier {
    Depot,
    Distribution,
}

impl FromStr for FacilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depot" => Ok(FacilityTier::Depot),
            "distribution" => Ok(FacilityTier::Distribution),
            _ => Err(format!("Unknown facility tier: {}", s)),
        }
    }
}

impl fmt::Display for FacilityTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FacilityTier::Depot => write!(f, "depot"),
            FacilityTier::Distribution => write!(f, "distribution"),
        }
    }
}

/// A selected facility site, anchored to one cell's centroid.
///
/// Created once by the allocator and read-only afterward, except that the
/// validator may re-amortize `committed_cost`/`amortization_months`, and
/// depot-tier facilities have `served_facility_ids` appended once the
/// dependent tier is allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    /// Anchor cell id; doubles as the facility id.
    pub id: String,
    pub tier: FacilityTier,
    pub lat: f64,
    pub lon: f64,
    pub service_radius_miles: f64,
    pub setup_cost: f64,
    pub recurring_cost_monthly: f64,
    pub efficiency_score: f64,
    pub expected_impact: f64,
    /// Months of recurring cost included in the committed cost.
    pub amortization_months: u32,
    /// Cost actually deducted from the budget at selection time.
    pub committed_cost: f64,
    #[serde(default)]
    pub served_facility_ids: Vec<String>,
}

impl Facility {
    pub fn from_candidate(
        candidate: &ScoredCandidate<'_>,
        tier: FacilityTier,
        service_radius_miles: f64,
        committed_cost: f64,
        amortization_months: u32,
    ) -> Self {
        Self {
            id: candidate.cell.id.clone(),
            tier,
            lat: candidate.cell.lat,
            lon: candidate.cell.lon,
            service_radius_miles,
            setup_cost: candidate.setup_cost,
            recurring_cost_monthly: candidate.recurring_cost,
            efficiency_score: candidate.efficiency_score,
            expected_impact: candidate.expected_impact,
            amortization_months,
            committed_cost,
            served_facility_ids: Vec::new(),
        }
    }
}

impl Positioned for Facility {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}
