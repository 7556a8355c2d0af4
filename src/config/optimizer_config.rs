use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::core::error::OptimizeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub need: f64,
    pub access_barrier: f64,
    pub poverty: f64,
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.need + self.access_barrier + self.poverty
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            need: DEFAULT_NEED_WEIGHT,
            access_barrier: DEFAULT_ACCESS_BARRIER_WEIGHT,
            poverty: DEFAULT_POVERTY_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub need_normalization: f64,
    pub serve_fraction: f64,
    pub population_cap_fraction: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            need_normalization: DEFAULT_NEED_NORMALIZATION,
            serve_fraction: DEFAULT_SERVE_FRACTION,
            population_cap_fraction: DEFAULT_POPULATION_CAP_FRACTION,
        }
    }
}

/// Capped linear cost model: `base + min(cap, impact * per_unit)`. The cap
/// bounds what a single extreme-need cell can absorb from the budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostModel {
    pub setup_base: f64,
    pub setup_per_unit: f64,
    pub setup_cap: f64,
    pub recurring_base: f64,
    pub recurring_per_unit: f64,
    pub recurring_cap: f64,
}

impl CostModel {
    pub fn setup_cost(&self, expected_impact: f64) -> f64 {
        self.setup_base + (expected_impact * self.setup_per_unit).min(self.setup_cap)
    }

    pub fn recurring_cost(&self, expected_impact: f64) -> f64 {
        self.recurring_base + (expected_impact * self.recurring_per_unit).min(self.recurring_cap)
    }
}

/// Months of recurring cost added to setup cost when computing a
/// facility's total cost for budget purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub primary_months: u32,
    pub fallback_months: u32,
}

impl AmortizationSchedule {
    pub fn primary_cost(&self, setup: f64, recurring: f64) -> f64 {
        setup + self.primary_months as f64 * recurring
    }

    pub fn fallback_cost(&self, setup: f64, recurring: f64) -> f64 {
        setup + self.fallback_months as f64 * recurring
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclusterConfig {
    /// The candidate bounding box is partitioned into grid_dim x grid_dim zones.
    pub grid_dim: usize,
    /// (total facilities selected so far, zone capacity) steps, ascending.
    /// The first step whose bound exceeds the current count applies.
    pub capacity_steps: Vec<(usize, usize)>,
    /// Capacity once every step bound has been passed.
    pub capacity_final: usize,
    /// Fraction of neighboring zones that must be occupied before a
    /// saturated zone may exceed its capacity by one.
    pub neighbor_saturation: f64,
}

impl Default for DeclusterConfig {
    fn default() -> Self {
        Self {
            grid_dim: DEFAULT_ZONE_GRID_DIM,
            capacity_steps: vec![(12, 1), (20, 2)],
            capacity_final: 3,
            neighbor_saturation: DEFAULT_NEIGHBOR_SATURATION,
        }
    }
}

impl DeclusterConfig {
    pub fn capacity_for(&self, total_selected: usize) -> usize {
        for (bound, capacity) in &self.capacity_steps {
            if total_selected < *bound {
                return *capacity;
            }
        }
        self.capacity_final
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    pub service_radius_miles: f64,
    pub min_distance_miles: f64,
    pub max_facilities: usize,
    pub cost_model: CostModel,
    pub amortization: AmortizationSchedule,
    pub decluster: Option<DeclusterConfig>,
}

impl TierConfig {
    pub fn depot_default() -> Self {
        Self {
            service_radius_miles: DEFAULT_DEPOT_RADIUS_MILES,
            min_distance_miles: DEFAULT_DEPOT_MIN_DISTANCE_MILES,
            max_facilities: DEFAULT_MAX_DEPOTS,
            cost_model: CostModel {
                setup_base: DEPOT_SETUP_BASE,
                setup_per_unit: DEPOT_SETUP_PER_PERSON,
                setup_cap: DEPOT_SETUP_CAP,
                recurring_base: DEPOT_RECURRING_BASE,
                recurring_per_unit: DEPOT_RECURRING_PER_PERSON,
                recurring_cap: DEPOT_RECURRING_CAP,
            },
            amortization: AmortizationSchedule {
                primary_months: DEPOT_PRIMARY_MONTHS,
                fallback_months: DEPOT_FALLBACK_MONTHS,
            },
            decluster: None,
        }
    }

    pub fn distribution_default() -> Self {
        Self {
            service_radius_miles: DEFAULT_DISTRIBUTION_RADIUS_MILES,
            min_distance_miles: DEFAULT_MIN_DISTANCE_MILES,
            max_facilities: DEFAULT_MAX_FACILITIES,
            cost_model: CostModel {
                setup_base: DISTRIBUTION_SETUP_BASE,
                setup_per_unit: DISTRIBUTION_SETUP_PER_PERSON,
                setup_cap: DISTRIBUTION_SETUP_CAP,
                recurring_base: DISTRIBUTION_RECURRING_BASE,
                recurring_per_unit: DISTRIBUTION_RECURRING_PER_PERSON,
                recurring_cap: DISTRIBUTION_RECURRING_CAP,
            },
            amortization: AmortizationSchedule {
                primary_months: DISTRIBUTION_PRIMARY_MONTHS,
                fallback_months: DISTRIBUTION_FALLBACK_MONTHS,
            },
            decluster: Some(DeclusterConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub total_budget: f64,
    pub depot_budget_fraction: f64,
    pub budget_floor_fraction: f64,
    pub scoring: ScoringConfig,
    pub depot: TierConfig,
    pub distribution: TierConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            total_budget: 500_000.0,
            depot_budget_fraction: DEFAULT_DEPOT_BUDGET_FRACTION,
            budget_floor_fraction: DEFAULT_BUDGET_FLOOR_FRACTION,
            scoring: ScoringConfig::default(),
            depot: TierConfig::depot_default(),
            distribution: TierConfig::distribution_default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !self.total_budget.is_finite() || self.total_budget < 0.0 {
            return Err(OptimizeError::InvalidConfig(format!(
                "total_budget must be a non-negative number, got {}",
                self.total_budget
            )));
        }
        let weights = &self.scoring.weights;
        if weights.need < 0.0 || weights.access_barrier < 0.0 || weights.poverty < 0.0 {
            return Err(OptimizeError::InvalidConfig(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(OptimizeError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {}",
                weights.sum()
            )));
        }
        if !(0.0..=1.0).contains(&self.depot_budget_fraction) {
            return Err(OptimizeError::InvalidConfig(format!(
                "depot_budget_fraction must be within [0, 1], got {}",
                self.depot_budget_fraction
            )));
        }
        if !(0.0..1.0).contains(&self.budget_floor_fraction) {
            return Err(OptimizeError::InvalidConfig(format!(
                "budget_floor_fraction must be within [0, 1), got {}",
                self.budget_floor_fraction
            )));
        }
        if self.scoring.need_normalization <= 0.0 {
            return Err(OptimizeError::InvalidConfig(
                "need_normalization must be positive".to_string(),
            ));
        }
        for (name, tier) in [("depot", &self.depot), ("distribution", &self.distribution)] {
            if tier.service_radius_miles <= 0.0 {
                return Err(OptimizeError::InvalidConfig(format!(
                    "{} service radius must be positive",
                    name
                )));
            }
            if tier.min_distance_miles < 0.0 {
                return Err(OptimizeError::InvalidConfig(format!(
                    "{} min distance must be non-negative",
                    name
                )));
            }
            if tier.amortization.primary_months == 0
                || tier.amortization.fallback_months > tier.amortization.primary_months
            {
                return Err(OptimizeError::InvalidConfig(format!(
                    "{} amortization schedule must have fallback <= primary months",
                    name
                )));
            }
            if let Some(decluster) = &tier.decluster {
                if decluster.grid_dim == 0 {
                    return Err(OptimizeError::InvalidConfig(format!(
                        "{} decluster grid must have at least one zone",
                        name
                    )));
                }
                if !(0.0..=1.0).contains(&decluster.neighbor_saturation) {
                    return Err(OptimizeError::InvalidConfig(format!(
                        "{} neighbor saturation must be within [0, 1]",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = OptimizerConfig::default();
        config.scoring.weights.need = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let mut config = OptimizerConfig::default();
        config.total_budget = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_schedule() {
        let decluster = DeclusterConfig::default();
        assert_eq!(decluster.capacity_for(0), 1);
        assert_eq!(decluster.capacity_for(11), 1);
        assert_eq!(decluster.capacity_for(12), 2);
        assert_eq!(decluster.capacity_for(19), 2);
        assert_eq!(decluster.capacity_for(20), 3);
        assert_eq!(decluster.capacity_for(100), 3);
    }

    #[test]
    fn test_cost_model_caps() {
        let model = TierConfig::distribution_default().cost_model;
        // Far past the cap: the variable part must stop growing.
        assert_eq!(model.setup_cost(1_000_000.0), 100_000.0 + 200_000.0);
        assert_eq!(model.recurring_cost(1_000_000.0), 10_000.0 + 30_000.0);
    }
}
