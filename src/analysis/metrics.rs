use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::constants::HIGH_NEED_RISK_THRESHOLD;
use crate::core::validator::ValidationReport;
use crate::models::cell::Cell;
use crate::models::facility::{Facility, FacilityTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Aggregate statistics over the input cells, computed before any
/// optimization pass runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_cells: usize,
    pub total_population: u64,
    pub total_need: f64,
    pub avg_risk_score: f64,
    pub high_need_cells: usize,
}

impl DatasetSummary {
    pub fn from_cells(cells: &[Cell]) -> Self {
        let avg_risk_score = if cells.is_empty() {
            0.0
        } else {
            cells.iter().map(|c| c.risk_score).sum::<f64>() / cells.len() as f64
        };
        Self {
            total_cells: cells.len(),
            total_population: cells.iter().map(|c| c.population as u64).sum(),
            total_need: cells.iter().map(|c| c.need_index).sum(),
            avg_risk_score,
            high_need_cells: cells
                .iter()
                .filter(|c| c.risk_score > HIGH_NEED_RISK_THRESHOLD)
                .count(),
        }
    }
}

/// The serializable result of one optimization run. Always structured:
/// recoverable failures set `status`/`reason` instead of raising past the
/// pipeline boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub facilities: Vec<Facility>,
    pub total_expected_impact: f64,
    pub budget_used: f64,
    pub budget_remaining: f64,
    /// Share of input cells within a surviving facility's radius, 0-100.
    pub coverage_percentage: f64,
    /// Total allocation rounds across both tiers.
    pub iterations: usize,
    pub adjustments_made: usize,
    pub timestamp: String,
}

impl OptimizationResult {
    pub fn success(report: ValidationReport, total_budget: f64, iterations: usize) -> Self {
        Self {
            status: RunStatus::Success,
            reason: None,
            total_expected_impact: report.total_impact,
            budget_used: report.budget_used,
            budget_remaining: total_budget - report.budget_used,
            coverage_percentage: report.coverage_percentage,
            iterations,
            adjustments_made: report.adjustments_made,
            facilities: report.facilities,
            timestamp: Local::now().to_rfc3339(),
        }
    }

    pub fn failed(reason: String) -> Self {
        Self {
            status: RunStatus::Failed,
            reason: Some(reason),
            facilities: Vec::new(),
            total_expected_impact: 0.0,
            budget_used: 0.0,
            budget_remaining: 0.0,
            coverage_percentage: 0.0,
            iterations: 0,
            adjustments_made: 0,
            timestamp: Local::now().to_rfc3339(),
        }
    }

    pub fn depot_count(&self) -> usize {
        self.facilities
            .iter()
            .filter(|f| f.tier == FacilityTier::Depot)
            .count()
    }

    pub fn distribution_count(&self) -> usize {
        self.facilities
            .iter()
            .filter(|f| f.tier == FacilityTier::Distribution)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_summary() {
        let cells = vec![
            Cell::new("a", 34.0, -118.0, 1000, 5.0),
            Cell::new("b", 34.1, -118.1, 500, 1.0),
            Cell::new("c", 34.2, -118.2, 0, 0.0),
        ];
        let summary = DatasetSummary::from_cells(&cells);
        assert_eq!(summary.total_cells, 3);
        assert_eq!(summary.total_population, 1500);
        assert_eq!(summary.total_need, 5000.0 + 500.0);
        assert_eq!(summary.high_need_cells, 1);
        assert!((summary.avg_risk_score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DatasetSummary::from_cells(&[]);
        assert_eq!(summary.total_cells, 0);
        assert_eq!(summary.avg_risk_score, 0.0);
    }

    #[test]
    fn test_failed_result_serializes_reason() {
        let result = OptimizationResult::failed("weights must sum to 1".to_string());
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("weights must sum to 1"));
    }
}
