use super::metrics::{DatasetSummary, OptimizationResult, RunStatus};

pub fn print_dataset_summary(summary: &DatasetSummary) {
    println!("\nDataset Summary");
    println!("----------------------------------------");
    println!("Cells: {}", summary.total_cells);
    println!("Population: {}", summary.total_population);
    println!("Total Need: {:.0}", summary.total_need);
    println!("Average Risk Score: {:.2}", summary.avg_risk_score);
    println!("High-Need Cells: {}", summary.high_need_cells);
}

pub fn print_run_summary(result: &OptimizationResult) {
    println!("\nOptimization Result");
    println!("----------------------------------------");
    match result.status {
        RunStatus::Failed => {
            println!("Status: FAILED");
            if let Some(reason) = &result.reason {
                println!("Reason: {}", reason);
            }
            return;
        }
        RunStatus::Success => println!("Status: success"),
    }
    println!("Facilities:");
    println!("  Depots: {}", result.depot_count());
    println!("  Distribution Points: {}", result.distribution_count());
    println!("Expected Impact: {:.0} people served", result.total_expected_impact);
    println!("Financial Metrics:");
    println!("  Budget Used: ${:.2}", result.budget_used);
    println!("  Budget Remaining: ${:.2}", result.budget_remaining);
    println!("Coverage: {:.1}% of cells", result.coverage_percentage);
    println!("Allocation Rounds: {}", result.iterations);
    println!("Validation Adjustments: {}", result.adjustments_made);
}

pub fn print_facility_details(result: &OptimizationResult) {
    println!("\nFacility Details:");
    println!("----------------------------------------");
    for facility in &result.facilities {
        println!(
            "{} [{}]: ({:.4}, {:.4}) impact {:.0}, committed ${:.0} over {} months",
            facility.id,
            facility.tier,
            facility.lat,
            facility.lon,
            facility.expected_impact,
            facility.committed_cost,
            facility.amortization_months,
        );
        if !facility.served_facility_ids.is_empty() {
            println!("  Serves: {}", facility.served_facility_ids.join(", "));
        }
    }
    println!("----------------------------------------");
}
