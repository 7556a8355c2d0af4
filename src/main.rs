use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use aidgrid::analysis::metrics::DatasetSummary;
use aidgrid::analysis::reporting;
use aidgrid::cli::cli::Args;
use aidgrid::config::optimizer_config::OptimizerConfig;
use aidgrid::core::pipeline::OptimizationPipeline;
use aidgrid::data::cells_loader;
use aidgrid::utils::csv_export;
use aidgrid::utils::logging;
use aidgrid::utils::progress::{JsonLineObserver, ProgressBarObserver};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging();

    println!("AidGrid Facility Placement Optimizer");

    let cells = cells_loader::load_cells(Path::new(args.cells()))
        .with_context(|| format!("failed to load cells from {}", args.cells()))?;
    let summary = DatasetSummary::from_cells(&cells);
    reporting::print_dataset_summary(&summary);

    let config = build_config(&args);
    let time_limit = args.time_limit().map(Duration::from_secs);

    let result = if args.stream() {
        let observer = JsonLineObserver;
        OptimizationPipeline::new(&config, &observer)
            .with_time_limit(time_limit)
            .run(&cells)
    } else {
        let observer = ProgressBarObserver::new();
        let result = OptimizationPipeline::new(&config, &observer)
            .with_time_limit(time_limit)
            .run(&cells);
        observer.finish();
        result
    };

    reporting::print_run_summary(&result);
    if args.verbose_facilities() {
        reporting::print_facility_details(&result);
    }

    if let Some(path) = args.output() {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path))?;
        println!("Result written to {}", path);
    }
    if let Some(path) = args.csv_output() {
        csv_export::export_facilities(Path::new(path), &result.facilities)
            .with_context(|| format!("failed to write {}", path))?;
        println!("Facility CSV written to {}", path);
    }

    Ok(())
}

fn build_config(args: &Args) -> OptimizerConfig {
    let mut config = OptimizerConfig::default();
    config.total_budget = args.budget();
    config.depot_budget_fraction = args.depot_budget_fraction();
    config.scoring.weights.need = args.need_weight();
    config.scoring.weights.access_barrier = args.access_weight();
    config.scoring.weights.poverty = args.poverty_weight();
    config.depot.max_facilities = args.max_depots();
    config.depot.service_radius_miles = args.depot_radius();
    config.distribution.max_facilities = args.max_facilities();
    config.distribution.min_distance_miles = args.min_distance();
    config.distribution.service_radius_miles = args.distribution_radius();
    config
}
