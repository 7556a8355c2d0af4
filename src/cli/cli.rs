use clap::Parser;

use crate::config::constants::{
    DEFAULT_ACCESS_BARRIER_WEIGHT, DEFAULT_DEPOT_BUDGET_FRACTION, DEFAULT_DEPOT_RADIUS_MILES,
    DEFAULT_DISTRIBUTION_RADIUS_MILES, DEFAULT_MAX_DEPOTS, DEFAULT_MAX_FACILITIES,
    DEFAULT_MIN_DISTANCE_MILES, DEFAULT_NEED_WEIGHT, DEFAULT_POVERTY_WEIGHT,
};

#[derive(Parser)]
#[command(author, version, about = "Two-tier facility placement optimizer", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "Cell dataset file (.json or .csv)")]
    cells: String,

    #[arg(short, long, help = "Total budget in dollars")]
    budget: f64,

    #[arg(long, default_value_t = DEFAULT_DEPOT_BUDGET_FRACTION)]
    depot_budget_fraction: f64,

    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_FACILITIES)]
    max_facilities: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_DEPOTS)]
    max_depots: usize,

    #[arg(short = 'd', long, default_value_t = DEFAULT_MIN_DISTANCE_MILES,
          help = "Minimum distance between distribution points in miles")]
    min_distance: f64,

    #[arg(long, default_value_t = DEFAULT_DEPOT_RADIUS_MILES)]
    depot_radius: f64,

    #[arg(long, default_value_t = DEFAULT_DISTRIBUTION_RADIUS_MILES)]
    distribution_radius: f64,

    #[arg(long, default_value_t = DEFAULT_NEED_WEIGHT)]
    need_weight: f64,

    #[arg(long, default_value_t = DEFAULT_ACCESS_BARRIER_WEIGHT)]
    access_weight: f64,

    #[arg(long, default_value_t = DEFAULT_POVERTY_WEIGHT)]
    poverty_weight: f64,

    #[arg(long, default_value_t = false, help = "Emit progress as JSON lines on stdout")]
    stream: bool,

    #[arg(short, long, help = "Write the optimization result as JSON")]
    output: Option<String>,

    #[arg(long, help = "Write the facility list as CSV")]
    csv_output: Option<String>,

    #[arg(long, help = "Wall-clock limit in seconds for the allocation passes")]
    time_limit: Option<u64>,

    #[arg(long, default_value_t = false, help = "Print per-facility details after the summary")]
    verbose_facilities: bool,
}

impl Args {
    pub fn cells(&self) -> &str {
        &self.cells
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn depot_budget_fraction(&self) -> f64 {
        self.depot_budget_fraction
    }

    pub fn max_facilities(&self) -> usize {
        self.max_facilities
    }

    pub fn max_depots(&self) -> usize {
        self.max_depots
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn depot_radius(&self) -> f64 {
        self.depot_radius
    }

    pub fn distribution_radius(&self) -> f64 {
        self.distribution_radius
    }

    pub fn need_weight(&self) -> f64 {
        self.need_weight
    }

    pub fn access_weight(&self) -> f64 {
        self.access_weight
    }

    pub fn poverty_weight(&self) -> f64 {
        self.poverty_weight
    }

    pub fn stream(&self) -> bool {
        self.stream
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn csv_output(&self) -> Option<&str> {
        self.csv_output.as_deref()
    }

    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    pub fn verbose_facilities(&self) -> bool {
        self.verbose_facilities
    }
}
