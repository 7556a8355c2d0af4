// Default parameters for the two-tier facility placement optimizer.
// Everything here is a tunable configuration default, not algorithmic law;
// OptimizerConfig carries the values actually used by a run.

// Scoring weights (must sum to 1.0)
pub const DEFAULT_NEED_WEIGHT: f64 = 0.5;
pub const DEFAULT_ACCESS_BARRIER_WEIGHT: f64 = 0.3;
pub const DEFAULT_POVERTY_WEIGHT: f64 = 0.2;
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// Need-index normalization divisor, chosen so the count-like need factor
// stays comparable in magnitude to the [0,1] ratio factors.
pub const DEFAULT_NEED_NORMALIZATION: f64 = 1000.0;

// Expected-impact caps: fraction of need a facility can realistically
// absorb, and fraction of population that fits its catchment.
pub const DEFAULT_SERVE_FRACTION: f64 = 0.4;
pub const DEFAULT_POPULATION_CAP_FRACTION: f64 = 0.3;

// Budget split and floor
pub const DEFAULT_DEPOT_BUDGET_FRACTION: f64 = 0.25;
pub const DEFAULT_BUDGET_FLOOR_FRACTION: f64 = 0.10;

// The shorter amortization horizon is only tried while the remaining
// budget exceeds this multiple of the candidate's setup cost.
pub const AMORTIZATION_SETUP_GUARD: f64 = 2.0;

// Distribution tier
pub const DEFAULT_DISTRIBUTION_RADIUS_MILES: f64 = 1.5;
pub const DEFAULT_MIN_DISTANCE_MILES: f64 = 0.5;
pub const DEFAULT_MAX_FACILITIES: usize = 1000;
pub const DISTRIBUTION_SETUP_BASE: f64 = 100_000.0;
pub const DISTRIBUTION_SETUP_PER_PERSON: f64 = 20.0;
pub const DISTRIBUTION_SETUP_CAP: f64 = 200_000.0;
pub const DISTRIBUTION_RECURRING_BASE: f64 = 10_000.0;
pub const DISTRIBUTION_RECURRING_PER_PERSON: f64 = 4.0;
pub const DISTRIBUTION_RECURRING_CAP: f64 = 30_000.0;
pub const DISTRIBUTION_PRIMARY_MONTHS: u32 = 12;
pub const DISTRIBUTION_FALLBACK_MONTHS: u32 = 6;

// Depot tier
pub const DEFAULT_DEPOT_RADIUS_MILES: f64 = 7.0;
pub const DEFAULT_DEPOT_MIN_DISTANCE_MILES: f64 = 3.0;
pub const DEFAULT_MAX_DEPOTS: usize = 4;
pub const DEPOT_SETUP_BASE: f64 = 80_000.0;
pub const DEPOT_SETUP_PER_PERSON: f64 = 10.0;
pub const DEPOT_SETUP_CAP: f64 = 150_000.0;
pub const DEPOT_RECURRING_BASE: f64 = 4_000.0;
pub const DEPOT_RECURRING_PER_PERSON: f64 = 1.0;
pub const DEPOT_RECURRING_CAP: f64 = 12_000.0;
pub const DEPOT_PRIMARY_MONTHS: u32 = 6;
pub const DEPOT_FALLBACK_MONTHS: u32 = 3;

// Declustering grid
pub const DEFAULT_ZONE_GRID_DIM: usize = 6;
pub const DEFAULT_NEIGHBOR_SATURATION: f64 = 0.7;

// Parallel scoring
pub const SCORING_CHUNK_SIZE: usize = 256;
pub const MAX_SCORING_WORKERS: usize = 8;

// Dataset analysis
pub const HIGH_NEED_RISK_THRESHOLD: f64 = 4.0;
