use std::path::Path;

use csv::Writer;

use crate::models::facility::Facility;

/// Writes the facility list as a flat CSV, one row per facility. Depot
/// linkage is emitted as a semicolon-joined id list.
pub fn export_facilities(path: &Path, facilities: &[Facility]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "id",
        "tier",
        "lat",
        "lon",
        "service_radius_miles",
        "setup_cost",
        "recurring_cost_monthly",
        "efficiency_score",
        "expected_impact",
        "amortization_months",
        "committed_cost",
        "served_facility_ids",
    ])?;

    for facility in facilities {
        writer.write_record([
            facility.id.clone(),
            facility.tier.to_string(),
            facility.lat.to_string(),
            facility.lon.to_string(),
            facility.service_radius_miles.to_string(),
            facility.setup_cost.to_string(),
            facility.recurring_cost_monthly.to_string(),
            facility.efficiency_score.to_string(),
            facility.expected_impact.to_string(),
            facility.amortization_months.to_string(),
            facility.committed_cost.to_string(),
            facility.served_facility_ids.join(";"),
        ])?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
