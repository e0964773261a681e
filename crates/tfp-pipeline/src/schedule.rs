use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::RedshiftSchedule;
use tracing::info;

/// Redshifts always sampled alongside the starting redshift.
pub const STANDARD_REDSHIFTS: [f64; 6] = [150.0, 100.0, 20.0, 10.0, 1.0, 0.0];

/// Union of `z_start` and [`STANDARD_REDSHIFTS`], deduplicated and sorted descending.
pub fn build_schedule(z_start: f64) -> Result<RedshiftSchedule, TfError> {
    if !z_start.is_finite() {
        return Err(TfError::InvalidConfig(
            ErrorInfo::new("schedule.z_start", "z_start must be finite")
                .with_context("z_start", z_start.to_string()),
        ));
    }
    let mut redshifts = Vec::with_capacity(STANDARD_REDSHIFTS.len() + 1);
    redshifts.push(z_start);
    redshifts.extend_from_slice(&STANDARD_REDSHIFTS);
    redshifts.sort_by(|a, b| b.total_cmp(a));
    redshifts.dedup_by(|later, earlier| later == earlier);

    let schedule = RedshiftSchedule::from_descending(redshifts)?;
    info!(redshifts = ?schedule.as_slice(), "set redshifts");
    Ok(schedule)
}
