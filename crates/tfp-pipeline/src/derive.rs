use std::f64::consts::PI;

use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::{CosmologyConfig, CosmologyInputs, DerivedParameters, ParameterRecord};
use tracing::{info, warn};

/// Expansion factors at which the adaptive grid adds a refinement level.
pub const REFINEMENT_EXPANSION_FACTORS: [f64; 7] = [0.0125, 0.025, 0.05, 0.1, 0.2, 0.4, 0.8];

/// Grid refinement selected by `FlagAMR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementMode {
    /// `FlagAMR == 0`: a single uniform grid.
    Uniform,
    /// `FlagAMR == 1`: seven refinement levels.
    Adaptive,
}

impl RefinementMode {
    /// Maps the raw flag, rejecting anything but 0 and 1.
    pub fn from_flag(flag: f64) -> Result<Self, TfError> {
        if flag == 0.0 {
            Ok(Self::Uniform)
        } else if flag == 1.0 {
            Ok(Self::Adaptive)
        } else {
            Err(TfError::InvalidConfig(
                ErrorInfo::new("derive.flag_amr", "FlagAMR must be 0 or 1")
                    .with_context("FlagAMR", flag.to_string()),
            ))
        }
    }

    /// Refinement thresholds; only their count enters the geometry.
    pub fn expansion_factors(self) -> &'static [f64] {
        match self {
            Self::Uniform => &[],
            Self::Adaptive => &REFINEMENT_EXPANSION_FACTORS,
        }
    }
}

/// Computes every derived field from the user inputs.
pub fn derived_parameters(inputs: &CosmologyInputs) -> Result<DerivedParameters, TfError> {
    if inputs.bias8_z0_wmap5 == 0.0 {
        return Err(TfError::DivisionByZero(
            ErrorInfo::new("derive.bias8_zero", "bias8_z0_WMAP5 must be non-zero")
                .with_context("bias8_z0_WMAP5", inputs.bias8_z0_wmap5.to_string()),
        ));
    }
    if inputs.z_start <= -1.0 || inputs.z_start.is_nan() {
        return Err(TfError::InvalidConfig(
            ErrorInfo::new("derive.z_start", "z_start must be greater than -1")
                .with_context("z_start", inputs.z_start.to_string()),
        ));
    }
    let mode = RefinementMode::from_flag(inputs.flag_amr)?;
    let refinements = u32::try_from(mode.expansion_factors().len()).unwrap_or(u32::MAX);
    let levelmax = inputs.levelmin.checked_add(refinements).ok_or_else(|| {
        TfError::InvalidConfig(
            ErrorInfo::new("derive.levelmax", "levelmax overflows")
                .with_context("levelmin", inputs.levelmin.to_string()),
        )
    })?;

    let sigma8 = 1.0 / inputs.bias8_z0_wmap5;
    let omega_c = inputs.omega_m - inputs.omega_b;
    let omega_l = 1.0 - inputs.omega_m;
    if omega_c < 0.0 || omega_l < 0.0 {
        warn!(omega_c, omega_l, "derived density fraction is negative");
    }

    let ncell_ini = 2f64.powi(exponent(inputs.levelmin)?);
    let lbox_ckpc = 2f64.powi(exponent(levelmax)?) * inputs.dx_fin_kpc;
    let lbox_cmpc = lbox_ckpc / 1000.0;

    Ok(DerivedParameters {
        sigma8_z0_wmap5: sigma8,
        omega_c,
        omega_l,
        levelmax,
        kmax: PI * ncell_ini / lbox_cmpc,
        lbox_cmpc,
        lbox_cmpc_h: lbox_cmpc * inputs.h,
        dx_ini_ckpc: lbox_ckpc / ncell_ini,
        dx_ini_kpc: 1.0 / (inputs.z_start + 1.0) * lbox_ckpc / ncell_ini,
    })
}

fn exponent(level: u32) -> Result<i32, TfError> {
    i32::try_from(level).map_err(|_| {
        TfError::InvalidConfig(
            ErrorInfo::new("derive.level_range", "grid level out of range")
                .with_context("level", level.to_string()),
        )
    })
}

/// Parses the user record and returns the fully derived configuration.
///
/// Pure: the input record is left untouched and the same record always
/// yields the same configuration.
pub fn derive_parameters(record: &ParameterRecord) -> Result<CosmologyConfig, TfError> {
    let inputs = CosmologyInputs::from_record(record)?;
    let derived = derived_parameters(&inputs)?;
    let config = CosmologyConfig::from_parts(record.clone(), derived)?;

    let derived = config.derived();
    info!(lbox_cmpc = derived.lbox_cmpc, "Lbox [cMpc]");
    info!(lbox_cmpc_h = derived.lbox_cmpc_h, "Lbox [cMpc/h]");
    info!(dx_fin_kpc = inputs.dx_fin_kpc, "dx_fin [kpc]");
    info!(dx_ini_kpc = derived.dx_ini_kpc, "dx_ini [kpc]");
    info!(dx_ini_ckpc = derived.dx_ini_ckpc, "dx_ini [ckpc]");
    Ok(config)
}
