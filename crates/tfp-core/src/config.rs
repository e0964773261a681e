//! Typed view over the cosmology parameter record.

use serde::{Deserialize, Serialize};

use crate::errors::TfError;
use crate::record::ParameterRecord;

/// Record keys, spelled exactly as they appear in `cosmo_params.json`.
pub mod keys {
    #![allow(missing_docs)]
    pub const H: &str = "h";
    pub const OMEGA_B: &str = "Omega_b";
    pub const OMEGA_C: &str = "Omega_c";
    pub const OMEGA_K: &str = "Omega_k";
    pub const OMEGA_M: &str = "Omega_m";
    pub const OMEGA_L: &str = "Omega_l";
    pub const W0: &str = "w0";
    pub const WA: &str = "wa";
    pub const AS: &str = "As";
    pub const NS: &str = "ns";
    pub const K0: &str = "k0";
    pub const KMAX: &str = "kmax";
    pub const K_PER_LOGINT: &str = "k_per_logint";
    pub const LEVELMIN: &str = "levelmin";
    pub const LEVELMAX: &str = "levelmax";
    pub const FLAG_AMR: &str = "FlagAMR";
    pub const DX_FIN_KPC: &str = "dx_fin_kpc";
    pub const Z_START: &str = "z_start";
    pub const BIAS8_Z0: &str = "bias8_z0_WMAP5";
    pub const SIGMA8_Z0: &str = "sigma8_z0_WMAP5";
    pub const LBOX_CMPC: &str = "Lbox_cMpc";
    pub const LBOX_CMPC_H: &str = "Lbox_cMpc/h";
    pub const DX_INI_CKPC: &str = "dx_ini_ckpc";
    pub const DX_INI_KPC: &str = "dx_ini_kpc";
    pub const FORCE_PNORM: &str = "force_pnorm";
}

/// User supplied parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmologyInputs {
    /// Reduced Hubble constant.
    pub h: f64,
    /// Baryon density fraction.
    pub omega_b: f64,
    /// Curvature density fraction.
    pub omega_k: f64,
    /// Total matter density fraction.
    pub omega_m: f64,
    /// Dark-energy equation of state today.
    pub w0: f64,
    /// Dark-energy equation of state evolution.
    pub wa: f64,
    /// Primordial scalar amplitude.
    pub a_s: f64,
    /// Primordial spectral index.
    pub ns: f64,
    /// Pivot wavenumber of the primordial spectrum.
    pub k0: f64,
    /// Solver sampling density in wavenumber.
    pub k_per_logint: u32,
    /// Coarse grid level; the coarse grid has `2^levelmin` cells per side.
    pub levelmin: u32,
    /// Adaptive refinement switch as written; only 0 and 1 pass derivation.
    pub flag_amr: f64,
    /// Comoving cell size at the finest level, in kpc.
    pub dx_fin_kpc: f64,
    /// Starting redshift of the simulation.
    pub z_start: f64,
    /// Inverse of the target present-day fluctuation amplitude.
    pub bias8_z0_wmap5: f64,
}

impl CosmologyInputs {
    /// Extracts the user supplied fields, failing with a config error naming any missing key.
    pub fn from_record(record: &ParameterRecord) -> Result<Self, TfError> {
        Ok(Self {
            h: record.require_f64(keys::H)?,
            omega_b: record.require_f64(keys::OMEGA_B)?,
            omega_k: record.require_f64(keys::OMEGA_K)?,
            omega_m: record.require_f64(keys::OMEGA_M)?,
            w0: record.require_f64(keys::W0)?,
            wa: record.require_f64(keys::WA)?,
            a_s: record.require_f64(keys::AS)?,
            ns: record.require_f64(keys::NS)?,
            k0: record.require_f64(keys::K0)?,
            k_per_logint: record.require_u32(keys::K_PER_LOGINT)?,
            levelmin: record.require_u32(keys::LEVELMIN)?,
            flag_amr: record.require_f64(keys::FLAG_AMR)?,
            dx_fin_kpc: record.require_f64(keys::DX_FIN_KPC)?,
            z_start: record.require_f64(keys::Z_START)?,
            bias8_z0_wmap5: record.require_f64(keys::BIAS8_Z0)?,
        })
    }
}

/// Quantities derived from [`CosmologyInputs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    /// Target present-day fluctuation amplitude.
    pub sigma8_z0_wmap5: f64,
    /// Cold dark matter density fraction.
    pub omega_c: f64,
    /// Dark-energy density fraction.
    pub omega_l: f64,
    /// Finest grid level.
    pub levelmax: u32,
    /// Largest wavenumber the solver must resolve, in 1/Mpc.
    pub kmax: f64,
    /// Comoving box length in Mpc.
    pub lbox_cmpc: f64,
    /// Comoving box length in Mpc/h.
    pub lbox_cmpc_h: f64,
    /// Comoving coarse cell size in kpc.
    pub dx_ini_ckpc: f64,
    /// Physical coarse cell size at `z_start`, in kpc.
    pub dx_ini_kpc: f64,
}

impl DerivedParameters {
    /// Reads previously derived fields back from a record.
    pub fn from_record(record: &ParameterRecord) -> Result<Self, TfError> {
        Ok(Self {
            sigma8_z0_wmap5: record.require_f64(keys::SIGMA8_Z0)?,
            omega_c: record.require_f64(keys::OMEGA_C)?,
            omega_l: record.require_f64(keys::OMEGA_L)?,
            levelmax: record.require_u32(keys::LEVELMAX)?,
            kmax: record.require_f64(keys::KMAX)?,
            lbox_cmpc: record.require_f64(keys::LBOX_CMPC)?,
            lbox_cmpc_h: record.require_f64(keys::LBOX_CMPC_H)?,
            dx_ini_ckpc: record.require_f64(keys::DX_INI_CKPC)?,
            dx_ini_kpc: record.require_f64(keys::DX_INI_KPC)?,
        })
    }

    fn write_into(&self, record: &mut ParameterRecord) -> Result<(), TfError> {
        record.set_f64(keys::SIGMA8_Z0, self.sigma8_z0_wmap5)?;
        record.set_f64(keys::OMEGA_C, self.omega_c)?;
        record.set_f64(keys::OMEGA_L, self.omega_l)?;
        record.set_u32(keys::LEVELMAX, self.levelmax);
        record.set_f64(keys::KMAX, self.kmax)?;
        record.set_f64(keys::LBOX_CMPC, self.lbox_cmpc)?;
        record.set_f64(keys::LBOX_CMPC_H, self.lbox_cmpc_h)?;
        record.set_f64(keys::DX_INI_CKPC, self.dx_ini_ckpc)?;
        record.set_f64(keys::DX_INI_KPC, self.dx_ini_kpc)
    }
}

/// Fully derived cosmology together with the ordered record it serializes to.
///
/// Values are immutable; every update returns a new configuration whose
/// record has been rewritten to match the typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CosmologyConfig {
    inputs: CosmologyInputs,
    derived: DerivedParameters,
    force_pnorm: Option<f64>,
    record: ParameterRecord,
}

impl CosmologyConfig {
    /// Combines a user record with its derived parameters.
    ///
    /// Inputs are read from `record`; derived fields are written into it,
    /// overwriting stale values in place and appending missing keys.
    pub fn from_parts(
        mut record: ParameterRecord,
        derived: DerivedParameters,
    ) -> Result<Self, TfError> {
        let inputs = CosmologyInputs::from_record(&record)?;
        derived.write_into(&mut record)?;
        let force_pnorm = record.optional_f64(keys::FORCE_PNORM)?;
        Ok(Self {
            inputs,
            derived,
            force_pnorm,
            record,
        })
    }

    /// Rebuilds a configuration from a record that already carries derived fields,
    /// such as a provenance document written by a previous run.
    pub fn from_record(record: ParameterRecord) -> Result<Self, TfError> {
        let inputs = CosmologyInputs::from_record(&record)?;
        let derived = DerivedParameters::from_record(&record)?;
        let force_pnorm = record.optional_f64(keys::FORCE_PNORM)?;
        Ok(Self {
            inputs,
            derived,
            force_pnorm,
            record,
        })
    }

    /// Returns a copy with the primordial amplitude replaced.
    pub fn with_amplitude(&self, a_s: f64) -> Result<Self, TfError> {
        let mut next = self.clone();
        next.record.set_f64(keys::AS, a_s)?;
        next.inputs.a_s = a_s;
        Ok(next)
    }

    /// Returns a copy carrying the power-spectrum normalization constant.
    pub fn with_force_pnorm(&self, pnorm: f64) -> Result<Self, TfError> {
        let mut next = self.clone();
        next.record.set_f64(keys::FORCE_PNORM, pnorm)?;
        next.force_pnorm = Some(pnorm);
        Ok(next)
    }

    /// User supplied fields.
    pub fn inputs(&self) -> &CosmologyInputs {
        &self.inputs
    }

    /// Derived fields.
    pub fn derived(&self) -> &DerivedParameters {
        &self.derived
    }

    /// Normalization constant, present once the configuration has been exported.
    pub fn force_pnorm(&self) -> Option<f64> {
        self.force_pnorm
    }

    /// Ordered record mirroring the typed fields plus any pass-through keys.
    pub fn record(&self) -> &ParameterRecord {
        &self.record
    }

    /// Consumes the configuration, returning its record.
    pub fn into_record(self) -> ParameterRecord {
        self.record
    }
}
