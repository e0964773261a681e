use std::f64::consts::PI;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use serde::Serialize;
use tempfile::NamedTempFile;
use tfp_core::errors::{ErrorInfo, TfError};
use tfp_core::{CosmologyConfig, CosmologyInputs, RedshiftSchedule, PROVENANCE_FILE_NAME};
use tfp_solver::TransferTable;
use tracing::info;

use crate::format::{redshift_tag, scientific, signed_one_decimal};

/// Significant digits written for every transfer value.
pub const TRANSFER_SIGNIFICANT_DIGITS: usize = 10;

fn io_error(code: &str, err: impl ToString, path: &Path) -> TfError {
    TfError::Io(ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()))
}

/// `As * k0^(1-ns) * h^(3+ns) / (4 pi)`, recorded as `force_pnorm`.
pub fn force_pnorm(inputs: &CosmologyInputs) -> f64 {
    inputs.a_s * inputs.k0.powf(1.0 - inputs.ns) * inputs.h.powf(3.0 + inputs.ns) / 4.0 / PI
}

/// `camb_transfer_z{zzz}_cpl{±w0}{±wa}_lmin{ll}.txt`.
pub fn transfer_file_name(z: f64, w0: f64, wa: f64, levelmin: u32) -> String {
    format!(
        "camb_transfer_z{}_cpl{}{}_lmin{levelmin:02}.txt",
        redshift_tag(z),
        signed_one_decimal(w0),
        signed_one_decimal(wa)
    )
}

/// Comment-prefixed header followed by one whitespace separated row per wavenumber.
pub fn render_transfer_text(header: &[String], rows: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for line in header {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    for row in rows.row_iter() {
        let cells: Vec<String> = row
            .iter()
            .map(|value| scientific(*value, TRANSFER_SIGNIFICANT_DIGITS))
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

/// Both artifacts rendered in memory, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedExport {
    /// Configuration including `force_pnorm`.
    pub config: CosmologyConfig,
    /// Position of `z_start` in the schedule and on the table's redshift axis.
    pub redshift_index: usize,
    /// Transposed slice: rows are wavenumbers, columns quantities.
    pub rows: DMatrix<f64>,
    /// Name of the transfer-table file.
    pub transfer_file_name: String,
    /// Contents of the transfer-table file.
    pub transfer_text: String,
    /// Contents of the provenance document.
    pub provenance_json: String,
}

/// Computes the normalization constant, selects the `z_start` slice and renders both artifacts.
pub fn prepare_export(
    config: &CosmologyConfig,
    schedule: &RedshiftSchedule,
    table: &TransferTable,
) -> Result<PreparedExport, TfError> {
    let pnorm = force_pnorm(config.inputs());
    let config = config.with_force_pnorm(pnorm)?;
    info!(force_pnorm = pnorm, "force_pnorm");

    let inputs = config.inputs();
    let redshift_index = schedule.index_of(inputs.z_start).ok_or_else(|| {
        TfError::Lookup(
            ErrorInfo::new("export.z_start_missing", "z_start is absent from the redshift schedule")
                .with_context("z_start", inputs.z_start.to_string())
                .with_context("schedule", format!("{:?}", schedule.as_slice())),
        )
    })?;
    let rows = table.slice_at(redshift_index)?;
    info!(wavenumbers = rows.nrows(), "number of k values");

    let transfer_file_name = transfer_file_name(
        schedule.as_slice()[redshift_index],
        inputs.w0,
        inputs.wa,
        inputs.levelmin,
    );
    let transfer_text = render_transfer_text(&config.record().header_lines(), &rows);
    let mut provenance_json = config.record().to_pretty_json()?;
    provenance_json.push('\n');

    Ok(PreparedExport {
        config,
        redshift_index,
        rows,
        transfer_file_name,
        transfer_text,
        provenance_json,
    })
}

/// Locations of the written artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Transfer-table file.
    pub transfer: PathBuf,
    /// Provenance document.
    pub provenance: PathBuf,
}

/// Writes both artifacts into `out_dir`.
///
/// Contents are staged in temporary files inside `out_dir` and only renamed
/// into place once both have been written.
pub fn write_artifacts(prepared: &PreparedExport, out_dir: &Path) -> Result<ArtifactPaths, TfError> {
    fs::create_dir_all(out_dir).map_err(|err| io_error("export.out_dir", err, out_dir))?;
    let paths = ArtifactPaths {
        transfer: out_dir.join(&prepared.transfer_file_name),
        provenance: out_dir.join(PROVENANCE_FILE_NAME),
    };
    let transfer = stage(out_dir, prepared.transfer_text.as_bytes())?;
    let provenance = stage(out_dir, prepared.provenance_json.as_bytes())?;

    provenance
        .persist(&paths.provenance)
        .map_err(|err| io_error("export.persist", err.error, &paths.provenance))?;
    info!(path = %paths.provenance.display(), "saved provenance record");
    if let Err(err) = transfer.persist(&paths.transfer) {
        let _ = fs::remove_file(&paths.provenance);
        return Err(io_error("export.persist", err.error, &paths.transfer));
    }
    info!(path = %paths.transfer.display(), "transfer function table created");
    Ok(paths)
}

fn stage(dir: &Path, contents: &[u8]) -> Result<NamedTempFile, TfError> {
    let mut file = NamedTempFile::new_in(dir).map_err(|err| io_error("export.stage", err, dir))?;
    file.write_all(contents)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| io_error("export.stage", err, file.path()))?;
    Ok(file)
}

/// Renders and writes both artifacts.
pub fn export_transfer(
    config: &CosmologyConfig,
    schedule: &RedshiftSchedule,
    table: &TransferTable,
    out_dir: &Path,
) -> Result<(PreparedExport, ArtifactPaths), TfError> {
    let prepared = prepare_export(config, schedule, table)?;
    let paths = write_artifacts(&prepared, out_dir)?;
    Ok((prepared, paths))
}
