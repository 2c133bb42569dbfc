//! `crosstally run` / `crosstally validate` — parameter-driven
//! two-source reconciliation.

use std::path::{Path, PathBuf};

use crosstally_recon::params::{Mode, ReconParams};
use crosstally_recon::{route, run, RecordSet, ReconResult};

use crate::exit_codes::{EXIT_DIFFERENCES, EXIT_INVALID_PARAMS, EXIT_RUNTIME};
use crate::CliError;

fn cli_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
    }
}

/// Parse a parameter file as JSON (planner output) or TOML (hand-written)
/// based on its extension.
fn load_params(path: &Path) -> Result<ReconParams, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", path.display())))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let parsed = if is_json {
        ReconParams::from_json(&text)
    } else {
        ReconParams::from_toml(&text)
    };
    parsed.map_err(|e| cli_err(EXIT_INVALID_PARAMS, e.to_string()))
}

/// Record set name: the CSV file's stem, e.g. `deposits.csv` → "deposits".
fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_record_set(path: &Path) -> Result<RecordSet, CliError> {
    let csv_data = std::fs::read_to_string(path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", path.display())))?;
    crosstally_io::read_record_set(&source_name(path), &csv_data)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("{}: {e}", path.display())))
}

pub fn cmd_run(
    params_path: PathBuf,
    left_path: PathBuf,
    right_path: PathBuf,
    out_dir: PathBuf,
    json_output: bool,
) -> Result<(), CliError> {
    let params = load_params(&params_path)?;
    let left = load_record_set(&left_path)?;
    let right = load_record_set(&right_path)?;

    let result = run(&params, &left, &right)
        .map_err(|e| cli_err(EXIT_INVALID_PARAMS, e.to_string()))?;

    let tables = route(&result, &params, left.columns(), right.columns());

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot create {}: {e}", out_dir.display())))?;

    for table in &tables {
        let path = out_dir.join(format!("{}.csv", table.name));
        let csv_text = crosstally_io::write_table(table)
            .map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;
        std::fs::write(&path, csv_text)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {} ({} rows)", path.display(), table.rows.len());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);

    if differences_found(&result) {
        return Err(cli_err(EXIT_DIFFERENCES, "differences found"));
    }
    Ok(())
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    match result.meta.mode {
        Mode::PassFail => eprintln!(
            "recon: {} pairs — {} valid, {} invalid, {} unmatched",
            s.pairs,
            s.valid,
            s.invalid,
            s.left_orphans + s.right_orphans,
        ),
        Mode::Severity => {
            let mut tags: Vec<String> = s
                .severity_counts
                .iter()
                .map(|(tag, n)| format!("{n} {tag}"))
                .collect();
            tags.sort();
            eprintln!(
                "recon: {} pairs — {} inconsistencies ({})",
                s.pairs,
                s.inconsistencies,
                if tags.is_empty() { "none".into() } else { tags.join(", ") },
            );
        }
    }
}

fn differences_found(result: &ReconResult) -> bool {
    let s = &result.summary;
    match result.meta.mode {
        Mode::PassFail => s.invalid > 0 || s.left_orphans > 0 || s.right_orphans > 0,
        Mode::Severity => s.inconsistencies > 0,
    }
}

pub fn cmd_validate(params_path: PathBuf) -> Result<(), CliError> {
    let params = load_params(&params_path)?;
    eprintln!(
        "valid: {} mode, {} rule(s), match on '{}' = '{}'",
        params.mode,
        params.validation_rules.len(),
        params.match_keys.left,
        params.match_keys.right,
    );
    Ok(())
}
