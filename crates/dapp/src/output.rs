use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde_json::json;

use crate::telegram::DeliveryReport;

/// Writes `result.txt` plus the `computed.json` manifest pointing at it,
/// as the task runtime expects in the output directory.
pub(crate) fn write_task_output(output_dir: &str, report: &DeliveryReport) -> Result<()> {
    let result_path = Path::new(output_dir).join("result.txt");
    fs::write(&result_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("failed to write task output {}", result_path.display()))?;
    info!("wrote {}", result_path.display());

    let computed = json!({ "deterministic-output-path": result_path.display().to_string() });
    let computed_path = Path::new(output_dir).join("computed.json");
    fs::write(&computed_path, serde_json::to_string(&computed)?)
        .with_context(|| format!("failed to write task output {}", computed_path.display()))?;
    info!("wrote {}", computed_path.display());

    Ok(())
}
