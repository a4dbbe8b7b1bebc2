//! CLI presentation: text and JSON rendering of command results.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// One row of `check` output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MountSummary {
    pub name: String,
    pub root: String,
    pub eligibility: String,
    pub files: usize,
}

/// Mount table for `check`.
pub fn format_check_text(mounts: &[MountSummary]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Mount", "Root", "Eligibility", "Files"]);
    for mount in mounts {
        table.add_row(vec![
            mount.name.clone(),
            mount.root.clone(),
            mount.eligibility.clone(),
            mount.files.to_string(),
        ]);
    }
    format!("Configuration OK: {} mount(s)\n\n{}", mounts.len(), table)
}

/// Mount list for `check --format json`.
pub fn format_check_json(mounts: &[MountSummary]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "valid": true,
        "mounts": mounts,
    }))
}
