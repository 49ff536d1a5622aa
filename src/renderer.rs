use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::schema::{Collection, SubnetRecord};
use crate::util::slug;

// ------------------------------------------------------------
// Profile renderer
// ------------------------------------------------------------
//
// Consumes a Collection (read-only) and writes one Markdown
// profile per record. The layout is fixed: literal on-chain
// fields substituted up top, clearly marked placeholder sections
// below for content the collector cannot supply (qualitative
// descriptions, sentiment, trend commentary). Those are filled
// in later by hand or by a downstream agent.
//
// Output is deterministic: rendering the same Collection twice
// produces byte-identical files. No render-time timestamps.
//

/// Deterministic profile file name for a record: `<id>_<slug>.md`.
pub fn profile_filename(record: &SubnetRecord) -> String {
    let label = format!("Subnet {}", record.id);
    format!("{}_{}.md", record.id, slug(&label))
}

/// Read a Collection document from disk. Missing or garbled
/// input is fatal for the renderer.
pub fn load_collection(path: &Path) -> anyhow::Result<Collection> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read collection from {}", path.display()))?;
    let collection = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse collection at {}", path.display()))?;
    Ok(collection)
}

/// Render every record in `collection` into `out_dir`, fully
/// overwriting any existing profile. Records with a description
/// file under `desc_dir` (`<id>.md`) get its text substituted
/// into the Primary Function section. Returns the number of
/// profiles written.
pub fn render_all(
    collection: &Collection,
    out_dir: &Path,
    desc_dir: &Path,
) -> anyhow::Result<usize> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for record in &collection.subnets {
        let description = load_description(desc_dir, record.id);
        let path = out_dir.join(profile_filename(record));
        std::fs::write(&path, render_profile(record, description.as_deref()))
            .with_context(|| format!("failed to write profile {}", path.display()))?;
    }

    info!(
        "rendered {} profiles to {}",
        collection.subnets.len(),
        out_dir.display()
    );
    Ok(collection.subnets.len())
}

/// Optional per-subnet description, kept in a directory alongside
/// the profiles and maintained by hand or by a downstream agent.
/// Absent or empty files simply fall back to the baseline text.
fn load_description(dir: &Path, id: u16) -> Option<String> {
    let text = std::fs::read_to_string(dir.join(format!("{id}.md"))).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Render a single record into the fixed profile template.
pub fn render_profile(record: &SubnetRecord, description: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Subnet {}", record.id);
    out.push('\n');

    render_metrics(&mut out, record);
    render_placeholders(&mut out, description);

    out
}

/// On-chain sections. An error record gets its failure cause in
/// place of the metric and hyperparameter values; nothing is
/// fabricated alongside an error.
fn render_metrics(out: &mut String, record: &SubnetRecord) {
    let _ = writeln!(out, "## On-Chain Metrics");

    if let Some(error) = &record.error {
        let _ = writeln!(out, "Data collection failed for this subnet: {error}");
        out.push('\n');
        return;
    }

    let _ = writeln!(out, "- **Registered:** {}", opt_bool(record.exists));
    let _ = writeln!(out, "- **Active:** {}", opt_bool(record.is_active));
    let _ = writeln!(
        out,
        "- **Owner Hotkey:** {}",
        record.owner_hotkey.as_deref().unwrap_or("n/a")
    );
    let _ = match record.price {
        Some(price) => writeln!(out, "- **Price (TAO):** {price}"),
        None => writeln!(out, "- **Price (TAO):** n/a"),
    };
    let _ = writeln!(out, "- **Collected At (Unix):** {}", record.last_update);
    out.push('\n');

    let _ = writeln!(out, "## Hyperparameters");
    match &record.hyperparameters {
        Some(params) if !params.is_empty() => {
            let _ = writeln!(out, "| Parameter | Value |");
            let _ = writeln!(out, "|-----------|-------|");
            for (key, value) in params {
                let _ = writeln!(out, "| {key} | {value} |");
            }
        }
        _ => {
            let _ = writeln!(out, "No hyperparameters available.");
        }
    }
    out.push('\n');
}

/// Placeholder sections, refined later by a live agent. Baseline
/// text matches the profile template used across the data set;
/// the Primary Function section takes an already-gathered
/// description when one exists.
fn render_placeholders(out: &mut String, description: Option<&str>) {
    let function =
        description.unwrap_or("Description not yet available; will update soon.");
    let _ = writeln!(out, "**Primary Function:** {function}");
    out.push('\n');
    out.push_str(
        "**Problem It Solves:** TBD (auto-fill by live agent or add rules).\n\
         \n\
         **Target Audience:**\n\
         - Developers / users of this subnet\n\
         - Investors tracking Bittensor subnets\n\
         \n\
         **Projected Growth Score (1–10):** 7 — baseline; refined by live market signals.\n\
         \n\
         **Conviction Scores**\n\
         - **Short-term (1–3 mo):** 50 — baseline; sentiment will update live.\n\
         - **Medium-term (3–12 mo):** 60 — baseline; dev progress updates live.\n\
         - **Long-term (1+ yr):** 70 — baseline; macro fit updates live.\n\
         \n\
         **Buy/Sell Conviction Meter:** 55 — baseline synthesis of fundamentals + sentiment.\n\
         \n\
         **Trending / Alerts (last 48h):** Checked by live agent.\n\
         \n\
         **Official Link:** (website or X will be attached by live agent)\n",
    );
}

fn opt_bool(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "n/a",
    }
}
