use crate::utils::Result;
use std::path::Path;
use std::process::{Command, Output};

/// Runs one external tool invocation to completion, capturing its output.
/// A non-zero exit or a spawn failure surfaces the tool name and stderr.
fn run_tool(tool: &str, command: &mut Command) -> Result<Output> {
    log::debug!("Running {:?}", command);
    let output = command
        .output()
        .map_err(|e| format!("Failed to run {}: {}", tool, e))?;
    if !output.status.success() {
        return Err(format!(
            "{} failed ({}): {}",
            tool,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(output)
}

/// Searches one genome's proteins against the combined profile library,
/// leaving the per-domain table at `table_out`. The human-readable report on
/// stdout is discarded.
pub fn run_hmmsearch(exe: &str, markers: &Path, proteins: &Path, table_out: &Path) -> Result<()> {
    let mut command = Command::new(exe);
    command
        .arg("--noali")
        .arg("--domtblout")
        .arg(table_out)
        .arg(markers)
        .arg(proteins);
    run_tool("hmmsearch", &mut command)?;
    Ok(())
}

/// Aligns one profile's sequence set against its model. Returns the aligner's
/// stdout: match-column-trimmed, identifier-prefixed alignment text.
pub fn run_hmmalign(exe: &str, model: &Path, seqs: &Path) -> Result<Vec<u8>> {
    let mut command = Command::new(exe);
    command
        .arg("--trim")
        .arg("--outformat")
        .arg("PSIBLAST")
        .arg(model)
        .arg(seqs);
    Ok(run_tool("hmmalign", &mut command)?.stdout)
}

/// Infers the tree from the filtered supermatrix, writing the Newick text
/// that the tool emits on stdout to `tree_out`.
pub fn run_fasttree(exe: &str, alignment: &Path, tree_out: &Path) -> Result<()> {
    let mut command = Command::new(exe);
    command.arg("-quiet").arg(alignment);
    let output = run_tool("FastTree", &mut command)?;
    std::fs::write(tree_out, &output.stdout)
        .map_err(|e| format!("Failed to write {}: {}", tree_out.display(), e))
}
