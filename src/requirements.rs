//! Install the CircuitPython libraries the player imports onto the device.
//!
//! Library bundles are managed with `circup`, which reads a pip-style
//! requirements file and writes the matching `.mpy` packages into the
//! device's `lib/` directory.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::preflight::check_required_tools;

pub const CIRCUP: &str = "circup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementsOutcome {
    /// The project has no requirements file.
    Skipped,
    Installed,
}

/// Install the libraries listed in `requirements` (relative to
/// `project_dir`) onto `device` with `circup`.
///
/// # Returns
///
/// * `Ok(Skipped)` if the project has no requirements file
/// * `Ok(Installed)` once `circup` exits successfully
/// * `Err` if `circup` is not on `PATH` or fails
pub fn install_requirements(
    project_dir: &Path,
    device: &Path,
    requirements: &Path,
) -> Result<RequirementsOutcome> {
    install_with(CIRCUP, project_dir, device, requirements)
}

pub(crate) fn install_with(
    tool: &str,
    project_dir: &Path,
    device: &Path,
    requirements: &Path,
) -> Result<RequirementsOutcome> {
    let file = project_dir.join(requirements);
    if !file.is_file() {
        println!(
            "[requirements] no '{}' in project, skipping",
            requirements.display()
        );
        return Ok(RequirementsOutcome::Skipped);
    }

    check_required_tools(&[(tool, "circup")])?;

    println!(
        "[requirements] {tool} --path {} install -r {}",
        device.display(),
        file.display()
    );
    let output = Command::new(tool)
        .arg("--path")
        .arg(device)
        .arg("install")
        .arg("-r")
        .arg(&file)
        .output()
        .with_context(|| format!("running {tool} for '{}'", file.display()))?;

    if output.status.success() {
        return Ok(RequirementsOutcome::Installed);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!(
        "{tool} failed installing '{}' onto '{}': {}\n{}",
        file.display(),
        device.display(),
        stdout.trim(),
        stderr.trim()
    )
}
