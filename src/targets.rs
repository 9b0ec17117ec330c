//! The deploy targets: `all`, `upload`, `requirements`, and `check`.

use anyhow::{bail, Result};
use std::path::Path;

use crate::context::DeployContext;
use crate::player::{PlayerConfig, SdCard};
use crate::requirements::{install_requirements, RequirementsOutcome};
use crate::upload::{upload, UploadReport};

pub const DEFAULT_TARGET: Target = Target::All;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `upload` then `requirements`.
    All,
    Upload,
    Requirements,
}

impl Target {
    /// Parse a target name as given on the command line.
    ///
    /// `check` is not a [`Target`]: it takes an SD root and needs no device.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(Target::All),
            "upload" => Ok(Target::Upload),
            "requirements" => Ok(Target::Requirements),
            other => bail!(
                "unknown target '{}'; expected one of: all, upload, requirements, check",
                other
            ),
        }
    }
}

pub fn run(ctx: &DeployContext, target: Target) -> Result<()> {
    match target {
        Target::All => {
            run_upload(ctx)?;
            run_requirements(ctx)?;
        }
        Target::Upload => {
            run_upload(ctx)?;
        }
        Target::Requirements => {
            run_requirements(ctx)?;
        }
    }
    Ok(())
}

pub fn run_upload(ctx: &DeployContext) -> Result<UploadReport> {
    println!("[upload] device {}", ctx.device.display());
    let files = ctx.manifest.expand(&ctx.project_dir)?;
    let report = upload(&ctx.project_dir, &ctx.device, &files)?;
    println!(
        "[upload] done: {} copied, {} unchanged",
        report.copied(),
        report.unchanged()
    );
    Ok(report)
}

pub fn run_requirements(ctx: &DeployContext) -> Result<RequirementsOutcome> {
    install_requirements(&ctx.project_dir, &ctx.device, ctx.manifest.requirements())
}

/// Validate an SD card's `player.json` and list its songs the way the
/// board prints them at boot.
pub fn check(sd_root: &Path) -> Result<PlayerConfig> {
    let sd = SdCard::new(sd_root);
    let config = PlayerConfig::load(&sd)?;

    for index in &config.rejected {
        eprintln!("[check] Invalid song configuration at {index}");
    }
    if let Some(volume) = config.volume {
        println!("[check] volume {volume:.2}");
    }
    if let Some(channel) = config.midi_channel {
        println!("[check] midi channel {channel}");
    }
    println!("\nAvailable Song Data");
    for song in &config.songs {
        println!("\n{song}");
    }
    Ok(config)
}
