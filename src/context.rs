//! Where a deploy reads from and writes to.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::device::DeviceLocator;
use crate::manifest::DeployManifest;

pub struct DeployContext {
    /// Directory holding `code.py`, `lib/` and the optional `deploy.toml`.
    pub project_dir: PathBuf,
    /// Mounted CIRCUITPY volume.
    pub device: PathBuf,
    pub manifest: DeployManifest,
}

impl DeployContext {
    pub fn new(project_dir: PathBuf, device: PathBuf, manifest: DeployManifest) -> Self {
        Self {
            project_dir,
            device,
            manifest,
        }
    }

    /// Context for the current directory. Without an explicit device the
    /// mount point is derived from `USER`.
    pub fn from_cwd(device: Option<PathBuf>) -> Result<Self> {
        let project_dir = std::env::current_dir().context("resolving current directory")?;
        let manifest = DeployManifest::load(&project_dir)?;
        let device = match device {
            Some(device) => device,
            None => DeviceLocator::from_env()?.resolve(),
        };
        Ok(Self::new(project_dir, device, manifest))
    }
}
