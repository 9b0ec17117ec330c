//! Mount-point resolution for the board's CIRCUITPY volume.
//!
//! Desktop Linux automounters disagree on where removable media lands:
//! udisks2 on most distros uses `/media/$USER/<label>`, while others
//! (Arch, Fedora) use `/run/media/$USER/<label>`. The first root wins if
//! its mount directory exists, otherwise the second is used unchecked.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Volume label CircuitPython gives its USB drive.
pub const VOLUME_LABEL: &str = "CIRCUITPY";

/// Mount roots, in preference order.
pub const MOUNT_ROOTS: [&str; 2] = ["/media", "/run/media"];

/// Finds the CIRCUITPY mount point for one user.
#[derive(Debug, Clone)]
pub struct DeviceLocator {
    user: String,
    roots: [PathBuf; 2],
    volume_label: String,
}

impl DeviceLocator {
    /// Locator over the standard mount roots ([`MOUNT_ROOTS`]).
    pub fn new(user: &str) -> Result<Self> {
        Self::with_roots(
            user,
            [PathBuf::from(MOUNT_ROOTS[0]), PathBuf::from(MOUNT_ROOTS[1])],
        )
    }

    /// Locator over arbitrary mount roots, primary first.
    pub fn with_roots(user: &str, roots: [PathBuf; 2]) -> Result<Self> {
        if user.is_empty() {
            bail!("cannot resolve device path: user name is empty");
        }
        if user.trim() != user {
            bail!(
                "cannot resolve device path: user name '{}' has surrounding whitespace",
                user
            );
        }
        if user.contains('/') {
            bail!("cannot resolve device path: invalid user name '{}'", user);
        }
        Ok(Self {
            user: user.to_string(),
            roots,
            volume_label: VOLUME_LABEL.to_string(),
        })
    }

    /// Build a locator from the `USER` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_user_var(std::env::var("USER").ok())
    }

    /// Build a locator from an already-read `USER` value.
    pub fn from_user_var(user: Option<String>) -> Result<Self> {
        match user {
            Some(user) if !user.is_empty() => Self::new(&user),
            _ => bail!("USER is not set; pass --device <path> to choose the mount point"),
        }
    }

    /// User name the mount paths are built from, exactly as given.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Both candidate mount points, primary first.
    pub fn candidates(&self) -> [PathBuf; 2] {
        [
            self.mount_under(&self.roots[0]),
            self.mount_under(&self.roots[1]),
        ]
    }

    /// Pick the device path. The fallback is returned even if it does not
    /// exist; copying into it then reports the missing device.
    pub fn resolve(&self) -> PathBuf {
        let [primary, fallback] = self.candidates();
        if primary.is_dir() {
            primary
        } else {
            fallback
        }
    }

    fn mount_under(&self, root: &Path) -> PathBuf {
        root.join(&self.user).join(&self.volume_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn locator(temp: &TempDir, user: &str) -> DeviceLocator {
        DeviceLocator::with_roots(
            user,
            [temp.path().join("media"), temp.path().join("run/media")],
        )
        .unwrap()
    }

    #[test]
    fn resolves_primary_when_present() {
        let temp = TempDir::new().unwrap();
        let primary = temp.path().join("media/u/CIRCUITPY");
        fs::create_dir_all(&primary).unwrap();
        fs::create_dir_all(temp.path().join("run/media/u/CIRCUITPY")).unwrap();

        assert_eq!(locator(&temp, "u").resolve(), primary);
    }

    #[test]
    fn falls_back_when_primary_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            locator(&temp, "u").resolve(),
            temp.path().join("run/media/u/CIRCUITPY")
        );
    }

    #[test]
    fn primary_that_is_a_file_is_not_a_mount() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("media/u")).unwrap();
        fs::write(temp.path().join("media/u/CIRCUITPY"), "").unwrap();

        assert_eq!(
            locator(&temp, "u").resolve(),
            temp.path().join("run/media/u/CIRCUITPY")
        );
    }

    #[test]
    fn default_candidates_follow_both_conventions() {
        let candidates = DeviceLocator::new("alice").unwrap().candidates();
        assert_eq!(candidates[0], PathBuf::from("/media/alice/CIRCUITPY"));
        assert_eq!(candidates[1], PathBuf::from("/run/media/alice/CIRCUITPY"));
    }

    #[test]
    fn rejects_empty_or_path_like_users() {
        assert!(DeviceLocator::new("").is_err());
        assert!(DeviceLocator::new("  ").is_err());
        assert!(DeviceLocator::new("../root").is_err());
    }

    #[test]
    fn user_with_surrounding_whitespace_is_rejected_not_trimmed() {
        assert!(DeviceLocator::new(" u").is_err());
        assert!(DeviceLocator::new("u\n").is_err());
        assert_eq!(DeviceLocator::new("u").unwrap().user(), "u");
    }

    #[test]
    fn unset_or_empty_user_variable_is_an_error() {
        let err = DeviceLocator::from_user_var(None).unwrap_err();
        assert!(err.to_string().contains("USER is not set"));
        assert!(DeviceLocator::from_user_var(Some(String::new())).is_err());

        let locator = DeviceLocator::from_user_var(Some("alice".to_string())).unwrap();
        assert_eq!(
            locator.candidates()[0],
            PathBuf::from("/media/alice/CIRCUITPY")
        );
    }
}
