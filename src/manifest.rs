//! What gets copied onto the device.
//!
//! Without a `deploy.toml` the manifest is the player's entry point and the
//! MIDI parser library it imports. A project may override both lists:
//!
//! ```toml
//! [deploy]
//! files = ["code.py", "lib/umidiparser.py"]
//! requirements = "requirements.txt"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILENAME: &str = "deploy.toml";
pub const DEFAULT_FILES: &[&str] = &["code.py", "lib/umidiparser.py"];
pub const DEFAULT_REQUIREMENTS: &str = "requirements.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployManifest {
    files: Vec<PathBuf>,
    requirements: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestToml {
    deploy: DeployToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeployToml {
    files: Option<Vec<String>>,
    requirements: Option<String>,
}

impl Default for DeployManifest {
    fn default() -> Self {
        Self {
            files: DEFAULT_FILES.iter().map(PathBuf::from).collect(),
            requirements: PathBuf::from(DEFAULT_REQUIREMENTS),
        }
    }
}

impl DeployManifest {
    /// Load `deploy.toml` from the project directory, or the defaults when
    /// the project has none.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MANIFEST_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading deploy manifest '{}'", path.display()))?;
        Self::parse(&raw, &path)
    }

    pub fn parse(raw: &str, origin: &Path) -> Result<Self> {
        let parsed: ManifestToml = toml::from_str(raw)
            .with_context(|| format!("parsing deploy manifest '{}'", origin.display()))?;
        let defaults = Self::default();

        let files = match parsed.deploy.files {
            None => defaults.files,
            Some(entries) => {
                if entries.is_empty() {
                    bail!(
                        "invalid deploy manifest '{}': files must not be empty",
                        origin.display()
                    );
                }
                let mut files: Vec<PathBuf> = Vec::with_capacity(entries.len());
                for entry in &entries {
                    let path = parse_relative_path(entry, "files").with_context(|| {
                        format!("invalid deploy manifest '{}'", origin.display())
                    })?;
                    if !files.contains(&path) {
                        files.push(path);
                    }
                }
                files
            }
        };

        let requirements = match parsed.deploy.requirements {
            None => defaults.requirements,
            Some(raw) => parse_relative_path(&raw, "requirements")
                .with_context(|| format!("invalid deploy manifest '{}'", origin.display()))?,
        };

        Ok(Self {
            files,
            requirements,
        })
    }

    /// Manifest entries in declaration order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn requirements(&self) -> &Path {
        &self.requirements
    }

    /// Resolve entries against the project directory. Directory entries
    /// become the files beneath them, in file-name order; dotfiles and
    /// `__pycache__` are left behind. Missing entries are kept so the
    /// copy step can report them.
    pub fn expand(&self, project_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut expanded = Vec::new();
        for entry in &self.files {
            let full = project_dir.join(entry);
            if !full.is_dir() {
                push_unique(&mut expanded, entry.clone());
                continue;
            }
            let walker = WalkDir::new(&full)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|ent| !is_skipped(ent.file_name().to_str()));
            for ent in walker {
                let ent = ent.with_context(|| format!("walking '{}'", full.display()))?;
                if !ent.file_type().is_file() {
                    continue;
                }
                let rel = ent.path().strip_prefix(project_dir).with_context(|| {
                    format!(
                        "'{}' is outside project directory '{}'",
                        ent.path().display(),
                        project_dir.display()
                    )
                })?;
                push_unique(&mut expanded, rel.to_path_buf());
            }
        }
        Ok(expanded)
    }
}

fn is_skipped(name: Option<&str>) -> bool {
    match name {
        Some(name) => name.starts_with('.') || name == "__pycache__",
        None => true,
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: PathBuf) {
    if !list.contains(&path) {
        list.push(path);
    }
}

pub(crate) fn parse_relative_path(raw: &str, field: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{field} contains an empty path");
    }
    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        bail!("{field} must be relative, got absolute path '{}'", raw);
    }
    for component in candidate.components() {
        if matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            bail!(
                "{field} contains invalid traversal/root component in '{}'",
                raw
            );
        }
    }
    Ok(candidate.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn origin() -> PathBuf {
        PathBuf::from("deploy.toml")
    }

    #[test]
    fn default_file_list_is_entry_point_then_parser() {
        let manifest = DeployManifest::default();
        assert_eq!(
            manifest.files(),
            &[PathBuf::from("code.py"), PathBuf::from("lib/umidiparser.py")]
        );
        assert_eq!(manifest.requirements(), Path::new("requirements.txt"));
    }

    #[test]
    fn load_without_manifest_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let manifest = DeployManifest::load(temp.path()).unwrap();
        assert_eq!(manifest, DeployManifest::default());
    }

    #[test]
    fn parse_overrides_and_dedups() {
        let manifest = DeployManifest::parse(
            "[deploy]\nfiles = [\"code.py\", \"lib/a.py\", \"code.py\"]\nrequirements = \"reqs.txt\"\n",
            &origin(),
        )
        .unwrap();
        assert_eq!(
            manifest.files(),
            &[PathBuf::from("code.py"), PathBuf::from("lib/a.py")]
        );
        assert_eq!(manifest.requirements(), Path::new("reqs.txt"));
    }

    #[test]
    fn parse_rejects_traversal_and_absolute_paths() {
        assert!(DeployManifest::parse("[deploy]\nfiles = [\"../code.py\"]\n", &origin()).is_err());
        assert!(DeployManifest::parse("[deploy]\nfiles = [\"/etc/passwd\"]\n", &origin()).is_err());
        assert!(
            DeployManifest::parse("[deploy]\nrequirements = \"../r.txt\"\n", &origin()).is_err()
        );
    }

    #[test]
    fn parse_rejects_empty_list_and_unknown_keys() {
        assert!(DeployManifest::parse("[deploy]\nfiles = []\n", &origin()).is_err());
        assert!(DeployManifest::parse("[deploy]\ndevice = \"/media\"\n", &origin()).is_err());
    }

    #[test]
    fn expand_walks_directories_in_name_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("lib/pkg/__pycache__")).unwrap();
        fs::write(root.join("code.py"), "print(1)\n").unwrap();
        fs::write(root.join("lib/pkg/b.py"), "").unwrap();
        fs::write(root.join("lib/pkg/a.py"), "").unwrap();
        fs::write(root.join("lib/pkg/.hidden"), "").unwrap();
        fs::write(root.join("lib/pkg/__pycache__/a.cpython.pyc"), "").unwrap();

        let manifest =
            DeployManifest::parse("[deploy]\nfiles = [\"code.py\", \"lib\"]\n", &origin()).unwrap();
        let files = manifest.expand(root).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("code.py"),
                PathBuf::from("lib/pkg/a.py"),
                PathBuf::from("lib/pkg/b.py"),
            ]
        );
    }

    #[test]
    fn expand_keeps_missing_entries() {
        let temp = TempDir::new().unwrap();
        let files = DeployManifest::default().expand(temp.path()).unwrap();
        assert_eq!(files, DeployManifest::default().files());
    }
}
