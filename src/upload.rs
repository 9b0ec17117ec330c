//! Copy the manifest onto the mounted device.
//!
//! Files are copied one at a time in manifest order and the first failure
//! aborts the rest. CircuitPython soft-reboots the board whenever the
//! drive is written, so files whose content already matches are skipped.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// What happened to one file during an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Written to the device.
    Copied,
    /// Already on the device with identical content; not written.
    Unchanged,
}

/// One manifest entry after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Path relative to both the project and the device.
    pub relative: PathBuf,
    /// Full path on the device.
    pub destination: PathBuf,
    pub status: FileStatus,
}

/// Per-file outcome of an [`upload`], in manifest order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub files: Vec<UploadedFile>,
}

impl UploadReport {
    pub fn copied(&self) -> usize {
        self.count(FileStatus::Copied)
    }

    pub fn unchanged(&self) -> usize {
        self.count(FileStatus::Unchanged)
    }

    fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Copy every `files` entry from `project_dir` to the same relative path
/// under `device`, printing one line per file to stdout.
pub fn upload(project_dir: &Path, device: &Path, files: &[PathBuf]) -> Result<UploadReport> {
    upload_with_progress(project_dir, device, files, &mut std::io::stdout())
}

/// [`upload`] with progress lines written to `progress`. Each file's `cp`
/// line is written before the file is touched, so a failing file is the
/// last one listed.
pub fn upload_with_progress(
    project_dir: &Path,
    device: &Path,
    files: &[PathBuf],
    progress: &mut impl Write,
) -> Result<UploadReport> {
    if !device.is_dir() {
        bail!(
            "device path '{}' does not exist or is not a directory; is the board mounted?",
            device.display()
        );
    }

    let mut report = UploadReport::default();
    for relative in files {
        let src = project_dir.join(relative);
        let dst = device.join(relative);
        writeln!(progress, "[upload] cp {} {}", src.display(), dst.display())?;
        let status = copy_if_changed(&src, &dst)
            .with_context(|| format!("uploading '{}'", relative.display()))?;
        if status == FileStatus::Unchanged {
            writeln!(progress, "[upload] unchanged {}", dst.display())?;
        }
        report.files.push(UploadedFile {
            relative: relative.clone(),
            destination: dst,
            status,
        });
    }
    Ok(report)
}

/// Copy `src` to `dst` unless `dst` already holds identical bytes.
pub fn copy_if_changed(src: &Path, dst: &Path) -> Result<FileStatus> {
    if !src.is_file() {
        bail!("file not found: {}", src.display());
    }
    if dst.is_file() && sha256_file(src)? == sha256_file(dst)? {
        return Ok(FileStatus::Unchanged);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    write_via_tmp(src, dst)?;
    Ok(FileStatus::Copied)
}

fn write_via_tmp(src: &Path, dst: &Path) -> Result<()> {
    let tmp = tmp_sibling(dst)?;
    let result = (|| -> Result<()> {
        let mut reader = File::open(src).with_context(|| format!("opening '{}'", src.display()))?;
        let mut writer =
            File::create(&tmp).with_context(|| format!("creating '{}'", tmp.display()))?;
        std::io::copy(&mut reader, &mut writer)
            .with_context(|| format!("copying '{}' to '{}'", src.display(), tmp.display()))?;
        writer.flush()?;
        // FAT drives on USB are write-cached; force the bytes out before the rename.
        writer
            .sync_all()
            .with_context(|| format!("syncing '{}'", tmp.display()))?;
        fs::rename(&tmp, dst).with_context(|| {
            format!("renaming '{}' -> '{}'", tmp.display(), dst.display())
        })?;
        Ok(())
    })();

    if result.is_err() && tmp.exists() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn tmp_sibling(dst: &Path) -> Result<PathBuf> {
    let name = dst
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("destination has no file name: {}", dst.display()))?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".upload-tmp");
    Ok(dst.with_file_name(tmp_name))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r
            .read(&mut buf)
            .with_context(|| format!("reading '{}'", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
