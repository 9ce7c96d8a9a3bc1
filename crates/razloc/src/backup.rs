//! Run-scoped backups of changed files and their restore.
//!
//! Every file a run changes is first snapshotted into a gzip-compressed tar
//! archive under [`BACKUP_DIR`]. The archive is created on the first real
//! write and finalized by [`BackupService::close`], which appends a
//! [`MANIFEST`] mapping each entry to the hash of the content the run wrote.
//! [`restore`] puts the snapshots of the newest archive back, skipping files
//! that were edited after the run.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use razloc_std::error::prelude::*;
use razloc_std::hash::{file_sha256_hex, sha256_hex};
use razloc_std::path::project_relative;

/// The folder, next to the project file, holding the archives.
pub const BACKUP_DIR: &str = ".razloc-backup";
/// The archive entry recording the content hashes.
pub const MANIFEST: &str = "MANIFEST.json";

const ARCHIVE_PREFIX: &str = "backup-";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Relative path to the sha256 of the content written by the run.
type Manifest = BTreeMap<String, String>;

/// The lifecycle of the archive of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    /// Nothing was archived yet.
    Idle,
    /// The archive accepts snapshots.
    Open,
    /// The archive was finalized.
    Closed,
}

struct OpenArchive {
    path: PathBuf,
    builder: tar::Builder<GzEncoder<File>>,
    manifest: Manifest,
}

enum ArchiveState {
    Idle,
    Open(OpenArchive),
    Closed(Option<PathBuf>),
}

/// Writes project files, snapshotting their previous content first.
pub struct BackupService {
    base: PathBuf,
    enabled: bool,
    dry_run: bool,
    state: ArchiveState,
}

impl BackupService {
    /// Creates the service for the project in `project_dir`. Without
    /// `enabled` files are written without snapshots; with `dry_run` nothing
    /// is written at all.
    pub fn new(project_dir: &Path, enabled: bool, dry_run: bool) -> Self {
        Self {
            base: project_dir.to_owned(),
            enabled,
            dry_run,
            state: ArchiveState::Idle,
        }
    }

    /// The state of this run's archive.
    pub fn state(&self) -> BackupState {
        match self.state {
            ArchiveState::Idle => BackupState::Idle,
            ArchiveState::Open(_) => BackupState::Open,
            ArchiveState::Closed(_) => BackupState::Closed,
        }
    }

    /// The archive of this run, once it exists.
    pub fn archive_path(&self) -> Option<&Path> {
        match &self.state {
            ArchiveState::Open(open) => Some(&open.path),
            ArchiveState::Closed(path) => path.as_deref(),
            ArchiveState::Idle => None,
        }
    }

    /// Writes `content` to `path`.
    ///
    /// Files already holding `content` are left alone. Otherwise the current
    /// content of an existing file is archived before it is overwritten.
    pub fn write_with_backup(&mut self, path: &Path, content: &str) -> Result<()> {
        let new_hash = sha256_hex(content);
        let old_hash = file_sha256_hex(path);
        if old_hash.as_deref() == Some(new_hash.as_str()) {
            log::debug!("unchanged {}", path.display());
            return Ok(());
        }

        if self.dry_run {
            log::info!("would write {}", path.display());
            log::debug!("new content of {}:\n{content}", path.display());
            return Ok(());
        }

        if self.enabled && old_hash.is_some() {
            self.snapshot(path, new_hash)?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(error_once_map!("create dir", path: parent.display()))?;
        }
        std::fs::write(path, content).map_err(error_once_map!("write file", path: path.display()))?;
        log::info!("wrote {}", path.display());
        Ok(())
    }

    fn snapshot(&mut self, path: &Path, new_hash: String) -> Result<()> {
        let Some(rel) = project_relative(&self.base, path) else {
            bail!("{} is outside of {}", path.display(), self.base.display());
        };

        if matches!(self.state, ArchiveState::Idle) {
            self.state = ArchiveState::Open(self.create_archive()?);
        }
        let ArchiveState::Open(archive) = &mut self.state else {
            bail!("backup archive is already closed");
        };

        // A file written twice keeps its snapshot from before the run.
        if !archive.manifest.contains_key(&rel) {
            let data = std::fs::read(path).map_err(error_once_map!("read file", path: path.display()))?;
            append(&mut archive.builder, &rel, &data)?;
            log::debug!("archived {rel}");
        }
        archive.manifest.insert(rel, new_hash);
        Ok(())
    }

    fn create_archive(&self) -> Result<OpenArchive> {
        let dir = self.base.join(BACKUP_DIR);
        std::fs::create_dir_all(&dir).map_err(error_once_map!("create backup dir", path: dir.display()))?;

        let stamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let mut path = dir.join(format!("{ARCHIVE_PREFIX}{stamp}{ARCHIVE_SUFFIX}"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{ARCHIVE_PREFIX}{stamp}_{n}{ARCHIVE_SUFFIX}"));
            n += 1;
        }

        let file = File::create(&path).map_err(error_once_map!("create backup", path: path.display()))?;
        let builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        log::info!("created backup {}", path.display());
        Ok(OpenArchive {
            path,
            builder,
            manifest: Manifest::new(),
        })
    }

    /// Finalizes the archive, returning its path if one was created. Later
    /// writes are rejected once an archive was closed.
    pub fn close(&mut self) -> Result<Option<PathBuf>> {
        match std::mem::replace(&mut self.state, ArchiveState::Closed(None)) {
            ArchiveState::Idle => Ok(None),
            ArchiveState::Closed(path) => {
                self.state = ArchiveState::Closed(path.clone());
                Ok(path)
            }
            ArchiveState::Open(archive) => {
                let path = archive.path.clone();
                self.state = ArchiveState::Closed(Some(path.clone()));
                finish(archive)?;
                log::info!("closed backup {}", path.display());
                Ok(Some(path))
            }
        }
    }
}

impl Drop for BackupService {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::error!("failed to finalize backup: {err}");
        }
    }
}

fn append<W: std::io::Write>(builder: &mut tar::Builder<W>, rel: &str, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
    builder
        .append_data(&mut header, rel, data)
        .map_err(error_once_map!("append backup entry", path: rel))
}

fn finish(mut archive: OpenArchive) -> Result<()> {
    let manifest = serde_json::to_vec_pretty(&archive.manifest).context("write backup manifest")?;
    append(&mut archive.builder, MANIFEST, &manifest)?;
    let encoder = archive.builder.into_inner().context("finish backup")?;
    let file = encoder.finish().context("finish backup")?;
    file.sync_all().context("finish backup")
}

/// The outcome of [`restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// The archive restored from.
    pub archive: PathBuf,
    /// Files put back, relative to the project.
    pub restored: Vec<String>,
    /// Files changed after the backup and left alone.
    pub skipped: Vec<String>,
}

/// The newest archive in the backup folder of `project_dir`.
pub fn latest_archive(project_dir: &Path) -> Result<Option<PathBuf>> {
    let dir = project_dir.join(BACKUP_DIR);
    if !dir.is_dir() {
        return Ok(None);
    }
    let entries = std::fs::read_dir(&dir).map_err(error_once_map!("read backup dir", path: dir.display()))?;
    let latest = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| {
            let order = archive_order(path.file_name()?.to_str()?)?;
            Some((order, path))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, path)| path);
    Ok(latest)
}

/// Orders archive names by timestamp, then by the numeric collision suffix.
fn archive_order(name: &str) -> Option<(String, u32)> {
    let stem = name.strip_prefix(ARCHIVE_PREFIX)?.strip_suffix(ARCHIVE_SUFFIX)?;
    match stem.split_once('_') {
        Some((stamp, n)) => Some((stamp.to_owned(), n.parse().ok()?)),
        None => Some((stem.to_owned(), 0)),
    }
}

fn read_archive(path: &Path) -> Result<(Vec<(String, Vec<u8>)>, Manifest)> {
    let file = File::open(path).map_err(error_once_map!("open backup", path: path.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut files = Vec::new();
    let mut manifest = None;
    for entry in archive.entries().context("read backup")? {
        let mut entry = entry.context("read backup")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().context("read backup")?.to_string_lossy().into_owned();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).context("read backup")?;
        if name == MANIFEST {
            manifest = Some(serde_json::from_slice::<Manifest>(&data).context("read backup manifest")?);
        } else {
            files.push((name, data));
        }
    }

    match manifest {
        Some(manifest) => Ok((files, manifest)),
        None => bail!("backup {} was never finalized", path.display()),
    }
}

/// Restores the newest backup of the project in `project_dir`.
///
/// A file whose content no longer matches what the backed up run wrote is
/// skipped unless `force` is set.
pub fn restore(project_dir: &Path, force: bool, dry_run: bool) -> Result<RestoreReport> {
    let Some(archive) = latest_archive(project_dir)? else {
        bail!("no backup found in {}", project_dir.join(BACKUP_DIR).display());
    };
    log::info!("restoring from {}", archive.display());
    let (files, manifest) = read_archive(&archive)?;

    let mut report = RestoreReport {
        archive,
        ..Default::default()
    };
    for (rel, data) in files {
        let target = project_dir.join(&rel);
        if project_relative(project_dir, &target).as_deref() != Some(rel.as_str()) {
            log::warn!("ignoring backup entry outside of the project: {rel}");
            continue;
        }

        let current = file_sha256_hex(&target);
        let recorded = manifest.get(&rel);
        let modified = current.is_some() && current.as_ref() != recorded;
        if modified && !force {
            log::warn!("skipping {rel}: changed after the backup");
            report.skipped.push(rel);
            continue;
        }

        if dry_run {
            log::info!("would restore {rel}");
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(error_once_map!("create dir", path: parent.display()))?;
            }
            std::fs::write(&target, &data).map_err(error_once_map!("restore file", path: target.display()))?;
            log::info!("restored {rel}");
        }
        report.restored.push(rel);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut backup = BackupService::new(dir.path(), true, false);

        let new_file = dir.path().join("Pages").join("New.razor");
        backup.write_with_backup(&new_file, "<h1>new</h1>").unwrap();
        assert_eq!(backup.state(), BackupState::Idle);
        assert_eq!(std::fs::read_to_string(&new_file).unwrap(), "<h1>new</h1>");

        backup.write_with_backup(&new_file, "<h1>new</h1>").unwrap();
        assert_eq!(backup.state(), BackupState::Idle);

        backup.write_with_backup(&new_file, "<h1>newer</h1>").unwrap();
        assert_eq!(backup.state(), BackupState::Open);

        let path = backup.close().unwrap().unwrap();
        assert_eq!(backup.state(), BackupState::Closed);
        assert!(path.starts_with(dir.path().join(BACKUP_DIR)));

        let (files, manifest) = read_archive(&path).unwrap();
        assert_eq!(files, vec![("Pages/New.razor".to_owned(), b"<h1>new</h1>".to_vec())]);
        assert_eq!(manifest["Pages/New.razor"], sha256_hex("<h1>newer</h1>"));
    }

    #[test]
    fn disabled_backup_only_writes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Login.razor");
        std::fs::write(&file, "old").unwrap();

        let mut backup = BackupService::new(dir.path(), false, false);
        backup.write_with_backup(&file, "new").unwrap();
        assert_eq!(backup.close().unwrap(), None);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new");
        assert!(!dir.path().join(BACKUP_DIR).exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Login.razor");
        std::fs::write(&file, "old").unwrap();

        let mut backup = BackupService::new(dir.path(), true, true);
        backup.write_with_backup(&file, "new").unwrap();
        assert_eq!(backup.close().unwrap(), None);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old");
    }

    #[test]
    fn unfinished_archive_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let backups = dir.path().join(BACKUP_DIR);
        std::fs::create_dir_all(&backups).unwrap();

        let file = File::create(backups.join("backup-2024-01-01T00-00-00.tar.gz")).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        append(&mut builder, "Login.razor", b"old").unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = restore(dir.path(), false, false).unwrap_err();
        assert!(err.to_string().contains("never finalized"), "{err}");
    }

    #[test]
    fn newest_archive_wins() {
        let dir = tempfile::tempdir().unwrap();
        let backups = dir.path().join(BACKUP_DIR);
        std::fs::create_dir_all(&backups).unwrap();
        for name in [
            "backup-2024-01-01T00-00-00.tar.gz",
            "backup-2024-03-01T00-00-00.tar.gz",
            "backup-2024-03-01T00-00-00_1.tar.gz",
            "notes.txt",
        ] {
            std::fs::write(backups.join(name), "").unwrap();
        }
        assert_eq!(
            latest_archive(dir.path()).unwrap(),
            Some(backups.join("backup-2024-03-01T00-00-00_1.tar.gz"))
        );
    }

    #[test]
    fn collision_suffixes_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let backups = dir.path().join(BACKUP_DIR);
        std::fs::create_dir_all(&backups).unwrap();
        for name in [
            "backup-2024-03-01T00-00-00.tar.gz",
            "backup-2024-03-01T00-00-00_2.tar.gz",
            "backup-2024-03-01T00-00-00_10.tar.gz",
            "backup-2024-03-01T00-00-00_x.tar.gz",
        ] {
            std::fs::write(backups.join(name), "").unwrap();
        }
        assert_eq!(
            latest_archive(dir.path()).unwrap(),
            Some(backups.join("backup-2024-03-01T00-00-00_10.tar.gz"))
        );
    }
}
