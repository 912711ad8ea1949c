//! Staging/sync engine
//!
//! Realizes a resolved manifest on disk: directory creation, file copies
//! and symbolic links. Sync is idempotent (re-running with unchanged
//! sources yields the same final state) and never transactional; a
//! partially staged tree is repaired by re-running.

use crate::error::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A resolved description of desired filesystem state
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    /// Directories to create (with all parents)
    #[serde(default)]
    pub mkdir: Vec<PathBuf>,

    /// `[source, destination]` pairs to copy; sources may carry glob
    /// patterns, in which case the destination is a directory
    #[serde(default)]
    pub copy: Vec<(PathBuf, PathBuf)>,

    /// `[source, destination]` pairs to link symbolically
    #[serde(default)]
    pub link: Vec<(PathBuf, PathBuf)>,
}

impl Manifest {
    /// Deserialize a manifest from a resolved YAML value
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_value(value)
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.mkdir.len() + self.copy.len() + self.link.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure policy for a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Abort on the first failing entry
    Strict,

    /// Process every entry, then report all failures as one batch
    ContinueOnError,
}

/// Realize a manifest on disk.
///
/// Entries are processed independently; parent directories are created
/// implicitly, so directory entries never need to precede file entries
/// under them.
pub fn sync(manifest: &Manifest, mode: SyncMode) -> StageResult<()> {
    let mut failures = Vec::new();

    for dir in &manifest.mkdir {
        collect(make_directory(dir), mode, &mut failures)?;
    }
    for (src, dest) in &manifest.copy {
        collect(copy_entry(src, dest), mode, &mut failures)?;
    }
    for (src, dest) in &manifest.link {
        collect(link_entry(src, dest), mode, &mut failures)?;
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(StageError::Batch(failures))
    }
}

fn collect(
    result: StageResult<()>,
    mode: SyncMode,
    failures: &mut Vec<StageError>,
) -> StageResult<()> {
    match (result, mode) {
        (Ok(()), _) => Ok(()),
        (Err(e), SyncMode::Strict) => Err(e),
        (Err(e), SyncMode::ContinueOnError) => {
            failures.push(e);
            Ok(())
        }
    }
}

/// Create a directory and all parents if absent
pub fn make_directory(dir: &Path) -> StageResult<()> {
    fs::create_dir_all(dir).map_err(|e| StageError::Entry {
        action: "create directory",
        src: None,
        dest: dir.to_path_buf(),
        source: e,
    })
}

/// Copy a source to a destination, creating parent directories as needed.
///
/// A source containing glob metacharacters is expanded and every match is
/// copied into the destination directory; zero matches is a failure. A
/// source naming an existing file is always copied literally, so file
/// names containing brackets do not get pattern-expanded.
pub fn copy_entry(src: &Path, dest: &Path) -> StageResult<()> {
    let pattern = src.to_string_lossy();
    if pattern.contains(['*', '?', '[']) && !src.is_file() {
        return copy_glob(&pattern, dest);
    }

    copy_file(src, dest)
}

fn copy_file(src: &Path, dest: &Path) -> StageResult<()> {
    let entry_error = |e: io::Error| StageError::Entry {
        action: "copy",
        src: Some(src.to_path_buf()),
        dest: dest.to_path_buf(),
        source: e,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(entry_error)?;
    }
    fs::copy(src, dest).map_err(entry_error)?;
    Ok(())
}

fn copy_glob(pattern: &str, dest_dir: &Path) -> StageResult<()> {
    let entry_error = |e: io::Error| StageError::Entry {
        action: "copy",
        src: Some(PathBuf::from(pattern)),
        dest: dest_dir.to_path_buf(),
        source: e,
    };

    let matches = glob::glob(pattern)
        .map_err(|e| entry_error(io::Error::new(io::ErrorKind::InvalidInput, e.to_string())))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| entry_error(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

    if matches.is_empty() {
        return Err(entry_error(io::Error::new(
            io::ErrorKind::NotFound,
            "pattern matched no files",
        )));
    }

    for path in matches {
        let name = path.file_name().ok_or_else(|| {
            entry_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "match has no file name",
            ))
        })?;
        copy_file(&path, &dest_dir.join(name))?;
    }
    Ok(())
}

/// Make the destination a symbolic link to the source.
///
/// An existing destination is removed first so re-linking is idempotent.
pub fn link_entry(src: &Path, dest: &Path) -> StageResult<()> {
    let entry_error = |e: io::Error| StageError::Entry {
        action: "link",
        src: Some(src.to_path_buf()),
        dest: dest.to_path_buf(),
        source: e,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(entry_error)?;
    }
    if dest.symlink_metadata().is_ok() {
        fs::remove_file(dest).map_err(entry_error)?;
    }
    make_symlink(src, dest).map_err(entry_error)?;
    Ok(())
}

#[cfg(unix)]
fn make_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn make_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_manifest_from_yaml() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            r#"
mkdir:
  - /tmp/fcst/INPUT
copy:
  - [/fix/global_hyblev.txt, /tmp/fcst/global_hyblev.txt]
link:
  - [/exec/ufs_model.x, /tmp/fcst/ufs_model.x]
"#,
        )
        .unwrap();

        let manifest = Manifest::from_value(value).unwrap();
        assert_eq!(manifest.mkdir.len(), 1);
        assert_eq!(manifest.copy.len(), 1);
        assert_eq!(manifest.link.len(), 1);
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_sync_creates_directories_copies_and_links() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.txt");
        write(&src, "fix data");

        let manifest = Manifest {
            mkdir: vec![temp.path().join("run/RESTART")],
            copy: vec![(src.clone(), temp.path().join("run/source.txt"))],
            link: vec![(src.clone(), temp.path().join("run/source.lnk"))],
        };

        sync(&manifest, SyncMode::Strict).unwrap();

        assert!(temp.path().join("run/RESTART").is_dir());
        assert_eq!(
            fs::read_to_string(temp.path().join("run/source.txt")).unwrap(),
            "fix data"
        );
        let link = temp.path().join("run/source.lnk");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "fix data");
    }

    #[test]
    fn test_sync_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.txt");
        write(&src, "fix data");

        let manifest = Manifest {
            mkdir: vec![temp.path().join("run")],
            copy: vec![(src.clone(), temp.path().join("run/source.txt"))],
            link: vec![(src.clone(), temp.path().join("run/source.lnk"))],
        };

        sync(&manifest, SyncMode::Strict).unwrap();
        sync(&manifest, SyncMode::Strict).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("run/source.txt")).unwrap(),
            "fix data"
        );
        assert!(temp
            .path()
            .join("run/source.lnk")
            .symlink_metadata()
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn test_copy_creates_intermediate_directories() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.txt");
        write(&src, "x");

        // No mkdir entry for the nested destination
        let manifest = Manifest {
            mkdir: vec![],
            copy: vec![(src, temp.path().join("a/b/c/dest.txt"))],
            link: vec![],
        };

        sync(&manifest, SyncMode::Strict).unwrap();
        assert!(temp.path().join("a/b/c/dest.txt").is_file());
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("source.txt");
        let dest = temp.path().join("dest.txt");
        write(&src, "new");
        write(&dest, "old");

        copy_entry(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_link_replaces_existing_destination() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.txt");
        let second = temp.path().join("second.txt");
        let dest = temp.path().join("dest.lnk");
        write(&first, "1");
        write(&second, "2");

        link_entry(&first, &dest).unwrap();
        link_entry(&second, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "2");
    }

    #[test]
    fn test_glob_copy_expands_matches() {
        let temp = TempDir::new().unwrap();
        let fix = temp.path().join("fix");
        fs::create_dir(&fix).unwrap();
        write(&fix.join("grid.tile1.nc"), "t1");
        write(&fix.join("grid.tile2.nc"), "t2");
        write(&fix.join("other.txt"), "no");

        let dest = temp.path().join("run/INPUT");
        copy_entry(&fix.join("grid.tile*.nc"), &dest).unwrap();

        assert!(dest.join("grid.tile1.nc").is_file());
        assert!(dest.join("grid.tile2.nc").is_file());
        assert!(!dest.join("other.txt").exists());
    }

    #[test]
    fn test_literal_source_with_brackets_is_copied() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("oro_data[v1].nc");
        write(&src, "orography");

        let dest = temp.path().join("run/oro_data[v1].nc");
        copy_entry(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "orography");
    }

    #[test]
    fn test_glob_copy_with_no_matches_fails() {
        let temp = TempDir::new().unwrap();
        let result = copy_entry(
            &temp.path().join("absent.tile*.nc"),
            &temp.path().join("run"),
        );
        assert!(matches!(result, Err(StageError::Entry { .. })));
    }

    #[test]
    fn test_strict_mode_aborts_on_first_failure() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.txt");
        write(&good, "ok");

        let manifest = Manifest {
            mkdir: vec![],
            copy: vec![
                (temp.path().join("missing.txt"), temp.path().join("a.txt")),
                (good, temp.path().join("b.txt")),
            ],
            link: vec![],
        };

        let result = sync(&manifest, SyncMode::Strict);
        assert!(matches!(result, Err(StageError::Entry { .. })));
        // Aborted before the second entry
        assert!(!temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_continue_on_error_collects_all_failures() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.txt");
        write(&good, "ok");

        let manifest = Manifest {
            mkdir: vec![],
            copy: vec![
                (temp.path().join("missing1.txt"), temp.path().join("a.txt")),
                (temp.path().join("missing2.txt"), temp.path().join("b.txt")),
                (good, temp.path().join("c.txt")),
            ],
            link: vec![],
        };

        let result = sync(&manifest, SyncMode::ContinueOnError);
        match result {
            Err(StageError::Batch(failures)) => assert_eq!(failures.len(), 2),
            other => panic!("expected Batch, got {:?}", other),
        }
        // Independent entries still processed
        assert!(temp.path().join("c.txt").is_file());
    }
}
