use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::error::{MigrateError, MigrateResult};

/// Backup location used while a file is rewritten in place
pub fn backup_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Read a file to string
pub fn read_file<P: AsRef<Path>>(path: P) -> MigrateResult<String> {
    fs::read_to_string(path.as_ref())
        .map_err(|e| MigrateError::File(format!(
            "Failed to read {}: {}", path.as_ref().display(), e
        )))
}

/// Move `path` aside to its backup location.
///
/// Refuses to clobber an existing backup, which may be the only copy left
/// over from an interrupted run.
pub fn move_to_backup<P: AsRef<Path>>(path: P) -> MigrateResult<PathBuf> {
    let backup = backup_path(&path);
    if backup.exists() {
        return Err(MigrateError::File(format!(
            "{} already exists, delete it before re-running", backup.display()
        )));
    }

    fs::rename(path.as_ref(), &backup)
        .map_err(|e| MigrateError::File(format!(
            "Failed to rename {} to {}: {}", path.as_ref().display(), backup.display(), e
        )))?;
    Ok(backup)
}

/// Write a string to a file, replacing any previous content
pub fn write_file<P: AsRef<Path>>(path: P, contents: &str) -> MigrateResult<()> {
    fs::write(path.as_ref(), contents)
        .map_err(|e| MigrateError::File(format!(
            "Failed to write {}: {}", path.as_ref().display(), e
        )))
}

/// Remove a file
pub fn remove_file<P: AsRef<Path>>(path: P) -> MigrateResult<()> {
    fs::remove_file(path.as_ref())
        .map_err(|e| MigrateError::File(format!(
            "Failed to remove {}: {}", path.as_ref().display(), e
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(backup_path("conf/bump.yaml"), PathBuf::from("conf/bump.yaml.bak"));
    }

    #[test]
    fn test_move_to_backup_refuses_existing_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        fs::write(&path, "a: 1\n").unwrap();
        fs::write(backup_path(&path), "old").unwrap();

        let err = move_to_backup(&path).unwrap_err();
        assert!(matches!(err, MigrateError::File(_)));
        assert!(path.exists());
    }

    #[test]
    fn test_move_to_backup_renames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.yaml");
        fs::write(&path, "a: 1\n").unwrap();

        let backup = move_to_backup(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(read_file(&backup).unwrap(), "a: 1\n");
    }
}
