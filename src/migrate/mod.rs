use std::fmt;
use std::path::PathBuf;

use log::{debug, info};

use crate::utils::error::{MigrateError, MigrateResult};
use crate::utils::fs::{move_to_backup, read_file, remove_file, write_file};

// Pipeline stages
pub mod bump;
pub mod document;
pub mod splice;

pub use bump::BumpMigrator;

/// Variable names used when none are given on the command line
pub const DEFAULT_VARIABLES: [&str; 4] = ["var1", "var2", "var3", "var4"];

// Migration options
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub path: PathBuf,
    pub variables: Vec<String>,
    pub verbose: bool,
}

impl MigrationOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MigrationOptions {
            path: path.into(),
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            verbose: false,
        }
    }
}

// Migration result containing changes made
#[derive(Debug, Default)]
pub struct MigrationResult {
    pub subsections: usize,
    pub normalized_dates: usize,
    pub changes: Vec<MigrationChange>,
    pub warnings: Vec<String>,
}

// Individual migration change
#[derive(Debug)]
pub struct MigrationChange {
    pub location: String,
    pub change_type: ChangeType,
    pub description: String,
}

// Types of changes that can occur during migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Copied,
    Renamed,
    Converted,
    PassedThrough,
    Ignored,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Copied => write!(f, "Copied"),
            ChangeType::Renamed => write!(f, "Renamed"),
            ChangeType::Converted => write!(f, "Converted"),
            ChangeType::PassedThrough => write!(f, "Passed through"),
            ChangeType::Ignored => write!(f, "Ignored"),
        }
    }
}

/// Migrate a document held in memory, returning the rewritten text.
///
/// Nothing is written; every parse error and precondition violation
/// surfaces here.
pub fn migrate_text(
    source: &str,
    variables: &[String],
    result: &mut MigrationResult,
) -> MigrateResult<String> {
    let mut doc = document::parse_document(source)?;
    result.normalized_dates = document::normalize_dates(&mut doc);

    let bumps = document::find_bumps(&doc);
    result.subsections = bumps.len();
    debug!("Found {} bump subsection(s)", bumps.len());

    let migrator = BumpMigrator::new(variables);
    let mut rendered = Vec::with_capacity(bumps.len());
    for (index, legacy) in bumps.into_iter().enumerate() {
        let new_bump = migrator.migrate(index, legacy, result)?;
        rendered.push(splice::render_bump(&new_bump)?);
    }

    splice::splice_bumps(source, &rendered)
}

/// Migrate the file named by `options` in place.
///
/// The original is moved to `<path>.bak`, the migrated text written to the
/// original path and the backup removed. The backup is left behind if the
/// write fails.
pub fn run(options: &MigrationOptions) -> MigrateResult<MigrationResult> {
    let mut result = MigrationResult::default();
    let source = read_file(&options.path)?;
    let migrated = migrate_text(&source, &options.variables, &mut result).map_err(|e| match e {
        MigrateError::Parse(msg) => MigrateError::Parse(format!("{}: {}", options.path.display(), msg)),
        other => other,
    })?;

    let backup = move_to_backup(&options.path)?;
    debug!("Moved {} to {}", options.path.display(), backup.display());
    write_file(&options.path, &migrated)?;
    remove_file(&backup)?;

    if options.verbose {
        for change in &result.changes {
            info!("[{}] {}: {}", change.change_type, change.location, change.description);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fs::backup_path;
    use std::fs;
    use tempfile::TempDir;

    const LEGACY: &str = "\
# Covariance test
geometry:
  resolution: c12
window begin: 2010-01-01 00:00:00   # untouched outside bump
cost function:
  background error:
    covariance model: SABER
    saber central block:
      saber block name: BUMP_NICAS
      bump:
        prefix: bump_nicas
        datadir: data
        method: cor
        new_hdiag: true
        nc1: 500
        ne: 10
        valid time: 2010-01-01 06:00:00
        stddev:
          air_temperature: [1.5]

final: true
";

    const MIGRATED: &str = "\
# Covariance test
geometry:
  resolution: c12
window begin: 2010-01-01 00:00:00   # untouched outside bump
cost function:
  background error:
    covariance model: SABER
    saber central block:
      saber block name: BUMP_NICAS
      bump:
        io:
          data directory: data
          files prefix: bump_nicas
        drivers:
          compute covariance: true
          compute correlation: true
          compute moments: true
        sampling:
          nc1: 500
        localization:
          ne: 10
        variance:
          stddev:
          - variables:
            - air_temperature
            value: 1.5

final: true
";

    fn variables() -> Vec<String> {
        DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_migrate_text_rewrites_only_the_subsection() {
        let mut result = MigrationResult::default();
        let migrated = migrate_text(LEGACY, &variables(), &mut result).unwrap();

        assert_eq!(migrated, MIGRATED);
        assert_eq!(result.subsections, 1);
        assert_eq!(result.normalized_dates, 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("valid time"));
    }

    #[test]
    fn test_document_without_bump_is_unchanged() {
        let source = "# comment\nvariables: [a, b]\n\nlist:\n- x: 1\n  when: 2010-01-01T00:00:00Z\n";
        let mut result = MigrationResult::default();

        assert_eq!(migrate_text(source, &variables(), &mut result).unwrap(), source);
        assert_eq!(result.subsections, 0);
    }

    #[test]
    fn test_inherited_settings_are_migrated() {
        let source = "common: &common\n  datadir: data\n  nc1: 500\nbump:\n  <<: *common\n  prefix: p\n";
        let mut result = MigrationResult::default();
        let migrated = migrate_text(source, &variables(), &mut result).unwrap();

        assert!(migrated.starts_with("common: &common\n  datadir: data\n  nc1: 500\nbump:\n"));
        assert!(migrated.contains("    data directory: data\n"));
        assert!(migrated.contains("    files prefix: p\n"));
        assert!(migrated.contains("  sampling:\n    nc1: 500\n"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_dates_inside_bump_are_canonical() {
        let source = "bump:\n  ensemble:\n    members:\n    - date: 2010-01-01 06:00:00\n      steps: [{at: 2010-01-01t12:00:00+00:00}]\n";
        let mut result = MigrationResult::default();
        let migrated = migrate_text(source, &variables(), &mut result).unwrap();

        assert!(migrated.contains("date: 2010-01-01T06:00:00Z"));
        assert!(migrated.contains("at: 2010-01-01T12:00:00Z"));
    }

    #[test]
    fn test_second_run_does_not_fail() {
        let mut result = MigrationResult::default();
        let once = migrate_text(LEGACY, &variables(), &mut result).unwrap();

        let mut result = MigrationResult::default();
        let twice = migrate_text(&once, &variables(), &mut result).unwrap();

        assert!(twice.starts_with("# Covariance test\n"));
        assert!(twice.ends_with("      bump:\n        {}\n\nfinal: true\n"));
        assert!(result.warnings.iter().all(|w| w.contains("unrecognized key")));
    }

    #[test]
    fn test_run_migrates_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bump.yaml");
        fs::write(&path, LEGACY).unwrap();

        let result = run(&MigrationOptions::new(&path)).unwrap();

        assert_eq!(result.subsections, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), MIGRATED);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_parse_error_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        let broken = "bump:\n  prefix: [unterminated\n";
        fs::write(&path, broken).unwrap();

        let err = run(&MigrationOptions::new(&path)).unwrap_err();

        assert!(matches!(err, MigrateError::Parse(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_precondition_violation_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.yaml");
        let short = "bump:\n  io_keys: [a, b]\n  io_values: [x]\n";
        fs::write(&path, short).unwrap();

        let err = run(&MigrationOptions::new(&path)).unwrap_err();

        assert!(matches!(err, MigrateError::Precondition(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), short);
    }

    #[test]
    fn test_missing_file_is_a_file_error() {
        let dir = TempDir::new().unwrap();
        let err = run(&MigrationOptions::new(dir.path().join("missing.yaml"))).unwrap_err();
        assert!(matches!(err, MigrateError::File(_)));
    }
}
