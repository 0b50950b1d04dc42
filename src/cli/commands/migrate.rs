use crate::cli::types::Cli;
use crate::migrate::{self, MigrationOptions};
use crate::utils::error::MigrateResult;

pub fn handle_migrate_command(cli: &Cli) -> MigrateResult<()> {
    let options = MigrationOptions {
        variables: cli.variables.clone(),
        verbose: cli.verbose,
        ..MigrationOptions::new(&cli.filename)
    };

    log::info!("File: {}", options.path.display());
    if cli.verbose {
        log::info!("Variables: {}", options.variables.join(", "));
    }

    let result = migrate::run(&options)?;

    if result.subsections == 0 {
        log::info!("No bump subsection found, file left as is");
    } else {
        log::info!("Migrated {} bump subsection(s)", result.subsections);
    }
    if result.normalized_dates > 0 {
        log::debug!("Normalized {} timestamp(s)", result.normalized_dates);
    }
    if !result.warnings.is_empty() {
        log::info!("{} legacy key(s) were dropped, review the warnings above", result.warnings.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_command_uses_cli_variables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vbal.yaml");
        fs::write(&path, "bump:\n  vbal_block: [true]\n").unwrap();

        let cli = Cli::try_parse_from(["bump-upgrade", path.to_str().unwrap(), "--variables", "psi", "chi"]).unwrap();
        handle_migrate_command(&cli).unwrap();

        let migrated = fs::read_to_string(&path).unwrap();
        assert!(migrated.contains("- balanced: chi\n"));
        assert!(migrated.contains("unbalanced: psi\n"));
    }
}
