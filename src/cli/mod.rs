pub mod types;
pub mod commands;
pub mod logging;

use clap::Parser;

/// Run the command-line interface, returning the process exit code
pub fn run() -> i32 {
    let cli = types::Cli::parse();

    // Initialize logging system
    logging::init_logging(cli.debug);

    // Configure backtrace
    logging::configure_backtrace(cli.trace);

    match commands::handle_migrate_command(&cli) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("Migration failed: {}", e);
            1
        }
    }
}
