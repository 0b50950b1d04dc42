mod migrate;

pub use migrate::handle_migrate_command;
