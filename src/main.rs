// Module declarations
mod cli;
mod migrate;
mod utils;

fn main() {
    // Run the CLI
    std::process::exit(cli::run());
}
