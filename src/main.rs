use lineage_labels::cli::Cli;

use clap::Parser;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = lineage_labels::cli::run(cli) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
