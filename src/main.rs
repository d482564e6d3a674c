use basanos::cli;
use clap::Parser;

fn main() {
    let args = cli::Args::parse();
    match cli::run(&args) {
        Ok(summary) => {
            if !summary.success() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
