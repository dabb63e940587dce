use std::path::PathBuf;

use clap::Parser;

use mock_router::scan::{scan_with_report, ModuleRegistry, ScanOptions};

#[derive(Parser)]
#[command(name = "mock-routes")]
#[command(about = "List the routes a mock directory produces", long_about = None)]
struct Cli {
    /// Mock directory (repeatable).
    #[arg(short, long = "dir", default_value = "mock")]
    dirs: Vec<PathBuf>,

    /// URL prefix for every route.
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Also print skipped and ignored files with their decision chains.
    #[arg(long)]
    report: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let options = ScanOptions::new(cli.dirs).with_prefix(cli.prefix);
    let (table, report) = scan_with_report(&options, &ModuleRegistry::new());

    for route in table.routes() {
        println!("{:<8} {:<40} {}", route.method, route.template, route.file.display());
    }

    if !table.duplicates().is_empty() {
        eprintln!("duplicates (first match wins): {}", table.duplicates().join(", "));
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
