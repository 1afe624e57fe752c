use anyhow::{Context, Result};
use bundle_patcher::{load_from_path, DriverError, Patcher};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bundle-patcher")]
#[command(about = "Apply ordered text patches to an unpacked application tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the unpacked application root
    root: PathBuf,

    /// Patch tables to apply
    #[arg(short, long, default_value = "patches.toml")]
    patches: PathBuf,

    /// Dry run - match every patch in memory without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Driver failures print their exact one-line message.
            match err.downcast_ref::<DriverError>() {
                Some(driver) => println!("{driver}"),
                None => println!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let patcher = Patcher::new(cli.root)?.dry_run(cli.dry_run);

    let tables = load_from_path(&cli.patches).with_context(|| {
        format!("Unable to load patch tables:({})", cli.patches.display())
    })?;

    if !tables.meta.name.is_empty() {
        println!(
            "{}",
            format!(
                "Applying '{}' to {}",
                tables.meta.name,
                patcher.root().display()
            )
            .dimmed()
        );
    }

    let outcomes = patcher.run(&tables)?;

    let total: usize = outcomes.iter().map(|outcome| outcome.patches).sum();
    println!(
        "{}",
        format!("{} patches across {} files", total, outcomes.len()).dimmed()
    );

    Ok(())
}
