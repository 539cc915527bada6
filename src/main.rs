use anyhow::Result;
use clap::Parser;
use opinet::app::{load_config, App, RunOptions};
use opinet::model::init_logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Overrides the configured number of steps
    #[arg(short = 'n', long)]
    steps: Option<u64>,

    /// JSON lines output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.print_config {
        let config = load_config(args.config.as_deref())?;
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut app = App::new(RunOptions {
        config: args.config,
        seed: args.seed,
        steps: args.steps,
        output: args.output,
    })?;
    app.run()?;

    let model = &app.model;
    println!(
        "Finished at t = {} with mean opinion {:.4} and {} rewirings.",
        model.time,
        model.mean_opinion(),
        model.rewiring_count()
    );
    Ok(())
}
