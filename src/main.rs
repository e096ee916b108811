use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cognate_cv::cv_opt::{CvCliOptions, CvOpt, DifficultyCliOptions};
use cognate_cv::difficulty::{self, DifficultyTools};
use cognate_cv::experiment;
use cognate_cv::report::{difference_table, score_table};
use cognate_cv::runner::SystemRunner;

#[derive(Parser)]
#[command(name = "cognate-cv")]
#[command(about = "Cross-validation of binary vs. prototype substitution models on cognate alignments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split every dataset into train/test folds, optionally run raxml-ng, and tabulate scores
    Cv(CvCliOptions),

    /// Predict alignment difficulty, retrying once on a padded alignment
    Difficulty(DifficultyCliOptions),
}

/// Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace) to a log level
fn init_logger(verbosity: i32) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn run_cv(cli: &CvCliOptions) -> Result<()> {
    let opt = CvOpt::from_cli(cli).map_err(anyhow::Error::msg)?;

    if cli.verbosity >= 3 {
        log::info!("Sampling parameters:");
        log::info!("  Folds: {}, train ratio: {}", opt.num_samples, opt.ratio);
        log::info!("  Kappa: {} ({} states)", opt.kappa, opt.num_states());
        log::info!("  Seed: {}", opt.seed);
        log::info!(
            "  Train: {}, evaluate: {}, plots: {}",
            opt.run_train,
            opt.run_evaluate,
            opt.make_plots
        );
    }

    let mut runner = SystemRunner;
    let summaries = experiment::run_experiment(&opt, &mut runner).with_context(|| {
        format!(
            "Cross-validation over {} failed",
            opt.msa_super_dir.display()
        )
    })?;

    println!("{}", score_table(&summaries));
    println!("{}", difference_table(&summaries));
    Ok(())
}

fn run_difficulty(cli: &DifficultyCliOptions) -> Result<()> {
    let tools = DifficultyTools {
        pythia: cli.pythia.clone(),
        raxmlng: cli.raxmlng.clone(),
        predictor: cli.predictor.clone(),
    };
    let mut runner = SystemRunner;
    let d = difficulty::run_with_padding(&tools, &mut runner, &cli.msa, &cli.output)
        .with_context(|| format!("Difficulty prediction for {} failed", cli.msa.display()))?;

    if d.is_nan() {
        log::warn!("No difficulty could be predicted for {}", cli.msa.display());
    } else {
        log::info!("Difficulty of {}: {}", cli.msa.display(), d);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Cv(opts) => {
            init_logger(opts.verbosity);
            run_cv(opts)
        }
        Commands::Difficulty(opts) => {
            init_logger(opts.verbosity);
            run_difficulty(opts)
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
