use std::process;

use clap::Parser;
use colored::Colorize;
use kmertally::{cli::Args, config::Config, run};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    init_tracing(args.quiet);

    let config = Config::from_args(&args).unwrap_or_else(|e| {
        eprintln!();
        eprintln!(
            "{}\n {}",
            "Problem with arguments:".blue().bold(),
            e.to_string().blue()
        );
        eprintln!();
        eprintln!(
            "{}\n {}",
            "Help menu:".blue().bold(),
            "$ kmertally --help".bold()
        );
        eprintln!();
        process::exit(1);
    });

    if !args.quiet {
        eprintln!(
            "{}: {}",
            "catalogs".bold(),
            config.kmer_dir.display().to_string().blue().bold()
        );
        eprintln!(
            "{}: {}",
            "reads".bold(),
            config.input.to_string().underline().bold().blue()
        );
        eprintln!(
            "{}: {}",
            "workers".bold(),
            config.options.workers.to_string().blue().bold()
        );
        eprintln!();
    }

    let summary = match run::run(&config) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!(
                "{}\n {}",
                "Application error:".blue().bold(),
                e.to_string().blue()
            );
            process::exit(1);
        }
    };

    for outcome in summary.failed() {
        if let Err(e) = &outcome.result {
            eprintln!(
                "{} {}\n {}",
                "Failed:".red().bold(),
                outcome.catalog.display(),
                e.to_string().red()
            );
        }
    }

    if !args.quiet {
        eprintln!(
            "{}: {} written, {} failed",
            "catalogs".bold(),
            summary.succeeded().count().to_string().green().bold(),
            summary.failed().count().to_string().red().bold()
        );
    }

    if !summary.is_success() {
        process::exit(1);
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}
