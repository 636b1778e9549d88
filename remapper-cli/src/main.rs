mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // Show remapper info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("remapper", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Info { path, ignore } => commands::info::run(path, ignore, &cli.global),
        Command::Map {
            old,
            new,
            output,
            ignore,
            no_propagation,
            sequential,
        } => commands::map::run(
            old,
            new,
            &commands::map::MapOptions {
                output: output.as_deref(),
                ignore,
                propagate: !*no_propagation,
                parallel: !*sequential,
                global: &cli.global,
            },
        ),
    }
}
