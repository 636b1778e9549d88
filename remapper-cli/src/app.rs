use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// remapper - match the classes, methods and fields of two obfuscated builds
#[derive(Debug, Parser)]
#[command(name = "remapper", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a program and print class, method and field counts.
    Info {
        /// A jar, a directory of classfiles, or a single classfile.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Ignore classes whose name contains this pattern (repeatable).
        #[arg(long, value_name = "PAT")]
        ignore: Vec<String>,
    },

    /// Match an old build against a new one.
    Map {
        /// The old build: a jar, a directory of classfiles, or a single classfile.
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// The new build.
        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// Write one mapping file per class into this directory.
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Ignore classes whose name contains this pattern (repeatable).
        /// Defaults to `bouncycastle` and `json`.
        #[arg(long, value_name = "PAT")]
        ignore: Vec<String>,

        /// Skip the reference propagation phase.
        #[arg(long)]
        no_propagation: bool,

        /// Score candidates on a single thread.
        #[arg(long)]
        sequential: bool,
    },
}
