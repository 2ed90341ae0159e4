use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glycorisk")]
#[command(author, version, about = "Explainable diabetes risk assessment")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assess one patient record given as a JSON object
    Assess {
        /// Input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Model artifact file or directory
        #[arg(short, long, env = "GLYCORISK_MODEL_PATH")]
        model: Option<PathBuf>,

        /// Pretty-print the report
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the feature-importance ranking
    Importance,

    /// Print the reference risk profiles with their guideline tiers
    Profiles,
}
