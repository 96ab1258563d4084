mod cache;
mod classifier;
mod commands;
mod config;
mod diagnostics;
mod document;
mod enrich;
mod error;
mod extractor;
mod index;
mod loader;
mod locator;
mod observer;
mod preview;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "peekref", about = "In-page content previews for markdown link targets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reference classification of a link target
    Classify {
        /// The link target to classify
        href: String,
    },
    /// Scan the source tree and write the content index file
    Index,
    /// Enrich a markdown file's links and print their dispositions
    Links {
        /// The markdown file to enrich
        file: PathBuf,
    },
    /// Resolve a link target and print the preview fragment
    Preview {
        /// The link target to resolve
        href: String,
        /// Markdown file the link lives in, for same-document anchors
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Re-run link enrichment on filesystem changes
    Watch {
        /// The markdown file to enrich
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify { href } => {
            commands::classify(&href);
            Ok(())
        },
        Commands::Index => commands::build_index(),
        Commands::Links { file } => commands::links(&file),
        Commands::Preview { href, from } => commands::preview(&href, from.as_deref()),
        Commands::Watch { file } => commands::watch(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    }
}
