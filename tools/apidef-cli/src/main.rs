//! apidef CLI - Command-line interface for resource schema code generation
//!
//! This tool reads a declarative resource schema (YAML or JSON) and emits the
//! protobuf IDL and OpenAPI document for the described API.

use clap::{Parser, Subcommand};
use commands::generate::GenerateCommand;

mod commands;
mod error;

/// apidef CLI - Generate protobuf and OpenAPI artefacts from resource schemas
#[derive(Debug, Parser)]
#[command(name = "apidef")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate protobuf and OpenAPI artefacts from a resource schema
    #[command(name = "generate")]
    Generate(GenerateCommand),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(cmd) => cmd.execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
