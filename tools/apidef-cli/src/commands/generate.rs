//! `apidef generate` subcommand
//!
//! Reads a resource schema and emits:
//! - `<service>.proto` — protobuf IDL for the described API
//! - `<service>_openapi.json` — OpenAPI 3.1 document for the described API
//!
//! # Usage
//!
//! ```text
//! apidef generate bookstore.yaml                 # generate both artefacts
//! apidef generate bookstore.yaml --check         # validate only (CI)
//! apidef generate bookstore.yaml --dry-run       # print to stdout, don't write
//! apidef generate bookstore.yaml --output-dir gen
//! ```

use crate::error::{CliError, CliResult};
use anyhow::Context;
use apidef_codegen::{
    generate_openapi_json, generate_proto, resolve, validate, Service, Severity,
};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Generate protobuf and OpenAPI artefacts from a resource schema
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Path to the resource schema (.yaml, .yml, or .json)
    pub schema: PathBuf,

    /// Directory the artefacts are written into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Validate the schema without writing files (exit 1 if errors found)
    #[arg(long)]
    pub check: bool,

    /// Print generated output to stdout instead of writing files
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    pub fn execute(self) -> CliResult<()> {
        // ── Read the schema ────────────────────────────────────────────────
        let schema_path = &self.schema;
        if !schema_path.exists() {
            return Err(CliError::schema_not_found(schema_path));
        }

        let source = std::fs::read_to_string(schema_path)
            .with_context(|| format!("reading {}", schema_path.display()))?;

        let extension = schema_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let service = match extension {
            "yaml" | "yml" => Service::from_yaml(&source)
                .with_context(|| format!("parsing {}", schema_path.display()))?,
            "json" => Service::from_json(&source)
                .with_context(|| format!("parsing {}", schema_path.display()))?,
            _ => return Err(CliError::unsupported_extension(schema_path)),
        };

        // ── Validate ───────────────────────────────────────────────────────
        let errors = validate(&service);
        let has_errors = print_validation_results(&errors, schema_path);

        if has_errors {
            return Err(
                anyhow::anyhow!("validation failed — fix the errors above and retry").into(),
            );
        }

        if self.check {
            println!(
                "{} {} validated successfully",
                "✓".green(),
                schema_path.display()
            );
            return Ok(());
        }

        // ── Generate ───────────────────────────────────────────────────────
        let resolved = resolve(&service)?;
        let proto_src = generate_proto(&resolved)?;
        let openapi_src = generate_openapi_json(&resolved)?;

        let short_name = service.short_name();
        let proto_path = self.output_dir.join(format!("{short_name}.proto"));
        let openapi_path = self.output_dir.join(format!("{short_name}_openapi.json"));

        if self.dry_run {
            println!("{}  {}", "── Protobuf".dimmed(), proto_path.display());
            println!("{proto_src}");
            println!("{}  {}", "── OpenAPI".dimmed(), openapi_path.display());
            println!("{openapi_src}");
            return Ok(());
        }

        // ── Write files ────────────────────────────────────────────────────
        write_if_changed(&proto_path, &proto_src)?;
        write_if_changed(&openapi_path, &openapi_src)?;

        println!(
            "{} {} resource(s) processed",
            "✓".green(),
            resolved.resources.len()
        );

        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Print validation results and return `true` if any errors were found.
fn print_validation_results(
    errors: &[apidef_codegen::ValidationError],
    schema_path: &Path,
) -> bool {
    let mut has_errors = false;
    for e in errors {
        match e.severity {
            Severity::Error => {
                eprintln!("{} [{}] {}", "✗".red(), e.location, e.message);
                has_errors = true;
            }
            Severity::Warning => {
                eprintln!("{} [{}] {}", "!".yellow(), e.location, e.message);
            }
        }
    }
    if !errors.is_empty() {
        eprintln!("  in: {}", schema_path.display());
    }
    has_errors
}

/// Write `contents` to `path`, creating parent directories as needed.
/// Prints a status line indicating whether the file was created or unchanged.
fn write_if_changed(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }

    // Read existing to detect changes
    let existing = std::fs::read_to_string(path).ok();
    let changed = existing.as_deref() != Some(contents);

    if changed {
        std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
        println!("  {} {} written", "→".cyan(), path.display());
    } else {
        println!("  {} {} unchanged", "·".dimmed(), path.display());
    }

    Ok(())
}
