//! # obtax CLI entry point
//!
//! Parses command-line arguments, loads the configured taxonomy once, and
//! dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use obtax_cli::columns::{run_columns, ColumnsArgs};
use obtax_cli::compile::{run_compile, CompileArgs};
use obtax_cli::config::TaxonomyConfig;
use obtax_cli::list::{run_list, ListArgs};
use obtax_cli::usages::{run_usages, UsagesArgs};

/// Orange Button taxonomy compiler.
///
/// Classifies taxonomy schemas, compiles Elements and Objects into typed
/// field descriptors, and derives which Objects embed a schema in an array.
#[derive(Parser, Debug)]
#[command(name = "obtax", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Taxonomy document (JSON or YAML). Overrides $OBTAX_TAXONOMY.
    #[arg(long, global = true, value_name = "PATH")]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the compiled form of a schema as JSON.
    Compile(CompileArgs),

    /// List Objects that embed a schema in an array property.
    Usages(UsagesArgs),

    /// List schema names, optionally by kind.
    List(ListArgs),

    /// Print the persistence columns of an Object.
    Columns(ColumnsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = TaxonomyConfig::resolve(cli.taxonomy.as_deref());
    tracing::debug!(path = %config.path.display(), source = ?config.source, "resolved taxonomy");

    let result = config.load().and_then(|store| match &cli.command {
        Commands::Compile(args) => run_compile(args, &store),
        Commands::Usages(args) => run_usages(args, &store),
        Commands::List(args) => run_list(args, &store),
        Commands::Columns(args) => run_columns(args, &store),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_compile_with_overrides() {
        let cli = Cli::try_parse_from([
            "obtax",
            "compile",
            "Product",
            "--max-length",
            "ProdCode=16",
            "--read-only",
            "ProductID",
        ])
        .unwrap();
        let Commands::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.name, "Product");
        assert_eq!(args.max_length, ["ProdCode=16"]);
        assert_eq!(args.read_only, ["ProductID"]);
    }

    #[test]
    fn cli_parse_usages_candidates() {
        let cli = Cli::try_parse_from([
            "obtax",
            "usages",
            "Package",
            "--candidate",
            "Product",
            "--candidate",
            "Location",
        ])
        .unwrap();
        let Commands::Usages(args) = cli.command else {
            panic!("expected usages");
        };
        assert_eq!(args.target, "Package");
        assert_eq!(args.candidates, ["Product", "Location"]);
    }

    #[test]
    fn cli_parse_list_kind() {
        let cli = Cli::try_parse_from(["obtax", "list", "--kind", "object"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.kind, Some(obtax_cli::list::KindFilter::Object));
        assert!(Cli::try_parse_from(["obtax", "list", "--kind", "table"]).is_err());
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "obtax",
            "columns",
            "Product",
            "-vv",
            "--taxonomy",
            "ob.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.taxonomy, Some(PathBuf::from("ob.yaml")));
        assert!(matches!(cli.command, Commands::Columns(_)));
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["obtax"]).is_err());
    }
}
