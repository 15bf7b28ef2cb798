//! `pig`: Product Information Graph command-line interface.
//!
//! Provides three subcommands for working with PIG packages:
//!
//! - **`validate`**: import a package and report item failures and the
//!   consistency outcome.
//! - **`convert`**: re-encode a package as JSON-LD or XML.
//! - **`render`**: print a human-readable summary of a package.
//!
//! All subcommands read a file path or stdin (`-`). The input format is taken
//! from `--format`, the file extension, or the first character of the
//! document, in that order.

mod schemas;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use pig::{
    CheckKind, CheckSet, DirectorySchemas, EmbeddedSchemas, Format, ImportOptions, ImportReport,
    Package, SchemaCache,
};

use schemas::HttpSchemaLoader;

/// pig: Product Information Graph CLI
///
/// Validate, convert, and inspect PIG packages.
#[derive(Parser)]
#[command(name = "pig", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Where item schemas come from. Embedded schemas are used when neither is set.
#[derive(clap::Args)]
struct SchemaArgs {
    /// Directory holding one `<schema-name>.json` per item kind.
    #[arg(long, env = "PIG_SCHEMA_DIR", value_name = "DIR", conflicts_with = "schema_url")]
    schema_dir: Option<PathBuf>,

    /// Base URL serving one `<schema-name>.json` per item kind.
    #[arg(long, env = "PIG_SCHEMA_URL", value_name = "URL")]
    schema_url: Option<String>,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Path to a package document, or `-` for stdin.
    file: PathBuf,

    /// Input format: jsonld | xml. Detected when omitted.
    #[arg(short = 'f', long, value_name = "FORMAT")]
    format: Option<Format>,

    #[command(flatten)]
    schemas: SchemaArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Import a package and check it.
    ///
    /// Prints "N of M items instantiated", one line per item that failed
    /// validation, and the first consistency violation if there is one.
    /// Exits 0 if the package is clean, 1 otherwise.
    ///
    /// Examples:
    ///   pig validate pumps.jsonld
    ///   pig validate pumps.xml --skip cardinality --skip value-constraints
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Consistency check to skip. Repeat to skip several:
        /// duplicate-ids | class-references | specialization-cycles |
        /// cardinality | link-targets | eligible-properties | eligible-links |
        /// value-constraints
        #[arg(long = "skip", value_name = "CHECK")]
        skip: Vec<CheckKind>,
    },

    /// Re-encode a package in another format.
    ///
    /// Only items that pass validation are written. The result goes to stdout.
    Convert {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: jsonld | xml.
        #[arg(short = 't', long, value_name = "FORMAT")]
        to: Format,
    },

    /// Render a package as human-readable text.
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Preferred language for titles and descriptions.
        #[arg(short = 'l', long, value_name = "LANG", default_value = "en")]
        lang: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pig=info,pig_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { input, skip } => {
            let mut options = ImportOptions::from_env();
            options.checks = skip
                .into_iter()
                .fold(CheckSet::all(), |checks, kind| checks.without(kind));
            let (_, report) = import(&input, &options).await;
            print_report(&report);
            if !report.is_clean() {
                process::exit(1);
            }
        }

        Command::Convert { input, to } => {
            let (package, report) = import(&input, &ImportOptions::from_env()).await;
            for failure in &report.failures {
                eprintln!("skipped {failure}");
            }
            let document = package
                .export(to)
                .unwrap_or_else(|e| fatal(&format!("failed to encode as {to}: {e}")));
            println!("{document}");
        }

        Command::Render { input, lang } => {
            let (package, _) = import(&input, &ImportOptions::from_env()).await;
            print!("{}", pig::render::render_package(&package, &lang));
        }
    }
}

/// Read, decode, validate, and check the input document.
async fn import(input: &InputArgs, options: &ImportOptions) -> (Package, ImportReport) {
    let document = read_input(&input.file);
    let format = input
        .format
        .or_else(|| extension_format(&input.file))
        .or_else(|| Format::sniff(&document))
        .unwrap_or_else(|| fatal("cannot tell the input format; pass --format jsonld|xml"));

    let cache = schema_cache(&input.schemas);
    Package::import_cached(&document, format, &cache, options)
        .await
        .unwrap_or_else(|e| fatal(&format!("[{}] {e}", e.status())))
}

fn schema_cache(args: &SchemaArgs) -> SchemaCache {
    match (&args.schema_dir, &args.schema_url) {
        (Some(dir), _) => {
            tracing::info!("schemas: directory {}", dir.display());
            SchemaCache::new(DirectorySchemas::new(dir))
        }
        (None, Some(url)) => {
            tracing::info!("schemas: {url}");
            let loader = HttpSchemaLoader::new(url)
                .unwrap_or_else(|e| fatal(&format!("failed to build HTTP client: {e}")));
            SchemaCache::new(loader)
        }
        (None, None) => SchemaCache::new(EmbeddedSchemas),
    }
}

fn print_report(report: &ImportReport) {
    println!("{}", report.summary());
    for failure in &report.failures {
        println!("  {failure}");
    }
    match &report.consistency {
        Ok(()) => println!("consistent"),
        Err(violation) => println!("inconsistent: [{}] {violation}", violation.status()),
    }
}

fn extension_format(path: &Path) -> Option<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &Path) -> String {
    if path.to_str() == Some("-") {
        std::io::read_to_string(std::io::stdin())
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {e}")))
    } else {
        std::fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(&format!("failed to read {}: {e}", path.display())))
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("pig: {msg}");
    process::exit(2);
}
