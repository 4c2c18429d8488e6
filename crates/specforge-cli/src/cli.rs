//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use specforge::OutputFormat;

/// Generate and combine OpenAPI 3.1 documents.
#[derive(Debug, Parser)]
#[command(name = "specforge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Generate(args) => args.verbose,
            Command::Combine(args) => args.verbose,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an OpenAPI document from the route manifests of a directory.
    Generate(GenerateArgs),
    /// Merge the OpenAPI documents of several services into one.
    Combine(CombineArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Directory searched for `*.routes.yaml`, `*.routes.yml` and `*.routes.json` files.
    #[arg(short, long, default_value = ".")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "openapi.yaml")]
    pub output: PathBuf,

    /// Output format: yaml or json.
    #[arg(short, long, default_value = "yaml")]
    pub format: OutputFormat,

    /// API title. Derived from the input directory name when absent.
    #[arg(short, long)]
    pub title: Option<String>,

    /// API version.
    #[arg(short = 'V', long = "version", default_value = "1.0.0")]
    pub api_version: String,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Server URL; may be repeated.
    #[arg(short, long = "server")]
    pub servers: Vec<String>,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Flags given explicitly override the services config, which overrides the defaults.
#[derive(Debug, Clone, Args)]
pub struct CombineArgs {
    /// Output file [default: combined-api.yaml]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: yaml or json. Guessed from the output file extension when absent.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Title of the combined document [default: Combined API]
    #[arg(short, long)]
    pub title: Option<String>,

    /// Version of the combined document [default: 1.0.0]
    #[arg(short = 'V', long = "version")]
    pub api_version: Option<String>,

    /// Prepended to every combined path.
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Services configuration file (YAML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-service path prefix as `service:/prefix`; may be repeated.
    #[arg(short, long = "prefix")]
    pub prefixes: Vec<String>,

    /// Keep only operations carrying one of these tags (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub include_tags: Vec<String>,

    /// Drop operations carrying any of these tags (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub exclude_tags: Vec<String>,

    /// Share identical component schemas between services [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub merge_schemas: Option<bool>,

    /// Validate the combined document before writing it [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub validate: Option<bool>,

    #[arg(short, long)]
    pub verbose: bool,

    /// OpenAPI documents to combine, in order.
    pub inputs: Vec<PathBuf>,
}
