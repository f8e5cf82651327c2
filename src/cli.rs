use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{export::ExportFormat, parser::ParsePolicy};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare spreadsheet rows side by side", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the (optionally filtered) catalogue as an HTML comparison page
    Render(RenderArgs),
    /// Render an HTML comparison of two or more selected rows
    Compare(CompareArgs),
    /// List the distinct values offered by each filter field
    Options(OptionsArgs),
    /// Preview rows in a formatted terminal table
    Preview(PreviewArgs),
    /// Write the filtered or selected rows as CSV or JSON
    Export(ExportArgs),
    /// Write the built-in configuration to a YAML file
    InitConfig(InitConfigArgs),
}

/// Where the export comes from and how to read it.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Read a local CSV file instead of fetching (`-` for stdin)
    #[arg(short = 'i', long = "input", conflicts_with = "url")]
    pub input: Option<PathBuf>,
    /// URL of the published CSV export (overrides the config file)
    #[arg(long)]
    pub url: Option<String>,
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// How to treat rows whose value count differs from the header
    #[arg(long, value_enum)]
    pub policy: Option<ParsePolicy>,
    /// Character encoding of the export (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Column identifying a row for --select
    #[arg(long = "key-field")]
    pub key_field: Option<String>,
    /// Column used as the category (mount) filter
    #[arg(long = "category-field")]
    pub category_field: Option<String>,
    /// Column used as the numeric-aware size filter
    #[arg(long = "size-field")]
    pub size_field: Option<String>,
    /// Attribute rows to show in the grid, comma-separated or repeated
    #[arg(short = 'A', long = "attribute", action = clap::ArgAction::Append)]
    pub rows: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Exact-match filters such as `マウント=RF`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Output HTML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Page title
    #[arg(long, default_value = "レンズ比較")]
    pub title: String,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Key-field values of the rows to compare (at least two)
    #[arg(short = 's', long = "select", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub select: Vec<String>,
    /// Output HTML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Page title
    #[arg(long, default_value = "レンズ比較")]
    pub title: String,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Fields to list (defaults to the category and size fields)
    #[arg(short = 'f', long = "field", action = clap::ArgAction::Append)]
    pub fields: Vec<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Exact-match filters such as `マウント=RF`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Exact-match filters such as `マウント=RF`
    #[arg(long = "filter", action = clap::ArgAction::Append, conflicts_with = "select")]
    pub filters: Vec<String>,
    /// Key-field values of the rows to export (at least two)
    #[arg(short = 's', long = "select", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub select: Vec<String>,
    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination YAML file
    #[arg(default_value = "lens-compare.yaml")]
    pub path: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
