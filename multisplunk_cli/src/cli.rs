use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "multisplunk")]
#[command(about = "Run one Splunk query across many instances in parallel")]
#[command(version)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["query", "query_file"])
))]
#[command(after_help = "\x1b[1;36mExamples:\x1b[0m
  multisplunk -c instances.yaml -q 'index=_internal | head 5'
  multisplunk -c instances.yaml -Q hunt.spl --clients prod,lab
  multisplunk -c instances.yaml -q 'error' --ask-clients --format csv

\x1b[1;36mConfiguration:\x1b[0m
  instances:
    - name: prod
      host: prod.splunkcloud.com
      token: <token>
      auth_type: session     # or bearer
      verify: true")]
pub struct Cli {
    /// YAML file listing the Splunk instances
    #[arg(short, long)]
    pub config: PathBuf,

    /// Search query (a leading `search` is added when missing)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Read the query from a file (takes precedence over --query)
    #[arg(short = 'Q', long)]
    pub query_file: Option<PathBuf>,

    /// Comma-separated instance names to query (default: all)
    #[arg(long, value_delimiter = ',', conflicts_with = "ask_clients")]
    pub clients: Vec<String>,

    /// Pick instances interactively
    #[arg(long)]
    pub ask_clients: bool,

    /// Maximum instances queried at the same time
    #[arg(short, long, default_value_t = multisplunk_core::DEFAULT_CONCURRENCY)]
    pub parallel: usize,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 300)]
    pub timeout: u64,

    /// Format of the per-instance result files
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Directory receiving the result files
    #[arg(short, long, default_value = "output")]
    pub outdir: PathBuf,

    /// Rows shown per instance in the console preview
    #[arg(long, default_value_t = 20)]
    pub preview: usize,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}
