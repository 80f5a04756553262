use clap::Parser;
use std::path::PathBuf;

use hoist::humanize::ByteSize;
use hoist::options::{DEFAULT_OUTPUT_FORMAT, RunOptions};

#[derive(Parser, Debug)]
// No `version`: its `-V` would collide with `--verbose`
#[command(name = "hoist")]
#[command(
    about = "Upload files to remote storage and print their public URLs",
    long_about = None
)]
pub struct Cli {
    /// Local files to upload; http(s) URLs are passed through untouched
    #[arg(value_name = "FILE", required = true)]
    pub local_paths: Vec<String>,

    /// Upload with the original name into this directory instead of renaming
    #[arg(short = 't', long)]
    pub target_dir: Option<String>,

    /// Print debug logs to stderr
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Override the configured size limit, e.g. 10MB; 0 means no limit
    #[arg(short = 's', long)]
    pub size_limit: Option<ByteSize>,

    /// Use this configuration file
    #[arg(short = 'c', long)]
    pub config_file: Option<PathBuf>,

    /// Remove each local file after it was uploaded
    #[arg(short = 'C', long)]
    pub clean: bool,

    /// Print the raw URL, before replacements
    #[arg(short = 'r', long)]
    pub raw: bool,

    /// Uploader id; defaults to `default_uploader` from the configuration
    #[arg(short = 'u', long)]
    pub uploader: Option<String>,

    /// Output format: url, markdown or one from `output_formats`
    #[arg(short = 'f', long, default_value = DEFAULT_OUTPUT_FORMAT)]
    pub output_format: String,

    /// Directory with adapter definitions
    #[arg(long)]
    pub extensions_dir: Option<PathBuf>,
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        RunOptions {
            local_paths: cli.local_paths,
            target_dir: cli.target_dir,
            verbose: cli.verbose,
            size_limit: cli.size_limit,
            config_file: cli.config_file,
            clean: cli.clean,
            raw: cli.raw,
            uploader: cli.uploader,
            output_format: cli.output_format,
            extensions_dir: cli.extensions_dir,
        }
    }
}
