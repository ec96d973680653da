use crate::config::Config;
use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{document_from_html, render, write_output, OutputFormat};

#[derive(Debug, Args)]
pub struct LinearArgs {
    /// HTML file to convert
    pub input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print compact JSON even when the config asks for pretty output
    #[arg(long)]
    pub compact: bool,
}

/// HTML → linear data JSON
pub fn linear(args: LinearArgs, config: &Config, cwd: &str) -> Result<()> {
    let source = super::read_source(&args.input, cwd)?;
    let doc = document_from_html(&source)?;
    info!(input = %args.input, items = doc.len(), "converted to linear data");

    let json = render(doc.data(), OutputFormat::Json, &config.link_prefix, config.pretty && !args.compact)?;
    write_output(args.output.as_deref(), cwd, &json)
}
