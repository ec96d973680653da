use crate::config::Config;
use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{document_from_json, render, write_output, OutputFormat};

#[derive(Debug, Args)]
pub struct HtmlArgs {
    /// Linear data JSON file to convert
    pub input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Linear data JSON → HTML
pub fn html(args: HtmlArgs, config: &Config, cwd: &str) -> Result<()> {
    let source = super::read_source(&args.input, cwd)?;
    let doc = document_from_json(&source)?;
    info!(input = %args.input, items = doc.len(), "converting to html");

    let html = render(doc.data(), OutputFormat::Html, &config.link_prefix, config.pretty)?;
    write_output(args.output.as_deref(), cwd, &html)
}
