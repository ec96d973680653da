use crate::config::Config;
use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{document_from_html, render, write_output, OutputFormat};

#[derive(Debug, Args)]
pub struct WikitextArgs {
    /// HTML file to convert
    pub input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Internal link prefix (overrides config)
    #[arg(long)]
    pub link_prefix: Option<String>,
}

/// HTML → linear data → HTML → wikitext.
///
/// The HTML is rebuilt from the document rather than serialized as read, so the output is
/// what an editor holding this document would save.
pub fn wikitext(args: WikitextArgs, config: &Config, cwd: &str) -> Result<()> {
    let source = super::read_source(&args.input, cwd)?;
    let doc = document_from_html(&source)?;
    let link_prefix = args.link_prefix.as_deref().unwrap_or(&config.link_prefix);
    info!(input = %args.input, items = doc.len(), link_prefix, "converting to wikitext");

    let text = render(doc.data(), OutputFormat::Wikitext, link_prefix, config.pretty)?;
    write_output(args.output.as_deref(), cwd, &text)
}
