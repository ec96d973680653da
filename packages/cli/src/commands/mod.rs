pub mod edit;
pub mod html;
pub mod linear;
pub mod wikitext;

pub use edit::{edit, EditArgs};
pub use html::{html, HtmlArgs};
pub use linear::{linear, LinearArgs};
pub use wikitext::{wikitext, WikitextArgs};

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use wikiedit_converter::Converter;
use wikiedit_dom::{parse_fragment, to_html};
use wikiedit_model::{Document, Item, LinearData};
use wikiedit_wikitext::{SerializerOptions, WikitextSerializer};

/// What a command writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Linear data as JSON
    Json,
    Html,
    Wikitext,
}

pub(crate) fn read_source(path: &str, cwd: &str) -> Result<String> {
    let path = PathBuf::from(cwd).join(path);
    fs::read_to_string(&path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Write `content` to `output`, or to stdout when no output file is given
pub(crate) fn write_output(output: Option<&str>, cwd: &str, content: &str) -> Result<()> {
    match output {
        Some(output) => {
            let path = PathBuf::from(cwd).join(output);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            println!("  {} {}", "✓".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub(crate) fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// Parse an HTML fragment and build a document from its linear data
pub(crate) fn document_from_html(source: &str) -> Result<Document> {
    let dom = parse_fragment(source)?;
    let data = Converter::with_defaults().get_data_from_dom(&dom)?;
    Ok(Document::with_defaults(data)?)
}

pub(crate) fn document_from_json(source: &str) -> Result<Document> {
    let data: LinearData = serde_json::from_str(source).context("Invalid linear data")?;
    Ok(Document::with_defaults(data)?)
}

/// Render linear data in `format`
pub(crate) fn render(data: &[Item], format: OutputFormat, link_prefix: &str, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(&data, pretty),
        OutputFormat::Html => {
            let dom = Converter::with_defaults().get_dom_from_data(data)?;
            Ok(to_html(&dom))
        }
        OutputFormat::Wikitext => {
            let dom = Converter::with_defaults().get_dom_from_data(data)?;
            let serializer = WikitextSerializer::new(SerializerOptions {
                link_prefix: link_prefix.to_string(),
            });
            Ok(serializer.serialize_dom(&dom)?)
        }
    }
}
