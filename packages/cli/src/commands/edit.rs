use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};
use wikiedit_editor::{AnnotationMethod, EditorResult, History, Surface, Transaction};
use wikiedit_model::{Annotation, Document, Item, Range};

use super::{document_from_json, render, write_output, OutputFormat};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Linear data JSON file to edit
    pub input: String,

    /// JSON list of edits to apply in order
    #[arg(short, long)]
    pub script: String,

    /// Number of steps to undo after the script has run
    #[arg(long, default_value_t = 0)]
    pub undo: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// One entry of an edit script. Each entry becomes its own undo step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditIntent {
    Insert {
        offset: usize,
        data: Vec<Item>,
    },

    Remove {
        from: usize,
        to: usize,
    },

    #[serde(rename_all = "camelCase")]
    Attribute {
        offset: usize,
        key: String,
        /// Removes the attribute when absent
        #[serde(default)]
        value: Option<Value>,
    },

    Annotate {
        from: usize,
        to: usize,
        #[serde(default = "default_method")]
        method: AnnotationMethod,
        annotation: Annotation,
    },

    #[serde(rename_all = "camelCase")]
    Convert {
        from: usize,
        to: usize,
        node_type: String,
        #[serde(default)]
        attributes: Option<BTreeMap<String, Value>>,
    },

    #[serde(rename_all = "camelCase")]
    Wrap {
        from: usize,
        to: usize,
        #[serde(default)]
        unwrap_outer: Vec<Item>,
        #[serde(default)]
        wrap_outer: Vec<Item>,
        #[serde(default)]
        unwrap_each: Vec<Item>,
        #[serde(default)]
        wrap_each: Vec<Item>,
    },
}

fn default_method() -> AnnotationMethod {
    AnnotationMethod::Set
}

impl EditIntent {
    /// Build the transaction for this edit against the surface's document and commit it
    pub fn apply(&self, surface: &mut Surface) -> EditorResult<()> {
        let doc = surface.document();
        match self {
            EditIntent::Insert { offset, data } => {
                let tx = Transaction::new_from_insertion(doc, *offset, data)?;
                let end = offset.saturating_add_signed(tx.length_difference());
                surface.change(Some(tx), Some(Range::collapsed(end)))
            }
            EditIntent::Remove { from, to } => {
                let range = Range::new(*from, *to);
                let tx = Transaction::new_from_removal(doc, range)?;
                let start = tx.translate_offset(range.start());
                surface.change(Some(tx), Some(Range::collapsed(start)))
            }
            EditIntent::Attribute { offset, key, value } => {
                let tx = Transaction::new_from_attribute_change(doc, *offset, key, value.clone())?;
                surface.change(Some(tx), None)
            }
            EditIntent::Annotate {
                from,
                to,
                method,
                annotation,
            } => {
                surface.change(None, Some(Range::new(*from, *to)))?;
                surface.annotate(*method, annotation)
            }
            EditIntent::Convert {
                from,
                to,
                node_type,
                attributes,
            } => {
                let range = Range::new(*from, *to);
                let tx = Transaction::new_from_content_branch_conversion(
                    doc,
                    range,
                    node_type,
                    attributes.clone(),
                )?;
                surface.change(Some(tx), Some(range))
            }
            EditIntent::Wrap {
                from,
                to,
                unwrap_outer,
                wrap_outer,
                unwrap_each,
                wrap_each,
            } => {
                let tx = Transaction::new_from_wrap(
                    doc,
                    Range::new(*from, *to),
                    unwrap_outer,
                    wrap_outer,
                    unwrap_each,
                    wrap_each,
                )?;
                let selection = Range::new(tx.translate_offset(*from), tx.translate_offset(*to));
                surface.change(Some(tx), Some(selection))
            }
        }
    }
}

/// Apply `intents` in order, then undo `undo` steps. Returns the edited document.
pub fn run_script(
    doc: Document,
    intents: &[EditIntent],
    undo: usize,
    history: History,
) -> Result<Document> {
    let mut surface = Surface::with_history(doc, history);

    for (index, intent) in intents.iter().enumerate() {
        intent
            .apply(&mut surface)
            .with_context(|| format!("Edit #{} failed", index + 1))?;
        surface.breakpoint();
        debug!(index, len = surface.document().len(), "applied edit");
    }

    let mut undone = 0;
    while undone < undo && surface.undo()?.is_some() {
        undone += 1;
    }
    if undone < undo {
        eprintln!(
            "{} only {} of {} steps could be undone",
            "Warning:".yellow().bold(),
            undone,
            undo
        );
    }

    info!(edits = intents.len(), undone, "edit script finished");
    Ok(surface.into_document())
}

pub fn edit(args: EditArgs, config: &Config, cwd: &str) -> Result<()> {
    let doc = document_from_json(&super::read_source(&args.input, cwd)?)?;
    let intents: Vec<EditIntent> = serde_json::from_str(&super::read_source(&args.script, cwd)?)
        .context("Invalid edit script")?;

    let history = match config.history_limit {
        Some(limit) => History::with_max_levels(limit),
        None => History::new(),
    };
    let doc = run_script(doc, &intents, args.undo, history)?;

    let output = render(doc.data(), args.format, &config.link_prefix, config.pretty)?;
    write_output(args.output.as_deref(), cwd, &output)
}
