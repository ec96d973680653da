//! # Wikitext Serializer
//!
//! A state machine over the token stream. Each tag name maps to a [`Handler`] that writes
//! the wiki syntax for its start and end tokens; tags without one, and tags the parser
//! marked as literal HTML, are written back as HTML.
//!
//! State carried between tokens:
//! - the number of newlines the output currently ends with, so block handlers add only the
//!   line breaks still missing
//! - line breaks owed by the last closed block, added before the next written text
//! - a stack of open lists with their accumulated bullets and item counts
//! - whether the next paragraph needs a blank line before it
//! - inside links, whether label text is dropped and which tail is peeled off

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wikiedit_dom::html::is_void_element;
use wikiedit_dom::DomNode;

use crate::dom::tokens_from_dom;
use crate::error::WikitextResult;
use crate::token::{Tag, Token};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerOptions {
    /// Path stripped from the front of internal link hrefs
    pub link_prefix: String,
}

#[derive(Debug, Clone, Default)]
pub struct WikitextSerializer {
    options: SerializerOptions,
}

impl WikitextSerializer {
    pub fn new(options: SerializerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serialize tokens, returning the written chunks in order
    pub fn serialize_tokens(&self, tokens: &[Token]) -> Vec<String> {
        let mut chunks = Vec::new();
        self.serialize_tokens_with(tokens, |chunk| chunks.push(chunk.to_string()));
        chunks
    }

    /// Serialize tokens, passing each chunk to `sink` as soon as it is written
    pub fn serialize_tokens_with<F: FnMut(&str)>(&self, tokens: &[Token], sink: F) {
        debug!(tokens = tokens.len(), "serializing tokens");
        let mut state = State::new(&self.options, sink);
        for token in tokens {
            state.serialize_token(token);
        }
    }

    #[instrument(skip_all, fields(nodes = nodes.len()))]
    pub fn serialize_dom(&self, nodes: &[DomNode]) -> WikitextResult<String> {
        let tokens = tokens_from_dom(nodes)?;
        Ok(self.serialize_tokens(&tokens).concat())
    }

    pub fn serialize_dom_with<F: FnMut(&str)>(&self, nodes: &[DomNode], sink: F) -> WikitextResult<()> {
        let tokens = tokens_from_dom(nodes)?;
        self.serialize_tokens_with(&tokens, sink);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Html,
    Silent,
    Quote(&'static str),
    List(&'static str),
    ListItem(&'static str),
    Table,
    TableSection,
    TableRow,
    TableCell {
        symbol: &'static str,
        same_row: &'static str,
    },
    Caption,
    Paragraph,
    Rule,
    Heading(usize),
    Preformatted,
    Link,
    Meta,
    Break,
}

impl Handler {
    fn for_tag(tag: &Tag) -> Self {
        if tag.hints.is_html() {
            return Handler::Html;
        }
        match tag.name.as_str() {
            "body" => Handler::Silent,
            "b" => Handler::Quote("'''"),
            "i" => Handler::Quote("''"),
            "ul" => Handler::List("*"),
            "ol" => Handler::List("#"),
            "dl" => Handler::List(""),
            "li" => Handler::ListItem(""),
            "dt" => Handler::ListItem(";"),
            "dd" => Handler::ListItem(":"),
            "table" => Handler::Table,
            "thead" | "tbody" | "tfoot" => Handler::TableSection,
            "tr" => Handler::TableRow,
            "td" => Handler::TableCell {
                symbol: "|",
                same_row: "||",
            },
            "th" => Handler::TableCell {
                symbol: "!",
                same_row: "!!",
            },
            "caption" => Handler::Caption,
            "p" => Handler::Paragraph,
            "hr" => Handler::Rule,
            "pre" => Handler::Preformatted,
            "a" => Handler::Link,
            "meta" => Handler::Meta,
            "br" => Handler::Break,
            name => match heading_level(name) {
                Some(level) => Handler::Heading(level),
                None => Handler::Html,
            },
        }
    }
}

fn heading_level(name: &str) -> Option<usize> {
    let level: usize = name.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

struct ListFrame {
    item_count: usize,
    bullets: String,
}

struct State<'a, F> {
    options: &'a SerializerOptions,
    sink: F,
    /// Nothing written yet; leading newlines are dropped
    at_start: bool,
    preceding_newlines: usize,
    pending_newlines: usize,
    ends_block: bool,
    need_paragraph_lines: bool,
    list_stack: Vec<ListFrame>,
    previous_open: Option<String>,
    current_open: Option<String>,
    drop_content: bool,
    drop_tail: Option<String>,
    in_pre: bool,
}

impl<'a, F: FnMut(&str)> State<'a, F> {
    fn new(options: &'a SerializerOptions, sink: F) -> Self {
        Self {
            options,
            sink,
            at_start: true,
            preceding_newlines: 0,
            pending_newlines: 0,
            ends_block: false,
            need_paragraph_lines: false,
            list_stack: Vec::new(),
            previous_open: None,
            current_open: None,
            drop_content: false,
            drop_tail: None,
            in_pre: false,
        }
    }

    fn serialize_token(&mut self, token: &Token) {
        self.previous_open = self.current_open.take();
        self.current_open = token.opened_tag().map(str::to_string);
        let was_dropping = self.drop_content;

        let output = match token {
            Token::TagOpen(tag) => self.start(Handler::for_tag(tag), tag),
            Token::TagClose(tag) => self.end(Handler::for_tag(tag), tag),
            Token::Text(text) if self.in_pre => self.preformat(text),
            Token::Text(text) => text.clone(),
            Token::Comment(comment) => format!("<!--{}-->", comment),
            Token::Newline => "\n".to_string(),
            Token::Eof => String::new(),
        };

        // Label text between a dropping link's start and end is not written
        if !output.is_empty() && !(was_dropping && self.drop_content) {
            self.emit(output);
        }
        if std::mem::take(&mut self.ends_block) {
            self.pending_newlines = self.pending_newlines.max(1);
        }
    }

    fn emit(&mut self, mut output: String) {
        let trailing = output.len() - output.trim_end_matches('\n').len();
        if trailing == output.len() {
            self.preceding_newlines += trailing;
        } else {
            if self.pending_newlines > 0 {
                let leading = output.len() - output.trim_start_matches('\n').len();
                let missing = self
                    .pending_newlines
                    .saturating_sub(self.preceding_newlines + leading);
                output.insert_str(0, &"\n".repeat(missing));
                self.pending_newlines = 0;
            }
            self.preceding_newlines = trailing;
        }

        if let Some(tail) = &self.drop_tail {
            if output.ends_with(tail.as_str()) {
                output.truncate(output.len() - tail.len());
            }
        }
        self.write(&output);
    }

    fn write(&mut self, chunk: &str) {
        let chunk = if self.at_start {
            chunk.trim_start_matches('\n')
        } else {
            chunk
        };
        if chunk.is_empty() {
            return;
        }
        self.at_start = false;
        (self.sink)(chunk);
    }

    /// Line breaks needed for the output to end with at least `count` of them
    fn new_lines(&self, count: usize) -> String {
        "\n".repeat(count.saturating_sub(self.preceding_newlines))
    }

    /// Owe a line break to whatever is written after the current token
    fn end_block(&mut self) {
        self.ends_block = true;
    }

    fn at_line_start(&self) -> bool {
        self.at_start || self.preceding_newlines > 0 || self.pending_newlines > 0
    }

    fn start(&mut self, handler: Handler, tag: &Tag) -> String {
        match handler {
            Handler::Html => html_start(tag),
            Handler::Silent | Handler::TableSection => String::new(),
            Handler::Quote(quote) => quote.to_string(),
            Handler::List(bullet) => self.list_start(bullet),
            Handler::ListItem(bullet) => self.list_item(bullet),
            Handler::Table => self.table_tag("{|", "", 1, tag),
            Handler::TableRow => {
                // The first row of a section needs no separator
                let after_section = matches!(
                    self.previous_open.as_deref(),
                    Some("thead" | "tbody" | "tfoot")
                );
                if after_section {
                    String::new()
                } else {
                    self.table_tag("|-", "", 1, tag)
                }
            }
            Handler::TableCell { symbol, same_row } => {
                if tag.hints.is_same_row() {
                    self.table_tag(same_row, " |", 0, tag)
                } else {
                    self.table_tag(symbol, " |", 1, tag)
                }
            }
            Handler::Caption => self.table_tag("|+", " |", 1, tag),
            Handler::Paragraph => {
                if !self.list_stack.is_empty() {
                    String::new()
                } else if self.need_paragraph_lines {
                    self.new_lines(2)
                } else {
                    self.need_paragraph_lines = true;
                    String::new()
                }
            }
            Handler::Rule => format!("{}----", self.new_lines(1)),
            Handler::Heading(level) => format!("{}{}", self.new_lines(1), "=".repeat(level)),
            Handler::Preformatted => {
                self.in_pre = true;
                self.new_lines(1)
            }
            Handler::Link => self.link_start(tag),
            Handler::Meta => match (tag.attr("typeof"), tag.attr("content")) {
                (Some("mw:tag"), Some(content)) => format!("<{}>", content),
                _ => html_start(tag),
            },
            Handler::Break => self.new_lines(2),
        }
    }

    fn end(&mut self, handler: Handler, tag: &Tag) -> String {
        match handler {
            Handler::Html => html_end(tag),
            Handler::Quote(quote) => quote.to_string(),
            Handler::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.need_paragraph_lines = true;
                    self.end_block();
                }
                String::new()
            }
            Handler::Table => {
                self.need_paragraph_lines = false;
                self.end_block();
                "\n|}".to_string()
            }
            Handler::Paragraph => {
                if self.list_stack.is_empty() {
                    self.end_block();
                }
                String::new()
            }
            Handler::Rule => {
                self.need_paragraph_lines = false;
                self.end_block();
                String::new()
            }
            Handler::Heading(level) => {
                self.need_paragraph_lines = false;
                self.end_block();
                "=".repeat(level)
            }
            Handler::Preformatted => {
                self.in_pre = false;
                self.end_block();
                String::new()
            }
            Handler::Link => self.link_end(tag),
            Handler::Meta => html_end(tag),
            Handler::Silent
            | Handler::ListItem(_)
            | Handler::TableSection
            | Handler::TableRow
            | Handler::TableCell { .. }
            | Handler::Caption
            | Handler::Break => String::new(),
        }
    }

    fn list_start(&mut self, bullet: &str) -> String {
        let after_item = self.previous_open.as_deref() == Some("li");
        let (bullets, full) = match self.list_stack.last_mut() {
            None => (bullet.to_string(), true),
            Some(frame) => {
                frame.item_count += 1;
                // Deeply nested, or not the first thing in its item
                let full = frame.item_count > 2 || (frame.item_count > 1 && !after_item);
                (format!("{}{}", frame.bullets, bullet), full)
            }
        };
        self.list_stack.push(ListFrame {
            item_count: 0,
            bullets: bullets.clone(),
        });
        if full {
            format!("{}{}", self.new_lines(1), bullets)
        } else {
            bullet.to_string()
        }
    }

    fn list_item(&mut self, bullet: &str) -> String {
        let Some(frame) = self.list_stack.last_mut() else {
            return bullet.to_string();
        };
        frame.item_count += 1;
        if frame.item_count == 1 {
            return bullet.to_string();
        }
        let bullets = format!("{}{}", frame.bullets, bullet);
        format!("{}{}", self.new_lines(1), bullets)
    }

    fn table_tag(&self, symbol: &str, options_end: &str, newlines: usize, tag: &Tag) -> String {
        let prefix = format!("{}{}", self.new_lines(newlines), symbol);
        if tag.attributes.is_empty() {
            prefix
        } else {
            format!("{} {}{}", prefix, serialize_attributes(&tag.attributes), options_end)
        }
    }

    fn link_start(&mut self, tag: &Tag) -> String {
        let (Some(rel), Some(href)) = (tag.attr("rel"), tag.attr("href")) else {
            return html_start(tag);
        };
        let hints = &tag.hints;
        match rel {
            "mw:wikiLink" => {
                let target = link_target(href, &self.options.link_prefix);
                let target = match hints.tail() {
                    Some(tail) => {
                        self.drop_tail = Some(tail.to_string());
                        match (&hints.s_href, hints.gc) {
                            (Some(original), true) => original.clone(),
                            _ => target.replace('_', " "),
                        }
                    }
                    None => match &hints.s_href {
                        // Keeps non-standard capitalisation
                        Some(original) if normalize_title(original) == normalize_title(&target) => {
                            original.clone()
                        }
                        _ => target.replace('_', " "),
                    },
                };
                if hints.gc {
                    self.drop_content = true;
                    format!("[[{}", target)
                } else {
                    format!("[[{}|", target)
                }
            }
            "mw:extLink" => {
                if hints.is_url_link() {
                    self.drop_content = true;
                    href.to_string()
                } else if hints.gc {
                    self.drop_content = true;
                    format!("[{}", href)
                } else {
                    format!("[{} ", href)
                }
            }
            _ => html_start(tag),
        }
    }

    fn link_end(&mut self, tag: &Tag) -> String {
        let (Some(rel), Some(_)) = (tag.attr("rel"), tag.attr("href")) else {
            return html_end(tag);
        };
        match rel {
            "mw:wikiLink" => {
                self.drop_content = false;
                self.drop_tail = None;
                format!("]]{}", tag.hints.tail().unwrap_or_default())
            }
            "mw:extLink" => {
                self.drop_content = false;
                if tag.hints.is_url_link() {
                    String::new()
                } else {
                    "]".to_string()
                }
            }
            _ => html_end(tag),
        }
    }

    /// Indent every line of preformatted text by one space
    fn preformat(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len() + 1);
        let mut line_start = self.at_line_start();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                output.push('\n');
                line_start = true;
            }
            if line_start && !line.is_empty() {
                output.push(' ');
            }
            output.push_str(line);
        }
        output
    }
}

fn html_start(tag: &Tag) -> String {
    let close = if is_void_element(&tag.name) { "/" } else { "" };
    if tag.attributes.is_empty() {
        format!("<{}{}>", tag.name, close)
    } else {
        format!(
            "<{} {}{}>",
            tag.name,
            serialize_attributes(&tag.attributes),
            close
        )
    }
}

fn html_end(tag: &Tag) -> String {
    if is_void_element(&tag.name) {
        String::new()
    } else {
        format!("</{}>", tag.name)
    }
}

fn serialize_attributes(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .filter_map(|(key, value)| match (key.is_empty(), value.is_empty()) {
            (false, false) => Some(format!("{}=\"{}\"", key, value.replace('"', "&quot;"))),
            (false, true) => Some(key.clone()),
            (true, false) => Some(value.clone()),
            (true, true) => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Internal link target: prefix stripped and percent-decoded
fn link_target(href: &str, prefix: &str) -> String {
    let raw = href.strip_prefix(prefix).unwrap_or(href);
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Title as the wiki stores it: single spaces, first letter upper case
fn normalize_title(title: &str) -> String {
    let spaced = title.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("h3"), Some(3));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("hr"), None);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("foo_bar  baz"), "Foo bar baz");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_link_target() {
        assert_eq!(link_target("./Caf%C3%A9_au_lait", "./"), "Café_au_lait");
        assert_eq!(link_target("Other", "./"), "Other");
    }

    #[test]
    fn test_serialize_attributes() {
        let attributes = vec![
            ("class".to_string(), "a \"b\"".to_string()),
            ("hidden".to_string(), String::new()),
        ];
        assert_eq!(
            serialize_attributes(&attributes),
            "class=\"a &quot;b&quot;\" hidden"
        );
    }

    #[test]
    fn test_html_fallback_for_void_elements() {
        let tag = Tag::new("img").with_attr("src", "x.png");
        assert_eq!(html_start(&tag), "<img src=\"x.png\"/>");
        assert_eq!(html_end(&tag), "");
        assert_eq!(html_end(&Tag::new("span")), "</span>");
    }
}
