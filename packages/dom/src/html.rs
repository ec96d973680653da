//! HTML fragment tokenizer, parser and serializer.
//!
//! The parser is deliberately forgiving: missing closing tags are implied, stray closing
//! tags are dropped and a `<` that does not start markup is kept as text. Only markup that
//! cannot be delimited at all (an unterminated tag or comment) is an error.

use logos::{Lexer, Logos};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{HtmlError, HtmlResult};
use crate::node::{push_merged, DomNode};

/// Elements that never have content or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "blockquote", "div", "dl", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "ol", "p",
    "pre", "table", "ul",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum HtmlToken<'src> {
    #[token("<!--", lex_comment)]
    Comment(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"<[a-zA-Z][a-zA-Z0-9]*", lex_open_tag)]
    OpenTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

fn lex_comment<'src>(lex: &mut Lexer<'src, HtmlToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    let end = rest.find("-->").map(|index| index + 3).unwrap_or(rest.len());
    lex.bump(end);
    lex.slice()
}

fn lex_open_tag<'src>(lex: &mut Lexer<'src, HtmlToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    let mut quote: Option<char> = None;
    let mut end = rest.len();
    for (index, ch) in rest.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => {
                end = index + 1;
                break;
            }
            None => {}
        }
    }
    lex.bump(end);
    lex.slice()
}

/// Parse an HTML fragment into a list of top-level nodes.
pub fn parse_fragment(source: &str) -> HtmlResult<Vec<DomNode>> {
    let mut roots: Vec<DomNode> = Vec::new();
    let mut open: Vec<DomNode> = Vec::new();
    let mut lexer = HtmlToken::lexer(source);

    while let Some(token) = lexer.next() {
        let offset = lexer.span().start;
        match token {
            Ok(HtmlToken::Comment(raw)) => {
                let content = raw
                    .strip_prefix("<!--")
                    .and_then(|inner| inner.strip_suffix("-->"))
                    .ok_or(HtmlError::UnterminatedComment { offset })?;
                append(&mut roots, &mut open, DomNode::comment(content));
            }
            Ok(HtmlToken::OpenTag(raw)) => {
                if !raw.ends_with('>') {
                    return Err(HtmlError::UnterminatedTag { offset });
                }
                let (node, self_closing) = parse_open_tag(raw);
                let tag = node.tag().unwrap_or_default().to_string();
                close_implied(&mut roots, &mut open, &tag);
                if self_closing || is_void_element(&tag) {
                    append(&mut roots, &mut open, node);
                } else {
                    open.push(node);
                }
            }
            Ok(HtmlToken::CloseTag(raw)) => {
                let name = raw[2..raw.len() - 1].trim().to_ascii_lowercase();
                match open.iter().rposition(|node| node.tag() == Some(name.as_str())) {
                    Some(index) => close_to(&mut roots, &mut open, index),
                    None => debug!(tag = %name, offset, "dropping stray closing tag"),
                }
            }
            Ok(HtmlToken::Text(raw)) => {
                append(&mut roots, &mut open, DomNode::text(decode_entities(raw)));
            }
            Err(()) => {
                append(&mut roots, &mut open, DomNode::text(lexer.slice()));
            }
        }
    }
    close_to(&mut roots, &mut open, 0);

    Ok(roots)
}

fn append(roots: &mut Vec<DomNode>, open: &mut [DomNode], node: DomNode) {
    match open.last_mut() {
        Some(parent) => parent.push_child(node),
        None => push_merged(roots, node),
    }
}

/// Pop open elements down to (and including) `index`, attaching each to its parent.
fn close_to(roots: &mut Vec<DomNode>, open: &mut Vec<DomNode>, index: usize) {
    while open.len() > index {
        if let Some(node) = open.pop() {
            append(roots, open, node);
        }
    }
}

/// Close elements that an opening `tag` ends implicitly.
fn close_implied(roots: &mut Vec<DomNode>, open: &mut Vec<DomNode>, tag: &str) {
    let (closes, boundaries): (&[&str], &[&str]) = match tag {
        "li" => (&["li"], &["ul", "ol"]),
        "dt" | "dd" => (&["dt", "dd"], &["dl"]),
        "tr" => (&["tr", "td", "th"], &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => (&["td", "th"], &["tr", "table"]),
        "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot", "tr", "td", "th"], &["table"]),
        _ if BLOCK_ELEMENTS.contains(&tag) => (&["p"], &[]),
        _ => return,
    };
    // Block elements only end a paragraph that is directly open
    let top_only = boundaries.is_empty();
    let mut target = None;
    for index in (0..open.len()).rev() {
        let current = open[index].tag().unwrap_or_default();
        if boundaries.contains(&current) {
            break;
        }
        if closes.contains(&current) {
            target = Some(index);
        }
        if top_only {
            break;
        }
    }
    if let Some(index) = target {
        close_to(roots, open, index);
    }
}

/// Parse the source text of an opening tag (`<name attr="v">`) into an empty element.
fn parse_open_tag(raw: &str) -> (DomNode, bool) {
    let body = raw[1..raw.len() - 1].trim_end();
    let self_closing = body.ends_with('/');
    let body = body.trim_end_matches('/');
    let name_end = body
        .find(|ch: char| ch.is_whitespace() || ch == '/')
        .unwrap_or(body.len());
    let mut node = DomNode::element(&body[..name_end]);
    for (key, value) in parse_attributes(&body[name_end..]) {
        node.set_attr(key, value);
    }
    (node, self_closing)
}

fn parse_attributes(source: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() || ch == '/' {
            chars.next();
            continue;
        }
        let mut name_end = source.len();
        while let Some(&(index, ch)) = chars.peek() {
            if ch.is_whitespace() || ch == '=' || ch == '/' {
                name_end = index;
                break;
            }
            chars.next();
        }
        let name = source[start..name_end].to_ascii_lowercase();

        while matches!(chars.peek(), Some((_, ch)) if ch.is_whitespace()) {
            chars.next();
        }
        if !matches!(chars.peek(), Some((_, '='))) {
            attributes.insert(name, String::new());
            continue;
        }
        chars.next();
        while matches!(chars.peek(), Some((_, ch)) if ch.is_whitespace()) {
            chars.next();
        }

        let value = match chars.peek().copied() {
            Some((index, quote @ ('"' | '\''))) => {
                chars.next();
                let mut end = source.len();
                for (inner, ch) in chars.by_ref() {
                    if ch == quote {
                        end = inner;
                        break;
                    }
                }
                &source[index + 1..end]
            }
            Some((index, _)) => {
                let mut end = source.len();
                while let Some(&(inner, ch)) = chars.peek() {
                    if ch.is_whitespace() {
                        end = inner;
                        break;
                    }
                    chars.next();
                }
                &source[index..end]
            }
            None => "",
        };
        attributes.insert(name, decode_entities(value));
    }

    attributes
}

/// Decode the named entities HTML output commonly uses plus numeric references.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                output.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

pub fn escape_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
    output
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Serialize nodes back to HTML text.
pub fn to_html(nodes: &[DomNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        write_node(node, &mut output);
    }
    output
}

fn write_node(node: &DomNode, output: &mut String) {
    match node {
        DomNode::Text { content } => output.push_str(&escape_text(content)),
        DomNode::Comment { content } => {
            output.push_str("<!--");
            output.push_str(content);
            output.push_str("-->");
        }
        DomNode::Element {
            tag,
            attributes,
            children,
        } => {
            output.push('<');
            output.push_str(tag);
            for (key, value) in attributes {
                output.push(' ');
                output.push_str(key);
                output.push_str("=\"");
                output.push_str(&escape_attribute(value));
                output.push('"');
            }
            output.push('>');
            if is_void_element(tag) {
                return;
            }
            for child in children {
                write_node(child, output);
            }
            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
    }
}
