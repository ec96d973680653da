use wikiedit_dom::DomNode;

use crate::error::{WikitextError, WikitextResult};
use crate::hints::{DataHints, HINTS_ATTRIBUTE};
use crate::token::{Tag, Token};

/// Flatten DOM nodes into a token stream, depth first, ending with [`Token::Eof`]
pub fn tokens_from_dom(nodes: &[DomNode]) -> WikitextResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for node in nodes {
        push_tokens(node, &mut tokens)?;
    }
    tokens.push(Token::Eof);
    Ok(tokens)
}

fn push_tokens(node: &DomNode, tokens: &mut Vec<Token>) -> WikitextResult<()> {
    match node {
        DomNode::Element {
            tag,
            attributes,
            children,
        } => {
            let hints = match attributes.get(HINTS_ATTRIBUTE) {
                Some(source) => {
                    DataHints::parse(source).map_err(|error| WikitextError::invalid_hints(tag, error))?
                }
                None => DataHints::default(),
            };
            let tag = Tag {
                name: tag.clone(),
                attributes: attributes
                    .iter()
                    .filter(|(key, _)| key.as_str() != HINTS_ATTRIBUTE)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
                hints,
            };
            tokens.push(Token::TagOpen(tag.clone()));
            for child in children {
                push_tokens(child, tokens)?;
            }
            tokens.push(Token::TagClose(tag));
        }
        DomNode::Text { content } => tokens.push(Token::Text(content.clone())),
        DomNode::Comment { content } => tokens.push(Token::Comment(content.clone())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flatten_with_hints() {
        let node = DomNode::element("a")
            .with_attr("href", "Foo")
            .with_attr(HINTS_ATTRIBUTE, r#"{"tail":"s"}"#)
            .with_child(DomNode::text("Foos"));
        let tokens = tokens_from_dom(&[node]).unwrap();
        let tag = Tag::new("a").with_attr("href", "Foo").with_hints(DataHints {
            tail: Some("s".to_string()),
            ..DataHints::default()
        });
        assert_eq!(
            tokens,
            vec![
                Token::TagOpen(tag.clone()),
                Token::text("Foos"),
                Token::TagClose(tag),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_hints() {
        let node = DomNode::element("td").with_attr(HINTS_ATTRIBUTE, "{");
        assert!(matches!(
            tokens_from_dom(&[node]),
            Err(WikitextError::InvalidHints { tag, .. }) if tag == "td"
        ));
    }
}
