//! Sample document touching every built-in node type, used by tests and benches.

use crate::annotation::{Annotation, AnnotationSet};
use crate::data::{Element, Item, LinearData};

pub fn bold() -> Annotation {
    Annotation::new("textStyle/bold")
}

pub fn italic() -> Annotation {
    Annotation::new("textStyle/italic")
}

fn styled(ch: char, annotation: Annotation) -> Item {
    let mut set = AnnotationSet::new();
    set.insert(annotation);
    Item::Annotated(ch, set)
}

fn open(node_type: &str) -> Item {
    Item::open(node_type)
}

fn open_with(node_type: &str, key: &str, value: &str) -> Item {
    Item::Element(Element::open(node_type).with_attribute(key, value))
}

fn close(node_type: &str) -> Item {
    Item::close(node_type)
}

/// Sixty-one items:
///
/// ```text
///  0 heading(1) a b(bold) c(italic)                      4 /heading
///  5 table > tableSection(body) > tableRow > tableCell(data)
///  9   paragraph d /paragraph
/// 12   list(bullet) > listItem > paragraph e, nested list(bullet) f   25 /list
/// 26   list(number) > listItem > paragraph g                           32 /list
/// 33 /tableCell /tableRow /tableSection /table
/// 37 preformatted h image i                              42 /preformatted
/// 43 definitionList term j, definition k                 54 /definitionList
/// 55 paragraph l /paragraph  58 paragraph m /paragraph
/// ```
pub fn example_data() -> LinearData {
    let mut data = vec![
        Item::Element(Element::open("heading").with_attribute("level", 1)),
        Item::Char('a'),
        styled('b', bold()),
        styled('c', italic()),
        close("heading"),
        open("table"),
        open_with("tableSection", "style", "body"),
        open("tableRow"),
        open_with("tableCell", "style", "data"),
        open("paragraph"),
        Item::Char('d'),
        close("paragraph"),
        open_with("list", "style", "bullet"),
        open("listItem"),
        open("paragraph"),
        Item::Char('e'),
        close("paragraph"),
        open_with("list", "style", "bullet"),
        open("listItem"),
        open("paragraph"),
        Item::Char('f'),
        close("paragraph"),
        close("listItem"),
        close("list"),
        close("listItem"),
        close("list"),
        open_with("list", "style", "number"),
        open("listItem"),
        open("paragraph"),
        Item::Char('g'),
        close("paragraph"),
        close("listItem"),
        close("list"),
        close("tableCell"),
        close("tableRow"),
        close("tableSection"),
        close("table"),
        open("preformatted"),
        Item::Char('h'),
        open_with("image", "html/src", "image.png"),
        close("image"),
        Item::Char('i'),
        close("preformatted"),
        open("definitionList"),
        open_with("definitionListItem", "style", "term"),
        open("paragraph"),
        Item::Char('j'),
        close("paragraph"),
        close("definitionListItem"),
        open_with("definitionListItem", "style", "definition"),
        open("paragraph"),
        Item::Char('k'),
        close("paragraph"),
        close("definitionListItem"),
        close("definitionList"),
    ];
    for ch in ['l', 'm'] {
        data.push(open("paragraph"));
        data.push(Item::Char(ch));
        data.push(close("paragraph"));
    }
    data
}

/// A single empty paragraph
pub fn empty_paragraph() -> LinearData {
    vec![open("paragraph"), close("paragraph")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_example_shape() {
        let data = example_data();
        assert_eq!(data.len(), 61);
        let doc = Document::with_defaults(data).unwrap();
        assert_eq!(doc.tree().children(doc.root()).len(), 6);
        assert_eq!(doc.flatten(), doc.data().to_vec());
    }
}
