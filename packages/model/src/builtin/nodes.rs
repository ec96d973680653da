use wikiedit_dom::DomNode;

use crate::data::Element;
use crate::factory::{NodeDescriptor, NodeFactory, NodeRules};

pub(crate) fn register(factory: &mut NodeFactory) {
    let types = [
        (
            "document",
            NodeDescriptor::new(NodeRules::branch().unwrapped().with_parents(&[]))
                .without_converters(),
        ),
        (
            "text",
            NodeDescriptor::new(NodeRules::leaf().unwrapped().content()).without_converters(),
        ),
        (
            "alienInline",
            NodeDescriptor::new(NodeRules::leaf().content()).without_converters(),
        ),
        (
            "alienBlock",
            NodeDescriptor::new(NodeRules::leaf()).without_converters(),
        ),
        (
            "paragraph",
            NodeDescriptor::new(NodeRules::branch().containing_content()).with_converters(
                &["p"],
                |_| Some(DomNode::element("p")),
                |_, _| Some(Element::open("paragraph")),
            ),
        ),
        (
            "heading",
            NodeDescriptor::new(NodeRules::branch().containing_content()).with_converters(
                &["h1", "h2", "h3", "h4", "h5", "h6"],
                heading_to_dom,
                heading_to_data,
            ),
        ),
        (
            "preformatted",
            NodeDescriptor::new(NodeRules::branch().containing_content()).with_converters(
                &["pre"],
                |_| Some(DomNode::element("pre")),
                |_, _| Some(Element::open("preformatted")),
            ),
        ),
        (
            "list",
            NodeDescriptor::new(NodeRules::branch().with_children(&["listItem"])).with_converters(
                &["ul", "ol"],
                |element| match element.attribute_str("style") {
                    Some("number") => Some(DomNode::element("ol")),
                    Some("bullet") => Some(DomNode::element("ul")),
                    _ => None,
                },
                |tag, _| {
                    let style = if tag == "ol" { "number" } else { "bullet" };
                    Some(Element::open("list").with_attribute("style", style))
                },
            ),
        ),
        (
            "listItem",
            NodeDescriptor::new(NodeRules::branch().with_parents(&["list"])).with_converters(
                &["li"],
                |_| Some(DomNode::element("li")),
                |_, _| Some(Element::open("listItem")),
            ),
        ),
        (
            "definitionList",
            NodeDescriptor::new(NodeRules::branch().with_children(&["definitionListItem"]))
                .with_converters(
                    &["dl"],
                    |_| Some(DomNode::element("dl")),
                    |_, _| Some(Element::open("definitionList")),
                ),
        ),
        (
            "definitionListItem",
            NodeDescriptor::new(NodeRules::branch().with_parents(&["definitionList"]))
                .with_converters(
                    &["dt", "dd"],
                    |element| match element.attribute_str("style") {
                        Some("term") => Some(DomNode::element("dt")),
                        Some("definition") => Some(DomNode::element("dd")),
                        _ => None,
                    },
                    |tag, _| {
                        let style = if tag == "dt" { "term" } else { "definition" };
                        Some(Element::open("definitionListItem").with_attribute("style", style))
                    },
                ),
        ),
        (
            "table",
            NodeDescriptor::new(NodeRules::branch().with_children(&["tableSection"]))
                .with_converters(
                    &["table"],
                    |_| Some(DomNode::element("table")),
                    |_, _| Some(Element::open("table")),
                ),
        ),
        (
            "tableSection",
            NodeDescriptor::new(
                NodeRules::branch()
                    .with_children(&["tableRow"])
                    .with_parents(&["table"]),
            )
            .with_converters(
                &["thead", "tbody", "tfoot"],
                |element| match element.attribute_str("style") {
                    Some("header") => Some(DomNode::element("thead")),
                    Some("footer") => Some(DomNode::element("tfoot")),
                    _ => Some(DomNode::element("tbody")),
                },
                |tag, _| {
                    let style = match tag {
                        "thead" => "header",
                        "tfoot" => "footer",
                        _ => "body",
                    };
                    Some(Element::open("tableSection").with_attribute("style", style))
                },
            ),
        ),
        (
            "tableRow",
            NodeDescriptor::new(
                NodeRules::branch()
                    .with_children(&["tableCell"])
                    .with_parents(&["tableSection"]),
            )
            .with_converters(
                &["tr"],
                |_| Some(DomNode::element("tr")),
                |_, _| Some(Element::open("tableRow")),
            ),
        ),
        (
            "tableCell",
            NodeDescriptor::new(NodeRules::branch().with_parents(&["tableRow"])).with_converters(
                &["td", "th"],
                |element| match element.attribute_str("style") {
                    Some("header") => Some(DomNode::element("th")),
                    _ => Some(DomNode::element("td")),
                },
                |tag, _| {
                    let style = if tag == "th" { "header" } else { "data" };
                    Some(Element::open("tableCell").with_attribute("style", style))
                },
            ),
        ),
        (
            "image",
            NodeDescriptor::new(NodeRules::leaf().content()).with_converters(
                &["img"],
                |_| Some(DomNode::element("img")),
                |_, _| Some(Element::open("image")),
            ),
        ),
    ];

    for (node_type, descriptor) in types {
        // Every descriptor above states its converters, so registration cannot fail
        let _ = factory.register(node_type, descriptor);
    }
}

fn heading_to_dom(element: &Element) -> Option<DomNode> {
    let level = element.attribute("level")?.as_u64()?;
    (1..=6)
        .contains(&level)
        .then(|| DomNode::element(format!("h{}", level)))
}

fn heading_to_data(tag: &str, _: &DomNode) -> Option<Element> {
    let level: u8 = tag.strip_prefix('h')?.parse().ok()?;
    Some(Element::open("heading").with_attribute("level", level))
}
