use wikiedit_dom::DomNode;

use crate::annotation::Annotation;
use crate::factory::{AnnotationDescriptor, AnnotationFactory};

const TEXT_STYLES: &[(&str, &str)] = &[
    ("bold", "b"),
    ("italic", "i"),
    ("underline", "u"),
    ("strike", "s"),
    ("subscript", "sub"),
    ("superscript", "sup"),
    ("code", "code"),
];

pub(crate) fn register(factory: &mut AnnotationFactory) {
    let _ = factory.register(
        "textStyle",
        AnnotationDescriptor::new().with_converters(
            &["b", "i", "u", "s", "sub", "sup", "code"],
            |subtype, _| {
                TEXT_STYLES
                    .iter()
                    .find(|(style, _)| *style == subtype)
                    .map(|(_, tag)| DomNode::element(*tag))
            },
            |tag, _| {
                TEXT_STYLES
                    .iter()
                    .find(|(_, style_tag)| *style_tag == tag)
                    .map(|(style, _)| Annotation::new(format!("textStyle/{}", style)))
            },
        ),
    );
    let _ = factory.register(
        "link",
        AnnotationDescriptor::new().with_converters(&["a"], link_to_dom, link_to_data),
    );
}

/// `rel="mw:<subtype>"` names the link kind; `data-type` is the fallback
fn link_to_data(_: &str, node: &DomNode) -> Option<Annotation> {
    let subtype = node
        .attr("rel")
        .and_then(|rel| rel.strip_prefix("mw:"))
        .or_else(|| node.attr("data-type"))
        .unwrap_or("unknown");
    let mut annotation = Annotation::new(format!("link/{}", subtype));
    if let Some(href) = node.attr("href") {
        annotation = annotation.with_data("href", href);
    }
    if let Some(hints) = node.attr("data-mw") {
        annotation = annotation.with_data("hints", hints);
    }
    Some(annotation)
}

fn link_to_dom(subtype: &str, annotation: &Annotation) -> Option<DomNode> {
    let mut node = DomNode::element("a");
    match subtype {
        "unknown" => {}
        "wikiLink" | "extLink" | "urlLink" => node.set_attr("rel", format!("mw:{}", subtype)),
        _ => node.set_attr("data-type", subtype),
    }
    if let Some(href) = annotation.data_str("href") {
        node.set_attr("href", href);
    }
    if let Some(hints) = annotation.data_str("hints") {
        node.set_attr("data-mw", hints);
    }
    Some(node)
}
