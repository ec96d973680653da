use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};
use wikiedit_dom::{parse_fragment, DomNode};
use wikiedit_model::factory::{ToDataAnnotation, ToDataElement, ToDomAnnotation, ToDomElement};
use wikiedit_model::{
    Annotation, AnnotationFactory, AnnotationSet, Element, Item, LinearData, NodeFactory,
};

use crate::error::{ConverterError, ConverterResult};

/// Model attributes with this prefix are plain DOM attributes
pub const HTML_ATTRIBUTE_PREFIX: &str = "html/";

/// Marks DOM elements generated by the parser rather than authored
pub const GENERATED_CONTENT_ATTRIBUTE: &str = "data-mw-gc";

/// Attribute of alien nodes holding their original markup
pub const ALIEN_HTML_ATTRIBUTE: &str = "html";

const ALIEN_INLINE: &str = "alienInline";
const ALIEN_BLOCK: &str = "alienBlock";
const DEFAULT_WRAPPER: &str = "paragraph";

fn is_alien(node_type: &str) -> bool {
    node_type == ALIEN_INLINE || node_type == ALIEN_BLOCK
}

/// Converts between DOM trees and linear data using the converters registered on a pair of
/// factories
#[derive(Clone)]
pub struct Converter {
    nodes: Arc<NodeFactory>,
    elements_to_dom: HashMap<String, ToDomElement>,
    elements_to_data: HashMap<String, ToDataElement>,
    annotations_to_dom: HashMap<String, ToDomAnnotation>,
    annotations_to_data: HashMap<String, ToDataAnnotation>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("element_tags", &self.elements_to_data.keys().collect::<Vec<_>>())
            .field("annotation_tags", &self.annotations_to_data.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Converter {
    pub fn new(nodes: Arc<NodeFactory>, annotations: &AnnotationFactory) -> Self {
        let mut elements_to_dom = HashMap::new();
        let mut elements_to_data = HashMap::new();
        for (node_type, converters) in nodes.converters() {
            elements_to_dom.insert(node_type.to_string(), converters.to_dom_element);
            for tag in &converters.dom_element_types {
                elements_to_data.insert(tag.clone(), converters.to_data_element);
            }
        }

        let mut annotations_to_dom = HashMap::new();
        let mut annotations_to_data = HashMap::new();
        for (base_type, converters) in annotations.converters() {
            annotations_to_dom.insert(base_type.to_string(), converters.to_dom_element);
            for tag in &converters.dom_element_types {
                annotations_to_data.insert(tag.clone(), converters.to_data_annotation);
            }
        }

        Self {
            nodes,
            elements_to_dom,
            elements_to_data,
            annotations_to_dom,
            annotations_to_data,
        }
    }

    /// Converter over the built-in node and annotation types
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(NodeFactory::with_defaults()),
            &AnnotationFactory::with_defaults(),
        )
    }

    pub fn node_factory(&self) -> &Arc<NodeFactory> {
        &self.nodes
    }

    /// One item per character, each carrying its own copy of `annotations`
    pub fn data_content_from_text(text: &str, annotations: &[Annotation]) -> LinearData {
        if annotations.is_empty() {
            return text.chars().map(Item::Char).collect();
        }
        let set: AnnotationSet = annotations.iter().map(Annotation::normalized).collect();
        text.chars()
            .map(|ch| Item::Annotated(ch, set.clone()))
            .collect()
    }

    /// DOM element for an opening data element. Aliens and unregistered types have none.
    ///
    /// Only `html/*` attributes are carried over, with the prefix stripped.
    pub fn dom_element_from_data_element(&self, element: &Element) -> Option<DomNode> {
        let node_type = element.node_type();
        if is_alien(node_type) {
            return None;
        }
        let to_dom = self.elements_to_dom.get(node_type)?;
        let mut node = to_dom(element)?;
        if let Some(attributes) = &element.attributes {
            for (key, value) in attributes {
                if let Some(name) = key.strip_prefix(HTML_ATTRIBUTE_PREFIX) {
                    node.set_attr(name, attribute_text(value));
                }
            }
        }
        Some(node)
    }

    /// Data element for a DOM element. Generated content and unregistered tags have none.
    ///
    /// Every DOM attribute is kept as an `html/*` attribute.
    pub fn data_element_from_dom_element(&self, node: &DomNode) -> Option<Element> {
        let tag = node.tag()?;
        if node.has_attr(GENERATED_CONTENT_ATTRIBUTE) {
            return None;
        }
        let to_data = self.elements_to_data.get(tag)?;
        let mut element = to_data(tag, node)?;
        if let Some(attributes) = node.attributes() {
            for (name, value) in attributes {
                element.set_attribute(format!("{}{}", HTML_ATTRIBUTE_PREFIX, name), value.as_str());
            }
        }
        Some(element)
    }

    pub fn annotation_from_dom_element(&self, node: &DomNode) -> Option<Annotation> {
        let tag = node.tag()?;
        let to_data = self.annotations_to_data.get(tag)?;
        to_data(tag, node)
    }

    pub fn dom_element_from_annotation(&self, annotation: &Annotation) -> Option<DomNode> {
        let to_dom = self.annotations_to_dom.get(annotation.base_type())?;
        to_dom(annotation.sub_type(), annotation)
    }

    /// Linear data for a list of DOM nodes treated as the children of the document root
    #[instrument(skip_all, fields(nodes = dom.len()))]
    pub fn get_data_from_dom(&self, dom: &[DomNode]) -> ConverterResult<LinearData> {
        let mut data = Vec::new();
        self.convert_children(dom, &[], "document", false, &mut data)?;
        debug!(items = data.len(), "converted dom to linear data");
        Ok(data)
    }

    fn convert_children(
        &self,
        children: &[DomNode],
        annotations: &[Annotation],
        branch_type: &str,
        already_wrapped: bool,
        data: &mut LinearData,
    ) -> ConverterResult<()> {
        let contains_content = self.nodes.can_node_contain_content(branch_type)?;
        let mut wrapping = false;

        for child in children {
            let needs_wrapper = !wrapping && !already_wrapped && !contains_content;
            match child {
                DomNode::Element { .. } => {
                    let in_content = contains_content || wrapping || already_wrapped;
                    if in_content && child.has_attr(GENERATED_CONTENT_ATTRIBUTE) {
                        data.extend(alien(ALIEN_INLINE, child, annotations));
                        continue;
                    }

                    if let Some(annotation) = self.annotation_from_dom_element(child) {
                        if needs_wrapper {
                            data.push(Item::open(DEFAULT_WRAPPER));
                            wrapping = true;
                        }
                        let mut nested = annotations.to_vec();
                        nested.push(annotation);
                        self.convert_children(
                            child.children(),
                            &nested,
                            branch_type,
                            wrapping || already_wrapped,
                            data,
                        )?;
                        continue;
                    }

                    match self.data_element_from_dom_element(child) {
                        Some(mut element) => {
                            let node_type = element.node_type().to_string();
                            if self.nodes.is_node_content(&node_type)? {
                                if needs_wrapper {
                                    data.push(Item::open(DEFAULT_WRAPPER));
                                    wrapping = true;
                                }
                                if !annotations.is_empty() {
                                    element.annotations =
                                        Some(annotations.iter().map(Annotation::normalized).collect());
                                }
                            } else if wrapping {
                                data.push(Item::close(DEFAULT_WRAPPER));
                                wrapping = false;
                            }
                            data.push(Item::Element(element));
                            self.convert_children(child.children(), &[], &node_type, false, data)?;
                            data.push(Item::close(&node_type));
                        }
                        None if in_content => {
                            data.extend(alien(ALIEN_INLINE, child, annotations));
                        }
                        None => {
                            data.extend(alien(ALIEN_BLOCK, child, &[]));
                        }
                    }
                }
                DomNode::Text { content } => {
                    if needs_wrapper {
                        // Formatting whitespace between blocks
                        if content.trim().is_empty() {
                            continue;
                        }
                        data.push(Item::open(DEFAULT_WRAPPER));
                        wrapping = true;
                    }
                    data.extend(Self::data_content_from_text(content, annotations));
                }
                DomNode::Comment { .. } => {}
            }
        }

        if wrapping {
            data.push(Item::close(DEFAULT_WRAPPER));
        }
        Ok(())
    }

    /// DOM nodes for linear data.
    ///
    /// Annotations that stay set across consecutive characters keep their DOM element; one
    /// that ends closes the elements opened inside it, and those still set are reopened. New
    /// annotations open innermost, in hash order when several start together.
    #[instrument(skip_all, fields(items = data.len()))]
    pub fn get_dom_from_data(&self, data: &[Item]) -> ConverterResult<Vec<DomNode>> {
        let mut builder = DomBuilder::new();
        let mut index = 0;

        while index < data.len() {
            match &data[index] {
                Item::Char(ch) => {
                    builder.sync_annotations(self, None)?;
                    builder.push_text(*ch);
                }
                Item::Annotated(ch, annotations) => {
                    builder.sync_annotations(self, Some(annotations))?;
                    builder.push_text(*ch);
                }
                Item::Element(element) if element.is_close() => {
                    builder.sync_annotations(self, None)?;
                    builder.pop();
                }
                Item::Element(element) => {
                    let node_type = element.node_type();
                    if self.nodes.is_node_content(node_type)? {
                        builder.sync_annotations(self, element.annotations.as_ref())?;
                    } else {
                        builder.sync_annotations(self, None)?;
                    }

                    if is_alien(node_type) {
                        let html = element
                            .attribute_str(ALIEN_HTML_ATTRIBUTE)
                            .ok_or_else(|| ConverterError::MissingAlienHtml(node_type.to_string()))?;
                        for node in parse_fragment(html)? {
                            builder.append(node);
                        }
                        // Aliens are leaves: skip the closing
                        index += 2;
                        continue;
                    }

                    let node = self
                        .dom_element_from_data_element(element)
                        .ok_or_else(|| ConverterError::unconvertible_element(node_type))?;
                    builder.open(node, None);
                }
            }
            index += 1;
        }

        Ok(builder.finish())
    }
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn alien(node_type: &str, node: &DomNode, annotations: &[Annotation]) -> [Item; 2] {
    let mut element = Element::open(node_type).with_attribute(ALIEN_HTML_ATTRIBUTE, node.outer_html());
    if !annotations.is_empty() {
        element.annotations = Some(annotations.iter().map(Annotation::normalized).collect());
    }
    [Item::Element(element), Item::close(node_type)]
}

struct Frame {
    node: DomNode,
    /// Hash of the annotation this element renders, `None` for node elements
    annotation: Option<String>,
}

/// Stack of DOM elements under construction. The bottom frame is a container that is never
/// popped.
struct DomBuilder {
    stack: Vec<Frame>,
}

impl DomBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                node: DomNode::element("div"),
                annotation: None,
            }],
        }
    }

    fn append(&mut self, node: DomNode) {
        if let Some(frame) = self.stack.last_mut() {
            frame.node.push_child(node);
        }
    }

    fn push_text(&mut self, ch: char) {
        self.append(DomNode::text(ch.to_string()));
    }

    fn open(&mut self, node: DomNode, annotation: Option<String>) {
        self.stack.push(Frame { node, annotation });
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                self.append(frame.node);
            }
        }
    }

    /// Index of the outermost annotation frame on top of the stack
    fn annotations_start(&self) -> usize {
        let open = self
            .stack
            .iter()
            .rev()
            .take_while(|frame| frame.annotation.is_some())
            .count();
        self.stack.len() - open
    }

    fn is_open(&self, hash: &str) -> bool {
        self.stack[self.annotations_start()..]
            .iter()
            .any(|frame| frame.annotation.as_deref() == Some(hash))
    }

    /// Close and open annotation elements so the open ones match `target`
    fn sync_annotations(
        &mut self,
        converter: &Converter,
        target: Option<&AnnotationSet>,
    ) -> ConverterResult<()> {
        let start = self.annotations_start();
        let ended = (start..self.stack.len()).find(|&index| {
            let hash = self.stack[index].annotation.as_deref().unwrap_or_default();
            !target.is_some_and(|set| set.contains(hash))
        });
        if let Some(ended) = ended {
            while self.stack.len() > ended {
                self.pop();
            }
        }

        if let Some(set) = target {
            for (hash, annotation) in set.iter() {
                if self.is_open(hash) {
                    continue;
                }
                let node = converter.dom_element_from_annotation(annotation).ok_or_else(|| {
                    ConverterError::unconvertible_annotation(&annotation.annotation_type)
                })?;
                self.open(node, Some(hash.clone()));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<DomNode> {
        while self.stack.len() > 1 {
            self.pop();
        }
        match self.stack.pop() {
            Some(Frame {
                node: DomNode::Element { children, .. },
                ..
            }) => children,
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wikiedit_model::example::{bold, italic};

    #[test]
    fn test_data_content_from_text() {
        assert_eq!(
            Converter::data_content_from_text("ab", &[]),
            vec![Item::Char('a'), Item::Char('b')]
        );
        let set: AnnotationSet = [bold()].into_iter().collect();
        assert_eq!(
            Converter::data_content_from_text("x", &[bold()]),
            vec![Item::Annotated('x', set)]
        );
    }

    #[test]
    fn test_html_attributes_round_trip() {
        let converter = Converter::with_defaults();
        let node = DomNode::element("h2").with_attr("id", "top");
        let element = converter.data_element_from_dom_element(&node).unwrap();
        assert_eq!(element.attribute("level"), Some(&Value::from(2u8)));
        assert_eq!(element.attribute_str("html/id"), Some("top"));
        assert_eq!(converter.dom_element_from_data_element(&element), Some(node));
    }

    #[test]
    fn test_unconvertible_elements() {
        let converter = Converter::with_defaults();
        let generated = DomNode::element("p").with_attr(GENERATED_CONTENT_ATTRIBUTE, "1");
        assert_eq!(converter.data_element_from_dom_element(&generated), None);
        assert_eq!(converter.data_element_from_dom_element(&DomNode::element("span")), None);
        assert_eq!(
            converter.dom_element_from_data_element(&Element::open(ALIEN_BLOCK)),
            None
        );
    }

    #[test]
    fn test_annotation_nesting_keeps_first_seen_outermost() {
        let converter = Converter::with_defaults();
        let both: AnnotationSet = [bold(), italic()].into_iter().collect();
        let data = vec![
            Item::open("paragraph"),
            Item::Annotated('a', [bold()].into_iter().collect()),
            Item::Annotated('b', both),
            Item::Annotated('c', [italic()].into_iter().collect()),
            Item::Char('d'),
            Item::close("paragraph"),
        ];
        let dom = converter.get_dom_from_data(&data).unwrap();
        assert_eq!(
            wikiedit_dom::to_html(&dom),
            "<p><b>a<i>b</i></b><i>c</i>d</p>"
        );
    }
}
