//! Registries mapping symbolic node and annotation types to their behaviour.
//!
//! A type is registered with a descriptor holding its structural rules and its DOM
//! converters. Converters must be stated explicitly: either a converter set, or an explicit
//! "none" for types with no external representation (document root, text, aliens).

use std::collections::HashMap;
use std::fmt;
use wikiedit_dom::DomNode;

use crate::annotation::{split_type, Annotation};
use crate::data::Element;
use crate::error::{ModelError, ModelResult};

/// Structural rules of a node type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRules {
    pub is_wrapped: bool,
    pub is_content: bool,
    pub can_contain_content: bool,
    /// Allowed child types; `None` allows anything, an empty list makes a leaf
    pub child_node_types: Option<Vec<String>>,
    /// Allowed parent types; `None` allows anything, an empty list forbids any parent
    pub parent_node_types: Option<Vec<String>>,
}

impl NodeRules {
    /// Wrapped branch with unrestricted children and parents
    pub fn branch() -> Self {
        Self {
            is_wrapped: true,
            is_content: false,
            can_contain_content: false,
            child_node_types: None,
            parent_node_types: None,
        }
    }

    /// Wrapped node without children
    pub fn leaf() -> Self {
        Self {
            child_node_types: Some(Vec::new()),
            ..Self::branch()
        }
    }

    pub fn content(mut self) -> Self {
        self.is_content = true;
        self
    }

    pub fn containing_content(mut self) -> Self {
        self.can_contain_content = true;
        self
    }

    pub fn unwrapped(mut self) -> Self {
        self.is_wrapped = false;
        self
    }

    pub fn with_children(mut self, types: &[&str]) -> Self {
        self.child_node_types = Some(types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_parents(mut self, types: &[&str]) -> Self {
        self.parent_node_types = Some(types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn can_have_children(&self) -> bool {
        self.child_node_types
            .as_ref()
            .map_or(true, |types| !types.is_empty())
    }

    pub fn can_have_grandchildren(&self) -> bool {
        self.can_have_children() && !self.can_contain_content && !self.is_content
    }
}

pub type ToDomElement = fn(&Element) -> Option<DomNode>;
pub type ToDataElement = fn(&str, &DomNode) -> Option<Element>;

#[derive(Clone)]
pub struct NodeConverters {
    pub dom_element_types: Vec<String>,
    pub to_dom_element: ToDomElement,
    pub to_data_element: ToDataElement,
}

impl fmt::Debug for NodeConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConverters")
            .field("dom_element_types", &self.dom_element_types)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    pub rules: NodeRules,
    // Outer None: converters never stated. Inner None: explicitly unconvertible.
    converters: Option<Option<NodeConverters>>,
}

impl NodeDescriptor {
    pub fn new(rules: NodeRules) -> Self {
        Self {
            rules,
            converters: None,
        }
    }

    pub fn with_converters(
        mut self,
        dom_element_types: &[&str],
        to_dom_element: ToDomElement,
        to_data_element: ToDataElement,
    ) -> Self {
        self.converters = Some(Some(NodeConverters {
            dom_element_types: dom_element_types.iter().map(|t| t.to_string()).collect(),
            to_dom_element,
            to_data_element,
        }));
        self
    }

    pub fn without_converters(mut self) -> Self {
        self.converters = Some(None);
        self
    }

    pub fn converters(&self) -> Option<&NodeConverters> {
        self.converters.as_ref().and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    registry: HashMap<String, NodeDescriptor>,
    order: Vec<String>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every built-in node type registered
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        crate::builtin::register_nodes(&mut factory);
        factory
    }

    pub fn register(
        &mut self,
        node_type: impl Into<String>,
        descriptor: NodeDescriptor,
    ) -> ModelResult<()> {
        let node_type = node_type.into();
        if descriptor.converters.is_none() {
            return Err(ModelError::MissingConverters(node_type));
        }
        if self.registry.insert(node_type.clone(), descriptor).is_none() {
            self.order.push(node_type);
        }
        Ok(())
    }

    pub fn lookup(&self, node_type: &str) -> ModelResult<&NodeDescriptor> {
        self.registry
            .get(node_type)
            .ok_or_else(|| ModelError::unknown_type(node_type))
    }

    /// Opening element for a registered node type
    pub fn create(&self, node_type: &str) -> ModelResult<Element> {
        self.lookup(node_type)?;
        Ok(Element::open(node_type))
    }

    pub fn rules(&self, node_type: &str) -> ModelResult<&NodeRules> {
        self.lookup(node_type).map(|descriptor| &descriptor.rules)
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.registry.contains_key(node_type)
    }

    /// Registered type names in registration order
    pub fn registered_types(&self) -> &[String] {
        &self.order
    }

    pub fn can_node_have_children(&self, node_type: &str) -> ModelResult<bool> {
        Ok(self.rules(node_type)?.can_have_children())
    }

    pub fn can_node_have_grandchildren(&self, node_type: &str) -> ModelResult<bool> {
        Ok(self.rules(node_type)?.can_have_grandchildren())
    }

    pub fn can_node_contain_content(&self, node_type: &str) -> ModelResult<bool> {
        Ok(self.rules(node_type)?.can_contain_content)
    }

    pub fn is_node_content(&self, node_type: &str) -> ModelResult<bool> {
        Ok(self.rules(node_type)?.is_content)
    }

    pub fn is_node_wrapped(&self, node_type: &str) -> ModelResult<bool> {
        Ok(self.rules(node_type)?.is_wrapped)
    }

    pub fn child_node_types(&self, node_type: &str) -> ModelResult<Option<&[String]>> {
        Ok(self.rules(node_type)?.child_node_types.as_deref())
    }

    pub fn parent_node_types(&self, node_type: &str) -> ModelResult<Option<&[String]>> {
        Ok(self.rules(node_type)?.parent_node_types.as_deref())
    }

    /// Node types with converters, in registration order
    pub fn converters(&self) -> impl Iterator<Item = (&str, &NodeConverters)> {
        self.order.iter().filter_map(|node_type| {
            self.registry
                .get(node_type)
                .and_then(NodeDescriptor::converters)
                .map(|converters| (node_type.as_str(), converters))
        })
    }
}

pub type ToDomAnnotation = fn(&str, &Annotation) -> Option<DomNode>;
pub type ToDataAnnotation = fn(&str, &DomNode) -> Option<Annotation>;

#[derive(Clone)]
pub struct AnnotationConverters {
    pub dom_element_types: Vec<String>,
    /// Called with the annotation subtype
    pub to_dom_element: ToDomAnnotation,
    /// Called with the DOM tag name
    pub to_data_annotation: ToDataAnnotation,
}

impl fmt::Debug for AnnotationConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationConverters")
            .field("dom_element_types", &self.dom_element_types)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationDescriptor {
    converters: Option<Option<AnnotationConverters>>,
}

impl AnnotationDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converters(
        mut self,
        dom_element_types: &[&str],
        to_dom_element: ToDomAnnotation,
        to_data_annotation: ToDataAnnotation,
    ) -> Self {
        self.converters = Some(Some(AnnotationConverters {
            dom_element_types: dom_element_types.iter().map(|t| t.to_string()).collect(),
            to_dom_element,
            to_data_annotation,
        }));
        self
    }

    pub fn without_converters(mut self) -> Self {
        self.converters = Some(None);
        self
    }

    pub fn converters(&self) -> Option<&AnnotationConverters> {
        self.converters.as_ref().and_then(Option::as_ref)
    }
}

/// Registry of annotation types, keyed by base type (`textStyle`, `link`)
#[derive(Debug, Clone, Default)]
pub struct AnnotationFactory {
    registry: HashMap<String, AnnotationDescriptor>,
    order: Vec<String>,
}

impl AnnotationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        crate::builtin::register_annotations(&mut factory);
        factory
    }

    pub fn register(
        &mut self,
        base_type: impl Into<String>,
        descriptor: AnnotationDescriptor,
    ) -> ModelResult<()> {
        let base_type = base_type.into();
        if descriptor.converters.is_none() {
            return Err(ModelError::MissingConverters(base_type));
        }
        if self.registry.insert(base_type.clone(), descriptor).is_none() {
            self.order.push(base_type);
        }
        Ok(())
    }

    /// Descriptor for a full annotation type such as `textStyle/bold`
    pub fn lookup(&self, annotation_type: &str) -> ModelResult<&AnnotationDescriptor> {
        let (base, _) = split_type(annotation_type);
        self.registry
            .get(base)
            .ok_or_else(|| ModelError::unknown_annotation_type(annotation_type))
    }

    pub fn create(&self, annotation_type: &str) -> ModelResult<Annotation> {
        self.lookup(annotation_type)?;
        Ok(Annotation::new(annotation_type))
    }

    pub fn registered_types(&self) -> &[String] {
        &self.order
    }

    pub fn converters(&self) -> impl Iterator<Item = (&str, &AnnotationConverters)> {
        self.order.iter().filter_map(|base_type| {
            self.registry
                .get(base_type)
                .and_then(AnnotationDescriptor::converters)
                .map(|converters| (base_type.as_str(), converters))
        })
    }
}
