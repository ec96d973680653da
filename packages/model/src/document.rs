use std::sync::Arc;
use tracing::debug;

use crate::build::{build_nodes, empty_text};
use crate::data::{Element, Item};
use crate::error::{ModelError, ModelResult};
use crate::factory::NodeFactory;
use crate::range::Range;
use crate::tree::{Node, NodeId, NodeTree};

/// Linear data plus the node tree and offset map kept in sync with it
#[derive(Debug, Clone)]
pub struct Document {
    factory: Arc<NodeFactory>,
    data: Vec<Item>,
    /// `data.len() + 1` entries: the deepest branch covering each offset
    offset_map: Vec<NodeId>,
    tree: NodeTree,
    root: NodeId,
}

/// A run of siblings under one parent, as replaced by a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingSpan {
    pub parent: NodeId,
    pub index: usize,
    pub count: usize,
    /// Outer range of the siblings, collapsed at the insertion point when `count` is 0
    pub range: Range,
}

impl Document {
    pub fn new(factory: Arc<NodeFactory>, data: Vec<Item>) -> ModelResult<Self> {
        let mut tree = NodeTree::new();
        let root = tree.alloc(Node::new("document", factory.rules("document")?.clone()));
        let built = build_nodes(&factory, &mut tree, &data, root)?;
        tree.attach_children(root, built.children);
        let mut offset_map = built.offset_map;
        offset_map.push(root);
        debug!(items = data.len(), nodes = tree.len(), "built document");

        Ok(Self {
            factory,
            data,
            offset_map,
            tree,
            root,
        })
    }

    /// Document over the built-in node types
    pub fn with_defaults(data: Vec<Item>) -> ModelResult<Self> {
        Self::new(Arc::new(NodeFactory::with_defaults()), data)
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn shared_factory(&self) -> Arc<NodeFactory> {
        Arc::clone(&self.factory)
    }

    pub fn data(&self) -> &[Item] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Item> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn item(&self, offset: usize) -> Option<&Item> {
        self.data.get(offset)
    }

    pub fn item_mut(&mut self, offset: usize) -> Option<&mut Item> {
        self.data.get_mut(offset)
    }

    /// Copy of a range of data, clamped to the document. `None` copies everything.
    pub fn get_data(&self, range: Option<Range>) -> Vec<Item> {
        match range {
            Some(range) => {
                let end = range.end().min(self.data.len());
                let start = range.start().min(end);
                self.data[start..end].to_vec()
            }
            None => self.data.clone(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    pub fn offset_map(&self) -> &[NodeId] {
        &self.offset_map
    }

    /// Deepest branch node covering `offset`
    pub fn node_from_offset(&self, offset: usize) -> Option<NodeId> {
        self.offset_map.get(offset).copied()
    }

    /// Offset of a node's first item (its opening marker when wrapped)
    pub fn offset_from_node(&self, id: NodeId) -> usize {
        self.tree.offset_of(id)
    }

    pub fn node_range(&self, id: NodeId) -> Range {
        self.tree.inner_range(id)
    }

    pub fn node_outer_range(&self, id: NodeId) -> Range {
        self.tree.outer_range(id)
    }

    /// Inner data of a node
    pub fn data_from_node(&self, id: NodeId) -> Option<&[Item]> {
        self.tree.get(id)?;
        let range = self.node_range(id);
        self.data.get(range.start()..range.end())
    }

    /// Opening marker of a wrapped node
    pub fn element_of(&self, id: NodeId) -> Option<&Element> {
        if !self.tree.get(id)?.is_wrapped() {
            return None;
        }
        self.data.get(self.offset_from_node(id))?.element()
    }

    /// Opening of a node with its type and attributes, used to reopen a node after a split
    pub fn cloned_element(&self, id: NodeId) -> Option<Element> {
        self.element_of(id).map(Element::cloned_opening)
    }

    /// Splice linear data and the offset map together.
    ///
    /// Inserted offset-map entries copy the entry at `at`; the rebuild or resize that follows
    /// the splice corrects them.
    pub fn splice_both(
        &mut self,
        at: usize,
        remove: usize,
        insert: Vec<Item>,
    ) -> ModelResult<Vec<Item>> {
        if at + remove > self.data.len() {
            return Err(ModelError::out_of_bounds(at + remove, self.data.len()));
        }
        let fill = self.offset_map[at];
        let inserted = insert.len();
        let removed: Vec<Item> = self.data.splice(at..at + remove, insert).collect();
        self.offset_map
            .splice(at..at + remove, std::iter::repeat(fill).take(inserted));
        debug_assert_eq!(self.offset_map.len(), self.data.len() + 1);
        Ok(removed)
    }

    /// Replace `count` children of `parent` starting at `index` with nodes rebuilt from the
    /// `new_length` items at `offset`, and overwrite that part of the offset map.
    pub fn rebuild_nodes(
        &mut self,
        parent: NodeId,
        index: usize,
        count: usize,
        offset: usize,
        new_length: usize,
    ) -> ModelResult<Vec<NodeId>> {
        let end = offset + new_length;
        if end > self.data.len() {
            return Err(ModelError::out_of_bounds(end, self.data.len()));
        }
        if self.tree.get(parent).is_none() {
            return Err(ModelError::DetachedNode(parent.0));
        }
        let built = build_nodes(&self.factory, &mut self.tree, &self.data[offset..end], parent)?;
        let mut added = built.children;
        let remaining = self.tree.children(parent).len().saturating_sub(count);
        if added.is_empty() && remaining == 0 && self.tree[parent].can_contain_content() {
            added.push(empty_text(&self.factory, &mut self.tree)?);
        }
        let removed = self
            .tree
            .splice_children(parent, index, count, added.clone());
        for node in removed {
            self.tree.release(node);
        }
        self.offset_map[offset..end].copy_from_slice(&built.offset_map);
        debug!(
            parent = %parent,
            index,
            removed = count,
            added = added.len(),
            offset,
            new_length,
            "rebuilt nodes"
        );
        Ok(added)
    }

    /// Change a node's length by `delta`, propagating to its ancestors
    pub fn resize_node(&mut self, id: NodeId, delta: isize) -> ModelResult<()> {
        if self.tree.get(id).is_none() {
            return Err(ModelError::DetachedNode(id.0));
        }
        self.tree.adjust_length(id, delta);
        Ok(())
    }

    /// Wrapped node whose opening marker sits at `offset`
    pub fn node_opened_at(&self, offset: usize) -> Option<NodeId> {
        let mut node = self.root;
        let mut start = 0;
        'descend: loop {
            let mut child_start = start + usize::from(self.tree[node].is_wrapped());
            for &child in self.tree.children(node) {
                let child_node = &self.tree[child];
                let child_end = child_start + child_node.outer_length();
                if child_start == offset && child_node.is_wrapped() {
                    return Some(child);
                }
                if child_start < offset && offset < child_end {
                    node = child;
                    start = child_start;
                    continue 'descend;
                }
                if child_start > offset {
                    return None;
                }
                child_start = child_end;
            }
            return None;
        }
    }

    /// Deepest wrapped branch (or the root) whose inner range contains `range`
    pub fn branch_containing(&self, range: Range) -> NodeId {
        let mut node = self.root;
        'descend: loop {
            let mut offset = self.tree.offset_of(node) + usize::from(self.tree[node].is_wrapped());
            for &child in self.tree.children(node) {
                let child_node = &self.tree[child];
                let inner_start = offset + 1;
                let inner_end = inner_start + child_node.length;
                if child_node.is_wrapped()
                    && child_node.can_have_children()
                    && inner_start <= range.start()
                    && range.end() <= inner_end
                {
                    node = child;
                    continue 'descend;
                }
                offset += child_node.outer_length();
                if offset > range.end() {
                    break;
                }
            }
            return node;
        }
    }

    /// Siblings a rebuild of `range` has to replace.
    ///
    /// Inside a content branch every child is rebuilt so text runs stay maximal. Elsewhere
    /// the children overlapping the range are taken, widened to neighbouring text nodes.
    pub fn rebuild_span(&self, range: Range) -> SiblingSpan {
        let parent = self.branch_containing(range);
        let inner = self.tree.inner_range(parent);
        let children = self.tree.children(parent);

        if self.tree[parent].can_contain_content() {
            return SiblingSpan {
                parent,
                index: 0,
                count: children.len(),
                range: inner,
            };
        }

        let mut first: Option<usize> = None;
        let mut last = 0;
        let mut insertion = 0;
        let mut bounds = Vec::with_capacity(children.len());
        let mut offset = inner.start();
        for (index, &child) in children.iter().enumerate() {
            let start = offset;
            offset += self.tree[child].outer_length();
            bounds.push(Range::new(start, offset));
            if offset <= range.start() {
                insertion = index + 1;
            }
            let overlaps = if range.is_collapsed() {
                start < range.start() && range.start() < offset
            } else {
                start < range.end() && range.start() < offset
            };
            if overlaps {
                first.get_or_insert(index);
                last = index;
            }
        }

        let is_text = |index: usize| children.get(index).is_some_and(|&id| self.tree[id].is_text());
        let (mut from, mut to) = match first {
            Some(first) => (first, last + 1),
            None => (insertion, insertion),
        };
        if from > 0 && is_text(from - 1) {
            from -= 1;
        }
        if is_text(to) {
            to += 1;
        }

        let range = if from < to {
            Range::new(bounds[from].start(), bounds[to - 1].end())
        } else {
            Range::collapsed(bounds.get(from).map_or(inner.end(), |b| b.start()))
        };
        SiblingSpan {
            parent,
            index: from,
            count: to - from,
            range,
        }
    }

    /// Linear data reproduced by walking the tree depth first
    pub fn flatten(&self) -> Vec<Item> {
        let mut output = Vec::with_capacity(self.data.len());
        let mut cursor = 0;
        self.flatten_node(self.root, &mut cursor, &mut output);
        output
    }

    fn flatten_node(&self, id: NodeId, cursor: &mut usize, output: &mut Vec<Item>) {
        let node = &self.tree[id];
        let wrapped = node.is_wrapped();
        if wrapped {
            if let Some(item) = self.data.get(*cursor) {
                output.push(item.clone());
            }
            *cursor += 1;
        }
        if node.children.is_empty() {
            let end = (*cursor + node.length).min(self.data.len());
            output.extend_from_slice(&self.data[(*cursor).min(end)..end]);
            *cursor += node.length;
        } else {
            for &child in &node.children {
                self.flatten_node(child, cursor, output);
            }
        }
        if wrapped {
            if let Some(item) = self.data.get(*cursor) {
                output.push(item.clone());
            }
            *cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chars;

    fn paragraphs() -> Document {
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("ab"));
        data.push(Item::close("paragraph"));
        data.push(Item::open("paragraph"));
        data.extend(chars("cd"));
        data.push(Item::close("paragraph"));
        Document::with_defaults(data).unwrap()
    }

    #[test]
    fn test_splice_both_keeps_lockstep() {
        let mut doc = paragraphs();
        let removed = doc.splice_both(1, 1, chars("xyz")).unwrap();
        assert_eq!(removed, chars("a"));
        assert_eq!(doc.offset_map().len(), doc.len() + 1);
        assert!(doc.splice_both(10, 1, Vec::new()).is_err());
    }

    #[test]
    fn test_branch_containing() {
        let doc = paragraphs();
        let first = doc.tree().children(doc.root())[0];
        assert_eq!(doc.branch_containing(Range::new(1, 2)), first);
        assert_eq!(doc.branch_containing(Range::new(3, 5)), doc.root());
        assert_eq!(doc.branch_containing(Range::collapsed(4)), doc.root());
    }

    #[test]
    fn test_rebuild_span_in_content_branch() {
        let doc = paragraphs();
        let first = doc.tree().children(doc.root())[0];
        let span = doc.rebuild_span(Range::collapsed(2));
        assert_eq!(span.parent, first);
        assert_eq!((span.index, span.count), (0, 1));
        assert_eq!(span.range, Range::new(1, 3));
    }

    #[test]
    fn test_rebuild_span_between_siblings() {
        let doc = paragraphs();
        let span = doc.rebuild_span(Range::collapsed(4));
        assert_eq!(span.parent, doc.root());
        assert_eq!((span.index, span.count), (1, 0));
        assert_eq!(span.range, Range::collapsed(4));

        let span = doc.rebuild_span(Range::new(3, 5));
        assert_eq!((span.index, span.count), (0, 2));
        assert_eq!(span.range, Range::new(0, 8));
    }

    #[test]
    fn test_rebuild_keeps_content_branch_non_empty() {
        let data = vec![
            Item::open("paragraph"),
            Item::open("image"),
            Item::close("image"),
            Item::close("paragraph"),
        ];
        let mut doc = Document::with_defaults(data).unwrap();
        let paragraph = doc.tree().children(doc.root())[0];
        assert_eq!(doc.tree().children(paragraph).len(), 1);

        doc.splice_both(1, 2, Vec::new()).unwrap();
        let added = doc.rebuild_nodes(paragraph, 0, 1, 1, 0).unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(doc.tree().children(paragraph), &added[..]);
        let text = &doc.tree()[added[0]];
        assert!(text.is_text());
        assert_eq!(text.length, 0);
        assert_eq!(doc.tree()[paragraph].length, 0);

        let fresh = Document::with_defaults(doc.data().to_vec()).unwrap();
        let fresh_paragraph = fresh.tree().children(fresh.root())[0];
        assert_eq!(fresh.tree().children(fresh_paragraph).len(), 1);
    }

    #[test]
    fn test_flatten_round_trip() {
        let doc = paragraphs();
        assert_eq!(doc.flatten(), doc.data().to_vec());
    }
}
