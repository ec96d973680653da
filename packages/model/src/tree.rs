//! Node tree stored in an arena.
//!
//! Nodes refer to each other by [`NodeId`]. Detached subtrees are released back to a free
//! list so rebuilt ranges reuse their slots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

use crate::factory::NodeRules;
use crate::range::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub node_type: String,
    /// Inner length: items owned, excluding the node's own markers
    pub length: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub rules: NodeRules,
}

impl Node {
    pub fn new(node_type: impl Into<String>, rules: NodeRules) -> Self {
        Self {
            node_type: node_type.into(),
            length: 0,
            parent: None,
            children: Vec::new(),
            rules,
        }
    }

    pub fn outer_length(&self) -> usize {
        self.length + if self.rules.is_wrapped { 2 } else { 0 }
    }

    pub fn is_wrapped(&self) -> bool {
        self.rules.is_wrapped
    }

    pub fn can_have_children(&self) -> bool {
        self.rules.can_have_children()
    }

    pub fn can_contain_content(&self) -> bool {
        self.rules.can_contain_content
    }

    pub fn is_content(&self) -> bool {
        self.rules.is_content
    }

    pub fn is_text(&self) -> bool {
        self.node_type == "text"
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Free a node and its whole subtree
    pub fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.slots.get_mut(current.0).and_then(Option::take) {
                pending.extend(node.children);
                self.free.push(current);
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| &node.children)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Attach children to a freshly built node; its length becomes their total outer length
    pub(crate) fn attach_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        let mut length = 0;
        for &child in &children {
            if let Some(node) = self.get_mut(child) {
                node.parent = Some(id);
                length += node.outer_length();
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.length = length;
            node.children = children;
        }
    }

    pub(crate) fn set_length(&mut self, id: NodeId, length: usize) {
        if let Some(node) = self.get_mut(id) {
            node.length = length;
        }
    }

    /// Replace `remove` children of `parent` starting at `index`, adjusting ancestor lengths.
    /// Returns the detached children; the caller decides whether to release them.
    pub fn splice_children(
        &mut self,
        parent: NodeId,
        index: usize,
        remove: usize,
        insert: Vec<NodeId>,
    ) -> Vec<NodeId> {
        let mut delta: isize = 0;
        for &child in &insert {
            if let Some(node) = self.get_mut(child) {
                node.parent = Some(parent);
                delta += node.outer_length() as isize;
            }
        }
        let removed: Vec<NodeId> = match self.get_mut(parent) {
            Some(node) => {
                let end = (index + remove).min(node.children.len());
                let start = index.min(end);
                node.children.splice(start..end, insert).collect()
            }
            None => return Vec::new(),
        };
        for &child in &removed {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
                delta -= node.outer_length() as isize;
            }
        }
        self.adjust_length(parent, delta);
        removed
    }

    /// Change a node's length and propagate the change to every ancestor
    pub fn adjust_length(&mut self, id: NodeId, delta: isize) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.get_mut(node_id) {
                Some(node) => {
                    node.length = node.length.saturating_add_signed(delta);
                    current = node.parent;
                }
                None => break,
            }
        }
    }

    /// Offset of the node's first item (its opening marker when wrapped)
    pub fn offset_of(&self, id: NodeId) -> usize {
        let mut offset = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            for &sibling in self.children(parent) {
                if sibling == current {
                    break;
                }
                offset += self.get(sibling).map_or(0, Node::outer_length);
            }
            if self.get(parent).is_some_and(Node::is_wrapped) {
                offset += 1;
            }
            current = parent;
        }
        offset
    }

    pub fn outer_range(&self, id: NodeId) -> Range {
        let start = self.offset_of(id);
        Range::new(start, start + self.get(id).map_or(0, Node::outer_length))
    }

    pub fn inner_range(&self, id: NodeId) -> Range {
        let outer = self.outer_range(id);
        match self.get(id) {
            Some(node) if node.is_wrapped() => Range::new(outer.start() + 1, outer.end() - 1),
            _ => outer,
        }
    }

    /// Whether two nodes sit at the same depth under same-typed ancestors up to a common one
    pub fn can_be_merged(&self, first: NodeId, second: NodeId) -> bool {
        let (mut n1, mut n2) = (first, second);
        while n1 != n2 {
            let (Some(a), Some(b)) = (self.get(n1), self.get(n2)) else {
                return false;
            };
            if a.node_type != b.node_type {
                return false;
            }
            match (a.parent, b.parent) {
                (Some(p1), Some(p2)) => {
                    n1 = p1;
                    n2 = p2;
                }
                _ => return false,
            }
        }
        true
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }
}

impl Index<NodeId> for NodeTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} has been released", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(tree: &mut NodeTree, node_type: &str) -> NodeId {
        tree.alloc(Node::new(node_type, NodeRules::branch()))
    }

    fn text(tree: &mut NodeTree, length: usize) -> NodeId {
        let id = tree.alloc(Node::new("text", NodeRules::leaf().unwrapped().content()));
        tree.set_length(id, length);
        id
    }

    #[test]
    fn test_offsets_and_lengths() {
        let mut tree = NodeTree::new();
        let root = tree.alloc(Node::new("document", NodeRules::branch().unwrapped()));
        let p1 = branch(&mut tree, "paragraph");
        let t1 = text(&mut tree, 3);
        tree.attach_children(p1, vec![t1]);
        let p2 = branch(&mut tree, "paragraph");
        let t2 = text(&mut tree, 2);
        tree.attach_children(p2, vec![t2]);
        tree.attach_children(root, vec![p1, p2]);

        assert_eq!(tree[root].length, 9);
        assert_eq!(tree.outer_range(p2), Range::new(5, 9));
        assert_eq!(tree.inner_range(t2), Range::new(6, 8));

        tree.adjust_length(t1, 2);
        assert_eq!(tree[p1].length, 5);
        assert_eq!(tree[root].length, 11);
        assert_eq!(tree.offset_of(t2), 8);
    }

    #[test]
    fn test_splice_and_release() {
        let mut tree = NodeTree::new();
        let root = tree.alloc(Node::new("document", NodeRules::branch().unwrapped()));
        let p1 = branch(&mut tree, "paragraph");
        let t1 = text(&mut tree, 1);
        tree.attach_children(p1, vec![t1]);
        tree.attach_children(root, vec![p1]);

        let p2 = branch(&mut tree, "heading");
        let removed = tree.splice_children(root, 0, 1, vec![p2]);
        assert_eq!(removed, vec![p1]);
        assert_eq!(tree[root].length, 2);
        tree.release(p1);
        assert!(tree.get(t1).is_none());
        assert_eq!(tree.len(), 2);
        let reused = branch(&mut tree, "paragraph");
        assert!(reused == p1 || reused == t1);
    }

    #[test]
    fn test_can_be_merged() {
        let mut tree = NodeTree::new();
        let root = tree.alloc(Node::new("document", NodeRules::branch().unwrapped()));
        let a = branch(&mut tree, "paragraph");
        let b = branch(&mut tree, "paragraph");
        let list = branch(&mut tree, "list");
        let item = branch(&mut tree, "listItem");
        let c = branch(&mut tree, "paragraph");
        tree.attach_children(item, vec![c]);
        tree.attach_children(list, vec![item]);
        tree.attach_children(root, vec![a, b, list]);

        assert!(tree.can_be_merged(a, b));
        assert!(!tree.can_be_merged(a, c));
        assert!(!tree.can_be_merged(a, list));
    }
}
