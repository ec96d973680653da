use crate::document::Document;
use crate::range::Range;
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Deepest nodes without children touched by the range
    Leaves,
    /// Children of the deepest branch containing the whole range
    Siblings,
    /// Nodes the range covers entirely, or partially covered content branches and the
    /// innermost non-content branches the range enters
    Covered,
}

/// One node picked by [`Document::select_nodes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelection {
    pub node: NodeId,
    /// Selected part of the node's inner range; `None` when the node is entirely covered
    pub range: Option<Range>,
    pub index: usize,
    pub parent: Option<NodeId>,
    pub node_range: Range,
    pub node_outer_range: Range,
}

impl Document {
    pub fn select_nodes(&self, range: Range, mode: SelectMode) -> Vec<NodeSelection> {
        let range = range.normalized();
        let mut selection = Vec::new();
        match mode {
            SelectMode::Leaves => self.select_leaves(self.root(), range, &mut selection),
            SelectMode::Covered => self.select_covered(self.root(), range, &mut selection),
            SelectMode::Siblings => {
                let parent = self.branch_containing(range);
                for (index, &child) in self.tree().children(parent).iter().enumerate() {
                    let outer = self.node_outer_range(child);
                    if touches(&outer, &range) {
                        selection.push(self.selection_of(child, index, range));
                    }
                }
            }
        }
        selection
    }

    fn selection_of(&self, node: NodeId, index: usize, range: Range) -> NodeSelection {
        let node_range = self.node_range(node);
        let node_outer_range = self.node_outer_range(node);
        let covered = range.encloses(&node_outer_range) && !node_outer_range.is_collapsed();
        NodeSelection {
            node,
            range: (!covered).then(|| range.intersection(&node_range)),
            index,
            parent: self.tree().parent(node),
            node_range,
            node_outer_range,
        }
    }

    fn select_leaves(&self, parent: NodeId, range: Range, selection: &mut Vec<NodeSelection>) {
        for (index, &child) in self.tree().children(parent).iter().enumerate() {
            let node = &self.tree()[child];
            let outer = self.node_outer_range(child);
            if !touches(&outer, &range) {
                continue;
            }
            if node.children.is_empty() {
                selection.push(self.selection_of(child, index, range));
            } else if touches(&self.node_range(child), &range) {
                self.select_leaves(child, range, selection);
            }
        }
    }

    fn select_covered(&self, parent: NodeId, range: Range, selection: &mut Vec<NodeSelection>) {
        for (index, &child) in self.tree().children(parent).iter().enumerate() {
            let node = &self.tree()[child];
            let outer = self.node_outer_range(child);
            if !outer.overlaps(&range) {
                continue;
            }
            let inner = self.node_range(child);
            if range.encloses(&outer)
                || node.can_contain_content()
                || node.children.is_empty()
            {
                selection.push(self.selection_of(child, index, range));
            } else if range.intersection(&inner).is_collapsed() {
                selection.push(self.selection_of(child, index, range));
            } else {
                self.select_covered(child, range, selection);
            }
        }
    }
}

/// Overlap test that also accepts a collapsed range (or node) sitting inside the other or
/// on its edge
fn touches(node: &Range, range: &Range) -> bool {
    if range.is_collapsed() {
        node.encloses(range)
    } else if node.is_collapsed() {
        range.encloses(node)
    } else {
        node.overlaps(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{chars, Item};

    fn doc() -> Document {
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("ab"));
        data.push(Item::close("paragraph"));
        data.push(Item::open("list"));
        data.push(Item::open("listItem"));
        data.push(Item::open("paragraph"));
        data.extend(chars("c"));
        data.push(Item::close("paragraph"));
        data.push(Item::close("listItem"));
        data.push(Item::close("list"));
        Document::with_defaults(data).unwrap()
    }

    #[test]
    fn test_select_covered() {
        let doc = doc();
        // 0 p, 1 a, 2 b, 3 /p, 4 list, 5 li, 6 p, 7 c, 8 /p, 9 /li, 10 /list
        let selection = doc.select_nodes(Range::new(0, 7), SelectMode::Covered);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[0].range, None);
        assert_eq!(selection[0].node_outer_range, Range::new(0, 4));
        assert_eq!(selection[1].range, Some(Range::new(7, 7)));
        assert_eq!(selection[1].node_outer_range, Range::new(6, 9));
    }

    #[test]
    fn test_select_leaves() {
        let doc = doc();
        let selection = doc.select_nodes(Range::new(2, 8), SelectMode::Leaves);
        assert_eq!(selection.len(), 2);
        assert!(selection.iter().all(|s| doc.tree()[s.node].is_text()));
        assert_eq!(selection[0].range, Some(Range::new(2, 3)));
        assert_eq!(selection[1].range, None);
    }

    #[test]
    fn test_select_leaves_collapsed() {
        let doc = doc();
        let selection = doc.select_nodes(Range::collapsed(1), SelectMode::Leaves);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].range, Some(Range::collapsed(1)));
    }

    #[test]
    fn test_select_siblings() {
        let doc = doc();
        let selection = doc.select_nodes(Range::new(2, 7), SelectMode::Siblings);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[0].parent, Some(doc.root()));
        assert_eq!(selection[1].index, 1);
    }
}
