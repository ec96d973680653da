use crate::data::Item;
use crate::error::{ModelError, ModelResult};
use crate::factory::NodeFactory;
use crate::tree::{Node, NodeId, NodeTree};

/// Nodes built from a slice of linear data
#[derive(Debug)]
pub(crate) struct BuiltNodes {
    /// Top-level nodes, not yet attached to the root
    pub children: Vec<NodeId>,
    /// One entry per item of the slice
    pub offset_map: Vec<NodeId>,
}

/// Zero-length text node given to a content branch that would otherwise have no children
pub(crate) fn empty_text(factory: &NodeFactory, tree: &mut NodeTree) -> ModelResult<NodeId> {
    Ok(tree.alloc(Node::new("text", factory.rules("text")?.clone())))
}

/// Build nodes for `data` as if it were the content of `root`.
///
/// Keeps a stack of child lists: entering a node that can have children pushes a new list,
/// its closing pops the list and attaches it in one go. Runs of characters become one text
/// node each and a content branch left without children gets an empty text node.
pub(crate) fn build_nodes(
    factory: &NodeFactory,
    tree: &mut NodeTree,
    data: &[Item],
    root: NodeId,
) -> ModelResult<BuiltNodes> {
    let text_rules = factory.rules("text")?.clone();
    let mut stack: Vec<Vec<NodeId>> = vec![vec![root], Vec::new()];
    let mut offset_map = Vec::with_capacity(data.len());
    let mut current = root;
    let mut in_text = false;

    let parent_top = |stack: &[Vec<NodeId>]| -> Option<NodeId> {
        stack
            .len()
            .checked_sub(2)
            .and_then(|index| stack[index].last().copied())
    };

    for (index, item) in data.iter().enumerate() {
        let mapped = if tree[current].can_have_children() {
            current
        } else {
            parent_top(&stack).unwrap_or(root)
        };
        offset_map.push(mapped);

        let Some(element) = item.element() else {
            if !in_text {
                let text = tree.alloc(Node::new("text", text_rules.clone()));
                if let Some(siblings) = stack.last_mut() {
                    siblings.push(text);
                }
                current = text;
                in_text = true;
            }
            let length = tree[current].length + 1;
            tree.set_length(current, length);
            continue;
        };

        if in_text {
            current = parent_top(&stack).unwrap_or(root);
            in_text = false;
        }

        if element.is_open() {
            let node = tree.alloc(Node::new(
                element.element_type.clone(),
                factory.rules(&element.element_type)?.clone(),
            ));
            if let Some(siblings) = stack.last_mut() {
                siblings.push(node);
            }
            if tree[node].can_have_children() {
                stack.push(Vec::new());
            }
            current = node;
        } else if tree[current].can_have_children() {
            let mut children = stack.pop().unwrap_or_default();
            if stack.len() < 2 {
                return Err(ModelError::UnbalancedInput { index });
            }
            if children.is_empty() && tree[current].can_contain_content() {
                children.push(empty_text(factory, tree)?);
            }
            tree.attach_children(current, children);
            current = parent_top(&stack).unwrap_or(root);
        } else {
            current = parent_top(&stack).unwrap_or(root);
        }
    }

    if stack.len() != 2 {
        return Err(ModelError::UnbalancedInput { index: data.len() });
    }
    let children = stack.pop().unwrap_or_default();

    Ok(BuiltNodes {
        children,
        offset_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{chars, Element};

    fn build(data: &[Item]) -> ModelResult<(NodeTree, NodeId, BuiltNodes)> {
        let factory = NodeFactory::with_defaults();
        let mut tree = NodeTree::new();
        let root = tree.alloc(Node::new("document", factory.rules("document")?.clone()));
        let built = build_nodes(&factory, &mut tree, data, root)?;
        Ok((tree, root, built))
    }

    #[test]
    fn test_text_runs_are_coalesced() {
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("abc"));
        data.push(Item::open("image"));
        data.push(Item::close("image"));
        data.extend(chars("d"));
        data.push(Item::close("paragraph"));

        let (tree, root, built) = build(&data).unwrap();
        assert_eq!(built.children.len(), 1);
        let paragraph = built.children[0];
        let types: Vec<_> = tree
            .children(paragraph)
            .iter()
            .map(|&id| (tree[id].node_type.clone(), tree[id].length))
            .collect();
        assert_eq!(
            types,
            vec![
                ("text".to_string(), 3),
                ("image".to_string(), 0),
                ("text".to_string(), 1)
            ]
        );
        assert_eq!(tree[paragraph].length, 6);
        assert_eq!(built.offset_map[0], root);
        assert_eq!(built.offset_map[1], paragraph);
        // Between the image markers the offset maps to the image's parent
        assert_eq!(built.offset_map[5], paragraph);
    }

    #[test]
    fn test_empty_content_branch_gets_text_node() {
        let data = vec![Item::open("paragraph"), Item::close("paragraph")];
        let (tree, _, built) = build(&data).unwrap();
        let paragraph = built.children[0];
        assert_eq!(tree.children(paragraph).len(), 1);
        assert_eq!(tree[tree.children(paragraph)[0]].length, 0);
    }

    #[test]
    fn test_unbalanced_closing() {
        let data = vec![Item::close("paragraph")];
        assert_eq!(
            build(&data).err(),
            Some(ModelError::UnbalancedInput { index: 0 })
        );
    }

    #[test]
    fn test_unknown_type() {
        let data = vec![Item::Element(Element::open("bogus"))];
        assert_eq!(
            build(&data).err(),
            Some(ModelError::UnknownType("bogus".to_string()))
        );
    }
}
