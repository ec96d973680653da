use tracing::{debug, warn};

use crate::data::{Element, Item};
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::tree::NodeId;

/// Wrappers to close (and document nodes to reopen) once an inserted element or a wrapped
/// text run ends
#[derive(Debug)]
struct Fixup {
    /// Closing type that triggers the fixup, `None` for the end of a text run
    expected_type: Option<String>,
    openings: Vec<Element>,
    reopen_elements: Vec<Element>,
}

/// Running state of a fixup pass
struct Fixer<'doc> {
    doc: &'doc Document,
    output: Vec<Item>,
    /// Openings written from the inserted data that are not closed yet
    opening_stack: Vec<Element>,
    /// Document nodes closed by the inserted data, waiting to be reopened
    closing_stack: Vec<(String, NodeId)>,
    /// Innermost document node we are in
    parent_node: NodeId,
    /// Type of the innermost node, including nodes opened by the inserted data
    parent_type: String,
}

impl<'doc> Fixer<'doc> {
    fn node_type(&self, id: NodeId) -> String {
        self.doc.tree()[id].node_type.clone()
    }

    /// Type of the node we are in once the inserted data's own openings are accounted for
    fn current_type(&self) -> String {
        match self.opening_stack.last() {
            Some(element) => element.element_type.clone(),
            None => self.node_type(self.parent_node),
        }
    }

    /// Append an item and track the openings and closings it contributes
    fn write(&mut self, item: Item, index: usize) -> ModelResult<()> {
        let Some(element) = item.element() else {
            self.output.push(item);
            return Ok(());
        };

        if element.is_open() {
            let balances_closing = self.opening_stack.is_empty()
                && self
                    .closing_stack
                    .last()
                    .is_some_and(|(closed, _)| *closed == element.element_type);
            if balances_closing {
                if let Some((_, node)) = self.closing_stack.pop() {
                    self.parent_node = node;
                }
            } else {
                self.opening_stack.push(element.clone());
            }
            self.parent_type = element.element_type.clone();
            self.output.push(item);
            return Ok(());
        }

        let expected_type = match self.opening_stack.pop() {
            Some(opening) => opening.element_type,
            None => {
                let closed = self.parent_node;
                let closed_type = self.node_type(closed);
                self.parent_node = self
                    .doc
                    .tree()
                    .parent(closed)
                    .ok_or(ModelError::CannotCloseRoot { index })?;
                self.closing_stack.push((closed_type.clone(), closed));
                closed_type
            }
        };
        self.parent_type = expected_type.clone();

        if element.node_type() != expected_type {
            warn!(
                expected = %expected_type,
                found = %element.element_type,
                index,
                "repairing mismatched closing in inserted data"
            );
            self.output.push(Item::close(&expected_type));
        } else {
            self.output.push(item);
        }
        Ok(())
    }

    /// Close a fixup's wrappers and reopen what it had to close
    fn apply_fixup(&mut self, fixup: Fixup, index: usize) -> ModelResult<()> {
        for opening in fixup.openings.iter().rev() {
            self.write(Item::Element(opening.closing()), index)?;
        }
        for element in fixup.reopen_elements.into_iter().rev() {
            self.write(Item::Element(element), index)?;
        }
        Ok(())
    }

    fn leave_text(&mut self, fixups: &mut Vec<Fixup>, index: usize) -> ModelResult<()> {
        if fixups.last().is_some_and(|f| f.expected_type.is_none()) {
            if let Some(fixup) = fixups.pop() {
                self.apply_fixup(fixup, index)?;
            }
        }
        self.parent_type = self.current_type();
        Ok(())
    }
}

impl Document {
    /// Make a snippet safe to insert at `offset`.
    ///
    /// Bare content in a place that cannot hold content is wrapped in a paragraph, nodes are
    /// wrapped in their first allowed parent type until the parent rules hold, and containing
    /// nodes are closed (and reopened afterwards) until the child rules hold. Openings left
    /// unclosed are closed at the end and document nodes the snippet closed are reopened.
    pub fn fixup_insertion(&self, data: &[Item], offset: usize) -> ModelResult<Vec<Item>> {
        let factory = self.factory();
        let parent_node = self
            .node_from_offset(offset)
            .ok_or_else(|| ModelError::out_of_bounds(offset, self.len()))?;
        let mut fixer = Fixer {
            doc: self,
            output: Vec::with_capacity(data.len()),
            opening_stack: Vec::new(),
            closing_stack: Vec::new(),
            parent_node,
            parent_type: self.tree()[parent_node].node_type.clone(),
        };
        let mut fixups: Vec<Fixup> = Vec::new();
        let mut in_text = false;

        for (index, item) in data.iter().enumerate() {
            if in_text && item.is_element() {
                fixer.leave_text(&mut fixups, index)?;
                in_text = false;
            }

            if item.is_close_element() {
                fixer.write(item.clone(), index)?;
                let matches_fixup = fixups.last().is_some_and(|fixup| {
                    fixup.expected_type.as_deref() == item.element().map(Element::node_type)
                });
                if matches_fixup {
                    if let Some(fixup) = fixups.pop() {
                        fixer.apply_fixup(fixup, index)?;
                    }
                }
                fixer.parent_type = fixer.current_type();
                continue;
            }

            let mut child_type = item
                .element()
                .map_or_else(|| "text".to_string(), |e| e.element_type.clone());
            let mut openings: Vec<Element> = Vec::new();
            let mut closings: Vec<Item> = Vec::new();
            let mut reopen_elements: Vec<Element> = Vec::new();

            if factory.is_node_content(&child_type)?
                && !factory.can_node_contain_content(&fixer.parent_type)?
            {
                child_type = "paragraph".to_string();
                openings.insert(0, Element::open("paragraph"));
            }

            // Wrap until the parent is acceptable
            loop {
                let allowed = factory.parent_node_types(&child_type)?;
                match allowed {
                    None => break,
                    Some(types) if types.contains(&fixer.parent_type) => break,
                    Some([]) => {
                        return Err(ModelError::no_allowed_parent(child_type, index));
                    }
                    Some(types) => {
                        child_type = types[0].clone();
                        openings.insert(0, Element::open(child_type.clone()));
                    }
                }
            }

            // Close containing nodes until the child is acceptable
            loop {
                let children_ok = factory
                    .child_node_types(&fixer.parent_type)?
                    .map_or(true, |types| types.contains(&child_type))
                    && !(!factory.is_node_content(&child_type)?
                        && factory.can_node_contain_content(&fixer.parent_type)?);
                if children_ok {
                    break;
                }
                closings.push(Item::close(&fixer.parent_type));
                match fixer.opening_stack.pop() {
                    Some(popped) => {
                        reopen_elements.push(popped);
                        fixer.parent_type = fixer.current_type();
                    }
                    None => {
                        let closed = fixer.parent_node;
                        let closed_type = fixer.node_type(closed);
                        if let Some(element) = self.cloned_element(closed) {
                            reopen_elements.push(element);
                        }
                        fixer.parent_node = self
                            .tree()
                            .parent(closed)
                            .ok_or_else(|| ModelError::no_valid_container(&child_type, index))?;
                        fixer.closing_stack.push((closed_type, closed));
                        fixer.parent_type = fixer.node_type(fixer.parent_node);
                    }
                }
            }

            // Closings already updated the stacks
            fixer.output.extend(closings);
            let wrapped = !openings.is_empty();
            for opening in &openings {
                fixer.write(Item::Element(opening.clone()), index)?;
            }
            fixer.write(item.clone(), index)?;

            match item.element() {
                None => {
                    in_text = true;
                    if wrapped || !reopen_elements.is_empty() {
                        fixer.parent_type = child_type;
                        fixups.push(Fixup {
                            expected_type: None,
                            openings,
                            reopen_elements,
                        });
                    }
                }
                Some(element) => {
                    fixer.parent_type = element.element_type.clone();
                    fixups.push(Fixup {
                        expected_type: Some(element.element_type.clone()),
                        openings,
                        reopen_elements,
                    });
                }
            }
        }

        if in_text {
            fixer.leave_text(&mut fixups, data.len())?;
        }
        while let Some(opening) = fixer.opening_stack.last() {
            let closing = Item::Element(opening.closing());
            fixer.write(closing, data.len())?;
        }
        while let Some((node_type, node)) = fixer.closing_stack.last() {
            let reopen = self
                .cloned_element(*node)
                .unwrap_or_else(|| Element::open(node_type.clone()));
            fixer.write(Item::Element(reopen), data.len())?;
        }

        if fixer.output.len() != data.len() {
            debug!(
                offset,
                before = data.len(),
                after = fixer.output.len(),
                "fixed up insertion"
            );
        }
        Ok(fixer.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chars;
    use crate::example::{empty_paragraph, example_data};
    use pretty_assertions::assert_eq;

    fn example() -> Document {
        Document::with_defaults(example_data()).unwrap()
    }

    fn foo_paragraph() -> Vec<Item> {
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("FOO"));
        data.push(Item::close("paragraph"));
        data
    }

    fn table_cell() -> Vec<Item> {
        let mut data = vec![Item::Element(
            Element::open("tableCell").with_attribute("style", "data"),
        )];
        data.extend(foo_paragraph());
        data.push(Item::close("tableCell"));
        data
    }

    fn wrapped_in_table(cell: Vec<Item>) -> Vec<Item> {
        let mut data = vec![
            Item::open("table"),
            Item::open("tableSection"),
            Item::open("tableRow"),
        ];
        data.extend(cell);
        data.extend([
            Item::close("tableRow"),
            Item::close("tableSection"),
            Item::close("table"),
        ]);
        data
    }

    #[test]
    fn test_paragraph_in_heading_splits_heading() {
        let doc = example();
        let fixed = doc.fixup_insertion(&foo_paragraph(), 2).unwrap();

        let mut expected = vec![Item::close("heading")];
        expected.extend(foo_paragraph());
        expected.push(Item::Element(
            Element::open("heading").with_attribute("level", 1),
        ));
        assert_eq!(fixed, expected);
    }

    #[test]
    fn test_paragraph_in_list_splits_list() {
        let doc = example();
        let fixed = doc.fixup_insertion(&foo_paragraph(), 13).unwrap();

        let mut expected = vec![Item::close("list")];
        expected.extend(foo_paragraph());
        expected.push(Item::Element(
            Element::open("list").with_attribute("style", "bullet"),
        ));
        assert_eq!(fixed, expected);
    }

    #[test]
    fn test_table_cell_gets_wrapped() {
        let doc = example();
        let fixed = doc.fixup_insertion(&table_cell(), 43).unwrap();
        assert_eq!(fixed, wrapped_in_table(table_cell()));
    }

    #[test]
    fn test_table_cell_in_paragraph_splits_paragraph() {
        let doc = example();
        let fixed = doc.fixup_insertion(&table_cell(), 52).unwrap();

        let mut expected = vec![Item::close("paragraph")];
        expected.extend(wrapped_in_table(table_cell()));
        expected.push(Item::open("paragraph"));
        assert_eq!(fixed, expected);
    }

    #[test]
    fn test_text_wrapping() {
        let doc = example();
        assert_eq!(doc.fixup_insertion(&chars("FOO"), 0).unwrap(), foo_paragraph());
        assert_eq!(doc.fixup_insertion(&chars("FOO"), 16).unwrap(), chars("FOO"));
        assert_eq!(doc.fixup_insertion(&chars("FOO"), 2).unwrap(), chars("FOO"));
    }

    #[test]
    fn test_text_in_table_row_closes_table() {
        let doc = example();
        let fixed = doc.fixup_insertion(&chars("FOO"), 34).unwrap();

        let mut expected = vec![
            Item::close("tableRow"),
            Item::close("tableSection"),
            Item::close("table"),
        ];
        expected.extend(foo_paragraph());
        expected.extend([
            Item::open("table"),
            Item::Element(Element::open("tableSection").with_attribute("style", "body")),
            Item::open("tableRow"),
        ]);
        assert_eq!(fixed, expected);
    }

    #[test]
    fn test_paragraph_split_is_left_alone() {
        let doc = Document::with_defaults(empty_paragraph()).unwrap();
        let mut data = chars("FOO");
        data.push(Item::close("paragraph"));
        data.push(Item::open("paragraph"));
        data.extend(chars("BAR"));
        assert_eq!(doc.fixup_insertion(&data, 1).unwrap(), data);

        data.push(Item::close("paragraph"));
        data.push(Item::open("paragraph"));
        data.extend(chars("BAZ"));
        assert_eq!(doc.fixup_insertion(&data, 1).unwrap(), data);
    }

    #[test]
    fn test_unclosed_opening_is_closed() {
        let doc = example();
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("x"));
        let fixed = doc.fixup_insertion(&data, 0).unwrap();
        assert_eq!(fixed.last(), Some(&Item::close("paragraph")));
        assert_eq!(fixed.len(), 3);
    }

    #[test]
    fn test_closing_the_root_fails() {
        let doc = example();
        let data = vec![Item::close("paragraph"), Item::close("document")];
        assert_eq!(
            doc.fixup_insertion(&data, 56).err(),
            Some(ModelError::CannotCloseRoot { index: 1 })
        );
    }
}
