//! # Transaction Builders
//!
//! Constructors that turn a high-level edit into a [`Transaction`] against a document.
//! They read the document and never modify it; every builder covers the full length of
//! the document so the result can be committed as is.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use wikiedit_model::data::closings_for;
use wikiedit_model::{Annotation, Document, Element, Item, NodeId, Range, SelectMode};

use crate::errors::{EditorError, EditorResult};
use crate::operation::AnnotationMethod;
use crate::transaction::Transaction;

fn type_name(item: Option<&Item>) -> String {
    match item {
        Some(Item::Element(element)) => element.element_type.clone(),
        Some(_) => "text".to_string(),
        None => "nothing".to_string(),
    }
}

fn check_range(doc: &Document, range: Range) -> EditorResult<Range> {
    let range = range.normalized();
    if range.end() > doc.len() {
        return Err(EditorError::out_of_bounds(format!(
            "range {} is beyond the end of the document ({})",
            range,
            doc.len()
        )));
    }
    Ok(range)
}

/// Grow a partial range in a content branch so it never ends between the markers of an
/// inline node
fn widened(doc: &Document, branch: NodeId, range: Range) -> Range {
    if range.is_collapsed() || !doc.tree()[branch].can_contain_content() {
        return range;
    }
    let (mut start, mut end) = (range.start(), range.end());
    for &child in doc.tree().children(branch) {
        if doc.tree()[child].is_text() {
            continue;
        }
        let outer = doc.node_outer_range(child);
        if outer.start() < start && start < outer.end() {
            start = outer.start();
        }
        if outer.start() < end && end < outer.end() {
            end = outer.end();
        }
    }
    Range::new(start, end)
}

impl Transaction {
    /// Insert `data` at `offset`, after repairing it so it nests validly there
    pub fn new_from_insertion(doc: &Document, offset: usize, data: &[Item]) -> EditorResult<Self> {
        if offset > doc.len() {
            return Err(EditorError::out_of_bounds(format!(
                "insertion offset {} is beyond the end of the document ({})",
                offset,
                doc.len()
            )));
        }
        let fixed = doc.fixup_insertion(data, offset)?;
        let mut tx = Transaction::new();
        tx.push_retain(offset);
        tx.push_replace(Vec::new(), fixed);
        tx.push_retain(doc.len() - offset);
        Ok(tx)
    }

    /// Remove `range`.
    ///
    /// When both ends sit in nodes that can be merged, everything from the selected part of
    /// the first to the selected part of the last goes in one replace, joining the two nodes.
    /// Otherwise only the covered nodes and the selected parts of partially covered content
    /// branches are removed, keeping the structure between them. Ranges in content never
    /// split an inline node.
    pub fn new_from_removal(doc: &Document, range: Range) -> EditorResult<Self> {
        let range = check_range(doc, range)?;
        let mut tx = Transaction::new();
        if range.is_collapsed() {
            tx.push_retain(doc.len());
            return Ok(tx);
        }

        let selection = doc.select_nodes(range, SelectMode::Covered);
        let (Some(first), Some(last)) = (selection.first(), selection.last()) else {
            tx.push_retain(doc.len());
            return Ok(tx);
        };

        if doc.tree().can_be_merged(first.node, last.node) {
            // A fully covered end contributes its inner range unless both ends are covered
            let span = match (first.range, last.range) {
                (None, None) => Range::new(
                    first.node_outer_range.start(),
                    last.node_outer_range.end(),
                ),
                _ => Range::new(
                    first
                        .range
                        .map_or(first.node_range, |r| widened(doc, first.node, r))
                        .start(),
                    last.range
                        .map_or(last.node_range, |r| widened(doc, last.node, r))
                        .end(),
                ),
            };
            tx.push_retain(span.start());
            tx.push_replace(doc.get_data(Some(span)), Vec::new());
            tx.push_retain(doc.len() - span.end());
            debug!(%range, %span, "built merging removal");
            return Ok(tx);
        }

        let mut offset = 0;
        for selected in &selection {
            let span = selected
                .range
                .map_or(selected.node_outer_range, |r| widened(doc, selected.node, r));
            if span.is_collapsed() {
                continue;
            }
            tx.push_retain(span.start() - offset);
            tx.push_replace(doc.get_data(Some(span)), Vec::new());
            offset = span.end();
        }
        tx.push_retain(doc.len() - offset);
        debug!(%range, ops = tx.operations().len(), "built removal");
        Ok(tx)
    }

    /// Set (`Some`) or remove (`None`) attribute `key` on the element opened at `offset`
    pub fn new_from_attribute_change(
        doc: &Document,
        offset: usize,
        key: &str,
        to: Option<Value>,
    ) -> EditorResult<Self> {
        let element = doc
            .item(offset)
            .ok_or_else(|| {
                EditorError::out_of_bounds(format!("no data at offset {}", offset))
            })?
            .element()
            .ok_or(EditorError::NotAnElement { offset })?;
        if element.is_close() {
            return Err(EditorError::ClosingElement { offset });
        }

        let mut tx = Transaction::new();
        tx.push_retain(offset);
        tx.push_replace_element_attribute(key, element.attribute(key).cloned(), to);
        tx.push_retain(doc.len() - offset);
        Ok(tx)
    }

    /// Set or clear `annotation` on the content in `range`.
    ///
    /// Each run of characters that needs the change is bracketed by a start/stop pair.
    /// Characters already in the wanted state and all elements are retained untouched.
    pub fn new_from_annotation(
        doc: &Document,
        range: Range,
        method: AnnotationMethod,
        annotation: &Annotation,
    ) -> EditorResult<Self> {
        let range = check_range(doc, range)?;
        let mut tx = Transaction::new();
        let mut span = range.start();
        let mut on = false;

        for offset in range.start()..range.end() {
            let is_element = doc.item(offset).is_some_and(Item::is_element);
            let wanted = if is_element {
                false
            } else {
                let covered = doc.offset_contains_annotation(offset, annotation);
                match method {
                    AnnotationMethod::Set => !covered,
                    AnnotationMethod::Clear => covered,
                }
            };

            if wanted != on {
                tx.push_retain(span);
                if wanted {
                    tx.push_start_annotating(method, annotation.clone());
                } else {
                    tx.push_stop_annotating(method, annotation.clone());
                }
                span = 0;
                on = wanted;
            }
            span += 1;
        }

        tx.push_retain(span);
        if on {
            tx.push_stop_annotating(method, annotation.clone());
        }
        tx.push_retain(doc.len() - range.end());
        Ok(tx)
    }

    /// Change every content branch touched by `range` into a `node_type` branch, keeping
    /// its content
    pub fn new_from_content_branch_conversion(
        doc: &Document,
        range: Range,
        node_type: &str,
        attributes: Option<BTreeMap<String, Value>>,
    ) -> EditorResult<Self> {
        let range = check_range(doc, range)?;
        let mut opening = Element::open(node_type);
        opening.attributes = attributes.filter(|attributes| !attributes.is_empty());
        let closing = opening.closing();

        let mut tx = Transaction::new();
        let mut previous = None;
        let mut previous_end = 0;
        for selected in doc.select_nodes(range, SelectMode::Leaves) {
            if !doc.tree()[selected.node].is_content() {
                continue;
            }
            let Some(branch) = doc.tree().parent(selected.node) else {
                continue;
            };
            if previous == Some(branch) {
                continue;
            }
            let outer = doc.node_outer_range(branch);
            tx.push_retain(outer.start() - previous_end);
            tx.push_replace(
                doc.get_data(Some(Range::new(outer.start(), outer.start() + 1))),
                vec![Item::Element(opening.clone())],
            );
            tx.push_retain(doc.tree()[branch].length);
            tx.push_replace(
                doc.get_data(Some(Range::new(outer.end() - 1, outer.end()))),
                vec![Item::Element(closing.clone())],
            );
            previous = Some(branch);
            previous_end = outer.end();
        }
        tx.push_retain(doc.len() - previous_end);
        Ok(tx)
    }

    /// Swap the wrapper around `range` and the wrapper around each of its top-level nodes.
    ///
    /// `unwrap_outer` lists the openings expected right before the range (outermost first)
    /// and is replaced by `wrap_outer`. `unwrap_each` lists the openings expected at the
    /// start of every top-level node in the range and is replaced by `wrap_each`. Matching
    /// closings are swapped at the other ends. The removed markers are taken from the
    /// document, so their attributes survive in the transaction.
    pub fn new_from_wrap(
        doc: &Document,
        range: Range,
        unwrap_outer: &[Item],
        wrap_outer: &[Item],
        unwrap_each: &[Item],
        wrap_each: &[Item],
    ) -> EditorResult<Self> {
        let range = check_range(doc, range)?;
        let data = doc.data();
        if range.start() < unwrap_outer.len() {
            return Err(EditorError::out_of_bounds(
                "unwrapOuter is longer than the data preceding the range",
            ));
        }
        if range.end() + unwrap_outer.len() > data.len() {
            return Err(EditorError::out_of_bounds(
                "unwrapOuter is longer than the data following the range",
            ));
        }

        let outer_start = range.start() - unwrap_outer.len();
        let unwrap_outer_data = &data[outer_start..range.start()];
        for (expected, found) in unwrap_outer.iter().zip(unwrap_outer_data) {
            if expected.element_type() != found.element_type() {
                return Err(EditorError::type_mismatch(
                    type_name(Some(expected)),
                    type_name(Some(found)),
                ));
            }
        }

        let mut tx = Transaction::new();
        tx.push_retain(outer_start);
        tx.push_replace(unwrap_outer_data.to_vec(), wrap_outer.to_vec());

        if unwrap_each.is_empty() && wrap_each.is_empty() {
            tx.push_retain(range.len());
        } else {
            let closing_wrap_each = closings_for(wrap_each);
            let each = unwrap_each.len();
            let mut depth = 0usize;
            let mut retain_from = range.start();
            let mut node_start = range.start();
            for offset in range.start()..range.end() {
                let Some(element) = data[offset].element() else {
                    continue;
                };
                if element.is_open() {
                    if depth == 0 {
                        for (index, expected) in unwrap_each.iter().enumerate() {
                            let found = data.get(offset + index);
                            if found.and_then(Item::element_type) != expected.element_type() {
                                return Err(EditorError::type_mismatch(
                                    type_name(Some(expected)),
                                    type_name(found),
                                ));
                            }
                        }
                        tx.push_retain(offset - retain_from);
                        tx.push_replace(data[offset..offset + each].to_vec(), wrap_each.to_vec());
                        node_start = offset;
                    }
                    depth += 1;
                } else {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let closings_start = offset + 1 - each;
                        tx.push_retain(closings_start - (node_start + each));
                        tx.push_replace(
                            data[closings_start..offset + 1].to_vec(),
                            closing_wrap_each.clone(),
                        );
                        retain_from = offset + 1;
                    }
                }
            }
            tx.push_retain(range.end() - retain_from);
        }

        tx.push_replace(
            data[range.end()..range.end() + unwrap_outer.len()].to_vec(),
            closings_for(wrap_outer),
        );
        tx.push_retain(data.len() - range.end() - unwrap_outer.len());
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wikiedit_model::data::chars;
    use wikiedit_model::example::{bold, example_data};

    fn example() -> Document {
        Document::with_defaults(example_data()).unwrap()
    }

    fn slice(doc: &Document, from: usize, to: usize) -> Vec<Item> {
        doc.get_data(Some(Range::new(from, to)))
    }

    fn retain(length: usize) -> Operation {
        Operation::retain(length)
    }

    fn remove(items: Vec<Item>) -> Operation {
        Operation::replace(items, vec![])
    }

    fn annotate(bias: crate::operation::AnnotationBias) -> Operation {
        Operation::Annotate {
            method: AnnotationMethod::Set,
            bias,
            annotation: bold(),
        }
    }

    #[test]
    fn test_insertion_is_fixed_up() {
        let doc = example();
        let tx = Transaction::new_from_insertion(&doc, 1, &chars("xy")).unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(1),
                Operation::replace(vec![], chars("xy")),
                retain(60)
            ]
        );

        // A paragraph inserted inside a heading splits it
        let paragraph = vec![Item::open("paragraph"), Item::Char('z'), Item::close("paragraph")];
        let tx = Transaction::new_from_insertion(&doc, 2, &paragraph).unwrap();
        let Operation::Replace { insert, .. } = &tx.operations()[1] else {
            panic!("expected a replace");
        };
        assert_eq!(insert.first(), Some(&Item::close("heading")));
        assert_eq!(tx.length_difference(), insert.len() as isize);
    }

    #[test]
    fn test_removal_within_one_content_branch() {
        let doc = example();
        let tx = Transaction::new_from_removal(&doc, Range::new(1, 3)).unwrap();
        assert_eq!(
            tx.operations(),
            &[retain(1), remove(slice(&doc, 1, 3)), retain(58)]
        );
    }

    #[test]
    fn test_removal_of_whole_nodes() {
        let doc = example();
        let expected = vec![remove(slice(&doc, 0, 5)), retain(56)];
        let tx = Transaction::new_from_removal(&doc, Range::new(0, 5)).unwrap();
        assert_eq!(tx.operations(), &expected[..]);

        // The part of the table the range enters holds nothing that can be removed
        let tx = Transaction::new_from_removal(&doc, Range::new(0, 7)).unwrap();
        assert_eq!(tx.operations(), &expected[..]);

        let tx = Transaction::new_from_removal(&doc, Range::new(58, 61)).unwrap();
        assert_eq!(tx.operations(), &[retain(58), remove(slice(&doc, 58, 61))]);
    }

    #[test]
    fn test_removal_across_branches_keeps_structure() {
        let doc = example();
        let tx = Transaction::new_from_removal(&doc, Range::new(2, 57)).unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(2),
                remove(slice(&doc, 2, 4)),
                retain(1),
                remove(slice(&doc, 5, 55)),
                retain(1),
                remove(slice(&doc, 56, 57)),
                retain(4),
            ]
        );

        let tx = Transaction::new_from_removal(&doc, Range::new(10, 16)).unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(10),
                remove(slice(&doc, 10, 11)),
                retain(4),
                remove(slice(&doc, 15, 16)),
                retain(45),
            ]
        );
    }

    #[test]
    fn test_removal_merges_adjacent_paragraphs() {
        let doc = example();
        let tx = Transaction::new_from_removal(&doc, Range::new(56, 59)).unwrap();
        assert_eq!(
            tx.operations(),
            &[retain(56), remove(slice(&doc, 56, 59)), retain(2)]
        );

        let tx = Transaction::new_from_removal(&doc, Range::new(57, 59)).unwrap();
        assert_eq!(
            tx.operations(),
            &[retain(57), remove(slice(&doc, 57, 59)), retain(2)]
        );
    }

    #[test]
    fn test_removal_at_branch_edges_stays_balanced() {
        let doc = example();
        let cases = [
            // Ends past the heading's content
            (1, 5, vec![retain(1), remove(slice(&doc, 1, 4)), retain(57)]),
            // Only the opening of the heading
            (0, 1, vec![retain(61)]),
            // Only the opening of a list
            (12, 13, vec![retain(61)]),
            // Two covered lists, then closings of the table
            (12, 37, vec![retain(12), remove(slice(&doc, 12, 33)), retain(28)]),
            // A covered list, then the opening of the next one
            (12, 27, vec![retain(13), remove(slice(&doc, 13, 27)), retain(34)]),
            // Partial paragraph, then a covered one
            (56, 61, vec![retain(56), remove(slice(&doc, 56, 60)), retain(1)]),
            // Across definition list items
            (47, 51, vec![retain(47), remove(slice(&doc, 47, 51)), retain(10)]),
        ];
        for (from, to, expected) in cases {
            let tx = Transaction::new_from_removal(&doc, Range::new(from, to)).unwrap();
            assert_eq!(tx.operations(), &expected[..], "removing {}-{}", from, to);
        }
    }

    #[test]
    fn test_removal_keeps_inline_nodes_whole() {
        let doc = example();
        // 37 pre, 38 h, 39 image, 40 /image, 41 i, 42 /pre
        let cases = [
            (38, 42, vec![retain(38), remove(slice(&doc, 38, 42)), retain(19)]),
            (31, 39, vec![retain(38), remove(slice(&doc, 38, 39)), retain(22)]),
            (40, 42, vec![retain(39), remove(slice(&doc, 39, 42)), retain(19)]),
            (38, 40, vec![retain(38), remove(slice(&doc, 38, 41)), retain(20)]),
            (40, 40, vec![retain(61)]),
        ];
        for (from, to, expected) in cases {
            let tx = Transaction::new_from_removal(&doc, Range::new(from, to)).unwrap();
            assert_eq!(tx.operations(), &expected[..], "removing {}-{}", from, to);
        }
    }

    #[test]
    fn test_collapsed_removal_is_no_op() {
        let doc = example();
        let tx = Transaction::new_from_removal(&doc, Range::collapsed(12)).unwrap();
        assert!(tx.is_no_op());
        assert_eq!(tx.operations(), &[retain(61)]);
    }

    #[test]
    fn test_attribute_change() {
        let doc = example();
        let tx =
            Transaction::new_from_attribute_change(&doc, 0, "level", Some(json!(2))).unwrap();
        assert_eq!(
            tx.operations(),
            &[
                Operation::Attribute {
                    key: "level".to_string(),
                    from: Some(json!(1)),
                    to: Some(json!(2)),
                },
                retain(61),
            ]
        );

        let tx = Transaction::new_from_attribute_change(&doc, 17, "style", Some(json!("number")))
            .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(17),
                Operation::Attribute {
                    key: "style".to_string(),
                    from: Some(json!("bullet")),
                    to: Some(json!("number")),
                },
                retain(44),
            ]
        );
    }

    #[test]
    fn test_attribute_change_errors() {
        let doc = example();
        assert_eq!(
            Transaction::new_from_attribute_change(&doc, 1, "level", Some(json!(2))),
            Err(EditorError::NotAnElement { offset: 1 })
        );
        assert_eq!(
            Transaction::new_from_attribute_change(&doc, 4, "level", Some(json!(2))),
            Err(EditorError::ClosingElement { offset: 4 })
        );
    }

    #[test]
    fn test_annotation_brackets_runs() {
        use crate::operation::AnnotationBias::{Start, Stop};
        let doc = example();

        let tx =
            Transaction::new_from_annotation(&doc, Range::new(1, 2), AnnotationMethod::Set, &bold())
                .unwrap();
        assert_eq!(
            tx.operations(),
            &[retain(1), annotate(Start), retain(1), annotate(Stop), retain(59)]
        );

        // "b" is bold already
        let tx =
            Transaction::new_from_annotation(&doc, Range::new(1, 4), AnnotationMethod::Set, &bold())
                .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(1),
                annotate(Start),
                retain(1),
                annotate(Stop),
                retain(1),
                annotate(Start),
                retain(1),
                annotate(Stop),
                retain(57),
            ]
        );

        let tx =
            Transaction::new_from_annotation(&doc, Range::new(3, 11), AnnotationMethod::Set, &bold())
                .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(3),
                annotate(Start),
                retain(1),
                annotate(Stop),
                retain(6),
                annotate(Start),
                retain(1),
                annotate(Stop),
                retain(50),
            ]
        );
    }

    #[test]
    fn test_annotation_over_structure_only_is_no_op() {
        let doc = example();
        let tx =
            Transaction::new_from_annotation(&doc, Range::new(4, 9), AnnotationMethod::Set, &bold())
                .unwrap();
        assert_eq!(tx.operations(), &[retain(61)]);
    }

    #[test]
    fn test_content_branch_conversion() {
        let doc = example();
        let tx = Transaction::new_from_content_branch_conversion(
            &doc,
            Range::new(1, 2),
            "paragraph",
            None,
        )
        .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                Operation::replace(slice(&doc, 0, 1), vec![Item::open("paragraph")]),
                retain(3),
                Operation::replace(slice(&doc, 4, 5), vec![Item::close("paragraph")]),
                retain(56),
            ]
        );

        let tx = Transaction::new_from_content_branch_conversion(
            &doc,
            Range::new(50, 58),
            "preformatted",
            None,
        )
        .unwrap();
        let pre = || vec![Item::open("preformatted")];
        let end_pre = || vec![Item::close("preformatted")];
        assert_eq!(
            tx.operations(),
            &[
                retain(50),
                Operation::replace(vec![Item::open("paragraph")], pre()),
                retain(1),
                Operation::replace(vec![Item::close("paragraph")], end_pre()),
                retain(2),
                Operation::replace(vec![Item::open("paragraph")], pre()),
                retain(1),
                Operation::replace(vec![Item::close("paragraph")], end_pre()),
                retain(3),
            ]
        );
    }

    #[test]
    fn test_wrap_changes_heading_to_paragraph() {
        let doc = example();
        let tx = Transaction::new_from_wrap(
            &doc,
            Range::new(1, 4),
            &[Item::open("heading")],
            &[Item::open("paragraph")],
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                Operation::replace(slice(&doc, 0, 1), vec![Item::open("paragraph")]),
                retain(3),
                Operation::replace(slice(&doc, 4, 5), vec![Item::close("paragraph")]),
                retain(56),
            ]
        );
    }

    #[test]
    fn test_unwrap_list() {
        let doc = example();
        let tx = Transaction::new_from_wrap(
            &doc,
            Range::new(13, 25),
            &[Item::open("list")],
            &[],
            &[Item::open("listItem")],
            &[],
        )
        .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(12),
                remove(slice(&doc, 12, 14)),
                retain(10),
                remove(slice(&doc, 24, 26)),
                retain(35),
            ]
        );
    }

    #[test]
    fn test_wrap_paragraphs_in_list() {
        let doc = example();
        let list = Item::Element(Element::open("list").with_attribute("style", "number"));
        let tx = Transaction::new_from_wrap(
            &doc,
            Range::new(55, 61),
            &[],
            &[list.clone()],
            &[],
            &[Item::open("listItem")],
        )
        .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(55),
                Operation::replace(vec![], vec![list, Item::open("listItem")]),
                retain(3),
                Operation::replace(
                    vec![],
                    vec![Item::close("listItem"), Item::open("listItem")]
                ),
                retain(3),
                Operation::replace(vec![], vec![Item::close("listItem"), Item::close("list")]),
            ]
        );
    }

    #[test]
    fn test_table_to_list() {
        let doc = example();
        let tx = Transaction::new_from_wrap(
            &doc,
            Range::new(9, 33),
            &[
                Item::open("table"),
                Item::open("tableSection"),
                Item::open("tableRow"),
                Item::open("tableCell"),
            ],
            &[Item::open("list"), Item::open("listItem")],
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(
            tx.operations(),
            &[
                retain(5),
                Operation::replace(
                    slice(&doc, 5, 9),
                    vec![Item::open("list"), Item::open("listItem")]
                ),
                retain(24),
                Operation::replace(
                    slice(&doc, 33, 37),
                    vec![Item::close("listItem"), Item::close("list")]
                ),
                retain(24),
            ]
        );
    }

    #[test]
    fn test_wrap_errors() {
        let doc = example();
        assert_eq!(
            Transaction::new_from_wrap(
                &doc,
                Range::new(13, 32),
                &[Item::open("table")],
                &[],
                &[],
                &[]
            ),
            Err(EditorError::type_mismatch("table", "list"))
        );
        assert_eq!(
            Transaction::new_from_wrap(
                &doc,
                Range::new(13, 32),
                &[Item::open("list")],
                &[],
                &[Item::open("paragraph")],
                &[]
            ),
            Err(EditorError::type_mismatch("paragraph", "listItem"))
        );
        assert!(matches!(
            Transaction::new_from_wrap(
                &doc,
                Range::new(1, 4),
                &[Item::open("listItem"), Item::open("paragraph")],
                &[],
                &[],
                &[]
            ),
            Err(EditorError::OutOfBounds(_))
        ));
    }
}
