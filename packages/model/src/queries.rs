use crate::annotation::{Annotation, AnnotationSet};
use crate::data::Item;
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::range::Range;

impl Document {
    /// Annotations covering the item at `offset`.
    ///
    /// A closing leaf carries no annotations of its own, so the offset is moved back to the
    /// previous content offset first.
    pub fn annotations_from_offset(&self, offset: usize) -> Vec<Annotation> {
        let mut offset = offset;
        let closes_leaf = self
            .item(offset)
            .and_then(Item::element)
            .filter(|element| element.is_close())
            .is_some_and(|element| {
                self.factory()
                    .can_node_have_children(element.node_type())
                    .is_ok_and(|can| !can)
            });
        if closes_leaf {
            match self.relative_content_offset(offset, -1) {
                Some(previous) => offset = previous,
                None => return Vec::new(),
            }
        }

        self.item(offset)
            .and_then(Item::annotations)
            .map(|set| set.annotations().cloned().collect())
            .unwrap_or_default()
    }

    pub fn offset_contains_annotation(&self, offset: usize, annotation: &Annotation) -> bool {
        let wanted = annotation.normalized();
        self.annotations_from_offset(offset)
            .iter()
            .any(|candidate| candidate.normalized() == wanted)
    }

    /// Run of items around `offset` that all carry `annotation`
    pub fn annotated_range_from_offset(
        &self,
        offset: usize,
        annotation: &Annotation,
    ) -> Option<Range> {
        if !self.offset_contains_annotation(offset, annotation) {
            return None;
        }
        let mut start = offset;
        while start > 0 && self.offset_contains_annotation(start - 1, annotation) {
            start -= 1;
        }
        let mut end = offset;
        while end < self.len() && self.offset_contains_annotation(end, annotation) {
            end += 1;
        }
        Some(Range::new(start, end))
    }

    /// Annotations at `offset` whose type starts with `prefix`, such as `"link/"`
    pub fn matching_annotations_from_offset(&self, offset: usize, prefix: &str) -> AnnotationSet {
        let mut matches = AnnotationSet::new();
        if let Some(set) = self.item(offset).and_then(Item::annotations) {
            for (hash, annotation) in set.iter() {
                if annotation.annotation_type.starts_with(prefix) {
                    matches.insert_hashed(hash.clone(), annotation.clone());
                }
            }
        }
        matches
    }

    pub fn offset_contains_matching_annotations(&self, offset: usize, prefix: &str) -> bool {
        !self.matching_annotations_from_offset(offset, prefix).is_empty()
    }

    /// Annotations shared by every character in `range`. Elements are skipped and a single
    /// plain character means nothing is shared.
    pub fn annotations_from_range(&self, range: Range) -> Vec<Annotation> {
        let range = range.normalized();
        if range.is_collapsed() {
            return self.annotations_from_offset(range.to);
        }

        let mut common: Option<AnnotationSet> = None;
        for item in self.get_data(Some(range)) {
            match item {
                Item::Element(_) => continue,
                Item::Char(_) => return Vec::new(),
                Item::Annotated(_, set) => match common.as_mut() {
                    Some(common) => common.retain_common(&set),
                    None => common = Some(set),
                },
            }
        }
        common
            .map(|set| set.annotations().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of `range` that stands on its own: closings without an opening in the range get
    /// the matching openings from the document prepended, and openings left unclosed get
    /// closings appended.
    pub fn get_balanced_data(&self, range: Range) -> ModelResult<Vec<Item>> {
        let range = range.normalized();
        if range.end() > self.len() {
            return Err(ModelError::out_of_bounds(range.end(), self.len()));
        }
        let slice = &self.data()[range.start()..range.end()];

        let mut open: Vec<&Item> = Vec::new();
        let mut openings: Vec<Item> = Vec::new();
        // Backward cursor over the data before the range, with its nesting depth
        let mut cursor = range.start();
        let mut depth = 0usize;

        for (index, item) in slice.iter().enumerate() {
            let Some(element) = item.element() else {
                continue;
            };
            if element.is_open() {
                open.push(item);
                continue;
            }
            if open.pop().is_some() {
                continue;
            }
            let opening = loop {
                if cursor == 0 {
                    return Err(ModelError::UnbalancedInput {
                        index: range.start() + index,
                    });
                }
                cursor -= 1;
                match self.data()[cursor].element() {
                    Some(candidate) if candidate.is_close() => depth += 1,
                    Some(candidate) if depth == 0 => break candidate.cloned_opening(),
                    Some(_) => depth -= 1,
                    None => {}
                }
            };
            openings.insert(0, Item::Element(opening));
        }

        let mut balanced = openings;
        balanced.extend_from_slice(slice);
        balanced.extend(
            open.iter()
                .rev()
                .filter_map(|item| item.element().map(|e| Item::Element(e.closing()))),
        );
        Ok(balanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chars;
    use crate::example::{bold, example_data, italic};
    use pretty_assertions::assert_eq;

    fn example() -> Document {
        Document::with_defaults(example_data()).unwrap()
    }

    #[test]
    fn test_annotations_from_offset() {
        let doc = example();
        assert_eq!(doc.annotations_from_offset(1), Vec::new());
        assert_eq!(doc.annotations_from_offset(2), vec![bold()]);
        assert_eq!(doc.annotations_from_offset(3), vec![italic()]);
        assert!(doc.offset_contains_annotation(2, &bold()));
        assert!(!doc.offset_contains_annotation(3, &bold()));
    }

    #[test]
    fn test_annotated_range() {
        let mut data = vec![Item::open("paragraph")];
        data.extend(chars("a"));
        let set: AnnotationSet = [bold()].into_iter().collect();
        data.extend(crate::data::annotated_chars("bcd", &set));
        data.extend(chars("e"));
        data.push(Item::close("paragraph"));
        let doc = Document::with_defaults(data).unwrap();

        assert_eq!(
            doc.annotated_range_from_offset(3, &bold()),
            Some(Range::new(2, 5))
        );
        assert_eq!(doc.annotated_range_from_offset(1, &bold()), None);
        assert_eq!(doc.annotations_from_range(Range::new(2, 5)), vec![bold()]);
        assert_eq!(doc.annotations_from_range(Range::new(1, 5)), Vec::new());
    }

    #[test]
    fn test_annotations_from_range_keeps_common() {
        let doc = example();
        assert_eq!(doc.annotations_from_range(Range::new(2, 4)), Vec::new());
        assert_eq!(doc.annotations_from_range(Range::new(2, 3)), vec![bold()]);
        // Elements are skipped
        assert_eq!(doc.annotations_from_range(Range::new(3, 5)), vec![italic()]);
    }

    #[test]
    fn test_matching_annotations() {
        let doc = example();
        let matches = doc.matching_annotations_from_offset(2, "textStyle/");
        assert_eq!(matches.len(), 1);
        assert!(doc.offset_contains_matching_annotations(3, "textStyle"));
        assert!(!doc.offset_contains_matching_annotations(2, "link/"));
    }

    #[test]
    fn test_balanced_data_inside_one_node() {
        let doc = example();
        assert_eq!(doc.get_balanced_data(Range::new(1, 2)).unwrap(), chars("a"));
    }

    #[test]
    fn test_balanced_data_adds_openings_and_closings() {
        let doc = example();
        // "l" </paragraph> <paragraph> "m"
        let balanced = doc.get_balanced_data(Range::new(56, 60)).unwrap();
        let mut expected = vec![Item::open("paragraph")];
        expected.extend(chars("l"));
        expected.push(Item::close("paragraph"));
        expected.push(Item::open("paragraph"));
        expected.extend(chars("m"));
        expected.push(Item::close("paragraph"));
        assert_eq!(balanced, expected);
    }

    #[test]
    fn test_balanced_data_reopens_ancestors_with_attributes() {
        let doc = example();
        // "f" </paragraph> </listItem> </list>
        let balanced = doc.get_balanced_data(Range::new(20, 24)).unwrap();
        assert_eq!(balanced.len(), 7);
        assert_eq!(
            balanced[0],
            Item::Element(
                crate::data::Element::open("list").with_attribute("style", "bullet")
            )
        );
        assert_eq!(balanced[1], Item::open("listItem"));
        assert_eq!(balanced[2], Item::open("paragraph"));
    }
}
