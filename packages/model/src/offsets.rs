//! Offset validity rules and cursor movement over linear data.
//!
//! Offsets sit between items: offset `i` is between `data[i - 1]` and `data[i]`. A content
//! offset accepts characters, a structural offset accepts whole nodes. Element types missing
//! from the factory never produce a valid offset.

use crate::data::Item;
use crate::document::Document;
use crate::factory::{NodeFactory, NodeRules};

fn rules<'a>(factory: &'a NodeFactory, node_type: &str) -> Option<&'a NodeRules> {
    factory.rules(node_type).ok()
}

/// Whether content can be inserted at `offset`
pub fn is_content_offset(factory: &NodeFactory, data: &[Item], offset: usize) -> bool {
    if offset == 0 || offset >= data.len() {
        return false;
    }
    let (left, right) = (&data[offset - 1], &data[offset]);
    let (Some(left), Some(right)) = (left.element(), right.element()) else {
        // Content on either side
        return true;
    };

    // Right of an inline leaf: <paragraph><image></image>|</paragraph>
    if left.is_close() && rules(factory, left.node_type()).is_some_and(|r| r.is_content) {
        return true;
    }
    // Left of an inline leaf: <paragraph>|<image></image></paragraph>
    if right.is_open() && rules(factory, &right.element_type).is_some_and(|r| r.is_content) {
        return true;
    }
    // Inside an empty content branch: <paragraph>|</paragraph>
    left.is_open()
        && right.is_close()
        && right.node_type() == left.element_type
        && rules(factory, &left.element_type).is_some_and(|r| r.can_contain_content)
}

/// Whether a node can be inserted at `offset`. With `unrestricted`, only offsets where a
/// node of any type could go.
pub fn is_structural_offset(
    factory: &NodeFactory,
    data: &[Item],
    offset: usize,
    unrestricted: bool,
) -> bool {
    if offset == 0 || offset == data.len() {
        return true;
    }
    if offset > data.len() {
        return false;
    }
    let (Some(left), Some(right)) = (data[offset - 1].element(), data[offset].element()) else {
        return false;
    };

    // Right of a branch: <list><listItem><paragraph>a</paragraph>|</listItem>|</list>|
    if left.is_close() {
        if let Some(r) = rules(factory, left.node_type()) {
            if (r.can_have_children() || !r.is_content)
                && (!unrestricted || r.parent_node_types.is_none())
            {
                return true;
            }
        }
    }
    // Left of a branch: |<list>|<listItem>|<paragraph>a</paragraph></listItem></list>
    if right.is_open() {
        if let Some(r) = rules(factory, &right.element_type) {
            if (r.can_have_children() || !r.is_content)
                && (!unrestricted || r.parent_node_types.is_none())
            {
                return true;
            }
        }
    }
    // Inside an empty non-content branch: <list>|</list>
    left.is_open()
        && right.is_close()
        && right.node_type() == left.element_type
        && rules(factory, &left.element_type).is_some_and(|r| {
            r.can_have_grandchildren() && (!unrestricted || r.child_node_types.is_none())
        })
}

pub fn is_element_data(data: &[Item], offset: usize) -> bool {
    data.get(offset).is_some_and(Item::is_element)
}

/// Whether every element in `data` is an inline content element
pub fn is_content_data(factory: &NodeFactory, data: &[Item]) -> bool {
    data.iter().all(|item| match item.element() {
        Some(element) if element.is_open() => {
            rules(factory, &element.element_type).is_some_and(|r| r.is_content)
        }
        _ => true,
    })
}

impl Document {
    pub fn is_content_offset(&self, offset: usize) -> bool {
        is_content_offset(self.factory(), self.data(), offset)
    }

    pub fn is_structural_offset(&self, offset: usize, unrestricted: bool) -> bool {
        is_structural_offset(self.factory(), self.data(), offset, unrestricted)
    }

    /// Offset `distance` valid offsets away from `offset`, validity decided by `predicate`.
    ///
    /// A zero distance returns `offset` when it is already valid and otherwise behaves like a
    /// distance of one. The scan goes forward from the document start, backward from the end
    /// and in the direction of `distance` elsewhere. If no valid offset is found before the
    /// edge is reached, the scan turns around once. Returns the last valid offset seen, or
    /// `None` when there is none.
    pub fn relative_offset<F>(&self, offset: usize, distance: isize, predicate: F) -> Option<usize>
    where
        F: Fn(&[Item], usize) -> bool,
    {
        let data = self.data();
        let len = data.len() as isize;
        let mut distance = distance;
        if distance == 0 {
            if predicate(data, offset) {
                return Some(offset);
            }
            distance = 1;
        }

        let start = offset.min(data.len()) as isize;
        let mut direction: isize = if start <= 0 {
            1
        } else if start >= len {
            -1
        } else if distance > 0 {
            1
        } else {
            -1
        };
        let mut target = distance.unsigned_abs();
        let mut i = start + direction;
        let mut steps = 0;
        let mut turned_around = false;
        let mut found = None;

        while i >= 0 && i <= len {
            if predicate(data, i as usize) {
                steps += 1;
                found = Some(i as usize);
                if steps == target {
                    return found;
                }
            } else if !turned_around
                && steps == 0
                && ((direction < 0 && i == 0) || (direction > 0 && i == len))
            {
                direction = -direction;
                i = start;
                target = 1;
                turned_around = true;
            }
            i += direction;
        }
        found
    }

    pub fn relative_content_offset(&self, offset: usize, distance: isize) -> Option<usize> {
        let factory = self.factory();
        self.relative_offset(offset, distance, |data, o| {
            is_content_offset(factory, data, o)
        })
    }

    /// Nearest content offset; without a direction the closer of the two neighbours wins,
    /// the right one on a tie
    pub fn nearest_content_offset(&self, offset: usize, direction: Option<isize>) -> Option<usize> {
        if self.is_content_offset(offset) {
            return Some(offset);
        }
        match direction {
            Some(direction) if direction != 0 => {
                self.relative_content_offset(offset, direction.signum())
            }
            _ => pick_nearest(
                offset,
                self.relative_content_offset(offset, -1),
                self.relative_content_offset(offset, 1),
            ),
        }
    }

    pub fn relative_structural_offset(
        &self,
        offset: usize,
        distance: isize,
        unrestricted: bool,
    ) -> Option<usize> {
        if distance == 0 && (offset == 0 || offset == self.len()) {
            return Some(offset);
        }
        let factory = self.factory();
        self.relative_offset(offset, distance, |data, o| {
            is_structural_offset(factory, data, o, unrestricted)
        })
    }

    pub fn nearest_structural_offset(
        &self,
        offset: usize,
        direction: Option<isize>,
        unrestricted: bool,
    ) -> Option<usize> {
        if self.is_structural_offset(offset, unrestricted) {
            return Some(offset);
        }
        match direction {
            Some(direction) if direction != 0 => {
                self.relative_structural_offset(offset, direction.signum(), unrestricted)
            }
            _ => pick_nearest(
                offset,
                self.relative_structural_offset(offset, -1, unrestricted),
                self.relative_structural_offset(offset, 1, unrestricted),
            ),
        }
    }
}

/// Closer of two candidates, comparing signed distances the way a missing offset of -1 would
fn pick_nearest(offset: usize, left: Option<usize>, right: Option<usize>) -> Option<usize> {
    let as_signed = |o: Option<usize>| o.map_or(-1, |o| o as isize);
    let offset = offset as isize;
    if offset - as_signed(left) < as_signed(right) - offset {
        left
    } else {
        right
    }
}
