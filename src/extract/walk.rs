//! Pre-order traversal over the string leaves of a JSON value.

use serde_json::Value;

/// Containers nested deeper than this are not entered.
pub const MAX_DEPTH: usize = 128;

/// A string leaf found while walking a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionCandidate<'a> {
    /// The leaf's text.
    pub value: &'a str,
    /// Nesting depth of the leaf (the root is 0).
    pub depth: usize,
}

/// Iterator over string leaves in pre-order: object members in document
/// order, array items left to right.
///
/// Uses an explicit stack, so payload depth never grows the call stack.
#[derive(Debug)]
pub struct StringLeaves<'a> {
    stack: Vec<(&'a Value, usize)>,
    max_depth: usize,
}

impl<'a> StringLeaves<'a> {
    fn new(root: &'a Value, max_depth: usize) -> Self {
        Self {
            stack: vec![(root, 0)],
            max_depth,
        }
    }
}

impl<'a> Iterator for StringLeaves<'a> {
    type Item = ExtractionCandidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth)) = self.stack.pop() {
            match node {
                Value::String(s) => {
                    return Some(ExtractionCandidate { value: s, depth });
                }
                // Children pushed in reverse so the first one pops first.
                Value::Array(items) if depth < self.max_depth => {
                    self.stack.extend(items.iter().rev().map(|v| (v, depth + 1)));
                }
                Value::Object(map) if depth < self.max_depth => {
                    self.stack.extend(map.values().rev().map(|v| (v, depth + 1)));
                }
                _ => {}
            }
        }
        None
    }
}

/// Walks every string leaf of `root` with the default depth limit.
pub fn string_leaves(root: &Value) -> StringLeaves<'_> {
    StringLeaves::new(root, MAX_DEPTH)
}

/// Walks every string leaf of `root`, entering at most `max_depth` levels.
pub fn string_leaves_with_depth(root: &Value, max_depth: usize) -> StringLeaves<'_> {
    StringLeaves::new(root, max_depth)
}
