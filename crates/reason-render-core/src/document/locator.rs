//! Locating target-language snippets in a document tree.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::node::Node;

/// Location of a snippet in the tree as it was when it was located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRef {
    /// Child indices from the root to the snippet's parent.
    pub parent_path: Vec<usize>,

    /// Index of the snippet among its parent's children.
    pub index: usize,

    /// Raw text of the code block.
    pub source: String,
}

impl SnippetRef {
    /// The snippet text without surrounding whitespace.
    pub fn trimmed(&self) -> &str {
        self.source.trim()
    }

    /// Full child-index path of the snippet node.
    pub fn path(&self) -> Vec<usize> {
        let mut path = self.parent_path.clone();
        path.push(self.index);
        path
    }
}

/// Collect every non-empty code block tagged with `language`, in document
/// (pre-order) order.
pub fn locate_snippets(tree: &Node, language: &str) -> Vec<SnippetRef> {
    let mut snippets = Vec::new();
    let mut path = Vec::new();
    visit(tree, language, &mut path, &mut snippets);
    snippets
}

fn visit(node: &Node, language: &str, path: &mut Vec<usize>, out: &mut Vec<SnippetRef>) {
    for (index, child) in node.children.iter().enumerate() {
        if is_snippet(child, language) {
            out.push(SnippetRef {
                parent_path: path.clone(),
                index,
                source: child.value().unwrap_or_default().to_string(),
            });
        }

        path.push(index);
        visit(child, language, path, out);
        path.pop();
    }
}

fn is_snippet(node: &Node, language: &str) -> bool {
    node.is_code()
        && node.lang() == Some(language)
        && node
            .value()
            .is_some_and(|value| !value.trim().is_empty())
}

/// Tracks sibling insertions so locations recorded before any mutation can
/// still be resolved afterwards.
///
/// Insertions must happen in document order: every earlier insertion into a
/// child list then lies before any later located node's ancestor in that
/// list, so the shift for a list is simply the number of insertions into it.
#[derive(Debug, Default)]
pub struct InsertionTracker {
    inserted: HashMap<Vec<usize>, usize>,
}

impl InsertionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate an original index path into the current tree.
    pub fn current_path(&self, original: &[usize]) -> Vec<usize> {
        original
            .iter()
            .enumerate()
            .map(|(depth, &index)| index + self.shift(&original[..depth]))
            .collect()
    }

    fn shift(&self, original_parent: &[usize]) -> usize {
        self.inserted.get(original_parent).copied().unwrap_or(0)
    }

    /// Insert `node` as the immediately preceding sibling of the snippet.
    pub fn insert_before(&mut self, tree: &mut Node, snippet: &SnippetRef, node: Node) -> Result<()> {
        let parent_path = self.current_path(&snippet.parent_path);
        let index = snippet.index + self.shift(&snippet.parent_path);

        let parent = tree.descendant_mut(&parent_path).ok_or_else(|| {
            Error::InvalidDocument(format!("no parent node at {:?}", parent_path))
        })?;

        let target = parent.children.get(index).ok_or_else(|| {
            Error::InvalidDocument(format!("no snippet at index {} under {:?}", index, parent_path))
        })?;
        if !target.is_code() {
            return Err(Error::InvalidDocument(format!(
                "expected a code block at {:?}/{}, found `{}`",
                parent_path, index, target.kind
            )));
        }

        parent.children.insert(index, node);
        *self.inserted.entry(snippet.parent_path.clone()).or_insert(0) += 1;
        Ok(())
    }
}
