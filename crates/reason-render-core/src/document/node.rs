//! The host document tree.
//!
//! Nodes follow the mdast shape (`type`, `lang`, `value`, `children`). Fields
//! the pipeline does not read are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node kind of fenced code blocks.
pub const CODE: &str = "code";

/// Node kind of raw markup emitted without escaping.
pub const HTML: &str = "html";

/// A node in the document tree.
///
/// `lang` and `value` live in `extra` so that an explicit `null` and an
/// absent key both survive a round trip. Parents keep their `children`
/// array even when it is empty; leaves never gain one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    /// Node kind (`root`, `paragraph`, `code`, `html`, ...).
    pub kind: String,

    /// Child nodes, in document order.
    pub children: Vec<Node>,

    /// Every other field (lang, value, position, meta, depth, ...).
    pub extra: Map<String, Value>,

    parent: bool,
}

/// Wire shape of a node.
#[derive(Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        Self {
            kind: raw.kind,
            parent: raw.children.is_some(),
            children: raw.children.unwrap_or_default(),
            extra: raw.extra,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let children = (node.parent || !node.children.is_empty()).then_some(node.children);
        Self {
            kind: node.kind,
            children,
            extra: node.extra,
        }
    }
}

impl Node {
    /// Create a leaf of the given kind with no content.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            children: Vec::new(),
            extra: Map::new(),
            parent: false,
        }
    }

    /// A document root.
    pub fn root(children: Vec<Node>) -> Self {
        Self::parent("root", children)
    }

    /// A container node such as a paragraph or list item.
    pub fn parent(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            children,
            parent: true,
            ..Self::new(kind)
        }
    }

    /// A fenced code block.
    pub fn code(lang: impl Into<String>, value: impl Into<String>) -> Self {
        let mut node = Self::new(CODE);
        node.extra.insert("lang".to_string(), Value::String(lang.into()));
        node.set_value(value);
        node
    }

    /// Raw markup that the host emits verbatim.
    pub fn html(value: impl Into<String>) -> Self {
        let mut node = Self::new(HTML);
        node.set_value(value);
        node
    }

    /// A plain text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::new("text");
        node.set_value(value);
        node
    }

    /// Language tag of a code block; `None` when absent or `null`.
    pub fn lang(&self) -> Option<&str> {
        self.extra.get("lang").and_then(Value::as_str)
    }

    /// Literal text of a leaf; `None` when absent or `null`.
    pub fn value(&self) -> Option<&str> {
        self.extra.get("value").and_then(Value::as_str)
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.extra
            .insert("value".to_string(), Value::String(value.into()));
    }

    /// Whether the node carries a `children` array.
    pub fn is_parent(&self) -> bool {
        self.parent || !self.children.is_empty()
    }

    pub fn is_code(&self) -> bool {
        self.kind == CODE
    }

    pub fn is_html(&self) -> bool {
        self.kind == HTML
    }

    /// Follow a path of child indices from this node.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Mutable variant of [`Node::descendant`].
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Count nodes in this subtree (including self) matching a predicate.
    pub fn count(&self, predicate: &impl Fn(&Node) -> bool) -> usize {
        let own = usize::from(predicate(self));
        own + self
            .children
            .iter()
            .map(|child| child.count(predicate))
            .sum::<usize>()
    }
}
