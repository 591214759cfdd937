//! Document tree model and snippet location.
//!
//! The tree is owned by the host. The pipeline only reads `type`, `lang` and
//! `value`, and inserts raw markup nodes into `children` lists.

mod locator;
mod node;

pub use locator::{InsertionTracker, SnippetRef, locate_snippets};
pub use node::{CODE, HTML, Node};
