//! Annotation parsing for snippets.
//!
//! Snippets configure their own compilation through directives in a leading
//! docblock:
//!
//! ```text
//! /**
//!  * @dependency bs-css
//!  * @style inline-script
//!  * @prelude none
//!  * @hidden
//!  */
//! ```
//!
//! Directives without a value are flags. Repeated directives accumulate in
//! the order they appear.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// A single directive occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    /// `@name` with nothing after it.
    Flag,
    /// `@name value`
    Text(String),
}

impl DirectiveValue {
    /// The value text, if this is not a flag.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag => None,
        }
    }
}

impl Serialize for DirectiveValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag => serializer.serialize_bool(true),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Directives found in a snippet, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Annotations {
    directives: BTreeMap<String, Vec<DirectiveValue>>,
}

impl Annotations {
    /// Create an empty annotation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of a directive.
    pub fn push(&mut self, name: impl Into<String>, value: DirectiveValue) {
        self.directives.entry(name.into()).or_default().push(value);
    }

    /// All occurrences of a directive.
    pub fn get(&self, name: &str) -> Option<&[DirectiveValue]> {
        self.directives.get(name).map(Vec::as_slice)
    }

    /// Text values of a directive in order of appearance. Flags are skipped.
    pub fn texts<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.get(name)
            .unwrap_or_default()
            .iter()
            .filter_map(DirectiveValue::as_text)
    }

    /// The first text value of a directive.
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.texts(name).next()
    }

    /// Whether the directive occurred at all.
    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Whether the directive occurred as a bare flag.
    pub fn has_flag(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|values| values.contains(&DirectiveValue::Flag))
    }

    /// Whether the docblock held no directives.
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Number of distinct directive names. Repeated directives count once.
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Directive names with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DirectiveValue])> {
        self.directives
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seeking,
    InBlock,
}

/// Parse every docblock directive in a snippet.
///
/// Lines inside a block that do not start with `*` are ignored, and an
/// unterminated block simply ends with the input.
pub fn parse(snippet: &str) -> Annotations {
    let mut annotations = Annotations::new();
    let mut state = State::Seeking;

    for line in snippet.lines() {
        let line = line.trim();

        match state {
            State::Seeking => {
                if line.starts_with("/**") {
                    state = State::InBlock;
                }
            }
            State::InBlock => {
                let Some(rest) = line.strip_prefix('*') else {
                    continue;
                };
                let rest = rest.trim();

                if rest.starts_with('/') {
                    state = State::Seeking;
                } else if let Some(directive) = rest.strip_prefix('@') {
                    match directive.split_once(' ') {
                        Some((name, value)) => {
                            annotations.push(name, DirectiveValue::Text(value.trim().to_string()))
                        }
                        None => annotations.push(directive, DirectiveValue::Flag),
                    }
                }
            }
        }
    }

    annotations
}
