//! Embed style and prelude resolution.
//!
//! A snippet picks its wrapper markup with `@style <name>` and its bundler
//! entry point with `@prelude <name>`. Names are looked up in registries
//! mapping names to template sources; each registry always defines its
//! fallback name. The built-in templates are compiled into the binary from
//! `static/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_embed::Embed;
use tokio::fs;

use crate::annotations::{Annotations, DirectiveValue};
use crate::error::{Error, Result, TemplateKind};

/// Token in embed styles replaced by the compiled artifact.
pub const SNIPPET_PLACEHOLDER: &str = "%SNIPPET%";

/// Module specifier a prelude must import the compiled snippet through.
pub const SNIPPET_MODULE: &str = "./Snippet.bs";

pub const STYLE_DIRECTIVE: &str = "style";
pub const PRELUDE_DIRECTIVE: &str = "prelude";

/// Style used when a snippet does not choose one.
pub const DEFAULT_STYLE: &str = "inline-script";

/// Prelude used when a snippet does not choose one.
pub const DEFAULT_PRELUDE: &str = "react-component";

/// Prelude that only evaluates the compiled module.
pub const NO_PRELUDE: &str = "none";

/// Templates compiled into the binary.
#[derive(Embed)]
#[folder = "static/"]
struct BuiltinTemplates;

/// Where a registered template is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Shipped inside the binary, keyed by its path under `static/`.
    Builtin(&'static str),
    /// A file on disk.
    File(PathBuf),
}

/// Names → template sources for one kind of template.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    kind: TemplateKind,
    fallback: String,
    entries: BTreeMap<String, TemplateSource>,
}

impl TemplateRegistry {
    /// Create a registry whose fallback name maps to `fallback_source`.
    pub fn new(kind: TemplateKind, fallback: impl Into<String>, fallback_source: TemplateSource) -> Self {
        let fallback = fallback.into();
        let entries = BTreeMap::from([(fallback.clone(), fallback_source)]);
        Self {
            kind,
            fallback,
            entries,
        }
    }

    /// Built-in embed styles.
    pub fn builtin_styles() -> Self {
        Self::new(
            TemplateKind::Style,
            DEFAULT_STYLE,
            TemplateSource::Builtin("embed/inline-script.html"),
        )
    }

    /// Built-in preludes.
    pub fn builtin_preludes() -> Self {
        let mut registry = Self::new(
            TemplateKind::Prelude,
            DEFAULT_PRELUDE,
            TemplateSource::Builtin("prelude/react-component.js"),
        );
        registry
            .entries
            .insert(NO_PRELUDE.to_string(), TemplateSource::Builtin("prelude/none.js"));
        registry
    }

    /// Read built-in templates from `assets_dir` instead of the binary.
    ///
    /// The directory mirrors `static/` (`embed/...`, `prelude/...`).
    pub fn with_assets_dir(mut self, assets_dir: &Path) -> Self {
        for source in self.entries.values_mut() {
            if let TemplateSource::Builtin(key) = source {
                *source = TemplateSource::File(assets_dir.join(key));
            }
        }
        self
    }

    /// Register (or replace) a template file.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Option<TemplateSource> {
        self.entries
            .insert(name.into(), TemplateSource::File(path.into()))
    }

    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(name, path);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateSource> {
        self.entries.get(name)
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn directive(&self) -> &'static str {
        match self.kind {
            TemplateKind::Style => STYLE_DIRECTIVE,
            TemplateKind::Prelude => PRELUDE_DIRECTIVE,
        }
    }

    fn required_token(&self) -> &'static str {
        match self.kind {
            TemplateKind::Style => SNIPPET_PLACEHOLDER,
            TemplateKind::Prelude => SNIPPET_MODULE,
        }
    }

    /// The template name a snippet asks for.
    ///
    /// Only the first occurrence of the directive counts. When it is absent,
    /// or the first occurrence is a bare flag, the fallback is used.
    pub fn select<'a>(&'a self, annotations: &'a Annotations) -> &'a str {
        annotations
            .get(self.directive())
            .and_then(<[DirectiveValue]>::first)
            .and_then(DirectiveValue::as_text)
            .unwrap_or(self.fallback.as_str())
    }

    /// Load and validate the template registered as `name`.
    ///
    /// # Errors
    /// [`Error::UnknownTemplate`] if the name is not registered,
    /// [`Error::MissingTemplateFile`] if its source does not exist and
    /// [`Error::MalformedTemplate`] if the text lacks the required token.
    pub async fn load(&self, name: &str) -> Result<String> {
        let source = self.get(name).ok_or_else(|| Error::UnknownTemplate {
            kind: self.kind,
            name: name.to_string(),
        })?;

        let missing = |path: PathBuf| Error::MissingTemplateFile {
            kind: self.kind,
            name: name.to_string(),
            path,
        };

        let text = match source {
            TemplateSource::Builtin(key) => match BuiltinTemplates::get(key) {
                Some(file) => String::from_utf8_lossy(&file.data).into_owned(),
                None => return Err(missing(PathBuf::from(key))),
            },
            TemplateSource::File(path) => {
                if !fs::try_exists(path).await.unwrap_or(false) {
                    return Err(missing(path.clone()));
                }
                fs::read_to_string(path)
                    .await
                    .map_err(|e| Error::fs(path, e))?
            }
        };

        let token = self.required_token();
        if !text.contains(token) {
            return Err(Error::MalformedTemplate {
                kind: self.kind,
                name: name.to_string(),
                token,
            });
        }

        Ok(text)
    }
}

/// A validated embed style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTemplate {
    pub name: String,
    pub text: String,
}

impl EmbedTemplate {
    /// Replace the placeholder with the artifact. Everything else is kept
    /// verbatim.
    pub fn render(&self, artifact: &str) -> String {
        self.text.replacen(SNIPPET_PLACEHOLDER, artifact, 1)
    }
}

/// Resolve the embed style a snippet asked for.
pub async fn resolve_embed_style(annotations: &Annotations, styles: &TemplateRegistry) -> Result<EmbedTemplate> {
    let name = styles.select(annotations);
    let text = styles.load(name).await?;
    Ok(EmbedTemplate {
        name: name.to_string(),
        text,
    })
}

/// Resolve the prelude source a snippet asked for.
pub async fn resolve_prelude(annotations: &Annotations, preludes: &TemplateRegistry) -> Result<String> {
    preludes.load(preludes.select(annotations)).await
}
