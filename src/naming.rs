//! Slug derivation for content documents.
//!
//! Every document gets a slug, either from an explicit `slug:` front-matter
//! key or from its path relative to the content root:
//!
//! - `blog/hello-world.md` → `/blog/hello-world`
//! - `blog/React Hooks/index.mdx` → `/blog/react-hooks` (page bundle)
//! - `index.md` → `/`
//!
//! Each path component is kebab-cased: ASCII letters and digits are kept
//! (lowercased), every other run of characters becomes a single dash, and
//! leading/trailing dashes are dropped. Empty components vanish, but a
//! component that kebab-cases to nothing (`日本語`, `ééé`, `!!!`) is an
//! error: dropping it would hand the document its parent's URL.

use crate::types::Slug;
use std::path::Path;
use thiserror::Error;

/// A slug component with nothing left after kebab-casing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0:?} has no ASCII letters or digits to build a URL from")]
pub struct SlugError(pub String);

/// Kebab-case one path component or title.
///
/// - `"Hello World"` → `"hello-world"`
/// - `"React & Hooks!"` → `"react-hooks"`
/// - `"__init__"` → `"init"`
pub fn kebab_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn slug_from_components<'a>(
    components: impl Iterator<Item = &'a str>,
) -> Result<Slug, SlugError> {
    let mut parts = Vec::new();
    for component in components.filter(|c| !c.is_empty()) {
        let part = kebab_case(component);
        if part.is_empty() {
            return Err(SlugError(component.to_string()));
        }
        parts.push(part);
    }
    if parts.is_empty() {
        Ok(Slug::root())
    } else {
        Ok(Slug::from_normalized(format!("/{}", parts.join("/"))))
    }
}

/// Derive a slug from a document path relative to the content root.
///
/// The extension is dropped, and so is a final `index` component. Fails on
/// a component that kebab-cases to nothing.
pub fn slug_from_path(relative: &Path) -> Result<Slug, SlugError> {
    let without_ext = relative.with_extension("");
    let mut components: Vec<String> = without_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.last().is_some_and(|last| last == "index") {
        components.pop();
    }
    slug_from_components(components.iter().map(String::as_str))
}

/// Normalize an explicit front-matter slug.
///
/// `"hello"`, `"/hello/"` and `"Hello"` all become `/hello`; nested values
/// like `"notes/rust"` keep their structure.
pub fn slug_from_override(value: &str) -> Result<Slug, SlugError> {
    slug_from_components(value.split('/'))
}

/// Slug of a generated taxonomy page, e.g. `("tags", "React Hooks")` →
/// `/tags/react-hooks`. `None` when the name has no slug-able characters.
pub fn taxonomy_slug(kind: &str, name: &str) -> Option<Slug> {
    let key = kebab_case(name);
    (!key.is_empty()).then(|| Slug::from_normalized(format!("/{kind}/{key}")))
}
