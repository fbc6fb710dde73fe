//! Content scanning and front-matter extraction.
//!
//! Stage 1 of the build. Walks the content directory, parses every markdown
//! document into a [`ContentNode`], and collects per-document failures instead
//! of aborting.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── config.toml                       # Site configuration (optional)
//! ├── assets/                           # Copied verbatim to the output root
//! ├── me.md                             # → /me
//! ├── blog/
//! │   ├── gatsby-netlify-cms.md         # → /blog/gatsby-netlify-cms
//! │   └── react-hooks-pitfalls/         # Page bundle
//! │       ├── index.mdx                 # → /blog/react-hooks-pitfalls
//! │       └── thumbnail.png             # Copied next to the page
//! └── writing-blog/
//!     └── on-writing.md
//! ```
//!
//! ## Front-matter
//!
//! ```yaml
//! ---
//! title: Hello            # required
//! date: 2021-05-01        # YYYY-MM-DD; optional, but undated docs stay out of feeds
//! template: post          # required
//! tags: [react, hooks]    # list or single string
//! categories: Tech
//! thumbnail: ./thumbnail.png
//! published: false        # default true
//! slug: custom-slug       # overrides the path-derived slug
//! ---
//! ```
//!
//! Unknown keys are ignored.
//!
//! ## Ordering
//!
//! Files are parsed in parallel, but results are always returned in sorted
//! source-path order. Slug collisions are resolved in that order too: the
//! first document keeps the slug, later ones are rejected. A document whose
//! path or `slug:` has a component with no ASCII letters or digits is
//! rejected rather than given its parent directory's slug.

use crate::markdown;
use crate::naming::{self, SlugError};
use crate::types::{ContentNode, Slug};
use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::WalkDir;

/// Fixed input format for `date:` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Directories under the content root that never hold documents.
const SKIPPED_DIRS: &[&str] = &["assets", "node_modules"];

/// Fatal scan failure: the content tree itself could not be read.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content directory not found: {0}")]
    MissingRoot(PathBuf),
}

/// Per-document failure. The document is skipped; the build continues.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid front-matter: {source}")]
    FrontMatter {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: missing required front-matter field `{field}`")]
    MissingField { path: String, field: &'static str },
    #[error("{path}: unparseable date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { path: String, value: String },
    #[error("{path}: cannot derive a slug: {source}")]
    InvalidSlug {
        path: String,
        #[source]
        source: SlugError,
    },
    #[error("{path}: slug {slug} is already used by {first}")]
    DuplicateSlug {
        path: String,
        slug: Slug,
        first: String,
    },
}

impl ContentError {
    /// Source path of the offending document.
    pub fn path(&self) -> &str {
        match self {
            ContentError::Io { path, .. }
            | ContentError::FrontMatter { path, .. }
            | ContentError::MissingField { path, .. }
            | ContentError::InvalidDate { path, .. }
            | ContentError::InvalidSlug { path, .. }
            | ContentError::DuplicateSlug { path, .. } => path,
        }
    }
}

/// Result of scanning a content tree.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Valid documents in source-path order, slugs unique.
    pub nodes: Vec<ContentNode>,
    /// Skipped documents, in source-path order.
    pub errors: Vec<ContentError>,
}

/// A `tags:`/`categories:` value: either one string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    One(String),
    Many(Vec<String>),
}

impl Default for StringList {
    fn default() -> Self {
        StringList::Many(Vec::new())
    }
}

impl StringList {
    /// Trimmed, non-empty, deduplicated values in first-seen order.
    fn normalized(self) -> Vec<String> {
        let raw = match self {
            StringList::One(s) => vec![s],
            StringList::Many(v) => v,
        };
        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for value in raw {
            let value = value.trim();
            if !value.is_empty() && !out.iter().any(|v| v == value) {
                out.push(value.to_string());
            }
        }
        out
    }
}

/// Front-matter exactly as written. Every field is optional here; required
/// fields are enforced in [`parse_document`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    title: Option<String>,
    date: Option<String>,
    tags: StringList,
    categories: StringList,
    template: Option<String>,
    thumbnail: Option<String>,
    published: Option<bool>,
    slug: Option<String>,
}

fn front_matter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\n(?:(.*?)\n)?---[ \t]*(?:\n|\z)(.*)\z")
            .expect("front-matter regex is valid")
    })
}

/// Split a document into its YAML front-matter and body.
///
/// Returns `None` for the YAML part when the document has no front-matter.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    match front_matter_regex().captures(content) {
        Some(caps) => {
            let yaml = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            (Some(yaml), body)
        }
        None => (None, content),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse one document's text into a [`ContentNode`].
///
/// `relative` is the document's path relative to the content root; it drives
/// the default slug and is recorded as the node's `source_path`.
pub fn parse_document(relative: &Path, content: &str) -> Result<ContentNode, ContentError> {
    let source_path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let content = content.replace("\r\n", "\n");
    let (yaml, body) = split_front_matter(&content);

    let raw: RawFrontMatter = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => {
            serde_yaml::from_str(yaml).map_err(|source| ContentError::FrontMatter {
                path: source_path.clone(),
                source,
            })?
        }
        _ => RawFrontMatter::default(),
    };

    let title = non_empty(raw.title).ok_or_else(|| ContentError::MissingField {
        path: source_path.clone(),
        field: "title",
    })?;
    let template = non_empty(raw.template).ok_or_else(|| ContentError::MissingField {
        path: source_path.clone(),
        field: "template",
    })?;
    let date = match non_empty(raw.date) {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
            ContentError::InvalidDate {
                path: source_path.clone(),
                value,
            }
        })?),
        None => None,
    };

    let slug = match non_empty(raw.slug) {
        Some(explicit) => naming::slug_from_override(&explicit),
        None => naming::slug_from_path(relative),
    }
    .map_err(|source| ContentError::InvalidSlug {
        path: source_path.clone(),
        source,
    })?;

    let is_mdx = relative
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("mdx"));
    let body = if is_mdx {
        markdown::strip_mdx_module_lines(body)
    } else {
        body.to_string()
    };

    let plain = markdown::plain_text(&body);
    let html = markdown::render_html(&body);

    Ok(ContentNode {
        source_path,
        slug,
        title,
        date,
        tags: raw.tags.normalized(),
        categories: raw.categories.normalized(),
        template,
        thumbnail: non_empty(raw.thumbnail),
        published: raw.published.unwrap_or(true),
        excerpt: markdown::excerpt(&plain),
        read_time: markdown::read_time(&plain),
        body,
        html,
    })
}

/// Markdown, MDX or `.markdown` by extension.
pub fn is_content_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext.as_str()))
}

/// List document paths under `root`, relative and sorted.
pub fn collect_documents(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                return false;
            }
            !(entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
        });

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_content_file(entry.path()) {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();
            documents.push(relative);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Scan the content directory into validated nodes plus per-document errors.
///
/// Reading and parsing run on the rayon pool; the merge afterwards is
/// sequential and in source-path order, so the result is deterministic.
pub fn scan(root: &Path) -> Result<ScanResult, ScanError> {
    let documents = collect_documents(root)?;
    tracing::debug!(count = documents.len(), root = %root.display(), "scanning documents");

    let parsed: Vec<Result<ContentNode, ContentError>> = documents
        .par_iter()
        .map(|relative| {
            let content =
                fs::read_to_string(root.join(relative)).map_err(|source| ContentError::Io {
                    path: relative.to_string_lossy().into_owned(),
                    source,
                })?;
            parse_document(relative, &content)
        })
        .collect();

    let mut result = ScanResult::default();
    let mut claimed: HashMap<Slug, String> = HashMap::new();

    for outcome in parsed {
        match outcome {
            Ok(node) => {
                if let Some(first) = claimed.get(&node.slug) {
                    result.errors.push(ContentError::DuplicateSlug {
                        path: node.source_path.clone(),
                        slug: node.slug.clone(),
                        first: first.clone(),
                    });
                    continue;
                }
                claimed.insert(node.slug.clone(), node.source_path.clone());
                tracing::debug!(slug = %node.slug, source = %node.source_path, "parsed document");
                result.nodes.push(node);
            }
            Err(err) => {
                tracing::warn!("skipping document: {err}");
                result.errors.push(err);
            }
        }
    }

    Ok(result)
}
