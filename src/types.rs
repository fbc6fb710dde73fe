//! Shared types used across all pipeline stages.
//!
//! A [`ContentNode`] is built once per source document by the scan stage and
//! is read-only afterwards: templates, feeds and site files all borrow it.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// URL path identifying a piece of content.
///
/// Always starts with `/` and never ends with one, except the root slug `/`
/// itself. Construct through [`crate::naming`], which enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub(crate) fn from_normalized(path: String) -> Self {
        debug_assert!(path.starts_with('/'));
        debug_assert!(path == "/" || !path.ends_with('/'));
        Self(path)
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The slug without its leading slash (`/blog/hello` → `blog/hello`).
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    /// Directory of the rendered page under `output_dir`.
    pub fn output_dir(&self, output_dir: &Path) -> PathBuf {
        if self.is_root() {
            output_dir.to_path_buf()
        } else {
            output_dir.join(self.relative())
        }
    }

    /// `index.html` path of the rendered page under `output_dir`.
    pub fn output_file(&self, output_dir: &Path) -> PathBuf {
        self.output_dir(output_dir).join("index.html")
    }

    /// Site-relative href with a trailing slash (`/blog/hello/`).
    pub fn href(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("{}/", self.0)
        }
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parsed source document.
///
/// Front-matter has already been validated: `title` and `template` are
/// present, `date` (if any) is a real calendar date, and tags/categories are
/// trimmed and deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct ContentNode {
    /// Path relative to the content root, `/`-separated.
    pub source_path: String,
    pub slug: Slug,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub template: String,
    /// Thumbnail path as written in front-matter, relative to the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub published: bool,
    /// Markdown body with front-matter removed.
    #[serde(skip)]
    pub body: String,
    /// Rendered HTML body.
    #[serde(skip)]
    pub html: String,
    /// Plain-text summary, at most 250 characters plus an ellipsis.
    pub excerpt: String,
    /// Estimated reading time in minutes (at least 1).
    pub read_time: u32,
}

impl ContentNode {
    /// True for documents stored as `dir/index.md` whose siblings are assets.
    /// A root-level `index.md` is not a bundle.
    pub fn is_bundle(&self) -> bool {
        let path = Path::new(&self.source_path);
        path.file_stem().is_some_and(|stem| stem == "index")
            && path.parent().is_some_and(|dir| !dir.as_os_str().is_empty())
    }

    /// Directory holding a bundle's files, relative to the content root.
    pub fn bundle_dir(&self) -> Option<&Path> {
        if self.is_bundle() {
            Path::new(&self.source_path).parent()
        } else {
            None
        }
    }

    /// Category to display: the first declared one, else the site default.
    pub fn primary_category<'a>(&'a self, default: &'a str) -> &'a str {
        self.categories.first().map(String::as_str).unwrap_or(default)
    }

    /// Listed on the home page, archive and taxonomy pages.
    pub fn is_listed_post(&self) -> bool {
        self.published && self.template == "post" && self.date.is_some()
    }
}

/// Sort newest first. Stable: equal dates keep their input order, undated
/// nodes go last.
pub fn sort_newest_first(nodes: &mut [&ContentNode]) {
    nodes.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_output_paths() {
        let out = Path::new("dist");
        let slug = Slug::from_normalized("/blog/hello".to_string());
        assert_eq!(slug.output_file(out), Path::new("dist/blog/hello/index.html"));
        assert_eq!(slug.href(), "/blog/hello/");
        assert_eq!(slug.relative(), "blog/hello");
    }

    #[test]
    fn root_slug_writes_index() {
        let out = Path::new("dist");
        let slug = Slug::root();
        assert_eq!(slug.output_file(out), Path::new("dist/index.html"));
        assert_eq!(slug.href(), "/");
        assert_eq!(slug.relative(), "");
    }

    #[test]
    fn sort_newest_first_is_stable() {
        use crate::test_helpers::test_node;
        let a = test_node("/a", Some("2020-01-03"));
        let b = test_node("/b", Some("2020-01-01"));
        let c = test_node("/c", Some("2020-01-03"));
        let d = test_node("/d", None);
        let mut nodes = vec![&d, &a, &b, &c];
        sort_newest_first(&mut nodes);
        let order: Vec<&str> = nodes.iter().map(|n| n.slug.as_str()).collect();
        assert_eq!(order, vec!["/a", "/c", "/b", "/d"]);
    }
}
