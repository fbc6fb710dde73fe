//! Shared test utilities for the simple-blog test suite.
//!
//! Provides fixture setup, document writers, node builders, and lookup
//! helpers that panic with the list of available slugs on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let result = scan(tmp.path()).unwrap();
//!
//! let post = find_node(&result.nodes, "/blog/gatsby-netlify-cms");
//! assert_eq!(post.template, "post");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::content::ScanResult;
use crate::naming;
use crate::types::{ContentNode, Slug};
use chrono::NaiveDate;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `---\n{front_matter}\n---\n{body}` at `root/relative`, creating
/// parent directories.
pub fn write_doc(root: &Path, relative: &str, front_matter: &str, body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("---\n{front_matter}\n---\n{body}")).unwrap();
}

// =========================================================================
// Node builders
// =========================================================================

/// A published `post` node titled "Test" at `slug`.
///
/// The source path mirrors the slug (`/blog/x` → `blog/x.md`, `/` →
/// `index.md`), so path filters behave as they would for a scanned file.
pub fn test_node(slug: &str, date: Option<&str>) -> ContentNode {
    let slug: Slug = naming::slug_from_override(slug).unwrap();
    let source_path = if slug.is_root() {
        "index.md".to_string()
    } else {
        format!("{}.md", slug.relative())
    };
    ContentNode {
        source_path,
        slug,
        title: "Test".to_string(),
        date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        tags: Vec::new(),
        categories: Vec::new(),
        template: "post".to_string(),
        thumbnail: None,
        published: true,
        body: String::new(),
        html: String::new(),
        excerpt: String::new(),
        read_time: 1,
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a node by slug. Panics if not found.
pub fn find_node<'a>(nodes: &'a [ContentNode], slug: &str) -> &'a ContentNode {
    nodes
        .iter()
        .find(|n| n.slug.as_str() == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = nodes.iter().map(|n| n.slug.as_str()).collect();
            panic!("node '{slug}' not found. Available: {slugs:?}")
        })
}

/// All slugs of a scan result, in order.
pub fn slugs(result: &ScanResult) -> Vec<&str> {
    result.nodes.iter().map(|n| n.slug.as_str()).collect()
}
