//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every document leads
//! with its positional index and title; source paths and slugs follow as
//! indented context lines, so the output reads as a content inventory while
//! still pointing back at files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 Hello (2021-05-01)
//!     Source: blog/hello.md
//!     Slug: /blog/hello
//!     Tags: react, hooks
//! 002 Work in progress (draft)
//!     Source: blog/wip.md
//!
//! Pages
//! 001 Me
//!     Source: me.md
//!
//! Skipped
//!     broken/no-title.md: missing required front-matter field `title`
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 /blog/hello → blog/hello/index.html
//!
//! Listings
//! 001 Home (6 posts) → index.html
//! 002 Blog (9 posts) → blog/index.html
//!
//! Feeds
//! 001 My Blog RSS Feed (9 entries) → rss.xml
//!
//! Generated 12 pages, 2 listings, 1 feed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::content::ContentError;
use crate::pipeline::{BuildReport, CheckReport, ListingRecord};
use crate::templates::{ListingKind, TemplateError};
use crate::types::{ContentNode, Slug};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + title, with an optional parenthesized detail.
///
/// ```text
/// 001 Hello (2021-05-01)
/// 002 Me
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Output file of a page, relative to the output directory.
fn output_file(slug: &Slug) -> String {
    if slug.is_root() {
        "index.html".to_string()
    } else {
        format!("{}/index.html", slug.relative())
    }
}

fn plural(count: usize, word: &str) -> String {
    match (count, word) {
        (1, _) => format!("1 {word}"),
        (_, "entry") => format!("{count} entries"),
        _ => format!("{count} {word}s"),
    }
}

// ============================================================================
// Check: content inventory
// ============================================================================

fn node_detail(node: &ContentNode) -> Option<String> {
    match (node.published, node.date) {
        (false, _) => Some("draft".to_string()),
        (true, Some(date)) => Some(date.format("%Y-%m-%d").to_string()),
        (true, None) => None,
    }
}

fn push_node(lines: &mut Vec<String>, index: usize, node: &ContentNode) {
    let detail = node_detail(node);
    lines.push(entity_header(index, &node.title, detail.as_deref()));
    lines.push(format!("{}Source: {}", indent(1), node.source_path));
    lines.push(format!("{}Slug: {}", indent(1), node.slug));
    if !node.tags.is_empty() {
        lines.push(format!("{}Tags: {}", indent(1), node.tags.join(", ")));
    }
    if node.template != "post" && node.template != "page" {
        lines.push(format!("{}Template: {}", indent(1), node.template));
    }
}

/// Format the content inventory found by a scan.
pub fn format_scan_output(report: &CheckReport, source_root: &Path) -> Vec<String> {
    let result = &report.scan;
    let mut lines = Vec::new();

    let (posts, pages): (Vec<&ContentNode>, Vec<&ContentNode>) =
        result.nodes.iter().partition(|n| n.template == "post");

    lines.push("Posts".to_string());
    for (i, node) in posts.iter().enumerate() {
        push_node(&mut lines, i + 1, node);
    }

    lines.push(String::new());
    lines.push("Pages".to_string());
    for (i, node) in pages.iter().enumerate() {
        push_node(&mut lines, i + 1, node);
    }

    if report.skipped() > 0 {
        lines.push(String::new());
        lines.extend(format_errors(&result.errors, &report.template_errors));
    }

    let has_config = source_root.join("config.toml").exists();
    let has_assets = source_root.join("assets").is_dir();
    if has_config || has_assets {
        lines.push(String::new());
        lines.push("Config".to_string());
        if has_config {
            lines.push(format!("{}config.toml", indent(1)));
        }
        if has_assets {
            lines.push(format!("{}assets/", indent(1)));
        }
    }

    lines
}

pub fn print_scan_output(report: &CheckReport, source_root: &Path) {
    for line in format_scan_output(report, source_root) {
        println!("{}", line);
    }
}

/// Aggregate report of every skipped document.
pub fn format_errors(content: &[ContentError], template: &[TemplateError]) -> Vec<String> {
    if content.is_empty() && template.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Skipped".to_string()];
    lines.extend(content.iter().map(|e| format!("{}{}", indent(1), e)));
    lines.extend(template.iter().map(|e| format!("{}{}", indent(1), e)));
    lines
}

// ============================================================================
// Build summary
// ============================================================================

fn listing_title(listing: &ListingRecord) -> String {
    match listing.kind {
        ListingKind::Index => "Home".to_string(),
        ListingKind::Archive => "Blog".to_string(),
        ListingKind::Tag | ListingKind::Category => listing.slug.to_string(),
    }
}

/// Format what a build wrote, what it skipped, and a one-line total.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for (i, page) in report.pages.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            page.slug,
            output_file(&page.slug)
        ));
    }

    lines.push(String::new());
    lines.push("Listings".to_string());
    for (i, listing) in report.listings.iter().enumerate() {
        let count = plural(listing.posts, "post");
        lines.push(format!(
            "{} → {}",
            entity_header(i + 1, &listing_title(listing), Some(&count)),
            output_file(&listing.slug)
        ));
    }

    lines.push(String::new());
    lines.push("Feeds".to_string());
    for (i, feed) in report.feeds.iter().enumerate() {
        let count = plural(feed.entries, "entry");
        lines.push(format!(
            "{} → {}",
            entity_header(i + 1, &feed.title, Some(&count)),
            feed.output.trim_start_matches('/')
        ));
    }

    if !report.undated.is_empty() {
        lines.push(String::new());
        lines.push("Undated (no feed entry)".to_string());
        for path in &report.undated {
            lines.push(format!("{}{}", indent(1), path));
        }
    }

    let errors = format_errors(&report.content_errors, &report.template_errors);
    if !errors.is_empty() {
        lines.push(String::new());
        lines.extend(errors);
    }

    lines.push(String::new());
    let mut summary = format!(
        "Generated {}, {}, {}",
        plural(report.pages.len(), "page"),
        plural(report.listings.len(), "listing"),
        plural(report.feeds.len(), "feed"),
    );
    if report.copied_files > 0 {
        summary.push_str(&format!(", copied {}", plural(report.copied_files, "file")));
    }
    if report.skipped() > 0 {
        summary.push_str(&format!(", skipped {}", plural(report.skipped(), "document")));
    }
    lines.push(summary);

    lines
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}
