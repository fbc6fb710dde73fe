//! The build: scan → render → feeds → site files.
//!
//! ```text
//! 1. Scan      content/        →  ContentNodes + content errors
//! 2. Render    ContentNodes    →  one page per node + listing pages
//! 3. Feeds     ContentNodes    →  RSS documents
//! 4. Site      pages           →  sitemap.xml, manifest.webmanifest, robots.txt
//! ```
//!
//! Configuration is resolved by the caller before anything here runs, so a
//! bad base URL never produces partial output. Every output path is planned
//! and checked for collisions before the first file is written.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                     # Home (hero + latest posts)
//! ├── blog/
//! │   ├── index.html                 # Archive
//! │   └── react-hooks-pitfalls/
//! │       ├── index.html             # Post
//! │       └── thumbnail.svg          # Copied bundle file
//! ├── tags/react/index.html
//! ├── categories/tech/index.html
//! ├── rss.xml
//! ├── sitemap.xml
//! ├── manifest.webmanifest
//! ├── robots.txt
//! └── favicon.svg                    # From content/assets/
//! ```

use crate::components::SiteContext;
use crate::config::{DeployContext, SiteConfig};
use crate::content::{self, ContentError, ScanError, ScanResult};
use crate::feed::{self, FeedError};
use crate::site_files;
use crate::templates::{self, ListingKind, TemplateError, TemplateRegistry};
use crate::types::{ContentNode, Slug};
use maud::Markup;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the content root copied verbatim to the output root.
pub const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to copy assets: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Output {path} is produced by both {first} and {second}")]
    OutputCollision {
        path: String,
        first: String,
        second: String,
    },
    #[error("{skipped} documents skipped, more than the allowed {allowed}")]
    TooManyErrors { skipped: usize, allowed: usize },
}

/// A written content page.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub slug: Slug,
    pub source_path: String,
    pub template: String,
}

/// A written listing page.
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub slug: Slug,
    pub kind: ListingKind,
    pub posts: usize,
}

/// A written feed.
#[derive(Debug, Clone)]
pub struct FeedRecord {
    pub title: String,
    pub output: String,
    pub entries: usize,
}

/// What a build produced and what it skipped.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: Vec<PageRecord>,
    pub listings: Vec<ListingRecord>,
    pub feeds: Vec<FeedRecord>,
    /// Auxiliary files written at the output root.
    pub site_files: Vec<&'static str>,
    /// Files copied from bundles and `assets/`.
    pub copied_files: usize,
    /// Published posts with no date: they get a page but no feed entry.
    pub undated: Vec<String>,
    pub content_errors: Vec<ContentError>,
    pub template_errors: Vec<TemplateError>,
}

impl BuildReport {
    /// Documents that produced no page.
    pub fn skipped(&self) -> usize {
        self.content_errors.len() + self.template_errors.len()
    }

    /// Fail when more documents were skipped than `max_content_errors` allows.
    pub fn check_tolerance(&self, allowed: Option<usize>) -> Result<(), BuildError> {
        tolerance(self.skipped(), allowed)
    }
}

fn tolerance(skipped: usize, allowed: Option<usize>) -> Result<(), BuildError> {
    match allowed {
        Some(allowed) if skipped > allowed => Err(BuildError::TooManyErrors { skipped, allowed }),
        _ => Ok(()),
    }
}

/// Tracks which artifact owns each output path.
#[derive(Default)]
struct OutputPlan {
    owners: HashMap<PathBuf, String>,
}

impl OutputPlan {
    fn claim(&mut self, path: PathBuf, owner: String) -> Result<PathBuf, BuildError> {
        if let Some(first) = self.owners.get(&path) {
            return Err(BuildError::OutputCollision {
                path: path.display().to_string(),
                first: first.clone(),
                second: owner,
            });
        }
        self.owners.insert(path.clone(), owner);
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// What [`check`] found: the scanned documents and the ones whose template
/// does not resolve.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub scan: ScanResult,
    pub template_errors: Vec<TemplateError>,
}

impl CheckReport {
    /// Documents a build would skip.
    pub fn skipped(&self) -> usize {
        self.scan.errors.len() + self.template_errors.len()
    }

    pub fn check_tolerance(&self, allowed: Option<usize>) -> Result<(), BuildError> {
        tolerance(self.skipped(), allowed)
    }
}

/// Scan and resolve templates without rendering or writing anything.
/// Skipped documents are counted the same way [`build`] counts them.
pub fn check(source: &Path) -> Result<CheckReport, BuildError> {
    let scan = content::scan(source)?;
    let registry = TemplateRegistry::builtin();
    let template_errors = scan
        .nodes
        .iter()
        .filter_map(|node| registry.resolve(node).err())
        .collect();
    Ok(CheckReport {
        scan,
        template_errors,
    })
}

/// Run the whole build. `config` must already be normalized and validated.
pub fn build(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
    context: DeployContext,
) -> Result<BuildReport, BuildError> {
    let scan = content::scan(source)?;
    let mut report = BuildReport {
        content_errors: scan.errors,
        ..BuildReport::default()
    };

    let ctx = SiteContext::new(config);
    let registry = TemplateRegistry::builtin();

    // Render every node; template failures drop the node from all outputs.
    let rendered: Vec<Result<Markup, TemplateError>> = scan
        .nodes
        .par_iter()
        .map(|node| registry.render(node, &ctx))
        .collect();

    let mut nodes: Vec<ContentNode> = Vec::with_capacity(scan.nodes.len());
    let mut pages: Vec<(Slug, Markup)> = Vec::with_capacity(scan.nodes.len());
    for (node, outcome) in scan.nodes.into_iter().zip(rendered) {
        match outcome {
            Ok(markup) => {
                pages.push((node.slug.clone(), markup));
                nodes.push(node);
            }
            Err(err) => {
                tracing::warn!("skipping document: {err}");
                report.template_errors.push(err);
            }
        }
    }

    let listings = templates::plan_listings(&nodes, &config.default_category);
    let feeds: Vec<feed::Feed> = config
        .effective_feeds()
        .iter()
        .map(|feed_config| feed::build_feed(config, feed_config, &nodes))
        .collect();

    // Plan every path before writing anything.
    let mut plan = OutputPlan::default();
    let mut page_writes: Vec<(PathBuf, String)> = Vec::new();
    for ((slug, markup), node) in pages.into_iter().zip(&nodes) {
        let path = plan.claim(slug.output_file(output), node.source_path.clone())?;
        page_writes.push((path, markup.into_string()));
    }
    for listing in &listings {
        let path = plan.claim(
            listing.slug.output_file(output),
            format!("{:?} listing {}", listing.kind, listing.slug),
        )?;
        page_writes.push((path, listing.render(&ctx).into_string()));
    }
    let mut feed_writes: Vec<(PathBuf, String)> = Vec::new();
    for feed in &feeds {
        let path = plan.claim(
            feed::output_path(output, &feed.output)?,
            format!("feed {}", feed.output),
        )?;
        feed_writes.push((path, feed::render_rss(feed)));
    }
    let mut sitemap_slugs: Vec<Slug> = nodes
        .iter()
        .filter(|n| n.published)
        .map(|n| n.slug.clone())
        .collect();
    sitemap_slugs.extend(listings.iter().map(|l| l.slug.clone()));
    let site_writes = [
        (
            site_files::SITEMAP_FILE,
            site_files::render_sitemap(config, &sitemap_slugs),
        ),
        (
            site_files::MANIFEST_FILE,
            site_files::render_manifest(config)?,
        ),
        (
            site_files::ROBOTS_FILE,
            site_files::render_robots(config, context),
        ),
    ];
    let mut site_paths = Vec::with_capacity(site_writes.len());
    for (name, _) in &site_writes {
        site_paths.push(plan.claim(output.join(name), (*name).to_string())?);
    }
    let mut copies: Vec<(PathBuf, PathBuf)> = Vec::new();
    for node in &nodes {
        if let Some(dir) = node.bundle_dir() {
            copies.extend(bundle_files(&source.join(dir), &node.slug.output_dir(output))?);
        }
    }
    let assets = source.join(ASSETS_DIR);
    if assets.is_dir() {
        copies.extend(asset_files(&assets, output)?);
    }
    for (from, to) in &copies {
        let relative = from.strip_prefix(source).unwrap_or(from);
        plan.claim(to.clone(), format!("copied file {}", relative.display()))?;
    }

    fs::create_dir_all(output)?;

    for (path, html) in &page_writes {
        write_file(path, html)?;
        tracing::info!(path = %path.display(), "wrote page");
    }

    for (from, to) in &copies {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        tracing::debug!(file = %from.display(), "copied file");
    }
    report.copied_files = copies.len();

    for ((path, xml), feed) in feed_writes.iter().zip(&feeds) {
        write_file(path, xml)?;
        tracing::info!(path = %path.display(), entries = feed.entries.len(), "wrote feed");
        report.feeds.push(FeedRecord {
            title: feed.title.clone(),
            output: feed.output.clone(),
            entries: feed.entries.len(),
        });
    }

    for (path, (name, contents)) in site_paths.iter().zip(&site_writes) {
        write_file(path, contents)?;
        tracing::info!(path = %path.display(), "wrote site file");
        report.site_files.push(*name);
    }

    report.pages = nodes
        .iter()
        .map(|node| PageRecord {
            slug: node.slug.clone(),
            source_path: node.source_path.clone(),
            template: node.template.clone(),
        })
        .collect();
    report.listings = listings
        .iter()
        .map(|listing| ListingRecord {
            slug: listing.slug.clone(),
            kind: listing.kind,
            posts: listing.posts.len(),
        })
        .collect();
    report.undated = nodes
        .iter()
        .filter(|n| n.published && n.template == "post" && n.date.is_none())
        .map(|n| n.source_path.clone())
        .collect();

    Ok(report)
}

/// The files sitting next to a bundle's `index.md`, paired with where they
/// land. Markdown siblings and subdirectories are not part of the bundle.
fn bundle_files(
    bundle_dir: &Path,
    dest: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(bundle_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file()
            || name.starts_with('.')
            || content::is_content_file(entry.path())
        {
            continue;
        }
        files.push((entry.path().to_path_buf(), dest.join(entry.file_name())));
    }
    Ok(files)
}

/// Every file under `src`, mirrored into `dst`.
fn asset_files(src: &Path, dst: &Path) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        files.push((entry.path().to_path_buf(), dst.join(relative)));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Duncan Leung".to_string(),
            url: "https://duncanleung.com".to_string(),
            ..SiteConfig::default()
        }
    }

    fn build_tmp(source: &Path) -> (TempDir, BuildReport) {
        let out = TempDir::new().unwrap();
        let report = build(source, out.path(), &config(), DeployContext::Production).unwrap();
        (out, report)
    }

    #[test]
    fn one_page_per_node() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "me.md", "title: Me\ntemplate: page", "About");
        write_doc(
            src.path(),
            "blog/hello.md",
            "title: Hello\ndate: 2021-05-01\ntemplate: post",
            "Hi",
        );

        let (out, report) = build_tmp(src.path());
        assert_eq!(report.pages.len(), 2);
        assert!(out.path().join("me/index.html").is_file());
        assert!(out.path().join("blog/hello/index.html").is_file());
        assert!(out.path().join("index.html").is_file());
        assert!(out.path().join("blog/index.html").is_file());
    }

    #[test]
    fn unknown_template_omits_page_and_continues() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "a.md", "title: A\ntemplate: slides", "");
        write_doc(src.path(), "b.md", "title: B\ntemplate: page", "");

        let (out, report) = build_tmp(src.path());
        assert_eq!(report.template_errors.len(), 1);
        assert!(!out.path().join("a/index.html").exists());
        assert!(out.path().join("b/index.html").is_file());
    }

    #[test]
    fn undated_post_gets_page_but_no_feed_entry() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "blog/undated.md", "title: U\ntemplate: post", "");
        write_doc(
            src.path(),
            "blog/dated.md",
            "title: D\ndate: 2021-01-01\ntemplate: post",
            "",
        );

        let (out, report) = build_tmp(src.path());
        assert!(out.path().join("blog/undated/index.html").is_file());
        assert_eq!(report.undated, vec!["blog/undated.md"]);
        let rss = fs::read_to_string(out.path().join("rss.xml")).unwrap();
        assert!(rss.contains("https://duncanleung.com/blog/dated"));
        assert!(!rss.contains("blog/undated"));
    }

    #[test]
    fn feed_colliding_with_page_is_fatal_before_writing() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "me.md", "title: Me\ntemplate: page", "");
        let out = TempDir::new().unwrap();
        let config = SiteConfig {
            rss: "/me/index.html".to_string(),
            ..config()
        };
        let result = build(src.path(), out.path(), &config, DeployContext::Production);
        assert!(matches!(result, Err(BuildError::OutputCollision { .. })));
        assert!(!out.path().join("me/index.html").exists());
    }

    #[test]
    fn copies_bundle_files_and_assets() {
        let src = TempDir::new().unwrap();
        write_doc(
            src.path(),
            "blog/hooks/index.md",
            "title: Hooks\ndate: 2021-01-01\ntemplate: post\nthumbnail: ./thumb.png",
            "",
        );
        fs::write(src.path().join("blog/hooks/thumb.png"), b"png").unwrap();
        fs::create_dir_all(src.path().join("assets/fonts")).unwrap();
        fs::write(src.path().join("assets/favicon.svg"), "<svg/>").unwrap();
        fs::write(src.path().join("assets/fonts/a.woff2"), "font").unwrap();

        let (out, report) = build_tmp(src.path());
        assert!(out.path().join("blog/hooks/thumb.png").is_file());
        assert!(out.path().join("favicon.svg").is_file());
        assert!(out.path().join("fonts/a.woff2").is_file());
        assert_eq!(report.copied_files, 3);
    }

    #[test]
    fn asset_colliding_with_page_is_fatal_before_writing() {
        let src = TempDir::new().unwrap();
        write_doc(
            src.path(),
            "blog/hello.md",
            "title: Hello\ndate: 2021-05-01\ntemplate: post",
            "Hi",
        );
        fs::create_dir_all(src.path().join("assets")).unwrap();
        fs::write(src.path().join("assets/index.html"), "stray").unwrap();
        let out = TempDir::new().unwrap();

        let result = build(src.path(), out.path(), &config(), DeployContext::Production);
        match result {
            Err(BuildError::OutputCollision { first, second, .. }) => {
                assert_eq!(first, "Index listing /");
                assert_eq!(second, "copied file assets/index.html");
            }
            other => panic!("expected a collision, got {other:?}"),
        }
        assert!(!out.path().join("index.html").exists());
        assert!(!out.path().join("blog/hello/index.html").exists());
    }

    #[test]
    fn bundle_file_colliding_with_its_page_is_fatal() {
        let src = TempDir::new().unwrap();
        write_doc(
            src.path(),
            "blog/hooks/index.md",
            "title: Hooks\ndate: 2021-01-01\ntemplate: post",
            "",
        );
        fs::write(src.path().join("blog/hooks/index.html"), "stray").unwrap();
        let out = TempDir::new().unwrap();

        let result = build(src.path(), out.path(), &config(), DeployContext::Production);
        assert!(matches!(result, Err(BuildError::OutputCollision { .. })));
        assert!(!out.path().join("blog/hooks/index.html").exists());
    }

    #[test]
    fn check_counts_template_errors_like_build() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "a.md", "title: A\ntemplate: slides", "");
        write_doc(src.path(), "b.md", "template: page", "");
        write_doc(src.path(), "c.md", "title: C\ntemplate: page", "");

        let report = check(src.path()).unwrap();
        assert_eq!(report.scan.errors.len(), 1);
        assert_eq!(report.template_errors.len(), 1);
        assert_eq!(report.scan.nodes.len(), 2);
        assert!(report.check_tolerance(Some(2)).is_ok());
        assert!(report.check_tolerance(Some(1)).is_err());

        let (_out, built) = build_tmp(src.path());
        assert_eq!(built.skipped(), report.skipped());
    }

    #[test]
    fn writes_site_files() {
        let src = TempDir::new().unwrap();
        write_doc(src.path(), "me.md", "title: Me\ntemplate: page", "");
        let (out, report) = build_tmp(src.path());
        assert_eq!(
            report.site_files,
            vec!["sitemap.xml", "manifest.webmanifest", "robots.txt"]
        );
        let sitemap = fs::read_to_string(out.path().join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://duncanleung.com/me/</loc>"));
    }

    #[test]
    fn tolerance_check() {
        let mut report = BuildReport::default();
        report.content_errors.push(ContentError::MissingField {
            path: "a.md".to_string(),
            field: "title",
        });
        assert!(report.check_tolerance(None).is_ok());
        assert!(report.check_tolerance(Some(1)).is_ok());
        assert!(matches!(
            report.check_tolerance(Some(0)),
            Err(BuildError::TooManyErrors {
                skipped: 1,
                allowed: 0
            })
        ));
    }
}
