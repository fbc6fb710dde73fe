//! Template resolution and page rendering.
//!
//! Each content node names a template in its front-matter. The
//! [`TemplateRegistry`] maps that name to a rendering function; unknown names
//! are a per-document [`TemplateError`] and the node gets no output.
//!
//! ## Built-in Templates
//!
//! - **post**: thumbnail, date, read time, category, tags, share and edit
//!   links, post actions, author note
//! - **page**: title and body only
//!
//! ## Generated Listings
//!
//! Besides one page per node, the build renders listing pages planned by
//! [`plan_listings`]:
//!
//! ```text
//! /                       # hero + latest posts (unless a document owns `/`)
//! /blog/                  # every listed post, newest first
//! /tags/{tag}/            # posts carrying the tag
//! /categories/{category}/ # posts in the category (default category if none)
//! ```

use crate::components::{
    self, SiteContext, base_document, edit_on_github_url, hero, post_listing, twitter_share_url,
};
use crate::naming;
use crate::types::{ContentNode, Slug, sort_newest_first};
use maud::{Markup, PreEscaped, html};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Number of posts on the home page.
pub const INDEX_POST_COUNT: usize = 6;

/// Signature shared by all page templates.
pub type TemplateFn = fn(&ContentNode, &SiteContext) -> Markup;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("{source_path}: unknown template {template:?} for {slug} (available: {})", .available.join(", "))]
    Unknown {
        slug: Slug,
        source_path: String,
        template: String,
        available: Vec<String>,
    },
}

/// Template name → rendering function.
pub struct TemplateRegistry {
    templates: BTreeMap<&'static str, TemplateFn>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    /// Registry with the `post` and `page` templates.
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: BTreeMap::new(),
        };
        registry.register("post", render_post);
        registry.register("page", render_page);
        registry
    }

    pub fn register(&mut self, name: &'static str, template: TemplateFn) {
        self.templates.insert(name, template);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.templates.keys().copied().collect()
    }

    pub fn resolve(&self, node: &ContentNode) -> Result<TemplateFn, TemplateError> {
        self.templates
            .get(node.template.as_str())
            .copied()
            .ok_or_else(|| TemplateError::Unknown {
                slug: node.slug.clone(),
                source_path: node.source_path.clone(),
                template: node.template.clone(),
                available: self.names().into_iter().map(String::from).collect(),
            })
    }

    /// Resolve and render in one step.
    pub fn render(&self, node: &ContentNode, ctx: &SiteContext) -> Result<Markup, TemplateError> {
        let template = self.resolve(node)?;
        Ok(template(node, ctx))
    }
}

/// Href for a front-matter thumbnail.
///
/// Relative paths resolve against the page's own directory, which is where
/// bundle files are copied. Absolute and external references pass through.
pub fn thumbnail_href(ctx: &SiteContext, node: &ContentNode, thumbnail: &str) -> String {
    if thumbnail.contains("://") {
        thumbnail.to_string()
    } else if thumbnail.starts_with('/') {
        ctx.config.href(thumbnail)
    } else {
        let relative = thumbnail.trim_start_matches("./");
        ctx.config
            .href(&format!("{}{}", node.slug.href(), relative))
    }
}

fn taxonomy_link(ctx: &SiteContext, kind: &str, name: &str) -> Markup {
    html! {
        @match naming::taxonomy_slug(kind, name) {
            Some(slug) => {
                a.category href=(ctx.config.href(&slug.href())) { (name) }
            }
            None => {
                span.category { (name) }
            }
        }
    }
}

pub fn render_post(node: &ContentNode, ctx: &SiteContext) -> Markup {
    let config = ctx.config;
    let title = format!("{} – {}", node.title, config.title);
    let share_url = twitter_share_url(ctx, node);

    let content = html! {
        article.single.container {
            header.single-header.no-thumbnail[node.thumbnail.is_none()] {
                @if let Some(thumbnail) = &node.thumbnail {
                    img.thumbnail src=(thumbnail_href(ctx, node, thumbnail)) alt=(node.title);
                }
                div.flex {
                    h1 { (node.title) }
                    div.post-meta {
                        @if let Some(date) = node.date {
                            time.date datetime=(date.format("%Y-%m-%d").to_string()) {
                                (ctx.format_date(date))
                            }
                        }
                        span.read-time { (node.read_time) " min read" }
                        (taxonomy_link(ctx, "categories", node.primary_category(&config.default_category)))
                        a.twitter-link href=(share_url) target="_blank" rel="noopener noreferrer" {
                            "Share on Twitter"
                        }
                        @if let Some(edit) = edit_on_github_url(config, node) {
                            a.github-link href=(edit) target="_blank" rel="noopener noreferrer" {
                                "Edit on GitHub"
                            }
                        }
                    }
                    (components::post_tags(config, &node.tags))
                }
            }
            div.post { (PreEscaped(&node.html)) }
        }
        div.single.container {
            (components::post_actions(ctx, node))
            (components::share(&share_url))
        }
        (components::user_info(config))
    };

    base_document(ctx, &title, &node.slug.href(), content)
}

pub fn render_page(node: &ContentNode, ctx: &SiteContext) -> Markup {
    let title = format!("{} – {}", node.title, ctx.config.title);
    let content = html! {
        article.single.container {
            header.single-header.no-thumbnail {
                h1 { (node.title) }
            }
            div.post { (PreEscaped(&node.html)) }
        }
    };
    base_document(ctx, &title, &node.slug.href(), content)
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Index,
    Archive,
    Tag,
    Category,
}

/// A generated page listing posts, newest first.
#[derive(Debug)]
pub struct ListingPage<'a> {
    pub slug: Slug,
    pub kind: ListingKind,
    /// Heading; the tag or category name for taxonomy pages.
    pub heading: String,
    pub posts: Vec<&'a ContentNode>,
}

impl ListingPage<'_> {
    pub fn render(&self, ctx: &SiteContext) -> Markup {
        match self.kind {
            ListingKind::Index => render_index(ctx, &self.posts),
            _ => render_listing(ctx, self),
        }
    }
}

/// Plan every listing page for the given nodes.
///
/// Only listed posts (published, `post` template, dated) appear. Listings
/// whose slug is already owned by a content node are dropped: documents win.
pub fn plan_listings<'a>(nodes: &'a [ContentNode], default_category: &str) -> Vec<ListingPage<'a>> {
    let mut posts: Vec<&ContentNode> = nodes.iter().filter(|n| n.is_listed_post()).collect();
    sort_newest_first(&mut posts);

    let mut tags = TaxonomyGroups::new();
    let mut categories = TaxonomyGroups::new();
    for &post in &posts {
        for tag in &post.tags {
            if let Some(slug) = naming::taxonomy_slug("tags", tag) {
                push_unique(&mut tags, slug, tag, post);
            }
        }
        let declared: Vec<&str> = if post.categories.is_empty() {
            vec![default_category]
        } else {
            post.categories.iter().map(String::as_str).collect()
        };
        for category in declared {
            if let Some(slug) = naming::taxonomy_slug("categories", category) {
                push_unique(&mut categories, slug, category, post);
            }
        }
    }

    let mut pages = vec![
        ListingPage {
            slug: Slug::root(),
            kind: ListingKind::Index,
            heading: "Latest Articles".to_string(),
            posts: posts.iter().take(INDEX_POST_COUNT).copied().collect(),
        },
        ListingPage {
            slug: Slug::from_normalized("/blog".to_string()),
            kind: ListingKind::Archive,
            heading: "Blog".to_string(),
            posts: posts.clone(),
        },
    ];
    pages.extend(taxonomy_pages(ListingKind::Tag, tags));
    pages.extend(taxonomy_pages(ListingKind::Category, categories));

    let owned: HashSet<&Slug> = nodes.iter().map(|n| &n.slug).collect();
    pages.retain(|page| !owned.contains(&page.slug));
    pages
}

type TaxonomyGroups<'a> = BTreeMap<Slug, (String, Vec<&'a ContentNode>)>;

fn taxonomy_pages(kind: ListingKind, groups: TaxonomyGroups<'_>) -> Vec<ListingPage<'_>> {
    groups
        .into_iter()
        .map(|(slug, (heading, posts))| ListingPage {
            slug,
            kind,
            heading,
            posts,
        })
        .collect()
}

/// Tags and categories that kebab-case to the same slug share one page,
/// headed by the first spelling seen.
fn push_unique<'a>(
    groups: &mut TaxonomyGroups<'a>,
    slug: Slug,
    name: &str,
    post: &'a ContentNode,
) {
    let (_, posts) = groups
        .entry(slug)
        .or_insert_with(|| (name.to_string(), Vec::new()));
    if !posts.iter().any(|p| std::ptr::eq(*p, post)) {
        posts.push(post);
    }
}

pub fn render_index(ctx: &SiteContext, posts: &[&ContentNode]) -> Markup {
    let config = ctx.config;
    let content = html! {
        (hero(config))
        section.container {
            h2.section-title { "Latest Articles" }
            (post_listing(ctx, posts))
            a.button href=(config.href("/blog/")) { "All articles" }
        }
    };
    base_document(ctx, &config.title, "/", content)
}

pub fn render_listing(ctx: &SiteContext, page: &ListingPage) -> Markup {
    let heading = match page.kind {
        ListingKind::Tag => format!("Posts tagged \u{201c}{}\u{201d}", page.heading),
        ListingKind::Category => format!("{} posts", page.heading),
        ListingKind::Index | ListingKind::Archive => page.heading.clone(),
    };
    let title = format!("{} – {}", heading, ctx.config.title);
    let content = html! {
        section.container {
            h1.section-title { (heading) }
            @if page.posts.is_empty() {
                p { "Nothing here yet." }
            } @else {
                (post_listing(ctx, &page.posts))
            }
        }
    };
    base_document(ctx, &title, &page.slug.href(), content)
}
