//! Stateless presentation components.
//!
//! Every function here formats data that is already resolved: a
//! [`ContentNode`], the [`SiteConfig`], or plain strings. None of them read
//! files or hold state. Templates in [`crate::templates`] compose them into
//! full documents.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: base styles (color variables injected from config)
//! - `static/nav.js`: navigation scroll state

use crate::config::{self, SiteConfig};
use crate::naming;
use crate::types::ContentNode;
use chrono::NaiveDate;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt::Write as _;

const CSS_STATIC: &str = include_str!("../static/style.css");
const NAV_JS: &str = include_str!("../static/nav.js");

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a query value the way browsers' `encodeURIComponent` does.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Everything a template needs besides the node itself.
pub struct SiteContext<'a> {
    pub config: &'a SiteConfig,
    /// Full stylesheet: color variables followed by the base styles.
    pub css: String,
}

impl<'a> SiteContext<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        let color_css = config::generate_color_css(&config.colors);
        Self {
            config,
            css: format!("{}\n\n{}", color_css, CSS_STATIC),
        }
    }

    /// Format a date with the configured `date_format`.
    ///
    /// Falls back to ISO format if the pattern cannot be rendered.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.config.date_format)).is_err() {
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }

    /// Public URL of a node's page, with trailing slash.
    pub fn page_url(&self, node: &ContentNode) -> String {
        self.config.absolute_url(&node.slug.href())
    }
}

/// Root-relative links and asset paths get the path prefix; anything with a
/// scheme is left alone.
fn site_href(config: &SiteConfig, link: &str) -> String {
    if link.starts_with('/') {
        config.href(link)
    } else {
        link.to_string()
    }
}

/// `current` is the page's site-relative href. `/` only matches itself.
fn is_active(link: &str, current: &str) -> bool {
    if link == "/" {
        current == "/"
    } else {
        current.starts_with(link)
    }
}

/// Renders the base HTML document structure.
pub fn base_document(ctx: &SiteContext, title: &str, current: &str, content: Markup) -> Markup {
    let config = ctx.config;
    html! {
        (DOCTYPE)
        html lang=(config.language) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if !config.description.is_empty() {
                    meta name="description" content=(config.description);
                }
                meta name="theme-color" content=(config.colors.theme);
                link rel="manifest" href=(config.href("manifest.webmanifest"));
                @for feed in config.effective_feeds() {
                    link rel="alternate" type="application/rss+xml"
                        title=(feed_title(config, &feed.title)) href=(config.href(&feed.output));
                }
                style { (PreEscaped(&ctx.css)) }
            }
            body {
                (navigation(config, current))
                main { (content) }
                (footer(config))
                script { (PreEscaped(NAV_JS)) }
            }
        }
    }
}

fn feed_title<'a>(config: &'a SiteConfig, title: &'a str) -> &'a str {
    if title.is_empty() { &config.title } else { title }
}

/// Sticky site navigation. `nav.js` toggles its `scrolled` class.
pub fn navigation(config: &SiteConfig, current: &str) -> Markup {
    html! {
        nav.nav data-scroll-nav {
            div.nav-container {
                div.brand {
                    a href=(config.href("/")) {
                        span.text { (config.title) }
                    }
                }
                div.links {
                    @for link in &config.menu {
                        a href=(site_href(config, &link.link))
                            class=[is_active(&link.link, current).then_some("active")] {
                            (link.name)
                        }
                    }
                }
            }
        }
    }
}

pub fn footer(config: &SiteConfig) -> Markup {
    let social = &config.social;
    html! {
        footer.footer.container {
            div {
                a href=(config.href(&config.rss)) rel="noopener noreferrer" target="_blank" { "RSS" }
                @if let Some(newsletter) = &social.newsletter {
                    a href=(newsletter) rel="noopener noreferrer" target="_blank" { "Newsletter" }
                }
            }
            div {
                @if let Some(github) = &social.github {
                    a href=(github) rel="noopener noreferrer" target="_blank" title="Open-source on GitHub" { "GitHub" }
                }
                @if let Some(handle) = social.twitter_handle() {
                    a href={ "https://twitter.com/" (handle) } rel="noopener noreferrer" target="_blank" { "Twitter" }
                }
                @if let Some(linkedin) = &social.linkedin {
                    a href=(linkedin) rel="noopener noreferrer" target="_blank" { "LinkedIn" }
                }
            }
        }
    }
}

/// Home page banner.
pub fn hero(config: &SiteConfig) -> Markup {
    html! {
        section.hero {
            div.container {
                @if !config.author.avatar.is_empty() {
                    img.avatar src=(site_href(config, &config.author.avatar)) alt=(config.author.name);
                }
                h1 { (config.title_alt) }
                @if !config.description.is_empty() {
                    p { (config.description) }
                }
            }
        }
    }
}

/// Author note shown under posts. Renders nothing without an author name.
pub fn user_info(config: &SiteConfig) -> Markup {
    let author = &config.author;
    html! {
        @if !author.name.is_empty() {
            aside.note {
                div.container.note-container {
                    div.note__author {
                        @if !author.avatar.is_empty() {
                            div.flex-avatar {
                                img.avatar src=(site_href(config, &author.avatar)) alt=(author.name);
                            }
                        }
                        div {
                            p.note__greeting { "Hi, I'm " (author.name) "." }
                            @if !author.minibio.is_empty() {
                                p { (PreEscaped(author.minibio.trim())) }
                            }
                            @if let Some(newsletter) = &config.social.newsletter {
                                div {
                                    a.button href=(newsletter) target="_blank" rel="noopener noreferrer" {
                                        "Subscribe to the blog"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Tag links. Tags that produce no slug are shown unlinked.
pub fn post_tags(config: &SiteConfig, tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            div.tags {
                @for tag in tags {
                    @match naming::taxonomy_slug("tags", tag) {
                        Some(slug) => {
                            a href=(config.href(&slug.href())) { (tag) }
                        }
                        None => {
                            span { (tag) }
                        }
                    }
                }
            }
        }
    }
}

/// `twitter.com/share` link for a post.
pub fn twitter_share_url(ctx: &SiteContext, node: &ContentNode) -> String {
    let mut url = format!(
        "https://twitter.com/share?text={}&url={}",
        encode_uri_component(&node.title),
        encode_uri_component(&ctx.page_url(node))
    );
    if let Some(handle) = ctx.config.social.twitter_handle() {
        url.push_str("&via=");
        url.push_str(&encode_uri_component(handle));
    }
    url
}

/// Link to edit the node's source on GitHub, when `repo` is configured.
pub fn edit_on_github_url(config: &SiteConfig, node: &ContentNode) -> Option<String> {
    config.repo.as_ref().map(|repo| {
        format!(
            "{}/edit/master/content/{}",
            repo.trim_end_matches('/'),
            node.source_path
        )
    })
}

/// "Discuss on Twitter" plus the edit link.
pub fn post_actions(ctx: &SiteContext, node: &ContentNode) -> Markup {
    let discuss = format!(
        "https://mobile.twitter.com/search?q={}",
        encode_uri_component(&ctx.page_url(node))
    );
    html! {
        div.post-actions {
            a target="_blank" rel="noopener noreferrer" href=(discuss) { "Discuss on Twitter" }
            @if let Some(edit) = edit_on_github_url(ctx.config, node) {
                span { " • " }
                a target="_blank" rel="noopener noreferrer" href=(edit) { "Edit post on GitHub" }
            }
        }
    }
}

pub fn share(share_url: &str) -> Markup {
    html! {
        div.share {
            div.divider {}
            span { "Share article" }
            a.twitter-link href=(share_url) target="_blank" rel="noopener noreferrer" {
                "Share on Twitter"
            }
        }
    }
}

/// Date-prefixed list of posts.
pub fn post_listing(ctx: &SiteContext, posts: &[&ContentNode]) -> Markup {
    html! {
        ul.posts {
            @for post in posts {
                li {
                    a href=(ctx.config.href(&post.slug.href())) { (post.title) }
                    @if let Some(date) = post.date {
                        time datetime=(date.format("%Y-%m-%d").to_string()) { (ctx.format_date(date)) }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MenuLink;
    use crate::test_helpers::test_node;

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Duncan Leung".to_string(),
            url: "https://duncanleung.com".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn encode_uri_component_matches_js() {
        assert_eq!(
            encode_uri_component("https://a.com/x y?q=1&r=(2)"),
            "https%3A%2F%2Fa.com%2Fx%20y%3Fq%3D1%26r%3D(2)"
        );
        assert_eq!(encode_uri_component("it's-fine_~*!"), "it's-fine_~*!");
    }

    #[test]
    fn base_document_includes_doctype_and_css() {
        let config = config();
        let ctx = SiteContext::new(&config);
        let html = base_document(&ctx, "Title", "/", html! { p { "body" } }).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("--color-bg"));
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn base_document_links_feeds_and_manifest() {
        let config = config();
        let ctx = SiteContext::new(&config);
        let html = base_document(&ctx, "T", "/", html! {}).into_string();
        assert!(html.contains(r#"type="application/rss+xml""#));
        assert!(html.contains(r#"href="/rss.xml""#));
        assert!(html.contains(r#"href="/manifest.webmanifest""#));
    }

    #[test]
    fn base_document_embeds_scroll_script() {
        let config = config();
        let ctx = SiteContext::new(&config);
        let html = base_document(&ctx, "T", "/", html! {}).into_string();
        assert!(html.contains("AbortController"));
        assert!(html.contains("data-scroll-nav"));
    }

    #[test]
    fn navigation_marks_active_link() {
        let config = config();
        let html = navigation(&config, "/blog/hello/").into_string();
        assert!(html.contains(r#"<a href="/blog/" class="active">Blog</a>"#));
    }

    #[test]
    fn navigation_root_link_only_active_on_home() {
        let config = SiteConfig {
            menu: vec![MenuLink {
                name: "Home".to_string(),
                link: "/".to_string(),
            }],
            ..config()
        };
        assert!(navigation(&config, "/").into_string().contains("active"));
        assert!(!navigation(&config, "/me/").into_string().contains("active"));
    }

    #[test]
    fn navigation_honours_path_prefix() {
        let config = SiteConfig {
            path_prefix: "/site".to_string(),
            ..config()
        };
        let html = navigation(&config, "/").into_string();
        assert!(html.contains(r#"href="/site/blog/""#));
        assert!(html.contains(r#"href="/site/""#));
    }

    #[test]
    fn avatar_honours_path_prefix() {
        let mut config = SiteConfig {
            path_prefix: "/site".to_string(),
            ..config()
        };
        config.author.name = "Duncan Leung".to_string();
        config.author.avatar = "/images/avatar.jpg".to_string();
        assert!(hero(&config).into_string().contains(r#"src="/site/images/avatar.jpg""#));
        assert!(user_info(&config).into_string().contains(r#"src="/site/images/avatar.jpg""#));

        config.author.avatar = "https://cdn.example.com/a.jpg".to_string();
        assert!(hero(&config).into_string().contains(r#"src="https://cdn.example.com/a.jpg""#));
    }

    #[test]
    fn footer_renders_optional_links() {
        let mut config = config();
        assert!(!footer(&config).into_string().contains("GitHub"));
        config.social.github = Some("https://github.com/duncanleung".to_string());
        config.social.twitter = Some("@leungd".to_string());
        let html = footer(&config).into_string();
        assert!(html.contains("https://github.com/duncanleung"));
        assert!(html.contains("https://twitter.com/leungd"));
    }

    #[test]
    fn user_info_requires_author() {
        let mut config = config();
        assert!(user_info(&config).into_string().is_empty());
        config.author.name = "Duncan Leung".to_string();
        config.author.minibio = "<strong>Duncan</strong> writes code.".to_string();
        let html = user_info(&config).into_string();
        assert!(html.contains("Hi, I'm Duncan Leung."));
        assert!(html.contains("<strong>Duncan</strong> writes code."));
    }

    #[test]
    fn post_tags_link_to_taxonomy_pages() {
        let config = config();
        let html = post_tags(&config, &["React Hooks".to_string()]).into_string();
        assert!(html.contains(r#"<a href="/tags/react-hooks/">React Hooks</a>"#));
    }

    #[test]
    fn twitter_share_url_encodes_title_and_via() {
        let mut config = config();
        config.social.twitter = Some("@leungd".to_string());
        let ctx = SiteContext::new(&config);
        let mut node = test_node("/blog/hello", Some("2021-05-01"));
        node.title = "Hello & Bye".to_string();
        let url = twitter_share_url(&ctx, &node);
        assert_eq!(
            url,
            "https://twitter.com/share?text=Hello%20%26%20Bye&url=https%3A%2F%2Fduncanleung.com%2Fblog%2Fhello%2F&via=leungd"
        );
    }

    #[test]
    fn post_actions_discuss_link() {
        let config = config();
        let ctx = SiteContext::new(&config);
        let node = test_node("/blog/hello", Some("2021-05-01"));
        let html = post_actions(&ctx, &node).into_string();
        assert!(html.contains(
            "https://mobile.twitter.com/search?q=https%3A%2F%2Fduncanleung.com%2Fblog%2Fhello%2F"
        ));
        assert!(!html.contains("Edit post on GitHub"));
    }

    #[test]
    fn edit_link_uses_repo() {
        let config = SiteConfig {
            repo: Some("https://github.com/duncanleung/blog/".to_string()),
            ..config()
        };
        let node = test_node("/blog/hello", None);
        assert_eq!(
            edit_on_github_url(&config, &node).as_deref(),
            Some("https://github.com/duncanleung/blog/edit/master/content/blog/hello.md")
        );
    }

    #[test]
    fn format_date_uses_config() {
        let config = config();
        let ctx = SiteContext::new(&config);
        let date = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap();
        assert_eq!(ctx.format_date(date), "May 1, 2021");
    }

    #[test]
    fn html_escape_in_maud() {
        let config = SiteConfig {
            title: "<script>alert('x')</script>".to_string(),
            ..config()
        };
        let html = navigation(&config, "/").into_string();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
