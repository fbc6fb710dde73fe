//! RSS feed generation.
//!
//! Each configured feed selects the published, dated nodes whose source path
//! contains its `path_filter`, orders them newest first (stable, so equal
//! dates keep source order), caps them at `limit`, and projects each into a
//! [`FeedEntry`].
//!
//! ## Link Rewriting
//!
//! Feed readers have no base URL, so root-relative references in the body are
//! made absolute. This is literal substitution over the HTML string, not a
//! parse:
//!
//! | Pattern          | Replacement          |
//! |------------------|----------------------|
//! | `href="/`        | `href="{url}/`       |
//! | `src="/`         | `src="{url}/`        |
//! | `"/static/`      | `"{url}/static/`     |
//! | `,` `\s*/static/`| `,{url}/static/`     |
//!
//! Known limitations: protocol-relative links (`href="//cdn…"`) match the
//! first rule and come out as `href="{url}//cdn…"`; single-quoted attributes
//! are left alone.

use crate::config::{FeedConfig, SiteConfig};
use crate::types::{ContentNode, sort_newest_first};
use chrono::NaiveDate;
use maud::{PreEscaped, html};
use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

const CONTENT_WRAPPER_STYLE: &str = "width: 100%; margin: 0 auto; max-width: 800px; padding: 40px 40px;";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid feed output path {0:?}")]
    InvalidOutput(String),
}

/// One `<item>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub guid: String,
    pub pub_date: NaiveDate,
    /// Plain-text excerpt.
    pub description: String,
    /// Rewritten body plus footer block, wrapped in a container `div`.
    pub content_encoded: String,
}

/// A feed ready to serialize.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Site-relative output path, e.g. `/blog/rss.xml`.
    pub output: String,
    pub self_url: String,
    pub entries: Vec<FeedEntry>,
}

/// Nodes that belong in the feed, newest first, capped at the feed limit.
pub fn select<'a>(nodes: &'a [ContentNode], feed: &FeedConfig) -> Vec<&'a ContentNode> {
    let mut selected: Vec<&ContentNode> = nodes
        .iter()
        .filter(|node| node.published && node.date.is_some())
        .filter(|node| format!("/{}", node.source_path).contains(&feed.path_filter))
        .collect();
    sort_newest_first(&mut selected);
    selected.truncate(feed.limit);
    selected
}

/// Absolute entry URL: base URL, `/`, slug without its leading slash.
pub fn entry_url(base_url: &str, node: &ContentNode) -> String {
    format!("{}/{}", base_url, node.slug.relative())
}

fn srcset_static_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*/static/").expect("srcset regex is valid"))
}

/// Make root-relative references absolute against `base_url`.
pub fn rewrite_links(html: &str, base_url: &str) -> String {
    let rewritten = html
        .replace(r#"href="/"#, &format!(r#"href="{base_url}/"#))
        .replace(r#"src="/"#, &format!(r#"src="{base_url}/"#))
        .replace(r#""/static/"#, &format!(r#""{base_url}/static/"#));
    srcset_static_regex()
        .replace_all(&rewritten, NoExpand(&format!(",{base_url}/static/")))
        .into_owned()
}

fn absolute_asset(config: &SiteConfig, path: &str) -> String {
    if path.starts_with('/') {
        config.absolute_url(path)
    } else {
        path.to_string()
    }
}

/// Author block and "posted to my blog" line appended to every entry.
pub fn footer_block(config: &SiteConfig, blog_url: &str, url: &str) -> String {
    let author = &config.author;
    html! {
        @if !author.name.is_empty() || !author.minibio.is_empty() {
            div {
                div style=(CONTENT_WRAPPER_STYLE) {
                    div style="display: flex;" {
                        @if !author.avatar.is_empty() {
                            div style="padding-right: 20px;" {
                                img src=(absolute_asset(config, &author.avatar)) alt=(author.name)
                                    style="max-width: 80px; border-radius: 50%;";
                            }
                        }
                        p {
                            @if author.minibio.is_empty() {
                                strong { (author.name) }
                            } @else {
                                (PreEscaped(author.minibio.trim()))
                            }
                        }
                    }
                }
            }
        }
        div style="margin-top: 55px; font-style: italic;" {
            "(This article was posted to my blog at "
            a href=(blog_url) { (blog_url) }
            ". You can "
            a href=(url) { "read it online by clicking here" }
            ".)"
        }
    }
    .into_string()
}

/// Project one node into a feed entry. Undated nodes yield `None`.
pub fn to_entry(config: &SiteConfig, blog_url: &str, node: &ContentNode) -> Option<FeedEntry> {
    let pub_date = node.date?;
    let url = entry_url(&config.url, node);
    let body = rewrite_links(&node.html, &config.url);
    let content_encoded = format!(
        r#"<div style="{CONTENT_WRAPPER_STYLE}">{body}{footer}</div>"#,
        footer = footer_block(config, blog_url, &url)
    );
    Some(FeedEntry {
        title: node.title.clone(),
        guid: url.clone(),
        url,
        pub_date,
        description: node.excerpt.clone(),
        content_encoded,
    })
}

/// Build a feed from the full node set.
pub fn build_feed(config: &SiteConfig, feed: &FeedConfig, nodes: &[ContentNode]) -> Feed {
    let blog_url = feed
        .blog_url
        .clone()
        .unwrap_or_else(|| config.absolute_url("blog"));
    let entries = select(nodes, feed)
        .into_iter()
        .filter_map(|node| to_entry(config, &blog_url, node))
        .collect();
    Feed {
        title: if feed.title.is_empty() {
            config.title.clone()
        } else {
            feed.title.clone()
        },
        link: config.absolute_url("/"),
        description: config.description.clone(),
        output: feed.output.clone(),
        self_url: config.absolute_url(&feed.output),
        entries,
    }
}

/// Filesystem path of a feed's output under `output_dir`.
pub fn output_path(output_dir: &Path, output: &str) -> Result<PathBuf, FeedError> {
    let relative = output.trim_start_matches('/');
    if relative.is_empty()
        || relative.ends_with('/')
        || relative.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(FeedError::InvalidOutput(output.to_string()));
    }
    Ok(output_dir.join(relative))
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// RFC 2822 date at midnight UTC.
pub fn rfc2822(date: NaiveDate) -> String {
    date.and_time(chrono::NaiveTime::default())
        .and_utc()
        .to_rfc2822()
}

/// Serialize a feed as RSS 2.0.
pub fn render_rss(feed: &Feed) -> String {
    let mut items = String::new();
    for entry in &feed.entries {
        items.push_str(&format!(
            "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid isPermaLink=\"false\">{}</guid>\n      <pubDate>{}</pubDate>\n      <description>{}</description>\n      <content:encoded>{}</content:encoded>\n    </item>\n",
            escape_xml(&entry.title),
            escape_xml(&entry.url),
            escape_xml(&entry.guid),
            rfc2822(entry.pub_date),
            escape_xml(&entry.description),
            cdata(&entry.content_encoded),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <generator>simple-blog</generator>
{}  </channel>
</rss>
"#,
        escape_xml(&feed.title),
        escape_xml(&feed.link),
        escape_xml(&feed.description),
        escape_xml(&feed.self_url),
        items
    )
}
