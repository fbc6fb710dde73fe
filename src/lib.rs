//! # Simple Blog
//!
//! A static site generator for a personal blog. A directory of markdown and
//! MDX files with YAML front-matter becomes a static HTML site plus one or
//! more RSS feeds.
//!
//! # Architecture: One-Way Pipeline
//!
//! ```text
//! config.toml  →  SiteConfig          (load, merge defaults, normalize, validate)
//! content/     →  ContentNodes        (front-matter + markdown, per-document errors)
//! nodes        →  dist/**/index.html  (template per node + listing pages)
//! nodes        →  rss.xml             (filtered, sorted, links rewritten)
//! pages        →  sitemap, manifest, robots.txt
//! ```
//!
//! Configuration is resolved exactly once and passed by reference; there is
//! no global state. A bad configuration aborts before any output is written.
//! A bad document is skipped and reported, and the build carries on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, merging over stock defaults, normalization, URL checks, color CSS |
//! | [`content`] | Walks the content directory and parses front-matter into [`types::ContentNode`]s |
//! | [`markdown`] | Markdown → HTML, plain text, excerpts, read time, MDX module stripping |
//! | [`naming`] | Slug derivation from paths and front-matter overrides |
//! | [`types`] | [`types::Slug`] and [`types::ContentNode`], shared by every stage |
//! | [`templates`] | Template registry (`post`, `page`) and listing pages |
//! | [`components`] | Stateless HTML components composed by templates (Maud) |
//! | [`feed`] | Feed selection, link rewriting, RSS 2.0 serialization |
//! | [`site_files`] | `sitemap.xml`, `manifest.webmanifest`, `robots.txt` |
//! | [`pipeline`] | Runs the build and reports what was written and skipped |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error, interpolation is
//! escaped by default, and there is no template directory to ship.
//!
//! ## Literal Feed Link Rewriting
//!
//! Feed bodies get their root-relative links made absolute by plain string
//! substitution (see [`feed`]). It is predictable and fast, and its limits
//! are documented rather than hidden behind an HTML parser.
//!
//! ## Deterministic Output
//!
//! Documents are parsed in parallel but merged in source-path order, sorting
//! is stable, and nothing time-dependent (build timestamps) is written, so
//! the same input always produces byte-identical output.

pub mod components;
pub mod config;
pub mod content;
pub mod feed;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod site_files;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
