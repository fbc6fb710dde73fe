//! Site configuration module.
//!
//! Handles loading, validating, and normalizing `config.toml`. The config file
//! lives in the content root and is read exactly once at the start of a build.
//! Stock defaults are the base layer; the user file overrides only the keys it
//! sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "My Blog"
//! title_short = "blog"
//! title_alt = "My Blog"
//! description = ""
//! url = "https://example.com"     # Production base URL (no trailing slash)
//! # preview_url = "https://deploy-preview.example.com"
//! path_prefix = ""                # Site served under a sub-path, e.g. "/blog"
//! language = "en"
//! logo = "/logos/logo-1024.png"
//! rss = "/rss.xml"
//! date_format = "%B %-d, %Y"      # chrono format for displayed dates
//! default_category = "Tech"
//! # repo = "https://github.com/you/site"   # enables "Edit on GitHub" links
//! # max_content_errors = 0                 # fail the build above this many
//!
//! [author]
//! name = ""
//! minibio = ""                    # HTML allowed
//! avatar = ""
//!
//! [social]
//! # twitter = "@handle"
//! # github = "https://github.com/you"
//!
//! [[menu]]
//! name = "Blog"
//! link = "/blog/"
//!
//! [colors]
//! theme = "#4147dc"               # Manifest theme color
//! background = "#ffffff"          # Manifest background color
//!
//! [[feeds]]
//! title = "My Blog RSS Feed"
//! output = "/rss.xml"
//! path_filter = "/blog/"
//! limit = 1000
//!
//! [processing]
//! max_processes = 4               # Max parallel readers (omit for auto)
//! ```
//!
//! ## Normalization
//!
//! After loading, [`SiteConfig::normalize`] canonicalizes the URL-ish fields:
//!
//! - `path_prefix = "/"` becomes `""`; anything else non-empty gets exactly one
//!   leading slash and no trailing slash (`"blog/"` → `"/blog"`).
//! - `url` loses any trailing slash.
//! - `rss` and every feed `output` gain a leading slash if missing.
//!
//! Normalization is idempotent. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid site url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid path_prefix {0:?}")]
    InvalidPathPrefix(String),
}

/// Deployment target. Selects which base URL the build publishes under.
///
/// Also accepts the values Netlify puts in `CONTEXT`: `deploy-preview` and
/// `branch-deploy` both build as [`DeployContext::Preview`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DeployContext {
    #[default]
    Production,
    #[value(alias = "deploy-preview", alias = "branch-deploy")]
    Preview,
}

/// Site configuration loaded from `config.toml`.
///
/// Constructed once per build and passed by reference to every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, used in `<title>`, the header brand and feed channels.
    pub title: String,
    /// Short name for the web app manifest.
    pub title_short: String,
    /// Alternative title used on the home page.
    pub title_alt: String,
    /// Site description for meta tags, the manifest and feed channels.
    pub description: String,
    /// Production base URL.
    pub url: String,
    /// Base URL used when building for the preview context.
    pub preview_url: Option<String>,
    /// Sub-path the site is served from, empty for the domain root.
    pub path_prefix: String,
    /// Language tag for `<html lang>`.
    pub language: String,
    /// Site logo, used by the manifest.
    pub logo: String,
    /// Path of the main feed.
    pub rss: String,
    /// Source repository; enables "Edit on GitHub" links when set.
    pub repo: Option<String>,
    /// chrono format string for displayed dates.
    pub date_format: String,
    /// Category shown for posts that declare none.
    pub default_category: String,
    /// Build fails when more documents than this are skipped. `None` never fails.
    pub max_content_errors: Option<usize>,
    pub author: AuthorConfig,
    pub social: SocialConfig,
    pub menu: Vec<MenuLink>,
    pub colors: ColorConfig,
    /// Feed definitions. Empty means one feed at `rss` over `/blog/`.
    pub feeds: Vec<FeedConfig>,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            title_short: "blog".to_string(),
            title_alt: "My Blog".to_string(),
            description: String::new(),
            url: "https://example.com".to_string(),
            preview_url: None,
            path_prefix: String::new(),
            language: "en".to_string(),
            logo: "/logos/logo-1024.png".to_string(),
            rss: "/rss.xml".to_string(),
            repo: None,
            date_format: "%B %-d, %Y".to_string(),
            default_category: "Tech".to_string(),
            max_content_errors: None,
            author: AuthorConfig::default(),
            social: SocialConfig::default(),
            menu: vec![MenuLink {
                name: "Blog".to_string(),
                link: "/blog/".to_string(),
            }],
            colors: ColorConfig::default(),
            feeds: Vec::new(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values that don't depend on normalization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Validation("title must not be empty".into()));
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::Validation(
                "date_format must not be empty".into(),
            ));
        }
        if chrono::format::StrftimeItems::new(&self.date_format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(ConfigError::Validation(format!(
                "date_format {:?} is not a valid strftime pattern",
                self.date_format
            )));
        }
        for feed in &self.feeds {
            if feed.limit == 0 {
                return Err(ConfigError::Validation(format!(
                    "feeds.limit must be positive (feed {})",
                    feed.output
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Swap in the base URL for the given deployment context.
    ///
    /// Preview falls back to the production URL when `preview_url` is unset.
    pub fn for_context(mut self, context: DeployContext) -> Self {
        if context == DeployContext::Preview
            && let Some(preview) = self.preview_url.take()
        {
            self.url = preview;
        }
        self
    }

    /// Canonicalize URL and path fields. Idempotent.
    pub fn normalize(mut self) -> Self {
        self.path_prefix = normalize_path_prefix(&self.path_prefix);
        self.url = normalize_site_url(&self.url);
        self.rss = normalize_rss_path(&self.rss);
        for feed in &mut self.feeds {
            feed.output = normalize_rss_path(&feed.output);
            if let Some(blog_url) = feed.blog_url.as_mut() {
                *blog_url = normalize_site_url(blog_url);
            }
        }
        self
    }

    /// Check the normalized base URL and path prefix.
    ///
    /// Both are fatal: nothing useful can be published without them.
    pub fn validate_urls(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: reason.to_string(),
        };
        let parsed = url::Url::parse(&self.url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("must not carry a query or fragment"));
        }

        let prefix = &self.path_prefix;
        if prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '\\'))
            || prefix.split('/').any(|seg| seg == "..")
        {
            return Err(ConfigError::InvalidPathPrefix(prefix.clone()));
        }
        Ok(())
    }

    /// The feeds to generate, falling back to the single default feed.
    pub fn effective_feeds(&self) -> Vec<FeedConfig> {
        if !self.feeds.is_empty() {
            return self.feeds.clone();
        }
        vec![FeedConfig {
            title: format!("{} RSS Feed", self.title),
            output: self.rss.clone(),
            path_filter: "/blog/".to_string(),
            blog_url: None,
            limit: DEFAULT_FEED_LIMIT,
        }]
    }

    /// Absolute URL for a site-relative path, honouring `path_prefix`.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.url,
            self.path_prefix,
            path.trim_start_matches('/')
        )
    }

    /// Site-relative href for an internal path, honouring `path_prefix`.
    pub fn href(&self, path: &str) -> String {
        format!("{}/{}", self.path_prefix, path.trim_start_matches('/'))
    }
}

/// `"/"` → `""`; otherwise exactly one leading slash and no trailing slash.
pub fn normalize_path_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Strip trailing slashes from a base URL.
pub fn normalize_site_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Ensure a feed path starts with `/`.
pub fn normalize_rss_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Author identity shown in the bio block and the feed footer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: String,
    /// Short HTML biography. Trusted; inserted unescaped.
    pub minibio: String,
    /// Avatar image URL.
    pub avatar: String,
}

/// Social handles and profile links. Each is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialConfig {
    /// Twitter handle, with or without the leading `@`.
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub newsletter: Option<String>,
    pub email: Option<String>,
}

impl SocialConfig {
    /// Twitter handle without the `@`.
    pub fn twitter_handle(&self) -> Option<&str> {
        self.twitter
            .as_deref()
            .map(|h| h.trim_start_matches('@'))
            .filter(|h| !h.is_empty())
    }
}

/// Header navigation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuLink {
    pub name: String,
    pub link: String,
}

pub const DEFAULT_FEED_LIMIT: usize = 1000;

/// One syndication feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Channel title. Empty falls back to the site title.
    pub title: String,
    /// Output path of the feed document, e.g. `/blog/rss.xml`.
    pub output: String,
    /// Only documents whose source path contains this substring are included.
    pub path_filter: String,
    /// URL named in the entry footer. Defaults to `{url}/blog`.
    pub blog_url: Option<String>,
    /// Maximum number of entries.
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            output: "/rss.xml".to_string(),
            path_filter: String::new(),
            blog_url: None,
            limit: DEFAULT_FEED_LIMIT,
        }
    }
}

/// Parallel reading settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel document readers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Color configuration: manifest colors plus light/dark palettes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Manifest and browser chrome theme color.
    pub theme: String,
    /// Manifest splash background color.
    pub background: String,
    pub light: Palette,
    pub dark: Palette,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            theme: "#4147dc".to_string(),
            background: "#ffffff".to_string(),
            light: Palette::default_light(),
            dark: Palette::default_dark(),
        }
    }
}

/// Page palette for one color scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub background: String,
    pub text: String,
    /// Dates, tags, footer text.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    /// Buttons, hero background, active nav item.
    pub accent: String,
}

impl Palette {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1b1b1b".to_string(),
            text_muted: "#5f6368".to_string(),
            border: "#e6e6e6".to_string(),
            link: "#4147dc".to_string(),
            accent: "#231c42".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1a1a1d".to_string(),
            text: "#e8e8e8".to_string(),
            text_muted: "#9aa0a6".to_string(),
            border: "#333333".to_string(),
            link: "#8f94ff".to_string(),
            accent: "#0f0c1d".to_string(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value (arrays included)
/// replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the raw (unnormalized) config from the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Load, select the deploy context, normalize and check URLs.
///
/// This is the single configuration boundary of a build: everything
/// downstream receives the returned value by reference.
pub fn load_site_config(root: &Path, context: DeployContext) -> Result<SiteConfig, ConfigError> {
    let config = load_config(root)?.for_context(context).normalize();
    config.validate_urls()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# All settings are optional. Values shown below are the defaults.
# Place this file at the root of the content directory.
# Unknown keys will cause an error.

# Site title (header brand, <title>, feed channel title)
title = "My Blog"
# Short name for the web app manifest
title_short = "blog"
# Alternative title used on the home page
title_alt = "My Blog"
description = ""

# Production base URL. Trailing slashes are stripped.
url = "https://example.com"
# Base URL for `--context preview` builds (also `deploy-preview` and
# `branch-deploy`). Falls back to `url`.
# preview_url = "https://deploy-preview.example.com"

# Serve the site under a sub-path. "/" and "" both mean the domain root.
path_prefix = ""

language = "en"
logo = "/logos/logo-1024.png"

# Path of the main feed. A leading slash is added if missing.
rss = "/rss.xml"

# Source repository; enables "Edit on GitHub" links on posts.
# repo = "https://github.com/you/site"

# chrono format string for displayed dates.
date_format = "%B %-d, %Y"

# Category shown for posts that declare none.
default_category = "Tech"

# Fail the build when more than this many documents are skipped.
# Omit to only warn.
# max_content_errors = 0

# ---------------------------------------------------------------------------
# Author (bio block and feed footer)
# ---------------------------------------------------------------------------
[author]
name = ""
# Short HTML biography.
minibio = ""
avatar = ""

# ---------------------------------------------------------------------------
# Social links (all optional)
# ---------------------------------------------------------------------------
[social]
# twitter = "@handle"
# github = "https://github.com/you"
# linkedin = "https://www.linkedin.com/in/you"
# newsletter = "https://you.substack.com"
# email = "you@example.com"

# ---------------------------------------------------------------------------
# Header navigation
# ---------------------------------------------------------------------------
[[menu]]
name = "Blog"
link = "/blog/"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
# Manifest theme color and splash background.
theme = "#4147dc"
background = "#ffffff"

[colors.light]
background = "#ffffff"
text = "#1b1b1b"
text_muted = "#5f6368"
border = "#e6e6e6"
link = "#4147dc"
accent = "#231c42"

[colors.dark]
background = "#1a1a1d"
text = "#e8e8e8"
text_muted = "#9aa0a6"
border = "#333333"
link = "#8f94ff"
accent = "#0f0c1d"

# ---------------------------------------------------------------------------
# Feeds. Without any [[feeds]] entry a single feed is written to `rss`,
# covering documents under /blog/.
# ---------------------------------------------------------------------------
# [[feeds]]
# title = "My Blog RSS Feed"
# output = "/blog/rss.xml"
# path_filter = "/blog/"
# blog_url = "https://example.com/blog"
# limit = 1000

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel document readers.
# Omit to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    fn vars(p: &Palette, indent: &str) -> String {
        [
            ("bg", &p.background),
            ("text", &p.text),
            ("text-muted", &p.text_muted),
            ("border", &p.border),
            ("link", &p.link),
            ("accent", &p.accent),
        ]
        .iter()
        .map(|(name, value)| format!("{indent}--color-{name}: {value};"))
        .collect::<Vec<_>>()
        .join("\n")
    }

    format!(
        ":root {{\n{light}\n    --color-theme: {theme};\n}}\n\n\
         @media (prefers-color-scheme: dark) {{\n    :root {{\n{dark}\n    }}\n}}",
        light = vars(&colors.light, "    "),
        theme = colors.theme,
        dark = vars(&colors.dark, "        "),
    )
}
