//! Auxiliary site files: `sitemap.xml`, `manifest.webmanifest`, `robots.txt`.

use crate::config::{DeployContext, SiteConfig};
use crate::feed::escape_xml;
use crate::types::Slug;
use serde::Serialize;

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const MANIFEST_FILE: &str = "manifest.webmanifest";
pub const ROBOTS_FILE: &str = "robots.txt";

/// Sitemap over every generated page, sorted by URL.
pub fn render_sitemap(config: &SiteConfig, pages: &[Slug]) -> String {
    let mut locs: Vec<String> = pages
        .iter()
        .map(|slug| config.absolute_url(&slug.href()))
        .collect();
    locs.sort();
    locs.dedup();

    let urls: String = locs
        .iter()
        .map(|loc| format!("  <url><loc>{}</loc></url>\n", escape_xml(loc)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{urls}</urlset>
"#
    )
}

#[derive(Debug, Serialize)]
struct WebManifest<'a> {
    name: &'a str,
    short_name: &'a str,
    description: &'a str,
    start_url: String,
    background_color: &'a str,
    theme_color: &'a str,
    display: &'static str,
    icons: Vec<ManifestIcon>,
}

#[derive(Debug, Serialize)]
struct ManifestIcon {
    src: String,
    sizes: &'static str,
    #[serde(rename = "type")]
    mime: &'static str,
}

/// Web app manifest as pretty-printed JSON.
pub fn render_manifest(config: &SiteConfig) -> Result<String, serde_json::Error> {
    let start_url = if config.path_prefix.is_empty() {
        "/".to_string()
    } else {
        config.path_prefix.clone()
    };
    let icons = if config.logo.is_empty() {
        Vec::new()
    } else {
        vec![ManifestIcon {
            src: config.href(&config.logo),
            sizes: "512x512",
            mime: "image/png",
        }]
    };
    let manifest = WebManifest {
        name: &config.title,
        short_name: &config.title_short,
        description: &config.description,
        start_url,
        background_color: &config.colors.background,
        theme_color: &config.colors.theme,
        display: "standalone",
        icons,
    };
    serde_json::to_string_pretty(&manifest)
}

/// `robots.txt` for the deployment context.
///
/// Production allows everything and names the sitemap; previews disallow all
/// crawling and omit it.
pub fn render_robots(config: &SiteConfig, context: DeployContext) -> String {
    match context {
        DeployContext::Production => format!(
            "User-agent: *\nAllow: /\n\nSitemap: {}\n",
            config.absolute_url(SITEMAP_FILE)
        ),
        DeployContext::Preview => "User-agent: *\nDisallow: /\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::slug_from_override;

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Duncan Leung".to_string(),
            title_short: "duncanleung".to_string(),
            url: "https://duncanleung.com".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn sitemap_lists_absolute_urls() {
        let pages = vec![
            slug_from_override("blog/hello").unwrap(),
            Slug::root(),
            slug_from_override("me").unwrap(),
        ];
        let xml = render_sitemap(&config(), &pages);
        assert!(xml.contains("<loc>https://duncanleung.com/</loc>"));
        assert!(xml.contains("<loc>https://duncanleung.com/blog/hello/</loc>"));
        let root = xml.find("duncanleung.com/</loc>").unwrap();
        let me = xml.find("duncanleung.com/me/</loc>").unwrap();
        assert!(root < me);
    }

    #[test]
    fn sitemap_honours_path_prefix() {
        let config = SiteConfig {
            path_prefix: "/site".to_string(),
            ..config()
        };
        let xml = render_sitemap(&config, &[slug_from_override("me").unwrap()]);
        assert!(xml.contains("<loc>https://duncanleung.com/site/me/</loc>"));
    }

    #[test]
    fn manifest_fields() {
        let json = render_manifest(&config()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Duncan Leung");
        assert_eq!(value["short_name"], "duncanleung");
        assert_eq!(value["start_url"], "/");
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["theme_color"], "#4147dc");
        assert_eq!(value["icons"][0]["type"], "image/png");
    }

    #[test]
    fn manifest_start_url_uses_prefix() {
        let config = SiteConfig {
            path_prefix: "/blog".to_string(),
            ..config()
        };
        let value: serde_json::Value =
            serde_json::from_str(&render_manifest(&config).unwrap()).unwrap();
        assert_eq!(value["start_url"], "/blog");
    }

    #[test]
    fn robots_per_context() {
        let config = config();
        let production = render_robots(&config, DeployContext::Production);
        assert!(production.contains("Allow: /"));
        assert!(production.contains("Sitemap: https://duncanleung.com/sitemap.xml"));

        let preview = render_robots(&config, DeployContext::Preview);
        assert!(preview.contains("Disallow: /"));
        assert!(!preview.contains("Sitemap"));
    }
}
