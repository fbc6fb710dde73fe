//! Markdown rendering and plain-text derivations.
//!
//! Bodies are rendered with pulldown-cmark (tables, footnotes, strikethrough
//! and task lists enabled). MDX files are treated as markdown after their
//! top-level `import`/`export` lines are removed; embedded JSX is passed
//! through as raw HTML and never executed.

use pulldown_cmark::{Event, Options, Parser, TagEnd, html as md_html};

/// Excerpt length in characters, before the ellipsis.
pub const EXCERPT_LENGTH: usize = 250;

/// Words per minute for read-time estimates.
pub const WORDS_PER_MINUTE: usize = 265;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render a markdown body to HTML.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Extract the readable text of a markdown body, whitespace-collapsed.
///
/// Raw HTML and images' URLs are dropped; code spans are kept.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate plain text to at most `max` characters at a word boundary.
///
/// Truncated text ends with `…`. Text that fits is returned unchanged.
pub fn prune(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let at_boundary = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", at_boundary.trim_end())
}

/// Summary used in listings and feed descriptions.
/// Takes the output of [`plain_text`].
pub fn excerpt(plain: &str) -> String {
    prune(plain, EXCERPT_LENGTH)
}

/// Estimated minutes to read, rounded, never below one.
pub fn read_time(plain: &str) -> u32 {
    let words = plain.split_whitespace().count();
    let minutes = (words + WORDS_PER_MINUTE / 2) / WORDS_PER_MINUTE;
    minutes.max(1) as u32
}

/// Remove MDX module statements (`import …`, `export …`) outside code fences.
///
/// A statement whose brackets are still open at the end of its first line
/// (`export const meta = {`) runs until they close. Brackets inside string
/// literals are counted too.
pub fn strip_mdx_module_lines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut fence: Option<&str> = None;
    let mut open_brackets = 0i32;
    for line in source.lines() {
        if open_brackets > 0 {
            open_brackets += bracket_balance(line);
            continue;
        }
        let trimmed = line.trim_start();
        match fence {
            Some(marker) => {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
            }
            None => {
                if trimmed.starts_with("```") {
                    fence = Some("```");
                } else if trimmed.starts_with("~~~") {
                    fence = Some("~~~");
                } else if line.starts_with("import ") || line.starts_with("export ") {
                    open_brackets = bracket_balance(line).max(0);
                    continue;
                }
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn bracket_balance(line: &str) -> i32 {
    line.chars()
        .map(|c| match c {
            '{' | '(' | '[' => 1,
            '}' | ')' | ']' => -1,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let html = render_html("Hi **there** and *you*.");
        assert!(html.contains("<strong>there</strong>"));
        assert!(html.contains("<em>you</em>"));
    }

    #[test]
    fn renders_tables() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render_html("<p>Hi <a href=\"/x\">link</a></p>\n");
        assert!(html.contains(r#"<a href="/x">link</a>"#));
    }

    #[test]
    fn plain_text_strips_markup() {
        let text = plain_text("# Title\n\nSome **bold** `code` and [a link](/x).\n\n- one\n- two\n");
        assert_eq!(text, "Title Some bold code and a link. one two");
    }

    #[test]
    fn prune_keeps_short_text() {
        assert_eq!(prune("short text", 250), "short text");
    }

    #[test]
    fn prune_cuts_at_word_boundary() {
        assert_eq!(prune("alpha beta gamma delta", 13), "alpha beta…");
    }

    #[test]
    fn prune_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(prune(&text, 10), text);
        assert_eq!(prune(&text, 4), format!("{}…", "é".repeat(4)));
    }

    #[test]
    fn excerpt_is_bounded() {
        let body = "word ".repeat(200);
        let excerpt = excerpt(&plain_text(&body));
        assert!(excerpt.chars().count() <= EXCERPT_LENGTH + 1);
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn read_time_minimum_one() {
        assert_eq!(read_time(""), 1);
        assert_eq!(read_time("a few words"), 1);
    }

    #[test]
    fn read_time_rounds() {
        assert_eq!(read_time(&"w ".repeat(530)), 2);
        assert_eq!(read_time(&"w ".repeat(660)), 2);
        assert_eq!(read_time(&"w ".repeat(700)), 3);
    }

    #[test]
    fn strips_mdx_imports_outside_fences() {
        let src = "import Foo from './foo'\n\n# Title\n\n```js\nimport x from 'y'\n```\nexport const meta = {}\n";
        let out = strip_mdx_module_lines(src);
        assert!(!out.contains("import Foo"));
        assert!(out.contains("import x from 'y'"));
        assert!(!out.contains("export const"));
        assert!(out.contains("# Title"));
    }

    #[test]
    fn strips_multi_line_mdx_statements() {
        let src = "import {\n  Note,\n  Aside,\n} from '../components'\nexport const meta = {\n  title: \"Hooks\",\n  tags: [\"react\"],\n}\n\n# Title\n\n<Note>Body</Note>\n";
        let out = strip_mdx_module_lines(src);
        assert_eq!(out, "\n# Title\n\n<Note>Body</Note>\n");
    }
}
