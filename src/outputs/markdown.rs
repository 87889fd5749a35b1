//! Markdown rendering of the daily post.
//!
//! A post is YAML front matter followed by one section per article, in feed
//! order:
//!
//! ```text
//! ---
//! title: "每日早报"
//! date: 2024-05-01T00:00:00+08:00
//! tags:
//!   - "每日新闻"
//! categories:
//!   - "新闻"
//! ---
//!
//! ### Headline
//!
//! ![封面图](/images/2024-05-01-img0.png)
//!
//! [阅读全文](https://example.com/a)
//! ```
//!
//! The image line is left out entirely for articles without a cached cover.
//! Rendering is a pure function of its inputs, so the same run date and feed
//! always produce the same bytes.

use crate::models::{Article, FrontMatter, PostDocument, Section};
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use std::fmt::Write;

pub const POST_TITLE: &str = "每日早报";
pub const POST_TAG: &str = "每日新闻";
pub const POST_CATEGORY: &str = "新闻";
const IMAGE_ALT: &str = "封面图";
const READ_MORE: &str = "阅读全文";

impl FrontMatter {
    /// Front matter of the daily brief published at `published_at`.
    pub fn daily_brief(published_at: &DateTime<FixedOffset>) -> Self {
        FrontMatter {
            title: POST_TITLE.to_string(),
            date: published_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            tags: vec![POST_TAG.to_string()],
            categories: vec![POST_CATEGORY.to_string()],
        }
    }
}

/// Build the post for `run_date`.
///
/// `image_paths[i]` is the cached cover of `articles[i]`, if any. A shorter
/// `image_paths` is treated as "no image" for the remaining articles.
pub fn build_post(
    run_date: NaiveDate,
    published_at: &DateTime<FixedOffset>,
    articles: &[Article],
    image_paths: &[Option<String>],
) -> PostDocument {
    let sections = articles
        .iter()
        .enumerate()
        .map(|(i, article)| Section {
            title: single_line(&article.title),
            image_path: image_paths.get(i).cloned().flatten(),
            link: article.link.trim().to_string(),
        })
        .collect();

    PostDocument {
        date_key: run_date.format("%Y-%m-%d").to_string(),
        front_matter: FrontMatter::daily_brief(published_at),
        sections,
    }
}

/// Render a post document to its on-disk text.
pub fn render(post: &PostDocument) -> String {
    let mut md = String::new();
    write_front_matter(&mut md, &post.front_matter);

    let sections: Vec<String> = post.sections.iter().map(render_section).collect();
    md.push('\n');
    md.push_str(&sections.join("\n"));
    md
}

/// Compose the full post text for `run_date`.
pub fn compose(
    run_date: NaiveDate,
    published_at: &DateTime<FixedOffset>,
    articles: &[Article],
    image_paths: &[Option<String>],
) -> String {
    render(&build_post(run_date, published_at, articles, image_paths))
}

fn write_front_matter(md: &mut String, fm: &FrontMatter) {
    md.push_str("---\n");
    writeln!(md, "title: {}", yaml_quote(&fm.title)).unwrap();
    writeln!(md, "date: {}", fm.date).unwrap();
    md.push_str("tags:\n");
    for tag in &fm.tags {
        writeln!(md, "  - {}", yaml_quote(tag)).unwrap();
    }
    md.push_str("categories:\n");
    for category in &fm.categories {
        writeln!(md, "  - {}", yaml_quote(category)).unwrap();
    }
    md.push_str("---\n");
}

fn render_section(section: &Section) -> String {
    let mut md = String::new();
    writeln!(md, "### {}\n", section.title).unwrap();
    if let Some(path) = &section.image_path {
        writeln!(md, "![{IMAGE_ALT}]({path})\n").unwrap();
    }
    writeln!(md, "[{READ_MORE}]({})", section.link).unwrap();
    md
}

/// Double-quoted YAML scalar.
fn yaml_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => write!(out, "\\u{:04x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Headings must stay on one line.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn published_at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T00:00:00+08:00").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn article(title: &str, cover: Option<&str>, link: &str) -> Article {
        Article {
            title: title.into(),
            cover: cover.map(Into::into),
            link: link.into(),
        }
    }

    fn front_matter_of(doc: &str) -> FrontMatter {
        let body = doc.strip_prefix("---\n").unwrap();
        let end = body.find("\n---\n").unwrap();
        serde_yaml::from_str(&body[..end]).unwrap()
    }

    #[test]
    fn test_compose_example_post() {
        let articles = vec![
            article("A", Some("http://x/y.png?q=1"), "http://x/a"),
            article("B", None, "http://x/b"),
        ];
        let images = vec![Some("/images/2024-05-01-img0.png".to_string()), None];

        let doc = compose(date(), &published_at(), &articles, &images);

        let expected = "---
title: \"每日早报\"
date: 2024-05-01T00:00:00+08:00
tags:
  - \"每日新闻\"
categories:
  - \"新闻\"
---

### A

![封面图](/images/2024-05-01-img0.png)

[阅读全文](http://x/a)

### B

[阅读全文](http://x/b)
";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_compose_keeps_every_article_in_order() {
        let articles: Vec<Article> = (0..7)
            .map(|i| article(&format!("title {i}"), None, &format!("http://x/{i}")))
            .collect();

        let doc = compose(date(), &published_at(), &articles, &[]);

        let headings: Vec<&str> = doc.lines().filter(|l| l.starts_with("### ")).collect();
        let expected: Vec<String> = (0..7).map(|i| format!("### title {i}")).collect();
        assert_eq!(headings, expected);
        assert_eq!(doc.matches("[阅读全文]").count(), 7);
        assert!(!doc.contains("![封面图]"));
    }

    #[test]
    fn test_front_matter_is_valid_yaml() {
        let doc = compose(date(), &published_at(), &[], &[]);
        let fm = front_matter_of(&doc);
        assert_eq!(fm, FrontMatter::daily_brief(&published_at()));
        assert_eq!(fm.tags, vec!["每日新闻"]);
        assert_eq!(fm.categories, vec!["新闻"]);
    }

    #[test]
    fn test_build_post_uses_date_key_and_sections() {
        let articles = vec![article("  Multi\nline   title ", None, " http://x/a ")];
        let post = build_post(date(), &published_at(), &articles, &[None]);

        assert_eq!(post.date_key, "2024-05-01");
        assert_eq!(crate::models::post_filename(&post.date_key), "2024-05-01-daily-news.md");
        assert_eq!(
            post.sections,
            vec![Section {
                title: "Multi line title".into(),
                image_path: None,
                link: "http://x/a".into(),
            }]
        );
    }

    #[test]
    fn test_yaml_quote_escapes() {
        assert_eq!(yaml_quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        let parsed: String = serde_yaml::from_str(&yaml_quote("line\nbreak\t\"q\"")).unwrap();
        assert_eq!(parsed, "line\nbreak\t\"q\"");
    }
}
