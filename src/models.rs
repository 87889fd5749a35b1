//! Data models for feed articles and the posts built from them.
//!
//! - [`FeedResponse`] / [`Article`]: the feed payload as received
//! - [`LocalImageRef`]: a cover image cached under the site's images directory
//! - [`PostDocument`] / [`FrontMatter`] / [`Section`]: one daily post

use serde::{Deserialize, Deserializer, Serialize};

/// The feed payload. Only the `data` field is read; anything else is ignored.
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    pub data: Vec<Article>,
}

/// One ranked news item.
///
/// Articles have no identity beyond their position in the feed response;
/// that index is what image filenames are derived from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Headline as published by the feed.
    pub title: String,
    /// Remote thumbnail URL. Missing, `null` and `""` all mean "no cover".
    #[serde(default, deserialize_with = "non_empty")]
    pub cover: Option<String>,
    /// Link to the full article.
    pub link: String,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// A cover image that has been downloaded for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImageRef {
    pub source_url: String,
    /// Site-relative path, e.g. `/images/2024-05-01-img0.png`.
    pub relative_path: String,
}

/// YAML front matter of a daily post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

/// One article rendered into the post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub image_path: Option<String>,
    pub link: String,
}

/// A daily post, keyed by its `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDocument {
    pub date_key: String,
    pub front_matter: FrontMatter,
    pub sections: Vec<Section>,
}

/// `{date_key}-daily-news.md`
pub fn post_filename(date_key: &str) -> String {
    format!("{date_key}-daily-news.md")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_response_parses_optional_cover() {
        let body = r#"{
            "code": 200,
            "data": [
                {"title": "A", "cover": "http://x/y.png?q=1", "link": "http://x/a"},
                {"title": "B", "link": "http://x/b"},
                {"title": "C", "cover": "", "link": "http://x/c"},
                {"title": "D", "cover": null, "link": "http://x/d", "hot_value": 12}
            ]
        }"#;
        let feed: FeedResponse = serde_json::from_str(body).unwrap();
        let covers: Vec<_> = feed.data.iter().map(|a| a.cover.as_deref()).collect();
        assert_eq!(covers, vec![Some("http://x/y.png?q=1"), None, None, None]);
        assert_eq!(feed.data[1].title, "B");
    }

    #[test]
    fn test_feed_response_requires_data() {
        let body = r#"{"code": 500, "message": "oops"}"#;
        assert!(serde_json::from_str::<FeedResponse>(body).is_err());
    }

    #[test]
    fn test_post_filename() {
        assert_eq!(post_filename("2024-05-01"), "2024-05-01-daily-news.md");
    }
}
