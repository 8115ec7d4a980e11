//! Wire types for the fan-site REST API.
//!
//! These mirror the JSON the server returns for `/songs` and `/news`.  The
//! deserializers are deliberately lenient about optional fields and
//! timestamps: the server stores rows written by several tools over time and
//! a single odd row must not make the whole list unreadable.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Fallback colour for news categories without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#8b5cf6";
/// Fallback icon for news categories without one.
pub const DEFAULT_CATEGORY_ICON: &str = "📰";

/// Song classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SongCategory {
    #[default]
    Original,
    Cover,
}

impl SongCategory {
    /// Form/query value sent to the server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Cover => "cover",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "Originals",
            Self::Cover => "Covers",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Original => Self::Cover,
            Self::Cover => Self::Original,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "original" => Some(Self::Original),
            "cover" => Some(Self::Cover),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub audio_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` when the server has no category or one we do not know.
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<SongCategory>,
}

impl Song {
    pub fn has_cover(&self) -> bool {
        self.cover_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<SongCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SongCategory::parse))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub category: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "required_timestamp")]
    pub published_date: DateTime<Utc>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Length used for card summaries when a post has no excerpt.
pub const EXCERPT_CHARS: usize = 150;

impl NewsPost {
    /// The excerpt if set, otherwise the content cut to [`EXCERPT_CHARS`].
    pub fn summary(&self) -> String {
        match self.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(excerpt) => excerpt.to_string(),
            None => truncate_text(&self.content, EXCERPT_CHARS),
        }
    }

    /// e.g. `January 5, 2024, 03:04 PM`
    pub fn display_date(&self) -> String {
        self.published_date.format("%B %-d, %Y, %I:%M %p").to_string()
    }

    /// Tags shown on list cards.
    pub fn card_tags(&self) -> &[String] {
        &self.tags[..self.tags.len().min(3)]
    }
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewsCategory {
    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_CATEGORY_COLOR)
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_CATEGORY_ICON)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsTag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Parse a server timestamp.  Accepts RFC 3339 and the offset-less ISO form
/// servers emit for naive datetimes (treated as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn required_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn nullable_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_unknown_category_is_none() {
        let json = r#"[
            {"id":"1","title":"Usseewa","audio_url":"http://x/1.mp3","category":"original"},
            {"id":"2","title":"Odo","audio_url":"http://x/2.mp3","category":"remix"},
            {"id":"3","title":"Show","audio_url":"http://x/3.mp3","category":null,"cover_url":"http://x/3.png"}
        ]"#;
        let songs: Vec<Song> = serde_json::from_str(json).unwrap();
        assert_eq!(songs[0].category, Some(SongCategory::Original));
        assert_eq!(songs[1].category, None);
        assert_eq!(songs[2].category, None);
        assert!(songs[2].has_cover());
        assert!(!songs[0].has_cover());
    }

    #[test]
    fn test_news_post_naive_timestamp_and_null_tags() {
        let json = r#"{
            "id":"n1","title":"Tour","content":"Dates announced","category":"Tour",
            "published_date":"2024-03-01T18:30:00","is_featured":true,"tags":null
        }"#;
        let post: NewsPost = serde_json::from_str(json).unwrap();
        assert!(post.tags.is_empty());
        assert!(post.is_featured);
        assert_eq!(post.display_date(), "March 1, 2024, 06:30 PM");
    }

    #[test]
    fn test_summary_prefers_excerpt() {
        let long = "a".repeat(200);
        let mut post: NewsPost = serde_json::from_value(serde_json::json!({
            "id": "n", "title": "t", "content": long, "category": "c",
            "published_date": "2024-01-01T00:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(post.summary().chars().count(), EXCERPT_CHARS + 3);
        assert!(post.summary().ends_with("..."));

        post.excerpt = Some("short".to_string());
        assert_eq!(post.summary(), "short");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("うっせぇわ", 3), "うっせ...");
        assert_eq!(truncate_text("abc", 3), "abc");
    }

    #[test]
    fn test_category_defaults() {
        let cat = NewsCategory {
            id: "1".into(),
            name: "Live".into(),
            description: None,
            color: None,
            icon: None,
        };
        assert_eq!(cat.color(), DEFAULT_CATEGORY_COLOR);
        assert_eq!(cat.icon(), DEFAULT_CATEGORY_ICON);
    }
}
