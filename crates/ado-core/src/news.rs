//! News board state and the admin creation form.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::error::DraftError;
use crate::library::{Ticket, TicketIssuer};
use crate::platform::expand_home;
use crate::protocol::{NewsCategory, NewsPost, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON};
use crate::upload::has_extension;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Which posts to list.  Featured and category are exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NewsFilter {
    #[default]
    All,
    Featured,
    Category(String),
}

impl NewsFilter {
    /// Query parameters for `GET /news`.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::All => Vec::new(),
            Self::Featured => vec![("featured", "true".to_string())],
            Self::Category(name) => vec![("category", name.clone())],
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => "All".to_string(),
            Self::Featured => "Featured".to_string(),
            Self::Category(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct NewsBoard {
    posts: Vec<NewsPost>,
    categories: Vec<NewsCategory>,
    filter: NewsFilter,
    status: NewsStatus,
    selected: usize,
    detail: Option<String>,
    fetches: TicketIssuer,
}

impl Default for NewsBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsBoard {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            categories: Vec::new(),
            filter: NewsFilter::All,
            status: NewsStatus::Idle,
            selected: 0,
            detail: None,
            fetches: TicketIssuer::default(),
        }
    }

    pub fn posts(&self) -> &[NewsPost] {
        &self.posts
    }

    pub fn categories(&self) -> &[NewsCategory] {
        &self.categories
    }

    pub fn filter(&self) -> &NewsFilter {
        &self.filter
    }

    pub fn status(&self) -> &NewsStatus {
        &self.status
    }

    /// Change the filter.  Returns a ticket to fetch with when it changed.
    pub fn set_filter(&mut self, filter: NewsFilter) -> Option<Ticket> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        Some(self.begin_fetch())
    }

    /// All, Featured, then each known category in order.
    pub fn cycle_filter(&mut self) -> Option<Ticket> {
        let next = match &self.filter {
            NewsFilter::All => NewsFilter::Featured,
            NewsFilter::Featured => self
                .categories
                .first()
                .map(|c| NewsFilter::Category(c.name.clone()))
                .unwrap_or(NewsFilter::All),
            NewsFilter::Category(name) => {
                let idx = self.categories.iter().position(|c| &c.name == name);
                idx.and_then(|i| self.categories.get(i + 1))
                    .map(|c| NewsFilter::Category(c.name.clone()))
                    .unwrap_or(NewsFilter::All)
            }
        };
        self.set_filter(next)
    }

    pub fn begin_fetch(&mut self) -> Ticket {
        self.status = NewsStatus::Loading;
        self.fetches.issue()
    }

    /// Apply a list response; stale tickets are dropped.
    pub fn apply_posts(&mut self, ticket: Ticket, result: Result<Vec<NewsPost>, String>) -> bool {
        if !self.fetches.is_current(ticket) {
            debug!("discarding stale news response {:?}", ticket);
            return false;
        }
        match result {
            Ok(posts) => {
                self.posts = posts;
                self.status = NewsStatus::Ready;
                self.selected = self.selected.min(self.posts.len().saturating_sub(1));
                if let Some(id) = &self.detail {
                    if !self.posts.iter().any(|p| &p.id == id) {
                        self.detail = None;
                    }
                }
            }
            Err(message) => {
                warn!("news fetch failed: {}", message);
                self.status = NewsStatus::Failed(message);
            }
        }
        true
    }

    pub fn set_categories(&mut self, categories: Vec<NewsCategory>) {
        self.categories = categories;
    }

    /// Colour and icon for a post's category name.
    pub fn category_style(&self, name: &str) -> (&str, &str) {
        match self.categories.iter().find(|c| c.name == name) {
            Some(c) => (c.color(), c.icon()),
            None => (DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON),
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_post(&self) -> Option<&NewsPost> {
        self.posts.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if !self.posts.is_empty() {
            self.selected = index.min(self.posts.len() - 1);
        }
    }

    pub fn select_next(&mut self) {
        self.select(self.selected.saturating_add(1));
    }

    pub fn select_prev(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }

    pub fn open_detail(&mut self) -> bool {
        match self.posts.get(self.selected) {
            Some(post) => {
                self.detail = Some(post.id.clone());
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail_post(&self) -> Option<&NewsPost> {
        let id = self.detail.as_deref()?;
        self.posts.iter().find(|p| p.id == id)
    }

    /// Replace a post in place, e.g. after re-fetching it for the detail view.
    pub fn update_post(&mut self, post: NewsPost) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
    }

    pub fn remove_post(&mut self, id: &str) {
        self.posts.retain(|p| p.id != id);
        if self.detail.as_deref() == Some(id) {
            self.detail = None;
        }
        self.select(self.selected);
    }
}

/// The admin's news creation form as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub source_url: String,
    pub source_name: String,
    pub author: String,
    pub is_featured: bool,
    /// Comma separated, sent as typed.
    pub tags: String,
    pub image_path: String,
}

/// A validated draft ready for `POST /news`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsSubmission {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: String,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub author: Option<String>,
    pub published_date: String,
    pub is_featured: bool,
    pub tags: String,
    pub image: Option<PathBuf>,
}

impl NewsDraft {
    pub fn validate(&self) -> Result<NewsSubmission, DraftError> {
        self.validate_at(Utc::now())
    }

    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<NewsSubmission, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(DraftError::EmptyContent);
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(DraftError::MissingCategory);
        }

        let image = match non_empty(&self.image_path) {
            None => None,
            Some(raw) => {
                let path = expand_home(&raw);
                if !has_extension(&path, IMAGE_EXTENSIONS) {
                    return Err(DraftError::UnsupportedImage);
                }
                if !path.is_file() {
                    return Err(DraftError::ImageNotFound(path));
                }
                Some(path)
            }
        };

        Ok(NewsSubmission {
            title: title.to_string(),
            content: self.content.clone(),
            excerpt: non_empty(&self.excerpt),
            category: category.to_string(),
            source_url: non_empty(&self.source_url),
            source_name: non_empty(&self.source_name),
            author: non_empty(&self.author),
            published_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            is_featured: self.is_featured,
            tags: self.tags.trim().to_string(),
            image,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str) -> NewsPost {
        serde_json::from_value(serde_json::json!({
            "id": id, "title": id, "content": "body", "category": "Live",
            "published_date": "2024-05-01T12:00:00Z"
        }))
        .unwrap()
    }

    fn category(name: &str) -> NewsCategory {
        NewsCategory {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: None,
            color: Some("#ff0000".into()),
            icon: Some("🎤".into()),
        }
    }

    #[test]
    fn test_filter_query() {
        assert!(NewsFilter::All.query().is_empty());
        assert_eq!(
            NewsFilter::Featured.query(),
            vec![("featured", "true".to_string())]
        );
        assert_eq!(
            NewsFilter::Category("Tour".into()).query(),
            vec![("category", "Tour".to_string())]
        );
    }

    #[test]
    fn test_set_same_filter_does_not_refetch() {
        let mut board = NewsBoard::new();
        assert!(board.set_filter(NewsFilter::All).is_none());
        assert!(board.set_filter(NewsFilter::Featured).is_some());
        assert_eq!(board.status(), &NewsStatus::Loading);
    }

    #[test]
    fn test_cycle_filter_walks_categories() {
        let mut board = NewsBoard::new();
        board.set_categories(vec![category("Live"), category("Release")]);

        board.cycle_filter();
        assert_eq!(board.filter(), &NewsFilter::Featured);
        board.cycle_filter();
        assert_eq!(board.filter(), &NewsFilter::Category("Live".into()));
        board.cycle_filter();
        assert_eq!(board.filter(), &NewsFilter::Category("Release".into()));
        board.cycle_filter();
        assert_eq!(board.filter(), &NewsFilter::All);
    }

    #[test]
    fn test_stale_news_response_dropped() {
        let mut board = NewsBoard::new();
        let old = board.begin_fetch();
        let new = board.begin_fetch();
        assert!(board.apply_posts(new, Ok(vec![post("a")])));
        assert!(!board.apply_posts(old, Ok(vec![])));
        assert_eq!(board.posts().len(), 1);
        assert_eq!(board.status(), &NewsStatus::Ready);
    }

    #[test]
    fn test_failure_sets_status() {
        let mut board = NewsBoard::new();
        let t = board.begin_fetch();
        board.apply_posts(t, Err("timeout".into()));
        assert_eq!(board.status(), &NewsStatus::Failed("timeout".into()));
    }

    #[test]
    fn test_detail_and_remove() {
        let mut board = NewsBoard::new();
        let t = board.begin_fetch();
        board.apply_posts(t, Ok(vec![post("a"), post("b")]));
        board.select_next();
        assert!(board.open_detail());
        assert_eq!(board.detail_post().map(|p| p.id.as_str()), Some("b"));

        board.remove_post("b");
        assert!(board.detail_post().is_none());
        assert_eq!(board.selected_index(), 0);
    }

    #[test]
    fn test_category_style_falls_back() {
        let mut board = NewsBoard::new();
        board.set_categories(vec![category("Live")]);
        assert_eq!(board.category_style("Live"), ("#ff0000", "🎤"));
        assert_eq!(
            board.category_style("Other"),
            (DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON)
        );
    }

    #[test]
    fn test_draft_validation() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut draft = NewsDraft::default();
        assert_eq!(draft.validate_at(now), Err(DraftError::EmptyTitle));
        draft.title = "New single".into();
        assert_eq!(draft.validate_at(now), Err(DraftError::EmptyContent));
        draft.content = "Out now".into();
        assert_eq!(draft.validate_at(now), Err(DraftError::MissingCategory));
        draft.category = "Release".into();
        draft.tags = " single, 2025 ".into();
        draft.author = "  ".into();

        let sub = draft.validate_at(now).unwrap();
        assert_eq!(sub.published_date, "2025-01-02T03:04:05.000Z");
        assert_eq!(sub.tags, "single, 2025");
        assert_eq!(sub.author, None);
        assert_eq!(sub.image, None);

        draft.image_path = "/tmp/photo.gif".into();
        assert_eq!(draft.validate_at(now), Err(DraftError::UnsupportedImage));
    }
}
