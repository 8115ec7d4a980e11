//! HTTP client for the fan-site API.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::cache::SongCache;
use crate::config::{normalize_base_url, Config};
use crate::error::ApiError;
use crate::news::{NewsFilter, NewsSubmission};
use crate::platform;
use crate::protocol::{NewsCategory, NewsPost, NewsTag, Song};
use crate::upload::{mime_for, UploadRequest};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    cache: Option<SongCache>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, cache: Option<SongCache>) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url);
        let parsed = Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http = Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("ado-music/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Request {
                endpoint: "client".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            timeout,
            cache,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let cache = config.cache.enabled.then(|| {
            SongCache::new(
                &platform::cache_dir(),
                Duration::from_secs(config.cache.song_ttl_secs),
            )
        });
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
            cache,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Song list, served from the local cache while it is fresh.
    pub async fn list_songs(&self) -> Result<Vec<Song>, ApiError> {
        if let Some(songs) = self.cache.as_ref().and_then(SongCache::load) {
            return Ok(songs);
        }
        self.fetch_songs().await
    }

    /// Song list from the network.  Refreshes the cache on success.
    pub async fn fetch_songs(&self) -> Result<Vec<Song>, ApiError> {
        let songs: Vec<Song> = self
            .send_json("/songs", self.http.get(self.url("/songs")).timeout(self.timeout))
            .await?;
        if let Some(cache) = &self.cache {
            cache.store(&songs);
        }
        Ok(songs)
    }

    pub fn clear_song_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub async fn get_song(&self, id: &str) -> Result<Song, ApiError> {
        let endpoint = format!("/songs/{}", id);
        let request = self.http.get(self.url(&endpoint)).timeout(self.timeout);
        self.send_json(&endpoint, request).await
    }

    /// Multipart upload.  The audio and cover files are streamed from disk.
    pub async fn upload_song(&self, upload: &UploadRequest) -> Result<Song, ApiError> {
        let endpoint = "/songs";
        let mut form = Form::new()
            .text("title", upload.title.clone())
            .part("file", file_part(endpoint, &upload.audio).await?);
        if let Some(cover) = &upload.cover {
            form = form.part("cover", file_part(endpoint, cover).await?);
        }
        if let Some(description) = &upload.description {
            form = form.text("description", description.clone());
        }
        form = form.text("category", upload.category.as_str());

        info!("uploading '{}' from {:?}", upload.title, upload.audio);
        let song: Song = self
            .send_json(endpoint, self.http.post(self.url(endpoint)).multipart(form))
            .await?;
        self.clear_song_cache();
        Ok(song)
    }

    pub fn song_file_url(&self, id: &str) -> String {
        self.url(&format!("/songs/{}/file", id))
    }

    pub fn song_cover_url(&self, id: &str) -> String {
        self.url(&format!("/songs/{}/cover", id))
    }

    pub async fn list_news(&self, filter: &NewsFilter) -> Result<Vec<NewsPost>, ApiError> {
        let request = self
            .http
            .get(self.url("/news"))
            .query(&filter.query())
            .timeout(self.timeout);
        self.send_json("/news", request).await
    }

    pub async fn get_news_post(&self, id: &str) -> Result<NewsPost, ApiError> {
        let endpoint = format!("/news/{}", id);
        let request = self.http.get(self.url(&endpoint)).timeout(self.timeout);
        self.send_json(&endpoint, request).await
    }

    pub async fn delete_news_post(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/news/{}", id);
        let request = self.http.delete(self.url(&endpoint)).timeout(self.timeout);
        self.send(&endpoint, request).await?;
        info!("deleted news post {}", id);
        Ok(())
    }

    pub async fn list_news_categories(&self) -> Result<Vec<NewsCategory>, ApiError> {
        let request = self
            .http
            .get(self.url("/news/categories"))
            .timeout(self.timeout);
        self.send_json("/news/categories", request).await
    }

    pub async fn list_news_tags(&self) -> Result<Vec<NewsTag>, ApiError> {
        let request = self.http.get(self.url("/news/tags")).timeout(self.timeout);
        self.send_json("/news/tags", request).await
    }

    pub async fn create_news_post(&self, post: &NewsSubmission) -> Result<NewsPost, ApiError> {
        let endpoint = "/news";
        let mut form = Form::new()
            .text("title", post.title.clone())
            .text("content", post.content.clone())
            .text("category", post.category.clone())
            .text("published_date", post.published_date.clone())
            .text("is_featured", post.is_featured.to_string())
            .text("tags", post.tags.clone());
        let optional = [
            ("excerpt", &post.excerpt),
            ("source_url", &post.source_url),
            ("source_name", &post.source_name),
            ("author", &post.author),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                form = form.text(name, value.clone());
            }
        }
        if let Some(image) = &post.image {
            form = form.part("image", file_part(endpoint, image).await?);
        }

        self.send_json(endpoint, self.http.post(self.url(endpoint)).multipart(form))
            .await
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        debug!("api request {}", endpoint);
        let response = request.send().await.map_err(|source| ApiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.send(endpoint, request)
            .await?
            .json()
            .await
            .map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

async fn file_part(endpoint: &str, path: &Path) -> Result<Part, ApiError> {
    let file_error = |source| ApiError::File {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(file_error)?;
    let len = file.metadata().await.map_err(file_error)?.len();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    Part::stream_with_length(body, len)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(|source| ApiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new("localhost:8000", Duration::from_secs(1), None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
        let err = ApiClient::new("not a url", Duration::from_secs(1), None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_media_urls() {
        let client = ApiClient::new("http://h:8000/", Duration::from_secs(1), None).unwrap();
        assert_eq!(client.base_url(), "http://h:8000");
        assert_eq!(client.song_file_url("42"), "http://h:8000/songs/42/file");
        assert_eq!(client.song_cover_url("42"), "http://h:8000/songs/42/cover");
    }
}
