//! API client against an in-process mock of the fan-site server.

mod common;

use std::time::Duration;

use ado_core::api::ApiClient;
use ado_core::cache::{SongCache, DEFAULT_SONG_TTL};
use ado_core::error::ApiError;
use ado_core::news::{NewsDraft, NewsFilter};
use ado_core::protocol::{Song, SongCategory};
use ado_core::upload::UploadForm;
use common::mock_api::MockApi;

const TIMEOUT: Duration = Duration::from_secs(5);

fn cached_song(id: &str) -> Song {
    Song {
        id: id.to_string(),
        title: "from cache".to_string(),
        audio_url: "http://cdn.example/cached.mp3".to_string(),
        cover_url: None,
        description: None,
        category: Some(SongCategory::Original),
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[tokio::test]
async fn fresh_cache_skips_network() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
    cache.store_at(&[cached_song("c")], now_ms() - 9 * 60 * 1000);

    let client = ApiClient::new(&base, TIMEOUT, Some(cache)).unwrap();
    let songs = client.list_songs().await.unwrap();

    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title, "from cache");
    assert_eq!(mock.song_list_hits(), 0);
}

#[tokio::test]
async fn stale_cache_fetches_and_refreshes() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
    cache.store_at(&[cached_song("c")], now_ms() - 11 * 60 * 1000);

    let client = ApiClient::new(&base, TIMEOUT, Some(cache)).unwrap();
    let songs = client.list_songs().await.unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!(mock.song_list_hits(), 1);

    // now cached again
    let again = client.list_songs().await.unwrap();
    assert_eq!(again, songs);
    assert_eq!(mock.song_list_hits(), 1);
}

#[tokio::test]
async fn without_cache_every_list_hits_network() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    client.list_songs().await.unwrap();
    client.list_songs().await.unwrap();
    assert_eq!(mock.song_list_hits(), 2);
}

#[tokio::test]
async fn missing_song_is_status_error() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    let song = client.get_song("7").await.unwrap();
    assert_eq!(song.id, "7");

    match client.get_song("missing").await {
        Err(ApiError::Status { status, endpoint }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(endpoint, "/songs/missing");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn connection_failure_is_request_error() {
    // nothing listens on port 9 locally
    let client = ApiClient::new("http://127.0.0.1:9", TIMEOUT, None).unwrap();
    let err = client.fetch_songs().await.unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }));
}

#[tokio::test]
async fn upload_sends_multipart_and_clears_cache() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = SongCache::new(&dir.path().join("cache"), DEFAULT_SONG_TTL);
    cache.store(&[cached_song("c")]);

    let audio = dir.path().join("kura kura.mp3");
    std::fs::write(&audio, b"ID3fake-mp3-bytes").unwrap();
    let cover = dir.path().join("art.png");
    std::fs::write(&cover, b"\x89PNGfake").unwrap();

    let form = UploadForm {
        title: " Kura Kura ".into(),
        audio_path: audio.display().to_string(),
        cover_path: cover.display().to_string(),
        description: String::new(),
        category: SongCategory::Cover,
    };
    let request = form.validate().unwrap();

    let client = ApiClient::new(&base, TIMEOUT, Some(cache.clone())).unwrap();
    let song = client.upload_song(&request).await.unwrap();
    assert_eq!(song.title, "Kura Kura");

    assert_eq!(mock.upload_field("title").unwrap().text(), "Kura Kura");
    assert_eq!(mock.upload_field("category").unwrap().text(), "cover");
    assert!(mock.upload_field("description").is_none());

    let file = mock.upload_field("file").unwrap();
    assert_eq!(file.file_name.as_deref(), Some("kura kura.mp3"));
    assert_eq!(file.content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(file.body, b"ID3fake-mp3-bytes");

    let art = mock.upload_field("cover").unwrap();
    assert_eq!(art.content_type.as_deref(), Some("image/png"));

    assert!(cache.load().is_none());
}

#[tokio::test]
async fn news_filters_map_to_query() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    let posts = client.list_news(&NewsFilter::All).await.unwrap();
    assert_eq!(posts.len(), 2);
    client.list_news(&NewsFilter::Featured).await.unwrap();
    client
        .list_news(&NewsFilter::Category("Live Tour".into()))
        .await
        .unwrap();

    let queries = mock.news_queries.lock().unwrap().clone();
    assert!(queries[0].is_empty());
    assert_eq!(queries[1].get("featured").map(String::as_str), Some("true"));
    assert!(!queries[1].contains_key("category"));
    assert_eq!(
        queries[2].get("category").map(String::as_str),
        Some("Live Tour")
    );
    assert!(!queries[2].contains_key("featured"));
}

#[tokio::test]
async fn news_categories_tags_and_single_post() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    let categories = client.list_news_categories().await.unwrap();
    assert_eq!(categories[0].icon(), "🎤");
    assert_eq!(categories[1].color(), "#8b5cf6");

    let tags = client.list_news_tags().await.unwrap();
    assert_eq!(tags[0].name, "tour");

    let post = client.get_news_post("a").await.unwrap();
    assert_eq!(post.id, "a");
    assert!(matches!(
        client.get_news_post("missing").await,
        Err(ApiError::Status { .. })
    ));
}

#[tokio::test]
async fn delete_news_post_hits_endpoint() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    client.delete_news_post("b").await.unwrap();
    assert_eq!(*mock.deleted.lock().unwrap(), vec!["b".to_string()]);
}

#[tokio::test]
async fn create_news_post_sends_form_fields() {
    let mock = MockApi::default();
    let base = mock.clone().spawn().await;
    let client = ApiClient::new(&base, TIMEOUT, None).unwrap();

    let draft = NewsDraft {
        title: "Tour dates".into(),
        content: "Asia and Europe".into(),
        category: "Live".into(),
        author: "staff".into(),
        is_featured: true,
        tags: "tour, 2025".into(),
        ..Default::default()
    };
    let submission = draft.validate().unwrap();
    let created = client.create_news_post(&submission).await.unwrap();
    assert_eq!(created.id, "created");

    assert_eq!(mock.news_field("title").unwrap().text(), "Tour dates");
    assert_eq!(mock.news_field("is_featured").unwrap().text(), "true");
    assert_eq!(mock.news_field("tags").unwrap().text(), "tour, 2025");
    assert_eq!(mock.news_field("author").unwrap().text(), "staff");
    assert!(mock.news_field("excerpt").is_none());
    assert!(mock.news_field("image").is_none());

    let published = mock.news_field("published_date").unwrap().text();
    assert!(chrono::DateTime::parse_from_rfc3339(&published).is_ok());
}
