#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One multipart field as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedField {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Shared counters and captures for assertions.
#[derive(Clone, Default)]
pub struct MockApi {
    pub song_list_hits: Arc<AtomicUsize>,
    pub news_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub upload_fields: Arc<Mutex<Vec<RecordedField>>>,
    pub news_fields: Arc<Mutex<Vec<RecordedField>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
}

impl MockApi {
    pub fn song_list_hits(&self) -> usize {
        self.song_list_hits.load(Ordering::SeqCst)
    }

    pub fn upload_field(&self, name: &str) -> Option<RecordedField> {
        find_field(&self.upload_fields, name)
    }

    pub fn news_field(&self, name: &str) -> Option<RecordedField> {
        find_field(&self.news_fields, name)
    }

    /// Bind on an ephemeral port and serve in the background.
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/songs", get(list_songs).post(upload_song))
            .route("/songs/:id", get(get_song))
            .route("/news", get(list_news).post(create_news))
            .route("/news/categories", get(list_categories))
            .route("/news/tags", get(list_tags))
            .route("/news/:id", get(get_news).delete(delete_news))
            .with_state(self);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

fn find_field(fields: &Mutex<Vec<RecordedField>>, name: &str) -> Option<RecordedField> {
    fields
        .lock()
        .unwrap()
        .iter()
        .find(|f| f.name == name)
        .cloned()
}

pub fn song_json(id: &str, category: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Song {}", id),
        "audio_url": format!("http://cdn.example/{}.mp3", id),
        "cover_url": null,
        "description": null,
        "category": category,
    })
}

pub fn post_json(id: &str, category: &str, featured: bool) -> Value {
    json!({
        "id": id,
        "title": format!("Post {}", id),
        "content": "Body",
        "category": category,
        "published_date": "2024-06-01T10:00:00",
        "is_featured": featured,
        "tags": ["live"],
    })
}

async fn list_songs(State(mock): State<MockApi>) -> Json<Value> {
    mock.song_list_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([song_json("1", "original"), song_json("2", "cover")]))
}

async fn get_song(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(song_json(&id, "original")))
}

async fn record(mut multipart: Multipart) -> Vec<RecordedField> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field.bytes().await.unwrap().to_vec();
        fields.push(RecordedField {
            name,
            file_name,
            content_type,
            body,
        });
    }
    fields
}

async fn upload_song(
    State(mock): State<MockApi>,
    multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let fields = record(multipart).await;
    let title = fields
        .iter()
        .find(|f| f.name == "title")
        .map(RecordedField::text)
        .unwrap_or_default();
    *mock.upload_fields.lock().unwrap() = fields;

    let mut song = song_json("new", "cover");
    song["title"] = json!(title);
    (StatusCode::CREATED, Json(song))
}

async fn list_news(
    State(mock): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    mock.news_queries.lock().unwrap().push(query);
    Json(json!([
        post_json("a", "Live", true),
        post_json("b", "Release", false)
    ]))
}

async fn get_news(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(post_json(&id, "Live", false)))
}

async fn delete_news(State(mock): State<MockApi>, Path(id): Path<String>) -> Json<Value> {
    mock.deleted.lock().unwrap().push(id);
    Json(json!({ "ok": true }))
}

async fn create_news(
    State(mock): State<MockApi>,
    multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let fields = record(multipart).await;
    *mock.news_fields.lock().unwrap() = fields;
    (StatusCode::CREATED, Json(post_json("created", "Release", false)))
}

async fn list_categories() -> Json<Value> {
    Json(json!([
        { "id": "1", "name": "Live", "color": "#ef4444", "icon": "🎤" },
        { "id": "2", "name": "Release", "description": null }
    ]))
}

async fn list_tags() -> Json<Value> {
    Json(json!([{ "id": "t1", "name": "tour" }]))
}
