//! AppState: shared data read by every component during render and input.
//!
//! Only the App event loop writes to it.

use std::path::PathBuf;

use ado_core::api::ApiClient;
use ado_core::library::Library;
use ado_core::news::NewsBoard;

use crate::widgets::status_bar::InputMode;

pub struct AppState {
    pub library: Library,
    pub news: NewsBoard,
    /// Used to resolve media URLs the server left out.
    pub api: ApiClient,
    pub input_mode: InputMode,
    /// Bumped whenever the song collection or the filter changes, so list
    /// components know to rebuild.
    pub songs_rev: u64,
    pub news_submitting: bool,
    /// Tag names offered as hints in the news form.
    pub news_tags: Vec<String>,
    pub seek_step: f64,
    pub volume_step: f32,
    pub tui_log_lines: Vec<String>,
    pub log_path: PathBuf,
}

impl AppState {
    pub fn new(library: Library, api: ApiClient, seek_step: f64, volume_step: f32, log_path: PathBuf) -> Self {
        Self {
            library,
            news: NewsBoard::new(),
            api,
            input_mode: InputMode::Normal,
            songs_rev: 0,
            news_submitting: false,
            news_tags: Vec::new(),
            seek_step,
            volume_step,
            tui_log_lines: Vec::new(),
            log_path,
        }
    }

    pub fn bump_songs(&mut self) {
        self.songs_rev = self.songs_rev.wrapping_add(1);
    }

    /// Cover art URL for a song, falling back to the id-based endpoint.
    pub fn cover_url(&self, song_id: &str) -> String {
        self.library
            .song(song_id)
            .and_then(|s| s.cover_url.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.api.song_cover_url(song_id))
    }
}
