//! Root client state: the song collection, view and filter navigation, the
//! admin gate and the upload form.  Owns the playback coordinator.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::playback::{MediaCommand, PlaybackCoordinator};
use crate::protocol::{Song, SongCategory};
use crate::upload::UploadForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongFilter {
    #[default]
    All,
    Original,
    Cover,
}

impl SongFilter {
    pub const ALL: [SongFilter; 3] = [Self::All, Self::Original, Self::Cover];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Original => "Originals",
            Self::Cover => "Covers",
        }
    }

    pub fn matches(self, song: &Song) -> bool {
        match self {
            Self::All => true,
            Self::Original => song.category == Some(SongCategory::Original),
            Self::Cover => song.category == Some(SongCategory::Cover),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Original,
            Self::Original => Self::Cover,
            Self::Cover => Self::All,
        }
    }

    pub fn for_category(category: Option<SongCategory>) -> Self {
        match category {
            Some(SongCategory::Original) => Self::Original,
            Some(SongCategory::Cover) => Self::Cover,
            None => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Songs,
    Covers,
    News,
    Upload,
}

impl View {
    pub const ALL: [View; 4] = [Self::Songs, Self::Covers, Self::News, Self::Upload];

    pub fn label(self) -> &'static str {
        match self {
            Self::Songs => "Songs",
            Self::Covers => "Covers",
            Self::News => "News",
            Self::Upload => "Upload",
        }
    }

    pub fn requires_admin(self) -> bool {
        self == Self::Upload
    }
}

/// Sequence number for an in-flight list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues tickets and tells whether a response is for the newest request.
#[derive(Debug, Clone, Default)]
pub struct TicketIssuer {
    latest: u64,
}

impl TicketIssuer {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

#[derive(Debug, Clone)]
pub struct Library {
    songs: Vec<Song>,
    filter: SongFilter,
    view: View,
    admin: bool,
    admin_password: String,
    playback: PlaybackCoordinator,
    upload: UploadForm,
    uploading: bool,
    loading: bool,
    load_error: Option<String>,
    refreshes: TicketIssuer,
}

impl Library {
    pub fn new(admin_password: impl Into<String>, volume: f32) -> Self {
        Self {
            songs: Vec::new(),
            filter: SongFilter::All,
            view: View::Songs,
            admin: false,
            admin_password: admin_password.into(),
            playback: PlaybackCoordinator::new(volume),
            upload: UploadForm::default(),
            uploading: false,
            loading: false,
            load_error: None,
            refreshes: TicketIssuer::default(),
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Songs matching the current filter, in server order.
    pub fn visible_songs(&self) -> Vec<&Song> {
        self.songs.iter().filter(|s| self.filter.matches(s)).collect()
    }

    /// Songs that have artwork.
    pub fn covers(&self) -> Vec<&Song> {
        self.songs.iter().filter(|s| s.has_cover()).collect()
    }

    pub fn filter(&self) -> SongFilter {
        self.filter
    }

    /// Derives a new view of the collection; never refetches.
    pub fn set_filter(&mut self, filter: SongFilter) {
        self.filter = filter;
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) -> Result<(), AuthError> {
        if view.requires_admin() && !self.admin {
            return Err(AuthError::AdminRequired);
        }
        self.view = view;
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Start a song-list refresh.  Only the response for the newest ticket
    /// is applied.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.loading = true;
        self.refreshes.issue()
    }

    /// Apply a song-list response.  Returns `None` when the ticket is stale
    /// and the response was discarded, otherwise any media commands the
    /// refresh produced.
    pub fn apply_songs(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Song>, String>,
    ) -> Option<Vec<MediaCommand>> {
        if !self.refreshes.is_current(ticket) {
            debug!("discarding stale song list response {:?}", ticket);
            return None;
        }
        self.loading = false;
        match result {
            Ok(songs) => {
                info!("loaded {} songs", songs.len());
                self.load_error = None;
                let commands = self.playback.sync_songs(&songs);
                self.songs = songs;
                Some(commands)
            }
            Err(message) => {
                warn!("song list failed: {}", message);
                self.load_error = Some(message);
                Some(Vec::new())
            }
        }
    }

    /// Pick a song from the artwork view: it becomes current, the filter
    /// follows its category and the song list is shown.
    pub fn select_cover(&mut self, song_id: &str) -> Vec<MediaCommand> {
        let Some(song) = self.song(song_id) else {
            return Vec::new();
        };
        self.filter = SongFilter::for_category(song.category);
        self.view = View::Songs;
        self.playback.select(song_id)
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Cosmetic gate.  The password lives in client config and is compared
    /// here; it protects nothing on the server.
    pub fn login(&mut self, password: &str) -> Result<(), AuthError> {
        if password != self.admin_password {
            warn!("admin login rejected");
            return Err(AuthError::WrongPassword);
        }
        info!("admin mode enabled");
        self.admin = true;
        self.view = View::Upload;
        Ok(())
    }

    pub fn logout(&mut self) {
        self.admin = false;
        if self.view.requires_admin() {
            self.view = View::Songs;
        }
    }

    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackCoordinator {
        &mut self.playback
    }

    pub fn upload_form(&self) -> &UploadForm {
        &self.upload
    }

    pub fn upload_form_mut(&mut self) -> &mut UploadForm {
        &mut self.upload
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
    }

    /// After a successful upload: clear the form, show the songs and start
    /// a reload.  The caller fetches with the returned ticket.
    pub fn finish_upload(&mut self) -> Ticket {
        self.uploading = false;
        self.upload.clear();
        self.view = View::Songs;
        self.begin_refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, category: Option<SongCategory>, cover: bool) -> Song {
        Song {
            id: id.to_string(),
            title: id.to_string(),
            audio_url: format!("http://api/songs/{}/file", id),
            cover_url: cover.then(|| format!("http://api/songs/{}/cover", id)),
            description: None,
            category,
        }
    }

    fn loaded_library() -> Library {
        let mut lib = Library::new("ado2025", 0.8);
        let ticket = lib.begin_refresh();
        lib.apply_songs(
            ticket,
            Ok(vec![
                song("o1", Some(SongCategory::Original), true),
                song("c1", Some(SongCategory::Cover), true),
                song("o2", Some(SongCategory::Original), false),
                song("x", None, false),
            ]),
        );
        lib
    }

    fn ids(songs: Vec<&Song>) -> Vec<&str> {
        songs.into_iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_filter_subsets() {
        let mut lib = loaded_library();
        assert_eq!(ids(lib.visible_songs()), vec!["o1", "c1", "o2", "x"]);

        lib.set_filter(SongFilter::Original);
        assert_eq!(ids(lib.visible_songs()), vec!["o1", "o2"]);

        lib.set_filter(SongFilter::Cover);
        lib.set_filter(SongFilter::Cover);
        assert_eq!(ids(lib.visible_songs()), vec!["c1"]);
    }

    #[test]
    fn test_covers_only_with_artwork() {
        let lib = loaded_library();
        assert_eq!(ids(lib.covers()), vec!["o1", "c1"]);
    }

    #[test]
    fn test_select_cover_switches_view_filter_and_current() {
        let mut lib = loaded_library();
        lib.set_view(View::Covers).unwrap();

        let cmds = lib.select_cover("c1");
        assert_eq!(lib.view(), View::Songs);
        assert_eq!(lib.filter(), SongFilter::Cover);
        assert_eq!(lib.playback().current(), Some("c1"));
        assert!(!cmds.is_empty());
    }

    #[test]
    fn test_select_cover_without_category_shows_all() {
        let mut lib = loaded_library();
        lib.set_filter(SongFilter::Original);
        lib.select_cover("x");
        assert_eq!(lib.filter(), SongFilter::All);
    }

    #[test]
    fn test_admin_gate() {
        let mut lib = loaded_library();
        assert_eq!(lib.set_view(View::Upload), Err(AuthError::AdminRequired));
        assert_eq!(lib.login("nope"), Err(AuthError::WrongPassword));
        assert!(!lib.is_admin());

        lib.login("ado2025").unwrap();
        assert!(lib.is_admin());
        assert_eq!(lib.view(), View::Upload);

        lib.logout();
        assert!(!lib.is_admin());
        assert_eq!(lib.view(), View::Songs);
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut lib = loaded_library();
        let first = lib.begin_refresh();
        let second = lib.begin_refresh();

        let applied = lib.apply_songs(second, Ok(vec![song("new", None, false)]));
        assert!(applied.is_some());
        assert!(lib.apply_songs(first, Ok(vec![])).is_none());
        assert_eq!(ids(lib.visible_songs()), vec!["new"]);
        assert!(!lib.is_loading());
    }

    #[test]
    fn test_failed_refresh_keeps_songs_and_sets_error() {
        let mut lib = loaded_library();
        let ticket = lib.begin_refresh();
        lib.apply_songs(ticket, Err("connection refused".into()));
        assert_eq!(lib.load_error(), Some("connection refused"));
        assert_eq!(lib.songs().len(), 4);

        let ticket = lib.begin_refresh();
        lib.apply_songs(ticket, Ok(vec![]));
        assert_eq!(lib.load_error(), None);
    }

    #[test]
    fn test_finish_upload_clears_form() {
        let mut lib = loaded_library();
        lib.login("ado2025").unwrap();
        lib.upload_form_mut().title = "Ashura-chan".into();
        lib.set_uploading(true);

        let ticket = lib.finish_upload();
        assert!(lib.upload_form().is_blank());
        assert_eq!(lib.view(), View::Songs);
        assert!(lib.is_loading());
        assert!(lib.apply_songs(ticket, Ok(vec![])).is_some());
    }
}
