//! Playback state machine and the coordinator that arbitrates between cards.
//!
//! Everything here is pure: cards and the coordinator never touch the audio
//! backend.  They return [`MediaCommand`]s for the caller to forward and
//! consume [`MediaEvent`]s the backend reports.  At most one card is active
//! at a time and the coordinator's `current` id is the only place that
//! decides which one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::Song;

/// Assumed track length while the real duration is still unknown.
pub const PLACEHOLDER_DURATION_SECS: f64 = 180.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CardStatus {
    Idle,
    Loading,
    Playing,
    Paused,
    Error(String),
}

impl CardStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "stopped",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Error(_) => "error",
        }
    }
}

/// Instructions for the audio backend.  Every command but volume names the
/// song it is meant for so a late command can be filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaCommand {
    Load {
        song_id: String,
        url: String,
        start_secs: f64,
    },
    Resume {
        song_id: String,
    },
    Pause {
        song_id: String,
    },
    Seek {
        song_id: String,
        secs: f64,
    },
    SetVolume(f32),
}

impl MediaCommand {
    pub fn song_id(&self) -> Option<&str> {
        match self {
            Self::Load { song_id, .. }
            | Self::Resume { song_id }
            | Self::Pause { song_id }
            | Self::Seek { song_id, .. } => Some(song_id),
            Self::SetVolume(_) => None,
        }
    }
}

/// Reports from the audio backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaEvent {
    Started {
        song_id: String,
    },
    Failed {
        song_id: String,
        message: String,
    },
    Timeline {
        song_id: String,
        position: Option<f64>,
        duration: Option<f64>,
    },
    Ended {
        song_id: String,
    },
}

impl MediaEvent {
    pub fn song_id(&self) -> &str {
        match self {
            Self::Started { song_id }
            | Self::Failed { song_id, .. }
            | Self::Timeline { song_id, .. }
            | Self::Ended { song_id } => song_id,
        }
    }
}

/// What a card asks of its coordinator after handling input.
#[derive(Debug, Clone, PartialEq)]
pub enum CardRequest {
    /// Make this card the current song.
    Activate,
    /// Clear the current song if it is this card.
    Release,
    /// Forward these commands to the backend.
    Media(Vec<MediaCommand>),
    Ignored,
}

/// One song's playback state.  `active` is owned by the coordinator and
/// only changes through [`SongCard::set_active`].
#[derive(Debug, Clone)]
pub struct SongCard {
    song_id: String,
    url: String,
    status: CardStatus,
    progress: f64,
    duration: Option<f64>,
    pending_seek: Option<f64>,
    active: bool,
}

impl SongCard {
    pub fn new(song_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            url: url.into(),
            status: CardStatus::Idle,
            progress: 0.0,
            duration: None,
            pending_seek: None,
            active: false,
        }
    }

    pub fn from_song(song: &Song) -> Self {
        Self::new(&song.id, &song.audio_url)
    }

    pub fn song_id(&self) -> &str {
        &self.song_id
    }

    pub fn status(&self) -> &CardStatus {
        &self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Duration used for display and seek clamping.
    pub fn effective_duration(&self) -> f64 {
        self.duration.unwrap_or(PLACEHOLDER_DURATION_SECS)
    }

    pub fn fraction(&self) -> f64 {
        let total = self.effective_duration();
        if total <= 0.0 {
            return 0.0;
        }
        (self.progress / total).clamp(0.0, 1.0)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            CardStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    /// Apply the coordinator's active flag.  Only edges do anything.
    pub fn set_active(&mut self, active: bool) -> Vec<MediaCommand> {
        if active == self.active {
            return Vec::new();
        }
        self.active = active;

        if active {
            return vec![self.start()];
        }

        match self.status {
            CardStatus::Playing => {
                self.status = CardStatus::Paused;
                vec![self.pause_command()]
            }
            CardStatus::Loading => {
                self.status = if self.progress > 0.0 {
                    CardStatus::Paused
                } else {
                    CardStatus::Idle
                };
                vec![self.pause_command()]
            }
            _ => Vec::new(),
        }
    }

    /// The play/pause button.
    pub fn toggle(&mut self) -> CardRequest {
        if !self.active {
            return CardRequest::Activate;
        }
        match self.status {
            CardStatus::Loading => CardRequest::Ignored,
            // pausing gives the slot back so another card can take it
            CardStatus::Playing => CardRequest::Release,
            CardStatus::Idle | CardStatus::Paused | CardStatus::Error(_) => {
                CardRequest::Media(vec![self.start()])
            }
        }
    }

    /// Move to `secs`.  Allowed in every state.
    pub fn seek(&mut self, secs: f64) -> Vec<MediaCommand> {
        let target = secs.clamp(0.0, self.effective_duration());
        self.progress = target;

        if self.duration.is_none() {
            self.pending_seek = Some(target);
            return Vec::new();
        }
        self.pending_seek = None;
        vec![MediaCommand::Seek {
            song_id: self.song_id.clone(),
            secs: target,
        }]
    }

    pub fn seek_by(&mut self, delta: f64) -> Vec<MediaCommand> {
        self.seek(self.progress + delta)
    }

    pub fn on_event(&mut self, event: &MediaEvent) -> CardRequest {
        match event {
            MediaEvent::Started { .. } => {
                if self.status == CardStatus::Loading {
                    self.status = CardStatus::Playing;
                }
                CardRequest::Ignored
            }
            MediaEvent::Failed { message, .. } => {
                if matches!(self.status, CardStatus::Loading | CardStatus::Playing) {
                    self.status = CardStatus::Error(message.clone());
                }
                CardRequest::Ignored
            }
            MediaEvent::Timeline {
                position, duration, ..
            } => {
                let mut commands = Vec::new();
                if let Some(d) = duration.filter(|d| d.is_finite() && *d > 0.0) {
                    self.duration = Some(d);
                    if let Some(target) = self.pending_seek.take() {
                        let target = target.min(d);
                        self.progress = target;
                        commands.push(MediaCommand::Seek {
                            song_id: self.song_id.clone(),
                            secs: target,
                        });
                    }
                }
                if commands.is_empty() && self.status == CardStatus::Playing {
                    if let Some(p) = position.filter(|p| p.is_finite() && *p >= 0.0) {
                        self.progress = p;
                    }
                }
                if commands.is_empty() {
                    CardRequest::Ignored
                } else {
                    CardRequest::Media(commands)
                }
            }
            MediaEvent::Ended { .. } => {
                self.status = CardStatus::Idle;
                self.progress = 0.0;
                self.pending_seek = None;
                if self.active {
                    CardRequest::Release
                } else {
                    CardRequest::Ignored
                }
            }
        }
    }

    fn start(&mut self) -> MediaCommand {
        self.status = CardStatus::Loading;
        self.pending_seek = None;
        MediaCommand::Load {
            song_id: self.song_id.clone(),
            url: self.url.clone(),
            start_secs: self.progress,
        }
    }

    fn pause_command(&self) -> MediaCommand {
        MediaCommand::Pause {
            song_id: self.song_id.clone(),
        }
    }
}

/// Holds the current song and the single audio backend's state.
#[derive(Debug, Clone)]
pub struct PlaybackCoordinator {
    cards: Vec<SongCard>,
    current: Option<String>,
    /// Song whose media the backend holds right now.
    loaded: Option<String>,
    volume: f32,
}

impl PlaybackCoordinator {
    pub fn new(volume: f32) -> Self {
        Self {
            cards: Vec::new(),
            current: None,
            loaded: None,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn cards(&self) -> &[SongCard] {
        &self.cards
    }

    pub fn card(&self, song_id: &str) -> Option<&SongCard> {
        self.cards.iter().find(|c| c.song_id == song_id)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_card(&self) -> Option<&SongCard> {
        self.current.as_deref().and_then(|id| self.card(id))
    }

    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_active(&self, song_id: &str) -> bool {
        self.current.as_deref() == Some(song_id)
    }

    /// Replace the card set after a refresh.  Cards for songs still present
    /// keep their state; a current song that disappeared is released.
    pub fn sync_songs(&mut self, songs: &[Song]) -> Vec<MediaCommand> {
        let mut old = std::mem::take(&mut self.cards);
        self.cards = songs
            .iter()
            .map(|song| match old.iter().position(|c| c.song_id == song.id) {
                Some(idx) => {
                    let mut card = old.swap_remove(idx);
                    card.url = song.audio_url.clone();
                    card
                }
                None => SongCard::from_song(song),
            })
            .collect();

        let mut commands = Vec::new();
        if let Some(current) = self.current.clone() {
            if self.card(&current).is_none() {
                debug!("current song {} gone after refresh", current);
                self.current = None;
                if self.loaded.as_deref() == Some(current.as_str()) {
                    commands.push(MediaCommand::Pause { song_id: current });
                }
            }
        }
        commands
    }

    /// Make `song_id` current regardless of its card state.
    pub fn select(&mut self, song_id: &str) -> Vec<MediaCommand> {
        if self.card(song_id).is_none() {
            return Vec::new();
        }
        self.current = Some(song_id.to_string());
        self.propagate()
    }

    pub fn toggle(&mut self, song_id: &str) -> Vec<MediaCommand> {
        let Some(card) = self.card_mut(song_id) else {
            return Vec::new();
        };
        let request = card.toggle();
        self.apply(song_id, request)
    }

    pub fn seek(&mut self, song_id: &str, secs: f64) -> Vec<MediaCommand> {
        let Some(card) = self.card_mut(song_id) else {
            return Vec::new();
        };
        let commands = card.seek(secs);
        self.route(commands)
    }

    pub fn seek_by(&mut self, song_id: &str, delta: f64) -> Vec<MediaCommand> {
        let Some(card) = self.card_mut(song_id) else {
            return Vec::new();
        };
        let commands = card.seek_by(delta);
        self.route(commands)
    }

    /// Volume goes straight to the backend whatever the play state.
    pub fn set_volume(&mut self, volume: f32) -> Vec<MediaCommand> {
        self.volume = volume.clamp(0.0, 1.0);
        vec![MediaCommand::SetVolume(self.volume)]
    }

    pub fn adjust_volume(&mut self, delta: f32) -> Vec<MediaCommand> {
        self.set_volume(self.volume + delta)
    }

    pub fn handle_event(&mut self, event: &MediaEvent) -> Vec<MediaCommand> {
        let song_id = event.song_id().to_string();
        if self.loaded.as_deref() != Some(song_id.as_str()) {
            debug!("dropping {:?} for unloaded song", event);
            return Vec::new();
        }
        if matches!(event, MediaEvent::Ended { .. } | MediaEvent::Failed { .. }) {
            self.loaded = None;
        }
        let Some(card) = self.card_mut(&song_id) else {
            return Vec::new();
        };
        let request = card.on_event(event);
        self.apply(&song_id, request)
    }

    fn apply(&mut self, song_id: &str, request: CardRequest) -> Vec<MediaCommand> {
        match request {
            CardRequest::Activate => {
                self.current = Some(song_id.to_string());
                self.propagate()
            }
            CardRequest::Release => {
                if self.current.as_deref() == Some(song_id) {
                    self.current = None;
                }
                self.propagate()
            }
            CardRequest::Media(commands) => self.route(commands),
            CardRequest::Ignored => Vec::new(),
        }
    }

    /// Push the derived `active` flag to every card.  Deactivations first.
    fn propagate(&mut self) -> Vec<MediaCommand> {
        let current = self.current.clone();
        let mut commands = Vec::new();

        for card in self.cards.iter_mut() {
            if card.active && current.as_deref() != Some(card.song_id.as_str()) {
                commands.extend(card.set_active(false));
            }
        }
        for card in self.cards.iter_mut() {
            if !card.active && current.as_deref() == Some(card.song_id.as_str()) {
                commands.extend(card.set_active(true));
            }
        }

        self.route(commands)
    }

    /// Fit card commands to the single backend.
    fn route(&mut self, commands: Vec<MediaCommand>) -> Vec<MediaCommand> {
        let mut routed = Vec::with_capacity(commands.len());
        for command in commands {
            match command {
                MediaCommand::Load { song_id, url, start_secs } => {
                    if self.loaded.as_deref() == Some(song_id.as_str()) {
                        routed.push(MediaCommand::Resume { song_id });
                    } else {
                        self.loaded = Some(song_id.clone());
                        routed.push(MediaCommand::Load {
                            song_id,
                            url,
                            start_secs,
                        });
                    }
                }
                MediaCommand::SetVolume(v) => routed.push(MediaCommand::SetVolume(v)),
                other => {
                    if other.song_id() == self.loaded.as_deref() {
                        routed.push(other);
                    }
                }
            }
        }
        routed
    }

    fn card_mut(&mut self, song_id: &str) -> Option<&mut SongCard> {
        self.cards.iter_mut().find(|c| c.song_id == song_id)
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            title: id.to_uppercase(),
            audio_url: format!("http://api/songs/{}/file", id),
            cover_url: None,
            description: None,
            category: None,
        }
    }

    fn coordinator(ids: &[&str]) -> PlaybackCoordinator {
        let mut c = PlaybackCoordinator::new(0.8);
        let songs: Vec<Song> = ids.iter().map(|id| song(id)).collect();
        c.sync_songs(&songs);
        c
    }

    fn started(id: &str) -> MediaEvent {
        MediaEvent::Started {
            song_id: id.to_string(),
        }
    }

    fn active_count(c: &PlaybackCoordinator) -> usize {
        c.cards().iter().filter(|card| card.is_active()).count()
    }

    #[test]
    fn test_toggle_idle_card_loads_it() {
        let mut c = coordinator(&["a", "b"]);
        let cmds = c.toggle("a");
        assert_eq!(
            cmds,
            vec![MediaCommand::Load {
                song_id: "a".into(),
                url: "http://api/songs/a/file".into(),
                start_secs: 0.0,
            }]
        );
        assert_eq!(c.current(), Some("a"));
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Loading);

        c.handle_event(&started("a"));
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Playing);
    }

    #[test]
    fn test_activating_another_card_pauses_first_before_loading() {
        let mut c = coordinator(&["a", "b"]);
        c.toggle("a");
        c.handle_event(&started("a"));

        let cmds = c.toggle("b");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], MediaCommand::Pause { song_id: "a".into() });
        assert!(matches!(&cmds[1], MediaCommand::Load { song_id, .. } if song_id == "b"));
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Paused);
        assert_eq!(active_count(&c), 1);
        assert!(c.card("b").unwrap().is_active());
    }

    #[test]
    fn test_at_most_one_active_across_sequence() {
        let mut c = coordinator(&["a", "b", "c"]);
        for id in ["a", "b", "a", "c", "c", "b"] {
            c.toggle(id);
            c.handle_event(&started(id));
            assert!(active_count(&c) <= 1);
        }
    }

    #[test]
    fn test_user_pause_releases_and_keeps_progress() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        c.handle_event(&started("a"));
        c.handle_event(&MediaEvent::Timeline {
            song_id: "a".into(),
            position: Some(42.0),
            duration: Some(200.0),
        });

        let cmds = c.toggle("a");
        assert_eq!(cmds, vec![MediaCommand::Pause { song_id: "a".into() }]);
        assert_eq!(c.current(), None);
        let card = c.card("a").unwrap();
        assert_eq!(card.status(), &CardStatus::Paused);
        assert_eq!(card.progress(), 42.0);

        // still loaded in the backend, so resuming does not reload
        let cmds = c.toggle("a");
        assert_eq!(cmds, vec![MediaCommand::Resume { song_id: "a".into() }]);
    }

    #[test]
    fn test_reactivation_after_switch_reloads_from_progress() {
        let mut c = coordinator(&["a", "b"]);
        c.toggle("a");
        c.handle_event(&started("a"));
        c.handle_event(&MediaEvent::Timeline {
            song_id: "a".into(),
            position: Some(30.0),
            duration: Some(200.0),
        });
        c.toggle("b");

        let cmds = c.toggle("a");
        assert!(cmds.contains(&MediaCommand::Load {
            song_id: "a".into(),
            url: "http://api/songs/a/file".into(),
            start_secs: 30.0,
        }));
    }

    #[test]
    fn test_ended_resets_and_clears_current() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        c.handle_event(&started("a"));
        c.handle_event(&MediaEvent::Timeline {
            song_id: "a".into(),
            position: Some(199.0),
            duration: Some(200.0),
        });

        c.handle_event(&MediaEvent::Ended { song_id: "a".into() });
        let card = c.card("a").unwrap();
        assert_eq!(card.status(), &CardStatus::Idle);
        assert_eq!(card.progress(), 0.0);
        assert!(!card.is_active());
        assert_eq!(c.current(), None);
        assert_eq!(c.loaded(), None);
    }

    #[test]
    fn test_failure_is_local_and_retry_clears_it() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        c.handle_event(&MediaEvent::Failed {
            song_id: "a".into(),
            message: "404 Not Found".into(),
        });
        assert_eq!(c.card("a").unwrap().error(), Some("404 Not Found"));
        assert_eq!(c.current(), Some("a"));

        let cmds = c.toggle("a");
        assert!(matches!(&cmds[0], MediaCommand::Load { song_id, .. } if song_id == "a"));
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Loading);
    }

    #[test]
    fn test_toggle_while_loading_is_ignored() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        assert!(c.toggle("a").is_empty());
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Loading);
    }

    #[test]
    fn test_seek_with_unknown_duration_applies_later() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        c.handle_event(&started("a"));

        assert!(c.seek("a", 95.0).is_empty());
        let card = c.card("a").unwrap();
        assert_eq!(card.progress(), 95.0);
        assert_eq!(card.pending_seek(), Some(95.0));

        let cmds = c.handle_event(&MediaEvent::Timeline {
            song_id: "a".into(),
            position: Some(1.0),
            duration: Some(240.0),
        });
        assert_eq!(
            cmds,
            vec![MediaCommand::Seek {
                song_id: "a".into(),
                secs: 95.0
            }]
        );
        let card = c.card("a").unwrap();
        assert_eq!(card.progress(), 95.0);
        assert_eq!(card.pending_seek(), None);
    }

    #[test]
    fn test_seek_clamps_to_placeholder() {
        let mut card = SongCard::new("a", "u");
        card.seek(10_000.0);
        assert_eq!(card.progress(), PLACEHOLDER_DURATION_SECS);
        card.seek(-5.0);
        assert_eq!(card.progress(), 0.0);
    }

    #[test]
    fn test_seek_on_unloaded_song_only_moves_progress() {
        let mut c = coordinator(&["a"]);
        assert!(c.seek("a", 50.0).is_empty());
        let cmds = c.toggle("a");
        assert!(matches!(
            &cmds[0],
            MediaCommand::Load { start_secs, .. } if *start_secs == 50.0
        ));
    }

    #[test]
    fn test_volume_does_not_touch_current() {
        let mut c = coordinator(&["a"]);
        c.toggle("a");
        assert_eq!(c.adjust_volume(0.5), vec![MediaCommand::SetVolume(1.0)]);
        assert_eq!(c.set_volume(-1.0), vec![MediaCommand::SetVolume(0.0)]);
        assert_eq!(c.current(), Some("a"));
    }

    #[test]
    fn test_events_for_other_songs_are_dropped() {
        let mut c = coordinator(&["a", "b"]);
        c.toggle("a");
        c.toggle("b");
        // late start from a after b was loaded
        c.handle_event(&started("a"));
        assert_ne!(c.card("a").unwrap().status(), &CardStatus::Playing);
        assert_eq!(c.loaded(), Some("b"));
    }

    #[test]
    fn test_deactivate_while_loading_without_progress_is_idle() {
        let mut c = coordinator(&["a", "b"]);
        c.toggle("a");
        c.toggle("b");
        assert_eq!(c.card("a").unwrap().status(), &CardStatus::Idle);
    }

    #[test]
    fn test_sync_keeps_state_and_drops_missing_current() {
        let mut c = coordinator(&["a", "b"]);
        c.toggle("b");
        c.handle_event(&started("b"));

        c.sync_songs(&[song("b"), song("c")]);
        assert_eq!(c.cards().len(), 2);
        assert_eq!(c.card("b").unwrap().status(), &CardStatus::Playing);

        let cmds = c.sync_songs(&[song("c")]);
        assert_eq!(cmds, vec![MediaCommand::Pause { song_id: "b".into() }]);
        assert_eq!(c.current(), None);
    }

    #[test]
    fn test_select_activates_song() {
        let mut c = coordinator(&["a", "b"]);
        let cmds = c.select("b");
        assert!(matches!(&cmds[0], MediaCommand::Load { song_id, .. } if song_id == "b"));
        assert!(c.is_active("b"));
        assert!(c.select("missing").is_empty());
        assert!(c.is_active("b"));
    }
}
