/// PlayerCore: single owner of the mpv process.
///
/// The App forwards `MediaCommand`s produced by the playback coordinator;
/// PlayerCore applies them to mpv and reports `MediaEvent`s back.  Playback
/// state is derived from observed properties (core-idle, pause, time-pos,
/// duration) plus end-file events.  The heartbeat only checks process
/// liveness and the start timeout.
use std::time::Duration;

use ado_core::playback::{MediaCommand, MediaEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_DURATION, OBS_PAUSE, OBS_TIME_POS};

/// A song that has not produced audio after this long is reported as failed.
pub const START_TIMEOUT: Duration = Duration::from_secs(15);
const TIMELINE_INTERVAL: Duration = Duration::from_millis(250);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// All inputs into the PlayerCore loop.
#[derive(Debug)]
pub enum PlayerInput {
    Command(MediaCommand),
    /// Raw mpv event forwarded from the reader task.
    Mpv(MpvEvent),
    HeartbeatTick,
    Shutdown,
}

/// What mpv is doing for the song it was last told to load.
#[derive(Debug)]
struct Track {
    song_id: String,
    start_secs: f64,
    file_loaded: bool,
    started: bool,
    waiting_since: Instant,
    last_timeline: Option<Instant>,
}

/// Observed mpv properties for the current track, turned into
/// `MediaEvent`s.  No IO happens here.
#[derive(Debug, Default)]
pub struct TrackMonitor {
    track: Option<Track>,
    obs_core_idle: Option<bool>,
    obs_pause: bool,
    obs_time_pos: Option<f64>,
    obs_duration: Option<f64>,
}

impl TrackMonitor {
    pub fn song_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.song_id.as_str())
    }

    pub fn tracks(&self, song_id: &str) -> bool {
        self.song_id() == Some(song_id)
    }

    pub fn file_loaded(&self) -> bool {
        self.track.as_ref().map_or(false, |t| t.file_loaded)
    }

    pub fn begin(&mut self, song_id: &str, start_secs: f64, now: Instant) {
        self.track = Some(Track {
            song_id: song_id.to_string(),
            start_secs,
            file_loaded: false,
            started: false,
            waiting_since: now,
            last_timeline: None,
        });
        self.obs_core_idle = None;
        self.obs_pause = false;
        self.obs_time_pos = None;
        self.obs_duration = None;
    }

    /// Record a seek that arrived before mpv finished opening the file.
    pub fn defer_seek(&mut self, secs: f64) {
        if let Some(track) = self.track.as_mut() {
            track.start_secs = secs;
        }
    }

    /// A paused track is resuming: it reports `Started` again once mpv is
    /// audible, and the start timeout restarts.
    pub fn resumed(&mut self, now: Instant) -> Option<MediaEvent> {
        let track = self.track.as_mut()?;
        track.started = false;
        track.waiting_since = now;
        self.check_started()
    }

    /// The file is open; returns the position to seek to, if any.
    pub fn file_loaded_at(&mut self) -> Option<f64> {
        let track = self.track.as_mut()?;
        track.file_loaded = true;
        (track.start_secs > 0.0).then_some(track.start_secs)
    }

    /// Drop the track and report it failed.
    pub fn fail(&mut self, message: impl Into<String>) -> Option<MediaEvent> {
        let track = self.track.take()?;
        Some(MediaEvent::Failed {
            song_id: track.song_id,
            message: message.into(),
        })
    }

    pub fn on_property(&mut self, obs_id: u64, data: &Value, now: Instant) -> Vec<MediaEvent> {
        let number = |v: &Value| if v.is_null() { None } else { v.as_f64() };
        match obs_id {
            OBS_CORE_IDLE => {
                self.obs_core_idle = data.as_bool();
                self.check_started().into_iter().collect()
            }
            OBS_PAUSE => {
                self.obs_pause = data.as_bool().unwrap_or(false);
                self.check_started().into_iter().collect()
            }
            OBS_TIME_POS => {
                self.obs_time_pos = number(data);
                self.timeline(now, false).into_iter().collect()
            }
            OBS_DURATION => {
                let duration = number(data);
                if duration == self.obs_duration {
                    return Vec::new();
                }
                self.obs_duration = duration;
                self.timeline(now, true).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_end_file(&mut self, reason: &str, file_error: Option<&str>) -> Option<MediaEvent> {
        match reason {
            "eof" => {
                let track = self.track.take()?;
                Some(MediaEvent::Ended {
                    song_id: track.song_id,
                })
            }
            "error" => self.fail(file_error.unwrap_or("playback error")),
            // "stop" is the previous file being replaced by loadfile
            _ => None,
        }
    }

    /// Start timeout check, driven by the heartbeat.
    pub fn check_timeout(&mut self, now: Instant) -> Option<MediaEvent> {
        let track = self.track.as_ref()?;
        if track.started || self.obs_pause {
            return None;
        }
        let waited = now.saturating_duration_since(track.waiting_since);
        if waited < START_TIMEOUT {
            return None;
        }
        warn!("player: no audio after {}s for song {}", waited.as_secs(), track.song_id);
        self.fail(format!("no audio after {}s", waited.as_secs()))
    }

    fn check_started(&mut self) -> Option<MediaEvent> {
        let track = self.track.as_mut()?;
        if track.started || !track.file_loaded || self.obs_pause || self.obs_core_idle != Some(false) {
            return None;
        }
        track.started = true;
        Some(MediaEvent::Started {
            song_id: track.song_id.clone(),
        })
    }

    fn timeline(&mut self, now: Instant, force: bool) -> Option<MediaEvent> {
        let track = self.track.as_mut()?;
        if !track.file_loaded {
            return None;
        }
        if !force {
            if let Some(last) = track.last_timeline {
                if now.saturating_duration_since(last) < TIMELINE_INTERVAL {
                    return None;
                }
            }
        }
        track.last_timeline = Some(now);
        Some(MediaEvent::Timeline {
            song_id: track.song_id.clone(),
            position: self.obs_time_pos,
            duration: self.obs_duration,
        })
    }
}

pub struct PlayerCore {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    /// Feeds mpv events back into our own loop.
    input_tx: mpsc::Sender<PlayerInput>,
    events: mpsc::Sender<MediaEvent>,
    monitor: TrackMonitor,
}

impl PlayerCore {
    pub fn new(volume: f32, input_tx: mpsc::Sender<PlayerInput>, events: mpsc::Sender<MediaEvent>) -> Self {
        Self {
            driver: MpvDriver::new(volume),
            handle: None,
            input_tx,
            events,
            monitor: TrackMonitor::default(),
        }
    }

    /// Run until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut input_rx: mpsc::Receiver<PlayerInput>) -> anyhow::Result<()> {
        info!("PlayerCore: starting event loop");

        let heartbeat_tx = self.input_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(HEARTBEAT_INTERVAL).await;
                if heartbeat_tx.send(PlayerInput::HeartbeatTick).await.is_err() {
                    break;
                }
            }
        });

        loop {
            match input_rx.recv().await {
                None => {
                    info!("PlayerCore: input channel closed, shutting down");
                    break;
                }
                Some(PlayerInput::Shutdown) => {
                    info!("PlayerCore: shutdown requested");
                    break;
                }
                Some(PlayerInput::Command(cmd)) => {
                    debug!("PlayerCore: command {:?}", cmd);
                    if let Err(e) = self.handle_command(cmd).await {
                        error!("PlayerCore: command error: {}", e);
                    }
                }
                Some(PlayerInput::Mpv(evt)) => self.handle_mpv_event(evt).await,
                Some(PlayerInput::HeartbeatTick) => self.heartbeat().await,
            }
        }

        self.cleanup().await;
        Ok(())
    }

    async fn emit(&self, event: Option<MediaEvent>) {
        if let Some(event) = event {
            debug!("PlayerCore: event {:?}", event);
            let _ = self.events.send(event).await;
        }
    }

    async fn handle_command(&mut self, cmd: MediaCommand) -> anyhow::Result<()> {
        match cmd {
            MediaCommand::Load {
                song_id,
                url,
                start_secs,
            } => {
                info!("PlayerCore: loading song {} from {}", song_id, url);
                self.monitor.begin(&song_id, start_secs, Instant::now());
                let handle = match self.ensure_mpv_handle().await {
                    Ok(h) => h,
                    Err(e) => {
                        warn!("PlayerCore: mpv unavailable: {}", e);
                        let failed = self.monitor.fail(e.to_string());
                        self.emit(failed).await;
                        return Ok(());
                    }
                };
                let _ = handle.set_pause(false).await;
                if let Err(e) = handle.load(&url).await {
                    warn!("PlayerCore: loadfile failed for {}: {}", song_id, e);
                    let failed = self.monitor.fail(e.to_string());
                    self.emit(failed).await;
                }
            }
            MediaCommand::Resume { song_id } => {
                if let Some(handle) = self.handle_for(&song_id) {
                    let started = self.monitor.resumed(Instant::now());
                    handle.set_pause(false).await?;
                    self.emit(started).await;
                }
            }
            MediaCommand::Pause { song_id } => {
                if let Some(handle) = self.handle_for(&song_id) {
                    handle.set_pause(true).await?;
                }
            }
            MediaCommand::Seek { song_id, secs } => {
                if let Some(handle) = self.handle_for(&song_id) {
                    if self.monitor.file_loaded() {
                        handle.seek_to(secs).await?;
                    } else {
                        self.monitor.defer_seek(secs);
                    }
                }
            }
            MediaCommand::SetVolume(volume) => {
                self.driver.last_volume = volume;
                if let Some(handle) = self.handle.as_ref() {
                    handle.set_volume(volume).await?;
                }
            }
        }
        Ok(())
    }

    /// The live handle, if `song_id` is what mpv is playing.
    fn handle_for(&self, song_id: &str) -> Option<MpvHandle> {
        if !self.monitor.tracks(song_id) {
            debug!("PlayerCore: ignoring command for untracked song {}", song_id);
            return None;
        }
        self.handle.clone()
    }

    async fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if let Some((obs_id, data)) = evt.as_property_change() {
            for event in self.monitor.on_property(obs_id, data, Instant::now()) {
                self.emit(Some(event)).await;
            }
            return;
        }

        match evt.event_name() {
            Some("end-file") => {
                let reason = evt.end_reason();
                info!("mpv: end-file reason={}", reason);
                let event = self.monitor.on_end_file(reason, evt.file_error());
                self.emit(event).await;
            }
            Some("start-file") => debug!("mpv: start-file"),
            Some("file-loaded") => {
                info!("mpv: file-loaded");
                let seek = self.monitor.file_loaded_at();
                if let Some(h) = self.handle.clone() {
                    tokio::spawn(async move {
                        if let Some(secs) = seek {
                            if let Err(e) = h.seek_to(secs).await {
                                warn!("mpv: initial seek to {:.1}s failed: {}", secs, e);
                            }
                        }
                        // re-observe so mpv pushes the current values for the new file
                        h.observe_all_properties().await;
                    });
                }
            }
            _ => {}
        }
    }

    async fn heartbeat(&mut self) {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("PlayerCore: heartbeat: mpv process died");
            self.handle = None;
            let failed = self.monitor.fail("mpv exited");
            self.emit(failed).await;
        }
        if let Some(failed) = self.monitor.check_timeout(Instant::now()) {
            if let Some(h) = self.handle.as_ref() {
                let _ = h.stop().await;
            }
            self.emit(Some(failed)).await;
        }
    }

    async fn ensure_mpv_handle(&mut self) -> anyhow::Result<MpvHandle> {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("PlayerCore: mpv process died, dropping handle");
            self.handle = None;
        }
        if let Some(handle) = self.handle.clone() {
            return Ok(handle);
        }

        // one channel and one forwarder per connection
        let (event_tx, mut event_rx) = mpsc::channel::<MpvEvent>(64);
        let core_tx = self.input_tx.clone();
        tokio::spawn(async move {
            while let Some(evt) = event_rx.recv().await {
                if core_tx.send(PlayerInput::Mpv(evt)).await.is_err() {
                    break;
                }
            }
        });

        let handle = match self.driver.try_reconnect(event_tx.clone()).await {
            Some(h) => h,
            None => self.driver.spawn_and_connect(event_tx).await?,
        };
        handle.observe_all_properties().await;
        if let Err(e) = handle.set_volume(self.driver.last_volume).await {
            warn!("PlayerCore: initial volume failed: {}", e);
        }
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    async fn cleanup(&mut self) {
        info!("PlayerCore: cleanup, stopping mpv");
        if let Some(handle) = self.handle.take() {
            let _ = handle.stop().await;
        }
        self.driver.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ado_core::playback::{CardStatus, PlaybackCoordinator};
    use ado_core::protocol::Song;
    use serde_json::json;

    fn loaded_monitor(start: f64) -> (TrackMonitor, Instant) {
        let now = Instant::now();
        let mut m = TrackMonitor::default();
        m.begin("s1", start, now);
        (m, now)
    }

    #[test]
    fn test_started_needs_file_loaded_and_unpaused() {
        let (mut m, now) = loaded_monitor(0.0);
        assert!(m.on_property(OBS_CORE_IDLE, &json!(false), now).is_empty());

        assert_eq!(m.file_loaded_at(), None);
        let events = m.on_property(OBS_CORE_IDLE, &json!(false), now);
        assert_eq!(
            events,
            vec![MediaEvent::Started {
                song_id: "s1".into()
            }]
        );
        // only once
        assert!(m.on_property(OBS_CORE_IDLE, &json!(false), now).is_empty());
    }

    #[test]
    fn test_paused_track_does_not_start() {
        let (mut m, now) = loaded_monitor(0.0);
        m.file_loaded_at();
        m.on_property(OBS_PAUSE, &json!(true), now);
        assert!(m.on_property(OBS_CORE_IDLE, &json!(false), now).is_empty());
        let events = m.on_property(OBS_PAUSE, &json!(false), now);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_start_position_returned_on_file_loaded() {
        let (mut m, _) = loaded_monitor(42.0);
        m.defer_seek(50.0);
        assert_eq!(m.file_loaded_at(), Some(50.0));
        assert!(m.file_loaded());
    }

    #[test]
    fn test_timeline_throttled_but_duration_forced() {
        let (mut m, now) = loaded_monitor(0.0);
        assert!(m.on_property(OBS_TIME_POS, &json!(1.0), now).is_empty());
        m.file_loaded_at();

        let first = m.on_property(OBS_TIME_POS, &json!(1.0), now);
        assert_eq!(first.len(), 1);
        assert!(m
            .on_property(OBS_TIME_POS, &json!(1.1), now + Duration::from_millis(100))
            .is_empty());

        let forced = m.on_property(OBS_DURATION, &json!(200.0), now + Duration::from_millis(120));
        assert_eq!(
            forced,
            vec![MediaEvent::Timeline {
                song_id: "s1".into(),
                position: Some(1.1),
                duration: Some(200.0),
            }]
        );
        // unchanged duration is not re-sent
        assert!(m
            .on_property(OBS_DURATION, &json!(200.0), now + Duration::from_millis(130))
            .is_empty());

        let later = m.on_property(OBS_TIME_POS, &json!(2.0), now + Duration::from_millis(400));
        assert_eq!(later.len(), 1);
    }

    #[test]
    fn test_end_file_reasons() {
        let (mut m, _) = loaded_monitor(0.0);
        assert_eq!(m.on_end_file("stop", None), None);
        assert_eq!(m.song_id(), Some("s1"));
        assert_eq!(
            m.on_end_file("eof", None),
            Some(MediaEvent::Ended {
                song_id: "s1".into()
            })
        );
        assert_eq!(m.song_id(), None);

        m.begin("s2", 0.0, Instant::now());
        assert_eq!(
            m.on_end_file("error", Some("unrecognized file format")),
            Some(MediaEvent::Failed {
                song_id: "s2".into(),
                message: "unrecognized file format".into(),
            })
        );
        assert_eq!(m.on_end_file("eof", None), None);
    }

    #[test]
    fn test_start_timeout() {
        let (mut m, now) = loaded_monitor(0.0);
        assert_eq!(m.check_timeout(now + Duration::from_secs(5)), None);
        let failed = m.check_timeout(now + START_TIMEOUT);
        assert!(matches!(failed, Some(MediaEvent::Failed { ref song_id, .. }) if song_id == "s1"));
        assert_eq!(m.song_id(), None);
    }

    #[test]
    fn test_no_timeout_while_paused_or_started() {
        let (mut m, now) = loaded_monitor(0.0);
        m.on_property(OBS_PAUSE, &json!(true), now);
        assert_eq!(m.check_timeout(now + Duration::from_secs(60)), None);

        m.on_property(OBS_PAUSE, &json!(false), now);
        assert_eq!(m.resumed(now + Duration::from_secs(60)), None);
        assert_eq!(m.check_timeout(now + Duration::from_secs(70)), None);

        m.file_loaded_at();
        m.on_property(OBS_CORE_IDLE, &json!(false), now);
        assert_eq!(m.check_timeout(now + Duration::from_secs(600)), None);
    }

    /// Feed coordinator commands through the monitor the way mpv reacts to
    /// them, and hand the resulting events back to the coordinator.
    fn play_out(m: &mut TrackMonitor, c: &mut PlaybackCoordinator, cmds: Vec<MediaCommand>, now: Instant) {
        let mut events = Vec::new();
        for cmd in cmds {
            match cmd {
                MediaCommand::Load { song_id, start_secs, .. } => {
                    m.begin(&song_id, start_secs, now);
                    m.file_loaded_at();
                    events.extend(m.on_property(OBS_PAUSE, &json!(false), now));
                    events.extend(m.on_property(OBS_CORE_IDLE, &json!(false), now));
                }
                MediaCommand::Pause { .. } => {
                    events.extend(m.on_property(OBS_PAUSE, &json!(true), now));
                    events.extend(m.on_property(OBS_CORE_IDLE, &json!(true), now));
                }
                MediaCommand::Resume { .. } => {
                    events.extend(m.resumed(now));
                    events.extend(m.on_property(OBS_PAUSE, &json!(false), now));
                    events.extend(m.on_property(OBS_CORE_IDLE, &json!(false), now));
                }
                _ => {}
            }
        }
        for event in events {
            c.handle_event(&event);
        }
    }

    #[test]
    fn test_pause_then_resume_plays_again() {
        let now = Instant::now();
        let mut m = TrackMonitor::default();
        let mut c = PlaybackCoordinator::new(0.8);
        c.sync_songs(&[Song {
            id: "a".into(),
            title: "Usseewa".into(),
            audio_url: "http://api/songs/a/file".into(),
            cover_url: None,
            description: None,
            category: None,
        }]);
        let status = |c: &PlaybackCoordinator| c.card("a").map(|card| card.status().clone());

        let cmds = c.toggle("a");
        play_out(&mut m, &mut c, cmds, now);
        assert_eq!(status(&c), Some(CardStatus::Playing));

        let cmds = c.toggle("a");
        assert_eq!(cmds, vec![MediaCommand::Pause { song_id: "a".into() }]);
        play_out(&mut m, &mut c, cmds, now);
        assert_eq!(status(&c), Some(CardStatus::Paused));

        let cmds = c.toggle("a");
        assert_eq!(cmds, vec![MediaCommand::Resume { song_id: "a".into() }]);
        play_out(&mut m, &mut c, cmds, now);
        assert_eq!(status(&c), Some(CardStatus::Playing));

        // and it can be paused again
        let cmds = c.toggle("a");
        assert_eq!(cmds, vec![MediaCommand::Pause { song_id: "a".into() }]);
    }

    #[test]
    fn test_resume_when_already_unpaused_starts_immediately() {
        let (mut m, now) = loaded_monitor(0.0);
        m.file_loaded_at();
        assert_eq!(m.on_property(OBS_CORE_IDLE, &json!(false), now).len(), 1);
        assert_eq!(
            m.resumed(now),
            Some(MediaEvent::Started {
                song_id: "s1".into()
            })
        );
    }
}
