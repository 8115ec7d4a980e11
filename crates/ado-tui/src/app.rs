//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from the terminal
//!   reader, the player core and spawned API calls.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Media commands flow out to the PlayerCore through `player_tx`.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use anyhow::Context;
use ado_core::library::{Ticket, View};
use ado_core::news::NewsSubmission;
use ado_core::playback::{MediaCommand, MediaEvent};
use ado_core::protocol::{NewsCategory, NewsPost, NewsTag, Song};
use ado_core::state::PersistentState;
use ado_core::upload::UploadRequest;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        cover_grid::CoverGrid, header::Header, help_overlay::HelpOverlay, log_panel::LogPanel,
        login_prompt::LoginPrompt, news_detail::NewsDetail, news_form::NewsForm,
        news_panel::NewsPanel, song_list::SongList, upload_form::UploadFormPane,
    },
    core::PlayerInput,
    focus::FocusRing,
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
};

/// Longest chain of follow-up actions one dispatch may produce.
const MAX_CHAIN: usize = 32;
const LOG_TAIL_LINES: usize = 500;

/// Everything that can wake the event loop.
#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Media(MediaEvent),
    SongsLoaded(Ticket, Result<Vec<Song>, String>),
    NewsLoaded(Ticket, Result<Vec<NewsPost>, String>),
    CategoriesLoaded(Result<Vec<NewsCategory>, String>),
    TagsLoaded(Result<Vec<NewsTag>, String>),
    PostFetched(Result<NewsPost, String>),
    PostDeleted(String, Result<(), String>),
    UploadFinished(Result<Song, String>),
    NewsCreated(Result<NewsPost, String>),
}

/// Screen rectangles from the last draw, used for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    body: Rect,
    song_list: Rect,
    cover_grid: Rect,
    news_panel: Rect,
    upload_form: Rect,
    news_form: Rect,
    log_panel: Rect,
}

pub struct App {
    state: AppState,
    focus: FocusRing,
    pane_areas: PaneAreas,

    header: Header,
    song_list: SongList,
    cover_grid: CoverGrid,
    news_panel: NewsPanel,
    news_detail: NewsDetail,
    upload_form: UploadFormPane,
    news_form: NewsForm,
    login_prompt: LoginPrompt,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,
    toast: ToastManager,

    player_tx: mpsc::Sender<PlayerInput>,
    /// Set in `run`; spawned API calls report back through it.
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(state: AppState, player_tx: mpsc::Sender<PlayerInput>) -> Self {
        let mut app = Self {
            state,
            focus: FocusRing::default(),
            pane_areas: PaneAreas::default(),
            header: Header::default(),
            song_list: SongList::new(),
            cover_grid: CoverGrid::default(),
            news_panel: NewsPanel::default(),
            news_detail: NewsDetail::default(),
            upload_form: UploadFormPane::new(),
            news_form: NewsForm::new(),
            login_prompt: LoginPrompt::new(),
            log_panel: LogPanel::default(),
            help_overlay: HelpOverlay::default(),
            toast: ToastManager::new(),
            player_tx,
            tx: None,
            should_quit: false,
        };
        app.sync_focus_ring();
        app
    }

    pub async fn run(mut self, mut media_rx: mpsc::Receiver<MediaEvent>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: player core events → AppMessage ──────────────────
        let media_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = media_rx.recv().await {
                if media_tx.send(AppMessage::Media(ev)).await.is_err() {
                    break;
                }
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Log tail refresh, only while the panel is expanded.
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("ado-music started");
        self.reload_tui_log();
        self.refresh_songs(false);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else {
                            break;
                        };
                        drained += 1;
                        redraw |= self.handle_message(next).await;
                    }
                    needs_redraw = redraw;
                }

                _ = toast_tick.tick() => {
                    needs_redraw = self.toast.tick();
                }

                _ = log_refresh.tick() => {
                    if self.log_panel.expanded {
                        self.reload_tui_log();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Returns whether the screen needs a redraw.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a).await;
                    }
                }
                Event::Mouse(mouse) => {
                    let actions = self.handle_mouse(mouse);
                    if actions.is_empty() && matches!(mouse.kind, MouseEventKind::Moved) {
                        return false;
                    }
                    for a in actions {
                        self.dispatch(a).await;
                    }
                }
                Event::Resize(w, h) => self.dispatch(Action::Resize(w, h)).await,
                _ => return false,
            },

            AppMessage::Media(ev) => {
                let commands = self.state.library.playback_mut().handle_event(&ev);
                self.send_media(commands).await;
            }

            AppMessage::SongsLoaded(ticket, result) => {
                if let Some(commands) = self.state.library.apply_songs(ticket, result) {
                    self.state.bump_songs();
                    self.send_media(commands).await;
                }
            }

            AppMessage::NewsLoaded(ticket, result) => {
                self.state.news.apply_posts(ticket, result);
            }

            AppMessage::CategoriesLoaded(result) => match result {
                Ok(categories) => self.state.news.set_categories(categories),
                Err(e) => warn!("news categories unavailable: {}", e),
            },

            AppMessage::TagsLoaded(result) => match result {
                Ok(tags) => self.state.news_tags = tags.into_iter().map(|t| t.name).collect(),
                Err(e) => warn!("news tags unavailable: {}", e),
            },

            AppMessage::PostFetched(result) => match result {
                Ok(post) => self.state.news.update_post(post),
                Err(e) => debug!("keeping listed copy of post: {}", e),
            },

            AppMessage::PostDeleted(id, result) => match result {
                Ok(()) => {
                    self.state.news.remove_post(&id);
                    self.toast.resolve_spinner(Severity::Success, "post deleted");
                }
                Err(e) => {
                    self.toast.resolve_spinner(Severity::Error, format!("delete failed: {}", e));
                }
            },

            AppMessage::UploadFinished(result) => match result {
                Ok(song) => {
                    info!("uploaded song {} ({})", song.title, song.id);
                    let ticket = self.state.library.finish_upload();
                    self.spawn_song_fetch(ticket, true);
                    self.sync_focus_ring();
                    self.toast
                        .resolve_spinner(Severity::Success, format!("uploaded \"{}\"", song.title));
                    self.dispatch(Action::UploadCleared).await;
                }
                Err(e) => {
                    self.state.library.set_uploading(false);
                    self.toast.resolve_spinner(Severity::Error, format!("upload failed: {}", e));
                }
            },

            AppMessage::NewsCreated(result) => {
                self.state.news_submitting = false;
                match result {
                    Ok(post) => {
                        info!("created news post {} ({})", post.title, post.id);
                        self.toast
                            .resolve_spinner(Severity::Success, format!("posted \"{}\"", post.title));
                        self.dispatch(Action::NewsFormCleared).await;
                        self.refresh_news();
                    }
                    Err(e) => {
                        self.toast.resolve_spinner(Severity::Error, format!("post failed: {}", e));
                    }
                }
            }
        }
        true
    }

    // ── Input routing ─────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        // Overlays capture all keys while visible.
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }
        if self.login_prompt.visible {
            return self.login_prompt.handle_key(key, &self.state);
        }
        if self.detail_open() {
            return self.news_detail.handle_key(key, &self.state);
        }

        // Text entry: everything goes to the focused component.
        if self.state.input_mode != InputMode::Normal || self.focused_is_editing() {
            return self.focused_handle_key(key);
        }

        let playing = self.current_song();
        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                return vec![Action::SwitchView(View::ALL[idx])];
            }
            KeyCode::Char('r') => {
                return match self.state.library.view() {
                    View::News => vec![Action::RefreshNews],
                    _ => vec![Action::RefreshSongs],
                };
            }
            KeyCode::Char('a') => {
                return if self.state.library.is_admin() {
                    vec![Action::Logout]
                } else {
                    vec![Action::OpenLogin]
                };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                return vec![Action::AdjustVolume(self.state.volume_step)];
            }
            KeyCode::Char('-') => return vec![Action::AdjustVolume(-self.state.volume_step)],
            KeyCode::Char('p') => {
                if let Some(id) = playing {
                    return vec![Action::TogglePlay(id)];
                }
            }
            KeyCode::Char(',') => {
                if let Some(id) = playing {
                    return vec![Action::SeekBy(id, -self.state.seek_step)];
                }
            }
            KeyCode::Char('.') => {
                if let Some(id) = playing {
                    return vec![Action::SeekBy(id, self.state.seek_step)];
                }
            }
            _ => {}
        }

        self.focused_handle_key(key)
    }

    fn focused_handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::SongList) => self.song_list.handle_key(key, s),
            Some(ComponentId::CoverGrid) => self.cover_grid.handle_key(key, s),
            Some(ComponentId::NewsPanel) => self.news_panel.handle_key(key, s),
            Some(ComponentId::UploadForm) => self.upload_form.handle_key(key, s),
            Some(ComponentId::NewsForm) => self.news_form.handle_key(key, s),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, s),
            _ => vec![],
        }
    }

    fn focused_is_editing(&self) -> bool {
        match self.focus.current() {
            Some(ComponentId::SongList) => self.song_list.is_editing(),
            Some(ComponentId::UploadForm) => self.upload_form.is_editing(),
            Some(ComponentId::NewsForm) => self.news_form.is_editing(),
            _ => false,
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {}
            _ => return vec![],
        }
        if self.help_overlay.visible || self.login_prompt.visible {
            return vec![];
        }

        let col = event.column;
        let row = event.row;

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let s = &self.state;

        if self.detail_open() {
            return self.news_detail.handle_mouse(event, areas.body, s);
        }

        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if let Some(view) = self.header.tab_at(col, row) {
                return vec![Action::SwitchView(view)];
            }
        }

        macro_rules! click_pane {
            ($id:expr, $component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                if !self.focus.is_focused($id) {
                    actions.insert(0, Action::FocusPane($id));
                }
                return actions;
            }};
        }

        if hit(areas.song_list, col, row) {
            click_pane!(ComponentId::SongList, self.song_list, areas.song_list);
        }
        if hit(areas.cover_grid, col, row) {
            click_pane!(ComponentId::CoverGrid, self.cover_grid, areas.cover_grid);
        }
        if hit(areas.news_panel, col, row) {
            click_pane!(ComponentId::NewsPanel, self.news_panel, areas.news_panel);
        }
        if hit(areas.upload_form, col, row) {
            click_pane!(ComponentId::UploadForm, self.upload_form, areas.upload_form);
        }
        if hit(areas.news_form, col, row) {
            click_pane!(ComponentId::NewsForm, self.news_form, areas.news_form);
        }
        if hit(areas.log_panel, col, row) && self.log_panel.expanded {
            click_pane!(ComponentId::LogPanel, self.log_panel, areas.log_panel);
        }

        vec![]
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Broadcast `action` to every component, apply it, then work through
    /// whatever follow-ups either side produced.
    async fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        let mut steps = 0usize;
        while let Some(action) = queue.pop_front() {
            steps += 1;
            if steps > MAX_CHAIN {
                warn!("dropping action chain after {} steps at {:?}", MAX_CHAIN, action);
                break;
            }
            queue.extend(self.broadcast(&action));
            queue.extend(self.apply_action(action).await);
        }
    }

    fn broadcast(&mut self, action: &Action) -> Vec<Action> {
        let s = &self.state;
        let mut secondary = Vec::new();
        secondary.extend(self.song_list.on_action(action, s));
        secondary.extend(self.cover_grid.on_action(action, s));
        secondary.extend(self.news_panel.on_action(action, s));
        secondary.extend(self.news_detail.on_action(action, s));
        secondary.extend(self.upload_form.on_action(action, s));
        secondary.extend(self.news_form.on_action(action, s));
        secondary.extend(self.login_prompt.on_action(action, s));
        secondary.extend(self.log_panel.on_action(action, s));
        secondary.extend(self.help_overlay.on_action(action, s));
        secondary
    }

    /// Apply an action to App-owned state.  Returns follow-up actions.
    async fn apply_action(&mut self, action: Action) -> Vec<Action> {
        debug!("apply_action: {:?}", action);
        match action {
            // ── Playback ──────────────────────────────────────────────────────
            Action::TogglePlay(id) => {
                let commands = self.state.library.playback_mut().toggle(&id);
                self.send_media(commands).await;
            }
            Action::Seek(id, secs) => {
                let commands = self.state.library.playback_mut().seek(&id, secs);
                self.send_media(commands).await;
            }
            Action::SeekBy(id, delta) => {
                let commands = self.state.library.playback_mut().seek_by(&id, delta);
                self.send_media(commands).await;
            }
            Action::AdjustVolume(delta) => {
                let commands = self.state.library.playback_mut().adjust_volume(delta);
                self.send_media(commands).await;
            }

            // ── Library ───────────────────────────────────────────────────────
            Action::SetFilter(filter) => {
                self.state.library.set_filter(filter);
                self.state.bump_songs();
            }
            Action::SelectCover(id) => {
                let commands = self.state.library.select_cover(&id);
                self.state.bump_songs();
                self.sync_focus_ring();
                self.focus.set(ComponentId::SongList);
                self.send_media(commands).await;
            }
            Action::SwitchView(view) => {
                if view == self.state.library.view() {
                    return vec![];
                }
                if let Err(e) = self.state.library.set_view(view) {
                    self.toast.warning(format!("{}: press a to log in", e));
                    return vec![];
                }
                return self.on_view_changed();
            }
            Action::RefreshSongs => self.refresh_songs(true),

            // ── Admin ─────────────────────────────────────────────────────────
            Action::OpenLogin => self.state.input_mode = InputMode::Input,
            Action::CloseLogin => self.state.input_mode = InputMode::Normal,
            Action::Login(password) => match self.state.library.login(&password) {
                Ok(()) => {
                    self.toast.success("admin mode on (local gate only)");
                    let mut follow = vec![Action::CloseLogin];
                    follow.extend(self.on_view_changed());
                    return follow;
                }
                Err(e) => self.toast.warning(e.to_string()),
            },
            Action::Logout => {
                self.state.library.logout();
                self.toast.info("admin mode off");
                return self.on_view_changed();
            }

            // ── Upload ────────────────────────────────────────────────────────
            Action::SubmitUpload(form) => {
                *self.state.library.upload_form_mut() = form;
                match self.state.library.upload_form().validate() {
                    Ok(request) => self.start_upload(request),
                    Err(e) => self.toast.error(e.to_string()),
                }
            }
            Action::UploadCleared => self.state.library.upload_form_mut().clear(),

            // ── News ──────────────────────────────────────────────────────────
            Action::RefreshNews => self.refresh_news(),
            Action::CycleNewsFilter => {
                if let Some(ticket) = self.state.news.cycle_filter() {
                    self.spawn_news_fetch(ticket);
                }
            }
            Action::SetNewsFilter(filter) => {
                if let Some(ticket) = self.state.news.set_filter(filter) {
                    self.spawn_news_fetch(ticket);
                }
            }
            Action::NewsNext => self.state.news.select_next(),
            Action::NewsPrev => self.state.news.select_prev(),
            Action::OpenDetail => {
                if self.state.news.open_detail() {
                    if let Some(post) = self.state.news.detail_post() {
                        let id = post.id.clone();
                        self.spawn_api(move |api| async move {
                            AppMessage::PostFetched(api.get_news_post(&id).await.map_err(|e| e.to_string()))
                        });
                    }
                }
            }
            Action::CloseDetail => self.state.news.close_detail(),
            Action::DeletePost(id) => {
                if !self.state.library.is_admin() {
                    self.toast.warning("admin mode required");
                    return vec![];
                }
                self.toast.spinner("deleting post…");
                self.spawn_api(move |api| async move {
                    let result = api.delete_news_post(&id).await.map_err(|e| e.to_string());
                    AppMessage::PostDeleted(id, result)
                });
            }
            Action::SubmitNews(draft) => match draft.validate() {
                Ok(submission) => self.start_news_post(submission),
                Err(e) => self.toast.error(e.to_string()),
            },
            Action::NewsFormCleared => {}

            // ── Input modes ───────────────────────────────────────────────────
            Action::OpenFilter => self.state.input_mode = InputMode::Filter,
            Action::BeginInput => self.state.input_mode = InputMode::Input,
            Action::CloseFilter | Action::EndInput => self.state.input_mode = InputMode::Normal,

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),

            // ── UI ────────────────────────────────────────────────────────────
            Action::ToggleLogs => {
                self.sync_focus_ring();
                if self.log_panel.expanded {
                    self.reload_tui_log();
                    self.focus.set(ComponentId::LogPanel);
                }
            }
            Action::ToggleHelp => {}
            Action::Toast(severity, message) => self.toast.push(severity, message),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => {
                self.save_persistent_state();
                if self.player_tx.send(PlayerInput::Shutdown).await.is_err() {
                    debug!("player core already gone");
                }
                self.should_quit = true;
            }
            Action::Resize(_, _) => {}
        }
        vec![]
    }

    // ── Views and focus ───────────────────────────────────────────────────────

    fn focus_items(&self) -> Vec<ComponentId> {
        let mut items = match self.state.library.view() {
            View::Songs => vec![ComponentId::SongList],
            View::Covers => vec![ComponentId::CoverGrid],
            View::News => vec![ComponentId::NewsPanel],
            View::Upload => vec![ComponentId::UploadForm, ComponentId::NewsForm],
        };
        if self.log_panel.expanded {
            items.push(ComponentId::LogPanel);
        }
        items
    }

    fn sync_focus_ring(&mut self) {
        let items = self.focus_items();
        self.focus.set_items(items);
    }

    /// Called after the library's view changed.  Starts the fetches the new
    /// view needs and returns follow-up actions.
    fn on_view_changed(&mut self) -> Vec<Action> {
        self.sync_focus_ring();
        let mut follow = Vec::new();
        if self.state.input_mode == InputMode::Filter {
            follow.push(Action::CloseFilter);
        }
        match self.state.library.view() {
            View::News if self.state.news.posts().is_empty() => self.refresh_news(),
            View::Upload => {
                self.spawn_api(|api| async move {
                    AppMessage::TagsLoaded(api.list_news_tags().await.map_err(|e| e.to_string()))
                });
                if self.state.news.categories().is_empty() {
                    self.spawn_api(|api| async move {
                        AppMessage::CategoriesLoaded(
                            api.list_news_categories().await.map_err(|e| e.to_string()),
                        )
                    });
                }
            }
            _ => {}
        }
        follow
    }

    fn detail_open(&self) -> bool {
        self.state.library.view() == View::News && self.state.news.detail_post().is_some()
    }

    /// Song the global play/seek keys act on: the active one, else whatever
    /// the backend last loaded.
    fn current_song(&self) -> Option<String> {
        let playback = self.state.library.playback();
        playback.current().or_else(|| playback.loaded()).map(str::to_string)
    }

    // ── Background work ───────────────────────────────────────────────────────

    /// Run an API call on the runtime and post its result back to the loop.
    fn spawn_api<F, Fut>(&self, job: F)
    where
        F: FnOnce(ado_core::api::ApiClient) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = AppMessage> + Send + 'static,
    {
        let Some(tx) = self.tx.clone() else {
            warn!("spawn_api called before the event loop started");
            return;
        };
        let api = self.state.api.clone();
        tokio::spawn(async move {
            let msg = job(api).await;
            if tx.send(msg).await.is_err() {
                debug!("app loop gone, dropping API result");
            }
        });
    }

    /// `force` skips the local cache.
    fn refresh_songs(&mut self, force: bool) {
        let ticket = self.state.library.begin_refresh();
        self.spawn_song_fetch(ticket, force);
    }

    fn spawn_song_fetch(&self, ticket: Ticket, force: bool) {
        self.spawn_api(move |api| async move {
            let result = if force { api.fetch_songs().await } else { api.list_songs().await };
            AppMessage::SongsLoaded(ticket, result.map_err(|e| e.to_string()))
        });
    }

    fn refresh_news(&mut self) {
        let ticket = self.state.news.begin_fetch();
        self.spawn_news_fetch(ticket);
    }

    /// Fetch posts for the current filter, plus the category list the first
    /// time round.
    fn spawn_news_fetch(&self, ticket: Ticket) {
        let filter = self.state.news.filter().clone();
        let want_categories = self.state.news.categories().is_empty();
        let Some(tx) = self.tx.clone() else {
            return;
        };
        let api = self.state.api.clone();
        tokio::spawn(async move {
            let posts = if want_categories {
                let (posts, categories) =
                    futures_util::future::join(api.list_news(&filter), api.list_news_categories()).await;
                let _ = tx
                    .send(AppMessage::CategoriesLoaded(categories.map_err(|e| e.to_string())))
                    .await;
                posts
            } else {
                api.list_news(&filter).await
            };
            let _ = tx
                .send(AppMessage::NewsLoaded(ticket, posts.map_err(|e| e.to_string())))
                .await;
        });
    }

    fn start_upload(&mut self, request: UploadRequest) {
        self.state.library.set_uploading(true);
        self.toast.spinner(format!("uploading \"{}\"…", request.title));
        self.spawn_api(move |api| async move {
            AppMessage::UploadFinished(api.upload_song(&request).await.map_err(|e| e.to_string()))
        });
    }

    fn start_news_post(&mut self, submission: NewsSubmission) {
        self.state.news_submitting = true;
        self.toast.spinner("posting news…");
        self.spawn_api(move |api| async move {
            AppMessage::NewsCreated(api.create_news_post(&submission).await.map_err(|e| e.to_string()))
        });
    }

    async fn send_media(&self, commands: Vec<MediaCommand>) {
        for cmd in commands {
            if let Err(e) = self.player_tx.send(PlayerInput::Command(cmd)).await {
                error!("player core unreachable: {}", e);
                return;
            }
        }
    }

    fn save_persistent_state(&self) {
        let state = PersistentState {
            volume: Some(self.state.library.playback().volume()),
            filter: self.state.library.filter(),
        };
        if let Err(e) = state.save() {
            warn!("failed to save UI state: {}", e);
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let log_h = if self.log_panel.expanded { 10u16 } else { 1 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(1),
            ])
            .split(area);
        let (header_area, sep_area, body_area, log_area, status_area) =
            (outer[0], outer[1], outer[2], outer[3], outer[4]);

        self.header.draw(frame, header_area, &self.state);
        status_bar::draw_separator(frame, sep_area);

        let mut areas = PaneAreas {
            body: body_area,
            log_panel: log_area,
            ..PaneAreas::default()
        };
        let s = &self.state;
        match s.library.view() {
            View::Songs => {
                areas.song_list = body_area;
                let focused = self.focus.is_focused(ComponentId::SongList);
                self.song_list.draw(frame, body_area, focused, s);
            }
            View::Covers => {
                areas.cover_grid = body_area;
                let focused = self.focus.is_focused(ComponentId::CoverGrid);
                self.cover_grid.draw(frame, body_area, focused, s);
            }
            View::News => {
                areas.news_panel = body_area;
                let focused = self.focus.is_focused(ComponentId::NewsPanel);
                self.news_panel.draw(frame, body_area, focused, s);
                if s.news.detail_post().is_some() {
                    self.news_detail.draw(frame, body_area, true, s);
                }
            }
            View::Upload => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .split(body_area);
                areas.upload_form = cols[0];
                areas.news_form = cols[1];
                let upload_focused = self.focus.is_focused(ComponentId::UploadForm);
                let news_focused = self.focus.is_focused(ComponentId::NewsForm);
                self.upload_form.draw(frame, cols[0], upload_focused, s);
                self.news_form.draw(frame, cols[1], news_focused, s);
            }
        }

        let log_focused = self.focus.is_focused(ComponentId::LogPanel);
        self.log_panel.draw(frame, log_area, log_focused, s);

        status_bar::draw_keys_bar(
            frame,
            status_area,
            s.input_mode,
            s.library.view(),
            s.library.playback().volume(),
        );

        self.pane_areas = areas;

        // ── Overlays (on top of everything) ───────────────────────────────────
        self.login_prompt.draw(frame, area, true, s);
        self.help_overlay.draw(frame, area, false, s);
        self.toast.draw(frame, area);
    }

    // ── Log ───────────────────────────────────────────────────────────────────

    /// Read the last lines of the log file into `state.tui_log_lines`.
    fn reload_tui_log(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.state.log_path) {
            let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
            let start = lines.len().saturating_sub(LOG_TAIL_LINES);
            self.state.tui_log_lines = lines[start..].to_vec();
        }
    }
}
