//! Action enum: every user intent and internal event that flows through the App.

use ado_core::library::{SongFilter, View};
use ado_core::news::{NewsDraft, NewsFilter};
use ado_core::upload::UploadForm;

use crate::widgets::toast::Severity;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    SongList,
    CoverGrid,
    NewsPanel,
    NewsDetail,
    UploadForm,
    NewsForm,
    LoginPrompt,
    LogPanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App applies them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay(String),
    Seek(String, f64),
    SeekBy(String, f64),
    AdjustVolume(f32),

    // ── Library ──────────────────────────────────────────────────────────────
    SetFilter(SongFilter),
    SelectCover(String),
    SwitchView(View),
    RefreshSongs,

    // ── Admin (cosmetic gate) ────────────────────────────────────────────────
    OpenLogin,
    Login(String),
    CloseLogin,
    Logout,

    // ── Upload ───────────────────────────────────────────────────────────────
    SubmitUpload(UploadForm),
    UploadCleared,

    // ── News ─────────────────────────────────────────────────────────────────
    RefreshNews,
    CycleNewsFilter,
    SetNewsFilter(NewsFilter),
    NewsNext,
    NewsPrev,
    OpenDetail,
    CloseDetail,
    DeletePost(String),
    SubmitNews(NewsDraft),
    NewsFormCleared,

    // ── Input modes ──────────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,
    BeginInput,
    EndInput,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── UI ───────────────────────────────────────────────────────────────────
    CopyToClipboard(String),
    ToggleHelp,
    ToggleLogs,
    Toast(Severity, String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
}
