//! Song upload form and its client-side validation.

use std::path::{Path, PathBuf};

use crate::error::UploadError;
use crate::platform::expand_home;
use crate::protocol::SongCategory;

const AUDIO_EXTENSIONS: &[&str] = &["mp3"];
const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Raw form input as typed.  Kept intact when an upload fails so the user
/// can fix it and retry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub title: String,
    pub audio_path: String,
    pub cover_path: String,
    pub description: String,
    pub category: SongCategory,
}

/// A validated upload, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub title: String,
    pub audio: PathBuf,
    pub cover: Option<PathBuf>,
    pub description: Option<String>,
    pub category: SongCategory,
}

impl UploadForm {
    pub fn validate(&self) -> Result<UploadRequest, UploadError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(UploadError::EmptyTitle);
        }
        if self.audio_path.trim().is_empty() {
            return Err(UploadError::MissingAudio);
        }

        let audio = expand_home(&self.audio_path);
        if !has_extension(&audio, AUDIO_EXTENSIONS) {
            return Err(UploadError::UnsupportedAudio);
        }
        if !audio.is_file() {
            return Err(UploadError::AudioNotFound(audio));
        }

        let cover = if self.cover_path.trim().is_empty() {
            None
        } else {
            let cover = expand_home(&self.cover_path);
            if !has_extension(&cover, COVER_EXTENSIONS) {
                return Err(UploadError::UnsupportedCover);
            }
            if !cover.is_file() {
                return Err(UploadError::CoverNotFound(cover));
            }
            Some(cover)
        };

        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(UploadRequest {
            title: title.to_string(),
            audio,
            cover,
            description,
            category: self.category,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.audio_path.trim().is_empty()
            && self.cover_path.trim().is_empty()
            && self.description.trim().is_empty()
    }
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| allowed.contains(&e.as_str()))
}

/// Content type for a multipart file part, from its extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(dir: &Path) -> UploadForm {
        let audio = dir.join("track.mp3");
        std::fs::write(&audio, b"ID3").unwrap();
        UploadForm {
            title: "  Readymade  ".into(),
            audio_path: audio.display().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_title_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = form_with(dir.path());
        form.title = "   ".into();
        assert_eq!(form.validate(), Err(UploadError::EmptyTitle));
    }

    #[test]
    fn test_missing_audio_rejected() {
        let form = UploadForm {
            title: "Gira Gira".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(UploadError::MissingAudio));
    }

    #[test]
    fn test_audio_must_be_mp3_and_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = form_with(dir.path());
        form.audio_path = dir.path().join("track.wav").display().to_string();
        assert_eq!(form.validate(), Err(UploadError::UnsupportedAudio));

        let missing = dir.path().join("nope.MP3");
        form.audio_path = missing.display().to_string();
        assert_eq!(form.validate(), Err(UploadError::AudioNotFound(missing)));
    }

    #[test]
    fn test_cover_extension_checked() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = form_with(dir.path());
        let gif = dir.path().join("cover.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        form.cover_path = gif.display().to_string();
        assert_eq!(form.validate(), Err(UploadError::UnsupportedCover));
    }

    #[test]
    fn test_valid_form_trims_and_drops_empty_description() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = form_with(dir.path());
        let png = dir.path().join("cover.PNG");
        std::fs::write(&png, b"\x89PNG").unwrap();
        form.cover_path = png.display().to_string();
        form.description = "   ".into();
        form.category = SongCategory::Cover;

        let req = form.validate().unwrap();
        assert_eq!(req.title, "Readymade");
        assert_eq!(req.cover, Some(png));
        assert_eq!(req.description, None);
        assert_eq!(req.category, SongCategory::Cover);
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.MP3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a")), "application/octet-stream");
    }
}
