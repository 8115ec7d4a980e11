//! Error types for the API client, upload validation and the admin gate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Client-side upload validation failures.  None of these reach the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("a title is required")]
    EmptyTitle,

    #[error("an audio file is required")]
    MissingAudio,

    #[error("audio file not found: {0}")]
    AudioNotFound(PathBuf),

    #[error("only MP3 audio files can be uploaded")]
    UnsupportedAudio,

    #[error("cover art must be a JPG or PNG image")]
    UnsupportedCover,

    #[error("cover file not found: {0}")]
    CoverNotFound(PathBuf),
}

/// News creation form validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("a title is required")]
    EmptyTitle,

    #[error("content is required")]
    EmptyContent,

    #[error("a category is required")]
    MissingCategory,

    #[error("image must be JPG, PNG or WebP")]
    UnsupportedImage,

    #[error("image file not found: {0}")]
    ImageNotFound(PathBuf),
}

/// Admin gate failures.  The gate is cosmetic; see `Library::login`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("wrong password")]
    WrongPassword,

    #[error("admin mode required")]
    AdminRequired,
}
