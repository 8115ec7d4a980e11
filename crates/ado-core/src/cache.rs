//! Time-boxed on-disk cache for the song list.
//!
//! One entry, stored as `{ "ts": <epoch ms>, "data": [Song] }` under a fixed
//! key.  Anything unreadable is a miss; write failures are ignored.  The
//! cache only saves redundant requests, it is never a source of truth.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::Song;

pub const SONG_CACHE_KEY: &str = "songs_cache_v1";
pub const DEFAULT_SONG_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    ts: i64,
    data: Vec<Song>,
}

#[derive(Debug, Clone)]
pub struct SongCache {
    path: PathBuf,
    ttl: Duration,
}

impl SongCache {
    pub fn new(dir: &Path, ttl: Duration) -> Self {
        Self {
            path: dir.join(format!("{}.json", SONG_CACHE_KEY)),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn load(&self) -> Option<Vec<Song>> {
        self.load_at(now_ms())
    }

    /// Cached songs if the entry was written less than `ttl` before `now_ms`.
    pub fn load_at(&self, now_ms: i64) -> Option<Vec<Song>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("song cache: unreadable entry at {:?}: {}", self.path, e);
                return None;
            }
        };

        let age_ms = now_ms - entry.ts;
        if age_ms < self.ttl.as_millis() as i64 {
            debug!("song cache: hit ({} songs, age {}ms)", entry.data.len(), age_ms);
            Some(entry.data)
        } else {
            debug!("song cache: stale (age {}ms)", age_ms);
            None
        }
    }

    pub fn store(&self, songs: &[Song]) {
        self.store_at(songs, now_ms());
    }

    pub fn store_at(&self, songs: &[Song], now_ms: i64) {
        let entry = CacheEntry {
            ts: now_ms,
            data: songs.to_vec(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)?;
                Ok(())
            });
        if let Err(e) = result {
            debug!("song cache: write failed: {}", e);
        }
    }

    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("song cache: cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("song cache: clear failed: {}", e),
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            title: format!("song {}", id),
            audio_url: format!("http://localhost/songs/{}/file", id),
            cover_url: None,
            description: None,
            category: None,
        }
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
        cache.store_at(&[song("a"), song("b")], 1_000_000);

        let nine_minutes = 9 * 60 * 1000;
        let hit = cache.load_at(1_000_000 + nine_minutes).unwrap();
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[1].id, "b");
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
        cache.store_at(&[song("a")], 1_000_000);

        assert!(cache.load_at(1_000_000 + 10 * 60 * 1000).is_none());
        assert!(cache.load_at(1_000_000 + 11 * 60 * 1000).is_none());
    }

    #[test]
    fn test_corrupt_or_missing_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
        assert!(cache.load().is_none());

        std::fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load().is_none());

        std::fs::write(cache.path(), r#"{"ts":"yesterday","data":[]}"#).unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_clear_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SongCache::new(dir.path(), DEFAULT_SONG_TTL);
        cache.store(&[song("a")]);
        assert!(cache.load().is_some());

        cache.clear();
        assert!(cache.load().is_none());
        // clearing twice is fine
        cache.clear();
    }

    #[test]
    fn test_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SongCache::new(&dir.path().join("a").join("b"), DEFAULT_SONG_TTL);
        cache.store(&[song("a")]);
        assert!(cache.path().exists());
    }
}
