use anyhow::{anyhow, Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
};

/// A named, time-stamped marker within one media item's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub time_ms: u64,
    pub name: String,
}

/// Snapshot of one media item's bookmarks, ordered by time. Refreshed
/// wholesale on every store change; never updated in place.
#[derive(Debug, Clone, Default)]
pub struct BookmarkSet {
    entries: Vec<Bookmark>,
}

impl BookmarkSet {
    pub fn from_entries(entries: Vec<Bookmark>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
struct MediaBookmarks {
    key: String,
    title: String,
    bookmarks: Vec<Bookmark>,
}

/// All persisted bookmarks, grouped per media item and backed by a TOML
/// file. The file is the source of truth: every mutation rewrites it and a
/// file watcher lets callers reload it wholesale when it changes on disk.
pub struct BookmarkStore {
    path: PathBuf,
    media: Vec<MediaBookmarks>,
    warnings: Vec<String>,
    watcher: Option<RecommendedWatcher>,
    changes_rx: Option<Receiver<notify::Result<notify::Event>>>,
}

impl BookmarkStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut warnings = Vec::new();
        let media = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read bookmark file: {}", path.display()))?;
            match toml::from_str::<BookmarkDocument>(&data) {
                Ok(doc) => resolve_document(doc, &mut warnings),
                Err(err) => {
                    warnings.push(format!("Failed to parse bookmarks: {err}"));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            media,
            warnings,
            watcher: None,
            changes_rx: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Snapshot of the given media item's bookmarks. Unknown keys yield an
    /// empty set.
    pub fn set_for(&self, media_key: &str) -> BookmarkSet {
        self.media
            .iter()
            .find(|media| media.key == media_key)
            .map(|media| BookmarkSet {
                entries: media.bookmarks.clone(),
            })
            .unwrap_or_default()
    }

    pub fn add(&mut self, media_key: &str, media_title: &str, time_ms: u64) -> Result<()> {
        let idx = match self.media.iter().position(|media| media.key == media_key) {
            Some(idx) => idx,
            None => {
                self.media.push(MediaBookmarks {
                    key: media_key.to_string(),
                    title: media_title.to_string(),
                    bookmarks: Vec::new(),
                });
                self.media.len() - 1
            }
        };
        let media = &mut self.media[idx];

        let name = format!("Bookmark {}", media.bookmarks.len() + 1);
        let insert_at = media
            .bookmarks
            .iter()
            .position(|bookmark| bookmark.time_ms > time_ms)
            .unwrap_or(media.bookmarks.len());
        media.bookmarks.insert(insert_at, Bookmark { time_ms, name });

        self.save()
    }

    pub fn rename(&mut self, media_key: &str, index: usize, name: &str) -> Result<()> {
        let bookmark = self.bookmark_mut(media_key, index)?;
        bookmark.name = name.trim().to_string();
        self.save()
    }

    pub fn delete(&mut self, media_key: &str, index: usize) -> Result<()> {
        let media = self
            .media
            .iter_mut()
            .find(|media| media.key == media_key)
            .ok_or_else(|| anyhow!("No bookmarks for media '{media_key}'"))?;
        if index >= media.bookmarks.len() {
            return Err(anyhow!("No bookmark at index {index} for '{media_key}'"));
        }
        media.bookmarks.remove(index);
        if media.bookmarks.is_empty() {
            self.media.retain(|media| media.key != media_key);
        }
        self.save()
    }

    fn bookmark_mut(&mut self, media_key: &str, index: usize) -> Result<&mut Bookmark> {
        self.media
            .iter_mut()
            .find(|media| media.key == media_key)
            .ok_or_else(|| anyhow!("No bookmarks for media '{media_key}'"))?
            .bookmarks
            .get_mut(index)
            .ok_or_else(|| anyhow!("No bookmark at index {index} for '{media_key}'"))
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create bookmark directory: {}", parent.display())
                })?;
            }
        }

        let doc = DocumentOut {
            media: self
                .media
                .iter()
                .map(|media| MediaOut {
                    key: media.key.clone(),
                    title: media.title.clone(),
                    bookmarks: media
                        .bookmarks
                        .iter()
                        .map(|bookmark| BookmarkOut {
                            time_ms: bookmark.time_ms,
                            name: bookmark.name.clone(),
                        })
                        .collect(),
                })
                .collect(),
        };

        let data = toml::to_string_pretty(&doc).context("Failed to serialize bookmarks")?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write bookmark file: {}", self.path.display()))
    }

    pub fn enable_hot_reload(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            return Err(anyhow!(
                "Bookmark directory {} does not exist",
                parent.display()
            ));
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&parent, RecursiveMode::NonRecursive)?;

        self.changes_rx = Some(rx);
        self.watcher = Some(watcher);
        Ok(())
    }

    pub fn disable_hot_reload(&mut self) {
        self.watcher = None;
        self.changes_rx = None;
    }

    pub fn hot_reload_enabled(&self) -> bool {
        self.watcher.is_some()
    }

    /// Drains pending watcher events and reloads the file wholesale if it
    /// changed. Returns true when a reload happened.
    pub fn poll_changes(&mut self) -> bool {
        let mut events = Vec::new();
        if let Some(rx) = self.changes_rx.as_ref() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        let mut reloaded = false;
        for event in events {
            match event {
                Ok(evt) => {
                    let relevant = evt
                        .paths
                        .iter()
                        .any(|p| p.file_name() == self.path.file_name());
                    if relevant && self.reload() {
                        reloaded = true;
                    }
                }
                Err(err) => log::warn!("Bookmark watcher error: {err}"),
            }
        }

        reloaded
    }

    fn reload(&mut self) -> bool {
        match Self::load(&self.path) {
            Ok(fresh) => {
                self.media = fresh.media;
                self.warnings = fresh.warnings;
                true
            }
            Err(err) => {
                log::warn!("Failed to reload bookmarks: {err:?}");
                false
            }
        }
    }
}

fn resolve_document(doc: BookmarkDocument, warnings: &mut Vec<String>) -> Vec<MediaBookmarks> {
    let mut media = Vec::new();

    for (idx, section) in doc.media.into_iter().enumerate() {
        let Some(key) = section
            .key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        else {
            warnings.push(format!("Media entry #{idx} is missing a key; skipping"));
            continue;
        };

        if media
            .iter()
            .any(|entry: &MediaBookmarks| entry.key == key)
        {
            warnings.push(format!("Duplicate media key '{key}'; skipping"));
            continue;
        }

        let title = section
            .title
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| key.clone());

        let mut bookmarks = Vec::new();
        for (bookmark_idx, raw) in section.bookmarks.into_iter().enumerate() {
            let time_ms = match raw.time_ms {
                Some(time) if time >= 0 => time as u64,
                _ => {
                    warnings.push(format!(
                        "Bookmark #{bookmark_idx} for '{key}' has no valid time; skipping"
                    ));
                    continue;
                }
            };
            let name = raw
                .name
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Bookmark {}", bookmarks.len() + 1));
            bookmarks.push(Bookmark { time_ms, name });
        }
        bookmarks.sort_by_key(|bookmark| bookmark.time_ms);

        media.push(MediaBookmarks {
            key,
            title,
            bookmarks,
        });
    }

    media
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookmarkDocument {
    media: Vec<MediaSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaSection {
    key: Option<String>,
    title: Option<String>,
    bookmarks: Vec<BookmarkSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookmarkSection {
    time_ms: Option<i64>,
    name: Option<String>,
}

#[derive(Serialize)]
struct DocumentOut {
    media: Vec<MediaOut>,
}

#[derive(Serialize)]
struct MediaOut {
    key: String,
    title: String,
    bookmarks: Vec<BookmarkOut>,
}

#[derive(Serialize)]
struct BookmarkOut {
    time_ms: u64,
    name: String,
}

pub fn default_bookmarks_path() -> PathBuf {
    PathBuf::from("bookmarks.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[[media]]
key = "abc"
title = "Some Film"

[[media.bookmarks]]
time_ms = 90000
name = "Reveal"

[[media.bookmarks]]
time_ms = 30000

[[media.bookmarks]]
name = "No time"

[[media]]
title = "Keyless"

[[media]]
key = "abc"
title = "Duplicate"
"#;

    fn store_from(sample: &str) -> (tempfile::TempDir, BookmarkStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bookmarks.toml");
        fs::write(&path, sample).expect("write sample");
        let store = BookmarkStore::load(&path).expect("load store");
        (dir, store)
    }

    #[test]
    fn malformed_entries_are_skipped_with_warnings() {
        let (_dir, store) = store_from(SAMPLE);

        let set = store.set_for("abc");
        assert_eq!(set.len(), 2);
        assert_eq!(set.entries()[0].time_ms, 30000);
        assert_eq!(set.entries()[1].time_ms, 90000);
        assert_eq!(set.entries()[1].name, "Reveal");

        assert_eq!(store.warnings().len(), 3);
    }

    #[test]
    fn sets_are_ordered_by_time() {
        let (_dir, store) = store_from(SAMPLE);
        let set = store.set_for("abc");
        let times: Vec<u64> = set.entries().iter().map(|b| b.time_ms).collect();
        assert_eq!(times, vec![30000, 90000]);
    }

    #[test]
    fn unnamed_bookmarks_get_default_names() {
        let (_dir, store) = store_from(SAMPLE);
        let set = store.set_for("abc");
        assert_eq!(set.entries()[0].name, "Bookmark 2");
    }

    #[test]
    fn unknown_media_key_is_an_empty_set() {
        let (_dir, store) = store_from(SAMPLE);
        assert!(store.set_for("missing").is_empty());
    }

    #[test]
    fn unparsable_file_is_empty_with_warning() {
        let (_dir, store) = store_from("not toml at all [[[");
        assert!(store.set_for("abc").is_empty());
        assert_eq!(store.warnings().len(), 1);
    }
}
