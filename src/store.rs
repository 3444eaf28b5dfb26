//! Event files in the working tree
//!
//! Events live under `events/` at the repository root: one markdown file per
//! event and, when media is attached, a sibling directory holding the copies.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

use crate::error::LifelineError;
use crate::model::{EventRecord, EventSummary};

/// Directory holding event files, relative to the repository root
pub const EVENTS_DIR: &str = "events";

/// Reads and writes event files below a repository root
#[derive(Debug, Clone)]
pub struct EventStore {
    root: PathBuf,
}

impl EventStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join(EVENTS_DIR)
    }

    /// Repository-relative path of the event file
    pub fn path_for(&self, event: &EventRecord) -> PathBuf {
        Path::new(EVENTS_DIR).join(event.filename())
    }

    /// Repository-relative path of the event's media directory
    pub fn media_dir_for(&self, event: &EventRecord) -> PathBuf {
        Path::new(EVENTS_DIR).join(event.media_dir_name())
    }

    /// Fail with [`LifelineError::DuplicateEvent`] if the event file exists
    pub fn ensure_absent(&self, event: &EventRecord) -> Result<(), LifelineError> {
        let path = self.path_for(event);
        if self.root.join(&path).exists() {
            return Err(LifelineError::DuplicateEvent(path));
        }
        Ok(())
    }

    /// Copy media and write the event file
    ///
    /// Returns the repository-relative paths written, ready to stage. On
    /// failure everything written by this call is removed again.
    pub fn write(&self, event: &EventRecord) -> Result<Vec<PathBuf>, LifelineError> {
        self.ensure_absent(event)?;
        fs::create_dir_all(self.events_dir())?;

        let mut written = scopeguard::guard(Vec::<PathBuf>::new(), |paths| {
            remove_written(&self.root, &paths);
        });

        if !event.media.is_empty() {
            let media_dir = self.media_dir_for(event);
            let created = !self.root.join(&media_dir).exists();
            fs::create_dir_all(self.root.join(&media_dir))?;
            if created {
                written.push(media_dir.clone());
            }
            for (source, name) in event.media.iter().zip(event.media_names()) {
                let target = media_dir.join(&name);
                fs::copy(source, self.root.join(&target))?;
                debug!(from = %source.display(), to = %target.display(), "copied media");
                written.push(target);
            }
        }

        let path = self.path_for(event);
        fs::write(
            self.root.join(&path),
            event.to_markdown(Path::new(EVENTS_DIR)),
        )?;
        written.push(path);

        // Staging takes files only; the media directory comes along with them
        let written = ScopeGuard::into_inner(written);
        Ok(written
            .into_iter()
            .filter(|p| !self.root.join(p).is_dir())
            .collect())
    }

    /// Remove files written for `event` that never made it into a commit
    ///
    /// `paths` are the ones [`EventStore::write`] returned. The media
    /// directory goes too once it is empty.
    pub fn discard(&self, event: &EventRecord, paths: &[PathBuf]) {
        let mut written = paths.to_vec();
        if !event.media.is_empty() {
            written.insert(0, self.media_dir_for(event));
        }
        remove_written(&self.root, &written);
    }

    /// Every readable event file, sorted by date then file name
    ///
    /// Files without valid front matter are skipped.
    pub fn list(&self) -> Result<Vec<EventSummary>, LifelineError> {
        let dir = self.events_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "md") || !path.is_file() {
                continue;
            }
            let Some(file) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            match EventSummary::from_markdown(&file, &content) {
                Some(summary) => events.push(summary),
                None => debug!(file = %file, "skipping file without event front matter"),
            }
        }
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.file.cmp(&b.file)));
        Ok(events)
    }
}

/// Delete `paths` below `root` in reverse order of creation
///
/// Directories are only removed when empty.
fn remove_written(root: &Path, paths: &[PathBuf]) {
    for path in paths.iter().rev() {
        let full = root.join(path);
        let removed = if full.is_dir() {
            fs::remove_dir(&full)
        } else {
            fs::remove_file(&full)
        };
        match removed {
            Ok(()) => debug!(path = %path.display(), "removed uncommitted file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %full.display(), %err, "could not clean up event files"),
        }
    }
}
