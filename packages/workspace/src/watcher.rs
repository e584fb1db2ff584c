//! Recursive project watcher feeding external change notifications into the
//! session.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// What happened to a watched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Created,
    Changed,
    Deleted,
}

/// Map a raw notification to a change kind and the paths it covers.
/// Access and metadata-only events are dropped.
pub fn classify_event(event: &Event) -> Option<(FileChangeKind, &[PathBuf])> {
    let kind = match event.kind {
        EventKind::Create(_) => FileChangeKind::Created,
        EventKind::Modify(_) => FileChangeKind::Changed,
        EventKind::Remove(_) => FileChangeKind::Deleted,
        _ => return None,
    };
    Some((kind, &event.paths))
}

pub struct FileWatcher {
    // Held so the watch registration stays alive
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new(root: &Path) -> Result<Self, WatcherError> {
        let (sender, receiver) = channel();
        let mut watcher = notify::recommended_watcher(move |event| {
            let _ = sender.send(event);
        })
        .map_err(|source| WatcherError::Watch {
            path: root.to_path_buf(),
            source,
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatcherError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        Ok(Self {
            _watcher: watcher,
            receiver,
        })
    }

    /// Block until the next filesystem event. Returns None when the watch
    /// backend has shut down.
    pub fn next_event(&self) -> Option<notify::Result<Event>> {
        self.receiver.recv().ok()
    }

    pub fn try_next_event(&self) -> Option<notify::Result<Event>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        let mut event = Event::new(kind);
        event.paths.push(PathBuf::from(path));
        event
    }

    #[test]
    fn test_classify_create_modify_remove() {
        let created = event(EventKind::Create(CreateKind::File), "/a.view.vrn");
        assert_eq!(
            classify_event(&created).map(|(kind, _)| kind),
            Some(FileChangeKind::Created)
        );

        let changed = event(EventKind::Modify(ModifyKind::Any), "/a.view.vrn");
        assert_eq!(
            classify_event(&changed).map(|(kind, _)| kind),
            Some(FileChangeKind::Changed)
        );

        let deleted = event(EventKind::Remove(RemoveKind::File), "/a.view.vrn");
        assert_eq!(
            classify_event(&deleted).map(|(kind, _)| kind),
            Some(FileChangeKind::Deleted)
        );
    }

    #[test]
    fn test_access_events_ignored() {
        let accessed = event(EventKind::Access(notify::event::AccessKind::Any), "/a.view.vrn");
        assert!(classify_event(&accessed).is_none());
    }

    #[test]
    fn test_watch_and_receive() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = FileWatcher::new(dir.path()).unwrap();

        std::fs::write(dir.path().join("Home.view.vrn"), "export default () => <></>;")
            .unwrap();

        // Backends may coalesce or reorder, so just wait for any event
        let mut saw_event = false;
        for _ in 0..50 {
            if watcher.try_next_event().is_some() {
                saw_event = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        assert!(saw_event);
    }
}
