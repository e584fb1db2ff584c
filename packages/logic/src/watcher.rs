//! Re-analysis of logic files on external modification.
//!
//! Thin pass-through to the host file-watching facility: each watched path
//! gets its own watcher, and a modification re-runs `analyze` and delivers
//! the fresh contract through the registered callback. Analysis failures are
//! logged and the callback is not invoked, so the consumer keeps its previous
//! good contract.

use crate::analyzer::{self, LogicContract};
use crate::error::AnalysisResult;
use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct LogicWatcher {
    watchers: HashMap<PathBuf, RecommendedWatcher>,
}

impl LogicWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `path`, re-analyzing on every modification. Registering a path
    /// that is already watched is a no-op.
    pub fn watch<F>(&mut self, path: &Path, callback: F) -> AnalysisResult<()>
    where
        F: Fn(LogicContract) + Send + 'static,
    {
        if self.watchers.contains_key(path) {
            return Ok(());
        }

        let watched = path.to_path_buf();
        let mut watcher = recommended_watcher(move |event: Result<Event, notify::Error>| {
            match event {
                Ok(event) if event.kind.is_modify() => {
                    match analyzer::analyze_file(&watched) {
                        Ok(contract) => callback(contract),
                        Err(err) => {
                            tracing::error!(path = %watched.display(), error = %err, "logic re-analysis failed");
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "logic watch error");
                }
            }
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        self.watchers.insert(path.to_path_buf(), watcher);
        Ok(())
    }

    pub fn unwatch(&mut self, path: &Path) {
        self.watchers.remove(path);
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watchers.contains_key(path)
    }

    pub fn clear(&mut self) {
        self.watchers.clear();
    }
}
