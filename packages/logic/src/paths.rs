//! File naming convention linking view files to their companion logic files.
//!
//! `Home.view.vrn` pairs with `Home.logic.js` or `Home.logic.ts` in the same
//! directory.

use std::path::{Path, PathBuf};

pub const VIEW_SUFFIX: &str = ".view.vrn";
pub const LOGIC_SUFFIXES: [&str; 2] = [".logic.js", ".logic.ts"];

pub fn is_view_file(path: &Path) -> bool {
    path.to_str()
        .map(|s| s.ends_with(VIEW_SUFFIX))
        .unwrap_or(false)
}

pub fn is_logic_file(path: &Path) -> bool {
    path.to_str()
        .map(|s| LOGIC_SUFFIXES.iter().any(|suffix| s.ends_with(suffix)))
        .unwrap_or(false)
}

/// Probe sibling paths for the logic file companion to `view_path`, returning
/// the first that exists on disk
pub fn find_corresponding_logic_file(view_path: &Path) -> Option<PathBuf> {
    let base = view_path.to_str()?.strip_suffix(VIEW_SUFFIX)?;

    for suffix in LOGIC_SUFFIXES {
        let candidate = PathBuf::from(format!("{}{}", base, suffix));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Map a logic-file path back to its owning view-file path. Pure suffix swap;
/// the result is not checked for existence.
pub fn view_file_for_logic_file(logic_path: &Path) -> Option<PathBuf> {
    let text = logic_path.to_str()?;
    for suffix in LOGIC_SUFFIXES {
        if let Some(base) = text.strip_suffix(suffix) {
            return Some(PathBuf::from(format!("{}{}", base, VIEW_SUFFIX)));
        }
    }
    None
}
