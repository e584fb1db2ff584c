pub mod analyzer;
pub mod error;
pub mod paths;
pub mod watcher;

pub use analyzer::{
    analyze, analyze_file, ActionParameter, LogicAction, LogicContract, LogicState,
};
pub use error::{AnalysisError, AnalysisResult};
pub use paths::{
    find_corresponding_logic_file, is_logic_file, is_view_file, view_file_for_logic_file,
};
pub use watcher::LogicWatcher;
