pub mod channel;
pub mod components;
pub mod protocol;
pub mod rate_limit;
pub mod session;
pub mod watcher;

pub use channel::{Channel, MpscChannel};
pub use components::{ComponentDefinition, PropDefinition, PropType};
pub use protocol::{ClientRequest, ServerEvent};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use session::{
    ConnectionId, DocumentSession, SessionError, SessionFileState, SessionOptions,
};
pub use watcher::{classify_event, FileChangeKind, FileWatcher, WatcherError};
