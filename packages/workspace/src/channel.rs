//! Abstract duplex channel between the session and one client.
//!
//! The session only ever pushes `ServerEvent`s; the concrete transport
//! (socket, editor webview bridge, test harness) lives behind this trait.

use crate::protocol::ServerEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub trait Channel: Send {
    /// Deliver one event to the client. Delivery to a closed or gone client
    /// is silently dropped; the session never blocks on a slow consumer.
    fn send(&self, event: ServerEvent);

    fn close(&self);
}

/// In-process channel backed by an unbounded tokio sender
pub struct MpscChannel {
    sender: UnboundedSender<ServerEvent>,
    closed: Arc<AtomicBool>,
}

impl MpscChannel {
    pub fn pair() -> (Self, UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                closed: Arc::new(AtomicBool::new(false)),
            },
            receiver,
        )
    }
}

impl Channel for MpscChannel {
    fn send(&self, event: ServerEvent) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        let _ = self.sender.send(event);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}
