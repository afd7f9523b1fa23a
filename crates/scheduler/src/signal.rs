use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

/// Creates the two ends of the "request a render" signal.
///
/// At most one request is pending at a time; further requests made before
/// the render side wakes up coalesce into it.
pub fn render_channel() -> (RenderSignal, RenderRequests) {
    let (tx, rx) = bounded(1);
    (RenderSignal { tx }, RenderRequests { rx })
}

/// Sending half, handed to background producers.
#[derive(Debug, Clone)]
pub struct RenderSignal {
    tx: Sender<()>,
}

impl RenderSignal {
    /// Asks for a render without blocking. Returns `false` once the render
    /// side has gone away.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWake {
    Requested,
    TimedOut,
    /// Every [`RenderSignal`] has been dropped.
    Closed,
}

/// Receiving half, owned by the render loop.
#[derive(Debug)]
pub struct RenderRequests {
    rx: Receiver<()>,
}

impl RenderRequests {
    /// Consumes a pending request, if any.
    pub fn try_take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> RenderWake {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => RenderWake::Requested,
            Err(RecvTimeoutError::Timeout) => RenderWake::TimedOut,
            Err(RecvTimeoutError::Disconnected) => RenderWake::Closed,
        }
    }
}
