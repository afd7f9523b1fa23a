use std::io;
use std::thread;
use std::time::Duration;

use drawconfig::CanvasConfig;

use crate::signal::RenderSignal;

/// Re-requests a render a fixed delay after work was done, so animations
/// keep moving when nothing else asks for a frame.
#[derive(Debug, Clone)]
pub struct WakePacer {
    delay: Duration,
    signal: RenderSignal,
}

impl WakePacer {
    pub fn new(delay: Duration, signal: RenderSignal) -> Self {
        Self { delay, signal }
    }

    pub fn from_config(config: &CanvasConfig, signal: RenderSignal) -> Self {
        Self::new(config.scheduler.wake_delay, signal)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawns a detached thread that sleeps for the delay, then signals.
    pub fn schedule(&self) -> io::Result<()> {
        let delay = self.delay;
        let signal = self.signal.clone();
        thread::Builder::new()
            .name("livecanvas-wake".into())
            .spawn(move || {
                thread::sleep(delay);
                if !signal.request() {
                    tracing::trace!("wake fired after render loop exited");
                }
            })?;
        Ok(())
    }
}
