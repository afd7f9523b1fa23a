use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use scheduler::RenderSignal;
use tracing::{debug, error, trace};

use crate::cell::StateHandle;

/// State that can absorb ingested samples.
pub trait IngestTarget: Default + Send + 'static {
    fn with_sample(self, value: f64) -> Self;

    /// Records a terminal read failure so the owner can show it.
    fn with_failure(self, _message: String) -> Self {
        self
    }
}

impl IngestTarget for Vec<f64> {
    fn with_sample(mut self, value: f64) -> Self {
        self.push(value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The source reached end-of-stream.
    Finished,
    /// `stop()` was called, or the state owner went away.
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub lines: u64,
    pub applied: u64,
    pub skipped: u64,
    pub outcome: IngestOutcome,
}

/// Flags shared with exactly one read loop. A fresh set is created for every
/// `start()`, so a cancellation can never reach a later run.
#[derive(Debug, Default)]
struct RunFlags {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl RunFlags {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

struct Run {
    flags: Arc<RunFlags>,
    handle: JoinHandle<IngestSummary>,
}

/// Reads numbers line by line on a background thread and feeds them into a
/// [`crate::StateCell`] through its handle.
pub struct IngestWorker<T> {
    state: StateHandle<T>,
    signal: RenderSignal,
    run: Option<Run>,
}

impl<T: IngestTarget> IngestWorker<T> {
    pub fn new(state: StateHandle<T>, signal: RenderSignal) -> Self {
        Self {
            state,
            signal,
            run: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        match &self.run {
            Some(run) if !run.flags.is_finished() => WorkerState::Active,
            _ => WorkerState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Active
    }

    /// Starts reading `source`. Does nothing and returns `Ok(false)` while a
    /// read loop is already active; `source` is dropped in that case.
    pub fn start<R>(&mut self, source: R) -> io::Result<bool>
    where
        R: BufRead + Send + 'static,
    {
        if self.is_active() {
            debug!("ingest already active; ignoring start");
            return Ok(false);
        }

        let flags = Arc::new(RunFlags::default());
        let handle = {
            let flags = Arc::clone(&flags);
            let state = self.state.clone();
            let signal = self.signal.clone();
            thread::Builder::new()
                .name("livecanvas-ingest".into())
                .spawn(move || read_loop(source, &flags, &state, &signal))?
        };
        debug!("ingest started");
        self.run = Some(Run { flags, handle });
        Ok(true)
    }

    /// Cancels the current run and forgets its flags.
    ///
    /// The read loop notices on its next line; a loop blocked on a quiet
    /// source stays parked until then. The returned handle can be joined to
    /// wait for it.
    pub fn stop(&mut self) -> Option<JoinHandle<IngestSummary>> {
        let run = self.run.take()?;
        run.flags.cancel();
        debug!("ingest stopped");
        Some(run.handle)
    }

    /// Blocks until the current run ends and returns what it did.
    pub fn join(&mut self) -> Option<IngestSummary> {
        let run = self.run.take()?;
        match run.handle.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                error!("ingest thread panicked");
                Some(IngestSummary {
                    lines: 0,
                    applied: 0,
                    skipped: 0,
                    outcome: IngestOutcome::Failed("ingest thread panicked".into()),
                })
            }
        }
    }
}

impl<T> Drop for IngestWorker<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.flags.cancel();
        }
    }
}

fn read_loop<R, T>(
    mut source: R,
    flags: &RunFlags,
    state: &StateHandle<T>,
    signal: &RenderSignal,
) -> IngestSummary
where
    R: BufRead,
    T: IngestTarget,
{
    let mut summary = IngestSummary {
        lines: 0,
        applied: 0,
        skipped: 0,
        outcome: IngestOutcome::Finished,
    };
    let mut buf = Vec::new();

    summary.outcome = loop {
        buf.clear();
        let read = source.read_until(b'\n', &mut buf);
        if flags.is_cancelled() {
            break IngestOutcome::Cancelled;
        }
        match read {
            Ok(0) => break IngestOutcome::Finished,
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                let message = format!("failed to read input: {err}");
                error!(%err, "ingest source failed");
                let reported = message.clone();
                state.send(move |current: T| current.with_failure(reported));
                signal.request();
                break IngestOutcome::Failed(message);
            }
        }
        summary.lines += 1;

        let line = String::from_utf8_lossy(&buf);
        let text = line.trim();
        match text.parse::<f64>() {
            // `NaN` and `inf` parse, but cannot be plotted or averaged; they
            // are skipped like any other unusable line.
            Ok(value) if value.is_finite() => {
                if !state.send(move |current: T| current.with_sample(value)) {
                    debug!("state owner dropped; ending ingest");
                    break IngestOutcome::Cancelled;
                }
                summary.applied += 1;
                signal.request();
            }
            _ => {
                summary.skipped += 1;
                trace!(line = text, "skipping non-numeric input");
            }
        }
    };

    flags.finished.store(true, Ordering::Release);
    debug!(
        lines = summary.lines,
        applied = summary.applied,
        skipped = summary.skipped,
        outcome = ?summary.outcome,
        "ingest loop ended"
    );
    summary
}
