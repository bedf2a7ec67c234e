// Lovi - app/scheduler.rs
//
// Drives every monitor session from a single background thread.
//
// Architecture:
//   - `MonitorManager` lives on the UI thread; `run_scheduler` runs on a
//     background thread that exclusively owns the `MonitorRegistry`.
//   - Commands (open, close, filter change) travel UI -> scheduler over one
//     mpsc channel; `MonitorProgress` messages travel back over another. The
//     UI thread polls the progress channel each frame.
//   - Two timers run on the same thread: the poll tick (default 1 s) ticks
//     every session in turn, and the change check (default 3 s) consumes all
//     changed flags into one `Changed` batch. Sharing the thread means the
//     read-and-clear of a changed flag can never race with a tick.
//   - Commands are applied between ticks, so closing a session can never
//     release a handle a tick is still using.
//   - An `Arc<AtomicBool>` cancel flag stops the thread; it wakes at least
//     every SCHEDULER_SLICE_MS to check it.
//
// Failure handling:
//   - A failing poll on one file never stops the others. The failure is
//     reported once (`ReadFailed`) and again only after the file has polled
//     successfully in between; the UI decides whether to close the session.

use crate::app::registry::MonitorRegistry;
use crate::core::classify::FilterMarkers;
use crate::core::model::{MonitorProgress, SessionId};
use crate::platform::config::MonitorSettings;
use crate::util::constants::SCHEDULER_SLICE_MS;
use crate::util::error::MonitorError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// =============================================================================
// Commands
// =============================================================================

/// Requests sent from the UI thread to the scheduler thread.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Open a file. The outcome is sent back on `reply`.
    Open {
        path: PathBuf,
        reply: mpsc::Sender<Result<SessionId, MonitorError>>,
    },
    Close {
        id: SessionId,
    },
    SetFilters(FilterMarkers),
}

// =============================================================================
// MonitorManager
// =============================================================================

/// Owns the scheduler thread and exposes a non-blocking poll interface,
/// mirroring the rest of the app layer's background managers.
pub struct MonitorManager {
    progress_rx: Option<mpsc::Receiver<MonitorProgress>>,
    command_tx: Option<mpsc::Sender<MonitorCommand>>,
    cancel_flag: Option<Arc<AtomicBool>>,
    worker: Option<JoinHandle<()>>,
}

impl MonitorManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            command_tx: None,
            cancel_flag: None,
            worker: None,
        }
    }

    /// Spawn the scheduler thread. A running scheduler is stopped first,
    /// closing all of its sessions.
    pub fn start(&mut self, settings: MonitorSettings, markers: FilterMarkers) {
        self.stop();

        let (progress_tx, progress_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        self.progress_rx = Some(progress_rx);
        self.command_tx = Some(command_tx);
        self.cancel_flag = Some(Arc::clone(&cancel));

        self.worker = Some(std::thread::spawn(move || {
            run_scheduler(settings, markers, command_rx, progress_tx, cancel);
        }));

        tracing::info!(
            poll_ms = settings.poll_interval.as_millis() as u64,
            change_ms = settings.change_check_interval.as_millis() as u64,
            "Scheduler started"
        );
    }

    /// Stop the scheduler thread and wait for it to release every handle.
    pub fn stop(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
        self.command_tx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Scheduler thread panicked");
            }
        }
        self.progress_rx = None;
    }

    /// Returns `true` while the scheduler thread is running.
    pub fn is_active(&self) -> bool {
        self.cancel_flag.is_some()
    }

    /// Start monitoring `path`.
    ///
    /// Blocks until the scheduler has opened the file, which happens between
    /// ticks. On success the backlog arrives as a `Lines` message shortly
    /// after.
    pub fn open(&self, path: impl Into<PathBuf>) -> Result<SessionId, MonitorError> {
        let (reply, outcome) = mpsc::channel();
        self.send(MonitorCommand::Open {
            path: path.into(),
            reply,
        })?;
        outcome.recv().map_err(|_| MonitorError::SchedulerStopped)?
    }

    /// Close a session. Confirmed by a `Closed` message.
    pub fn close(&self, id: SessionId) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Close { id })
    }

    /// Replace the marker snapshot used for lines read from now on.
    pub fn set_filters(&self, markers: FilterMarkers) -> Result<(), MonitorError> {
        self.send(MonitorCommand::SetFilters(markers))
    }

    /// Poll for pending progress messages without blocking.
    ///
    /// Drains all currently queued messages and returns them.
    pub fn poll_progress(&self) -> Vec<MonitorProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }

    fn send(&self, cmd: MonitorCommand) -> Result<(), MonitorError> {
        self.command_tx
            .as_ref()
            .ok_or(MonitorError::SchedulerStopped)?
            .send(cmd)
            .map_err(|_| MonitorError::SchedulerStopped)
    }
}

impl Default for MonitorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MonitorManager {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Scheduler thread
// =============================================================================

fn run_scheduler(
    settings: MonitorSettings,
    markers: FilterMarkers,
    commands: mpsc::Receiver<MonitorCommand>,
    tx: mpsc::Sender<MonitorProgress>,
    cancel: Arc<AtomicBool>,
) {
    let mut scheduler = Scheduler::new(MonitorRegistry::new(settings, markers), tx);
    if !scheduler.emit(MonitorProgress::Started) {
        return;
    }

    let slice = Duration::from_millis(SCHEDULER_SLICE_MS);
    let mut next_tick = Instant::now() + settings.poll_interval;
    let mut next_change_check = Instant::now() + settings.change_check_interval;

    loop {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let now = Instant::now();
        let wait = next_tick
            .min(next_change_check)
            .saturating_duration_since(now)
            .min(slice);

        match commands.recv_timeout(wait) {
            Ok(cmd) => {
                if !scheduler.handle(cmd) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if now >= next_tick {
            if !scheduler.tick_all() {
                break;
            }
            next_tick = now + settings.poll_interval;
        }
        if now >= next_change_check {
            if !scheduler.check_changes() {
                break;
            }
            next_change_check = now + settings.change_check_interval;
        }
    }

    scheduler.registry.close_all();
    let _ = scheduler.emit(MonitorProgress::Stopped);
    tracing::info!("Scheduler stopped");
}

/// State owned by the scheduler thread. Every method returns `false` once
/// the UI side of the progress channel has gone away.
struct Scheduler {
    registry: MonitorRegistry,
    tx: mpsc::Sender<MonitorProgress>,
    /// Sessions whose most recent poll failed.
    failing: HashSet<SessionId>,
}

impl Scheduler {
    fn new(registry: MonitorRegistry, tx: mpsc::Sender<MonitorProgress>) -> Self {
        Self {
            registry,
            tx,
            failing: HashSet::new(),
        }
    }

    fn emit(&self, msg: MonitorProgress) -> bool {
        self.tx.send(msg).is_ok()
    }

    fn handle(&mut self, cmd: MonitorCommand) -> bool {
        match cmd {
            MonitorCommand::Open { path, reply } => {
                let result = self.registry.open(path);
                let opened = result.as_ref().ok().copied();
                // The caller may have given up waiting; that is not an error.
                let _ = reply.send(result);
                match opened {
                    // Produce the backlog right away rather than on the next tick.
                    Some(id) => self.tick_one(id) && self.flush(id),
                    None => true,
                }
            }
            MonitorCommand::Close { id } => {
                self.failing.remove(&id);
                match self.registry.close(id) {
                    Ok(()) => self.emit(MonitorProgress::Closed { id }),
                    Err(e) => {
                        tracing::debug!(error = %e, "Scheduler: close of unknown session ignored");
                        true
                    }
                }
            }
            MonitorCommand::SetFilters(markers) => {
                self.registry.set_filters(markers);
                true
            }
        }
    }

    fn tick_one(&mut self, id: SessionId) -> bool {
        match self.registry.tick(id) {
            Ok(_) => {
                self.failing.remove(&id);
                true
            }
            Err(e) => self.report_failure(id, e),
        }
    }

    fn tick_all(&mut self) -> bool {
        let failures = self.registry.tick_all();
        let failed: HashSet<SessionId> = failures.iter().map(|(id, _)| *id).collect();
        self.failing.retain(|id| failed.contains(id));
        for (id, e) in failures {
            if !self.report_failure(id, e) {
                return false;
            }
        }
        self.registry.ids().into_iter().all(|id| self.flush(id))
    }

    /// Report a failure unless this session is already in a failure streak.
    fn report_failure(&mut self, id: SessionId, e: MonitorError) -> bool {
        if !self.failing.insert(id) {
            return true;
        }
        tracing::warn!(session = %id, error = %e, "Scheduler: poll failed");
        let path = self
            .registry
            .path(id)
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        self.emit(MonitorProgress::ReadFailed {
            id,
            path,
            message: e.to_string(),
        })
    }

    /// Send any lines a session produced since the last flush.
    fn flush(&mut self, id: SessionId) -> bool {
        match self.registry.new_rendered_lines(id) {
            Ok(lines) if !lines.is_empty() => self.emit(MonitorProgress::Lines { id, lines }),
            _ => true,
        }
    }

    fn check_changes(&mut self) -> bool {
        let names = self.registry.collect_changes();
        if names.is_empty() {
            return true;
        }
        tracing::debug!(files = ?names, "Scheduler: change batch");
        self.emit(MonitorProgress::Changed { names })
    }
}
