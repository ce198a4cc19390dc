//! Background crunching: one worker thread per lineage.
//!
//! [`CruncherThread::spawn`] moves a [`StepIterator`] onto a dedicated
//! thread. The worker owns the iterator exclusively; produced states
//! stream back over a bounded event channel sized by the configured
//! lookahead, so a worker can run ahead of its consumer but never
//! unboundedly far. Control messages (profile swaps, retirement) flow
//! in over an unbounded channel and are applied before every advance.
//!
//! The worker never blocks on a channel: it polls with `try_send` /
//! `try_recv` and sleeps for the configured interval when the event
//! buffer is full or when it is parked after a failure. Retiring the
//! handle joins the thread and recovers the iterator, browser and
//! all.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use bramble_core::{StepProfile, WorldState};

use crate::config::{ConfigError, CruncherConfig};
use crate::iterator::{CrunchError, StepIterator};

/// One state handed over by a worker.
///
/// The profile tag is the recipe that was active when the state was
/// produced, so a manager flushing events into a tree appends
/// faithfully across mid-stream profile swaps.
#[derive(Clone, Debug)]
pub struct ProducedState {
    /// The produced state, shared with the worker's own browser.
    pub state: Arc<dyn WorldState>,
    /// The resolved clock reading the state was committed with.
    pub clock: f64,
    /// The profile that produced the state.
    pub profile: Arc<StepProfile>,
}

/// Events streamed by a cruncher worker.
#[derive(Clone, Debug)]
pub enum CruncherEvent {
    /// One new state on the lineage.
    Produced(ProducedState),
    /// The timeline reached its natural end; the worker exits after
    /// delivering this.
    Ended,
    /// A step misbehaved; the worker parks until a profile message
    /// arrives or it is retired.
    Failed(CrunchError),
}

/// Control messages flowing into the worker.
enum Control {
    SetProfile(StepProfile),
    Retire,
}

/// Failure to recover the iterator from a retired worker.
#[derive(Debug, PartialEq, Eq)]
pub enum RetireError {
    /// The worker thread panicked; the iterator is lost.
    WorkerPanicked,
}

impl fmt::Display for RetireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkerPanicked => {
                write!(f, "cruncher worker panicked; step iterator lost")
            }
        }
    }
}

impl Error for RetireError {}

// ── Worker ─────────────────────────────────────────────────────────

/// State held by the worker thread's main loop.
struct CruncherWorker {
    iterator: StepIterator,
    profile_tag: Arc<StepProfile>,
    events: Sender<CruncherEvent>,
    control: Receiver<Control>,
    poll_interval: Duration,
    /// Event produced but not yet accepted by the bounded channel.
    pending: Option<CruncherEvent>,
    /// Set after a failure event; cleared by a profile message.
    parked: bool,
    /// Set once the end event is queued; exit after delivering it.
    finishing: bool,
}

impl CruncherWorker {
    fn new(
        iterator: StepIterator,
        events: Sender<CruncherEvent>,
        control: Receiver<Control>,
        poll_interval: Duration,
    ) -> Self {
        let profile_tag = Arc::new(iterator.profile().clone());
        Self {
            iterator,
            profile_tag,
            events,
            control,
            poll_interval,
            pending: None,
            parked: false,
            finishing: false,
        }
    }

    /// Main crunching loop. Runs until retired, disconnected, or the
    /// world ends.
    ///
    /// Consumes self and returns the [`StepIterator`] so the spawner
    /// can recover it through `JoinHandle<StepIterator>`.
    fn run(mut self) -> StepIterator {
        loop {
            // 1. Apply queued control messages; retirement wins over
            //    everything else.
            if !self.apply_control() {
                break;
            }

            // 2. Hand over the buffered event, if any.
            if let Some(event) = self.pending.take() {
                match self.events.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        self.pending = Some(event);
                        thread::sleep(self.poll_interval);
                        continue;
                    }
                    // Consumer dropped the stream; nothing left to do.
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }

            // 3. The end event is away; the timeline is complete.
            if self.finishing {
                break;
            }

            // 4. Parked after a failure: idle until a control message.
            if self.parked {
                thread::sleep(self.poll_interval);
                continue;
            }

            // 5. Crunch one step ahead.
            match self.iterator.advance() {
                Ok(Some(state)) => {
                    let clock = self.iterator.tip_clock();
                    self.pending = Some(CruncherEvent::Produced(ProducedState {
                        state,
                        clock,
                        profile: Arc::clone(&self.profile_tag),
                    }));
                }
                Ok(None) => {
                    self.pending = Some(CruncherEvent::Ended);
                    self.finishing = true;
                }
                Err(e) => {
                    self.pending = Some(CruncherEvent::Failed(e));
                    self.parked = true;
                }
            }
        }
        self.iterator
    }

    /// Drain the control channel. Returns `false` when the worker
    /// should stop.
    ///
    /// Any profile message unparks a failed worker, including one
    /// carrying the unchanged profile: the caller is asking for a
    /// retry.
    fn apply_control(&mut self) -> bool {
        loop {
            match self.control.try_recv() {
                Ok(Control::SetProfile(profile)) => {
                    self.iterator.set_profile(&profile);
                    self.profile_tag = Arc::new(profile);
                    self.parked = false;
                }
                Ok(Control::Retire) => return false,
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

// ── Handle ─────────────────────────────────────────────────────────

/// Handle to a background cruncher worker.
///
/// Created by [`CruncherThread::spawn`]. The handle is the only way
/// to talk to the worker: read events from [`events`](Self::events),
/// swap recipes with [`set_profile`](Self::set_profile), and take the
/// iterator back with [`retire`](Self::retire). Dropping the handle
/// retires the worker implicitly, discarding the iterator.
#[derive(Debug)]
pub struct CruncherThread {
    events: Receiver<CruncherEvent>,
    control: Option<Sender<Control>>,
    handle: Option<JoinHandle<StepIterator>>,
}

impl CruncherThread {
    /// Spawn a worker crunching `iterator` in the background.
    pub fn spawn(iterator: StepIterator, config: CruncherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (event_tx, event_rx) = crossbeam_channel::bounded(config.lookahead);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let poll_interval = config.poll_interval();

        let handle = thread::Builder::new()
            .name("bramble-cruncher".into())
            .spawn(move || {
                CruncherWorker::new(iterator, event_tx, control_rx, poll_interval).run()
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            events: event_rx,
            control: Some(control_tx),
            handle: Some(handle),
        })
    }

    /// The event stream flowing out of the worker.
    ///
    /// The stream disconnects when the worker exits (after an `Ended`
    /// event, or once the handle is retired).
    pub fn events(&self) -> &Receiver<CruncherEvent> {
        &self.events
    }

    /// Swap the worker's active profile.
    ///
    /// Applied before the worker's next advance. Events already in
    /// flight keep the profile tag they were produced under. A worker
    /// parked after a failure is woken by any profile message. Sending
    /// to a worker that already exited is a no-op.
    pub fn set_profile(&self, profile: StepProfile) {
        if let Some(control) = &self.control {
            // Best-effort: a worker that ended keeps its last recipe.
            let _ = control.send(Control::SetProfile(profile));
        }
    }

    /// Stop the worker and recover its [`StepIterator`].
    ///
    /// Every produced state lives in the recovered iterator's browser,
    /// including states still buffered in the event stream when the
    /// worker stopped.
    pub fn retire(mut self) -> Result<StepIterator, RetireError> {
        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Retire);
        }
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| RetireError::WorkerPanicked),
            None => Err(RetireError::WorkerPanicked),
        }
    }
}

impl Drop for CruncherThread {
    fn drop(&mut self) {
        // Disconnecting the control channel stops the worker loop.
        self.control.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
