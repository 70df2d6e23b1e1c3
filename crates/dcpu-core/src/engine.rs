//! Background execution loop with a thread-safe input-event queue.
//!
//! One dedicated thread repeatedly drains at most one pending event and then
//! executes exactly one instruction while holding the state's write lock, so
//! readers and [`ExecutionEngine::stop`] only ever observe instruction
//! boundaries. Events are the only way for other threads to change a running
//! machine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::api::CoreConfig;
use crate::execute::{step, StepOutcome};
use crate::fault::{DecodeError, EngineError};
use crate::history::{Snapshot, SnapshotHistory};
use crate::peripherals::InputEvent;
use crate::state::{RunState, State};

/// Cloneable handle for posting input events from any thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<InputEvent>,
}

impl EventSender {
    /// Enqueues `event`; events are applied in FIFO order, one per loop
    /// iteration, before that iteration's instruction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] once the engine has been dropped.
    pub fn post(&self, event: InputEvent) -> Result<(), EngineError> {
        self.tx.send(event).map_err(|_| EngineError::Closed)
    }
}

struct Shared<S> {
    running: AtomicBool,
    current: RwLock<S>,
    run_state: Mutex<RunState>,
    history: Mutex<SnapshotHistory<S>>,
    history_interval: u64,
    steps: AtomicU64,
    events: Receiver<InputEvent>,
}

impl<S: State> Shared<S> {
    /// One loop iteration: at most one event, then one instruction.
    fn iterate(&self) -> Result<(), DecodeError> {
        let mut state = self.current.write();

        if let Ok(event) = self.events.try_recv() {
            let handled = state.handle_event(&event);
            tracing::trace!(?event, ?handled, "input event applied");
        }

        match step(&mut *state) {
            StepOutcome::Retired { pc, operation } => {
                let steps = self.steps.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::trace!(pc, %operation, "retired");
                if self.history_interval > 0 && steps % self.history_interval == 0 {
                    self.history.lock().record(steps, S::clone(&state));
                }
                Ok(())
            }
            StepOutcome::Fault { pc, cause } => {
                tracing::error!(pc, %cause, "execution halted on decode fault");
                Err(cause)
            }
        }
    }

    fn run(&self) {
        while self.running.load(Ordering::Acquire) {
            if let Err(cause) = self.iterate() {
                *self.run_state.lock() = RunState::Faulted(cause);
                self.running.store(false, Ordering::Release);
            }
        }
    }
}

/// Owns the machine state and the thread that executes it.
///
/// Lifecycle: [`ExecutionEngine::new`] → [`ExecutionEngine::start`] →
/// [`ExecutionEngine::stop`] → drop. Dropping a running engine stops it.
pub struct ExecutionEngine<S: State + 'static> {
    shared: Arc<Shared<S>>,
    sender: EventSender,
    thread: Option<JoinHandle<()>>,
}

impl<S: State + 'static> ExecutionEngine<S> {
    /// Wraps `state` in a stopped engine configured by `config`.
    #[must_use]
    pub fn new(state: S, config: &CoreConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                current: RwLock::new(state),
                run_state: Mutex::new(RunState::Stopped),
                history: Mutex::new(SnapshotHistory::new(config.history_capacity)),
                history_interval: config.history_interval,
                steps: AtomicU64::new(0),
                events: rx,
            }),
            sender: EventSender { tx },
            thread: None,
        }
    }

    /// Spawns the execution thread. No-op while already running.
    ///
    /// Starting a faulted engine retries the faulting instruction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] when the OS refuses a new thread.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.shared.running.load(Ordering::Acquire) {
            return Ok(());
        }
        self.reap();

        self.shared.running.store(true, Ordering::Release);
        *self.shared.run_state.lock() = RunState::Running;

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("dcpu-exec".into())
            .spawn(move || shared.run());
        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                tracing::debug!(steps = self.steps(), "engine started");
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                *self.shared.run_state.lock() = RunState::Stopped;
                Err(EngineError::Spawn(err))
            }
        }
    }

    /// Clears the running flag and joins the execution thread.
    ///
    /// Once this returns no instruction is in flight. No-op when stopped.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if self.reap() {
            tracing::debug!(steps = self.steps(), "engine stopped");
        }
    }

    // Joins a finished or stopping thread; true if one was joined.
    fn reap(&mut self) -> bool {
        let Some(handle) = self.thread.take() else {
            return false;
        };
        if handle.join().is_err() {
            tracing::error!("execution thread panicked");
        }
        let mut run_state = self.shared.run_state.lock();
        if run_state.is_running() {
            *run_state = RunState::Stopped;
        }
        true
    }

    /// Enqueues an input event. See [`EventSender::post`].
    ///
    /// # Errors
    ///
    /// Never fails while the engine exists; the signature mirrors
    /// [`EventSender::post`].
    pub fn post_event(&self, event: InputEvent) -> Result<(), EngineError> {
        self.sender.post(event)
    }

    /// Handle for posting events from other threads.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Events posted but not yet applied.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.shared.events.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        *self.shared.run_state.lock()
    }

    /// Returns `true` while the execution thread is live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Instructions retired since the engine was created or last restored.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.shared.steps.load(Ordering::Acquire)
    }

    /// Clone of the current state, taken between instructions.
    ///
    /// For [`crate::PersistentState`] this is O(1) and safe to retain
    /// indefinitely.
    #[must_use]
    pub fn snapshot(&self) -> S {
        self.shared.current.read().clone()
    }

    /// Runs `f` against the current state under the read lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.shared.current.read())
    }

    /// Retained history snapshots, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Snapshot<S>> {
        self.shared.history.lock().iter().cloned().collect()
    }

    /// Executes one event/instruction iteration on the caller's thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Running`] while the execution thread is live.
    /// A decode fault marks the engine [`RunState::Faulted`] and is returned
    /// as `Ok(Some(cause))`.
    pub fn step_once(&self) -> Result<Option<DecodeError>, EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        match self.shared.iterate() {
            Ok(()) => Ok(None),
            Err(cause) => {
                *self.shared.run_state.lock() = RunState::Faulted(cause);
                Ok(Some(cause))
            }
        }
    }

    /// Replaces the current state, e.g. with an earlier snapshot.
    ///
    /// Clears a latched fault. The step counter is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Running`] while the execution thread is live.
    pub fn restore(&self, state: S) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        *self.shared.current.write() = state;
        *self.shared.run_state.lock() = RunState::Stopped;
        tracing::debug!("state restored");
        Ok(())
    }

    /// Restores the latest retained snapshot taken at or before `step`,
    /// discarding newer snapshots and resetting the step counter to it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Running`] while running and
    /// [`EngineError::NoSnapshot`] when no snapshot qualifies.
    pub fn rewind_to(&self, step: u64) -> Result<u64, EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        let mut history = self.shared.history.lock();
        let snapshot = history
            .at_or_before(step)
            .cloned()
            .ok_or(EngineError::NoSnapshot(step))?;
        history.truncate_after(snapshot.step);
        drop(history);

        self.restore(snapshot.state)?;
        self.shared.steps.store(snapshot.step, Ordering::Release);
        Ok(snapshot.step)
    }
}

impl<S: State + 'static> Drop for ExecutionEngine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: State + 'static> std::fmt::Debug for ExecutionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("run_state", &self.run_state())
            .field("steps", &self.steps())
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}
