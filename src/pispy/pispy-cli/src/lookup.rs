//! Single-flight lookup controller.
//!
//! The controller owns the visible lookup state. Each [`request`] bumps a
//! generation counter and spawns the fetch on the runtime; completions come
//! back over a channel and are committed only if their generation is still
//! the current one. Superseded lookups are aborted, and any result that
//! slips through anyway is dropped without touching the state.
//!
//! [`request`]: LookupController::request

use crate::assemble::LookupView;
use crate::registry::Registry;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Loading { package: String, generation: u64 },
    Committed(LookupView),
}

#[derive(Debug)]
struct Completion {
    generation: u64,
    view: LookupView,
}

pub struct LookupController<R> {
    registry: Arc<R>,
    runtime: Handle,
    generation: u64,
    state: LookupState,
    in_flight: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<R: Registry> LookupController<R> {
    pub fn new(registry: R, runtime: Handle) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            registry: Arc::new(registry),
            runtime,
            generation: 0,
            state: LookupState::Idle,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LookupState::Loading { .. })
    }

    /// The most recently committed view, if any lookup has finished.
    pub fn committed(&self) -> Option<&LookupView> {
        match &self.state {
            LookupState::Committed(view) => Some(view),
            _ => None,
        }
    }

    /// Start looking up `package`, superseding any lookup still in flight.
    ///
    /// Blank names are ignored and leave the state untouched; returns whether
    /// a lookup was started.
    pub fn request(&mut self, package: &str) -> bool {
        let package = package.trim();
        if package.is_empty() {
            debug!("ignoring lookup of a blank package name");
            return false;
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let package = package.to_string();
        info!(%package, generation, "lookup started");

        self.state = LookupState::Loading {
            package: package.clone(),
            generation,
        };

        let registry = Arc::clone(&self.registry);
        let completions = self.completions_tx.clone();
        self.in_flight = Some(self.runtime.spawn(async move {
            let outcome = registry.fetch(&package).await;
            let view = LookupView::from_outcome(&package, outcome);
            // A send error means the controller is gone; nobody is waiting.
            let _ = completions.send(Completion { generation, view });
        }));

        true
    }

    /// Apply every completion that has arrived, without waiting.
    ///
    /// Returns true if the visible state changed.
    pub fn poll_completions(&mut self) -> bool {
        // Checked before draining: a task sends before it finishes, so once
        // it is finished anything it sent is already queued.
        let finished = self.in_flight.as_ref().is_some_and(JoinHandle::is_finished);

        let mut changed = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            changed |= self.apply(completion);
        }
        if finished && self.is_loading() {
            changed |= self.abandon();
        }
        changed
    }

    /// Wait until the current lookup (if any) has been committed.
    ///
    /// A lookup task that dies without reporting back (a panic in the
    /// registry, say) commits the not-found sentinel rather than leaving the
    /// controller loading forever.
    pub async fn settle(&mut self) -> Option<&LookupView> {
        while self.is_loading() {
            let Some(task) = self.in_flight.as_mut() else {
                break;
            };
            tokio::select! {
                biased;
                Some(completion) = self.completions_rx.recv() => {
                    self.apply(completion);
                }
                _ = task => {
                    while let Ok(completion) = self.completions_rx.try_recv() {
                        self.apply(completion);
                    }
                    if self.is_loading() {
                        self.abandon();
                    }
                }
            }
        }
        self.committed()
    }

    /// Commit the sentinel for a current lookup whose task is gone.
    fn abandon(&mut self) -> bool {
        self.in_flight = None;
        let LookupState::Loading { package, generation } = &self.state else {
            return false;
        };
        warn!(%package, generation, "lookup task ended without a result");
        let view = LookupView::interrupted(package);
        self.state = LookupState::Committed(view);
        true
    }

    fn apply(&mut self, completion: Completion) -> bool {
        match &self.state {
            LookupState::Loading { generation, .. } if *generation == completion.generation => {
                info!(
                    package = %completion.view.package_name,
                    found = completion.view.found,
                    generation = completion.generation,
                    "lookup committed"
                );
                self.in_flight = None;
                self.state = LookupState::Committed(completion.view);
                true
            }
            _ => {
                debug!(
                    package = %completion.view.package_name,
                    generation = completion.generation,
                    current = self.generation,
                    "discarding superseded lookup"
                );
                false
            }
        }
    }
}

impl<R> Drop for LookupController<R> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}
