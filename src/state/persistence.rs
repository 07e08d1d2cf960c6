use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PersistenceWriteError;
use crate::event::{EventBus, EventHandler, SceneEvent, SubscriptionId};
use crate::store::{ProjectId, ProjectPatch, ProjectStore};
use crate::util::time::Clock;

#[derive(Debug)]
struct DebounceState {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceState {
    fn restart(&mut self, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }
}

/// Subscribed to the scene bus; restarts the debounce on every persistent change
struct ChangeListener {
    state: Arc<Mutex<DebounceState>>,
    clock: Arc<dyn Clock>,
}

impl EventHandler<SceneEvent> for ChangeListener {
    fn handle_event(&mut self, event: &SceneEvent) {
        if event.is_persistent_change() {
            let deadline = self.state.lock().restart(self.clock.now());
            debug!("{:?}: save scheduled for {:?}", event, deadline);
        }
    }
}

/// Keeps the stored scene in step with the live one.
///
/// Every change pushes the save deadline out to `delay` after it. A save is
/// written once the deadline passes with no further change. `save_now`
/// writes at once and drops the pending deadline so a stale debounced write
/// cannot follow it.
pub struct PersistenceSynchronizer {
    project_id: ProjectId,
    clock: Arc<dyn Clock>,
    debounce: Arc<Mutex<DebounceState>>,
    subscription: Option<(EventBus<SceneEvent>, SubscriptionId)>,
    writes: u64,
    last_saved_at: Option<Instant>,
}

impl std::fmt::Debug for PersistenceSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceSynchronizer")
            .field("project_id", &self.project_id)
            .field("debounce", &*self.debounce.lock())
            .field("attached", &self.subscription.is_some())
            .field("writes", &self.writes)
            .finish()
    }
}

impl PersistenceSynchronizer {
    pub fn new(project_id: ProjectId, delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            project_id,
            clock,
            debounce: Arc::new(Mutex::new(DebounceState { delay, deadline: None })),
            subscription: None,
            writes: 0,
            last_saved_at: None,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Start listening to a scene's change events. Must be paired with
    /// [`Self::detach`] on teardown.
    pub fn attach(&mut self, bus: &EventBus<SceneEvent>) {
        self.detach();
        let id = bus.subscribe(Box::new(ChangeListener {
            state: Arc::clone(&self.debounce),
            clock: Arc::clone(&self.clock),
        }));
        self.subscription = Some((bus.clone(), id));
    }

    /// Stop listening and forget any pending save
    pub fn detach(&mut self) {
        if let Some((bus, id)) = self.subscription.take() {
            bus.unsubscribe(id);
        }
        self.cancel_pending();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// (Re)start the debounce from now. Returns the new deadline.
    pub fn on_scene_changed(&self) -> Instant {
        self.debounce.lock().restart(self.clock.now())
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.debounce.lock().deadline
    }

    pub fn has_pending(&self) -> bool {
        self.pending_deadline().is_some()
    }

    pub fn is_due(&self) -> bool {
        self.pending_deadline()
            .is_some_and(|deadline| self.clock.now() >= deadline)
    }

    /// Claim a due save. Returns true at most once per deadline.
    pub fn take_due(&self) -> bool {
        let mut state = self.debounce.lock();
        match state.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                state.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending save, if any
    pub fn cancel_pending(&self) -> bool {
        self.debounce.lock().deadline.take().is_some()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn last_saved_at(&self) -> Option<Instant> {
        self.last_saved_at
    }

    /// Write `blob` (plus any extra fields) to the store.
    ///
    /// A failure leaves nothing pending; the next scene change schedules a
    /// new attempt.
    pub async fn write(
        &mut self,
        store: &dyn ProjectStore,
        blob: Result<String, serde_json::Error>,
        extra: ProjectPatch,
    ) -> Result<(), PersistenceWriteError> {
        let blob = blob.inspect_err(|e| error!("Serializing scene failed: {}", e))?;
        let patch = ProjectPatch {
            canvas_state: Some(blob),
            ..extra
        };

        match store.update(&self.project_id, patch).await {
            Ok(()) => {
                self.writes += 1;
                self.last_saved_at = Some(self.clock.now());
                info!("Saved project {}", self.project_id);
                Ok(())
            }
            Err(source) => {
                error!("Saving project {} failed: {}", self.project_id, source);
                Err(PersistenceWriteError::Store {
                    project: self.project_id.clone(),
                    source,
                })
            }
        }
    }

    /// Write immediately, cancelling any pending debounced save first
    pub async fn save_now(
        &mut self,
        store: &dyn ProjectStore,
        blob: Result<String, serde_json::Error>,
        extra: ProjectPatch,
    ) -> Result<(), PersistenceWriteError> {
        if self.cancel_pending() {
            debug!("Immediate save supersedes pending save");
        }
        self.write(store, blob, extra).await
    }
}

impl Drop for PersistenceSynchronizer {
    fn drop(&mut self) {
        self.detach();
    }
}
