//! Single-slot debounce timer.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Default)]
struct SlotState {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

/// Holds at most one scheduled job. Scheduling replaces (and cancels) the
/// previous job if its timer has not fired yet; a job whose timer fired is
/// detached from the slot and always runs to completion.
#[derive(Default)]
pub(crate) struct DebounceSlot {
    state: Mutex<SlotState>,
}

impl DebounceSlot {
    pub(crate) fn schedule<F>(self: &Arc<Self>, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }

        let slot = Arc::clone(self);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if slot.claim(generation) {
                job.await;
            }
        }));
    }

    /// Cancel the scheduled job. Returns whether one was pending.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation = state.generation.wrapping_add(1);
        state.pending.take().is_some_and(|pending| {
            pending.abort();
            true
        })
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .is_some()
    }

    /// Detach the job of `generation` once its timer fired. False when it was
    /// superseded in the meantime.
    fn claim(&self, generation: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            return false;
        }
        state.pending = None;
        true
    }
}
