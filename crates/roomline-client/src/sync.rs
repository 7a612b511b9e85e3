//! Polling synchronizer.
//!
//! One task per authenticated session fetches the room state, applies it,
//! then waits a fixed delay.  The next fetch is never scheduled before the
//! previous one has completed, so at most one fetch is ever in flight.  A
//! "sync now" request only cuts the current delay short.  Fetches also hold
//! the client's single fetch permit, so a synchronizer started right after
//! a stop queues behind the old one's fetch instead of overlapping it.
//!
//! Liveness is checked after every suspension: the handle's own stop flag,
//! the session epoch captured at spawn time and the client's shutdown flag.
//! A fetch that resolves after any of them flipped is discarded unapplied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ChatApi;
use crate::client::ClientCore;
use crate::error::ClientError;
use crate::events::UiEvent;

#[derive(Debug, Default)]
struct Control {
    stopped: AtomicBool,
    stop: Notify,
    nudge: Notify,
}

impl Control {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Handle to a running synchronizer.
#[derive(Debug)]
pub struct SyncHandle {
    control: Arc<Control>,
    epoch: u64,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub(crate) fn spawn<A: ChatApi>(core: Arc<ClientCore<A>>, epoch: u64) -> Self {
        let control = Arc::new(Control::default());
        let task = tokio::spawn(run(core, control.clone(), epoch));
        Self {
            control,
            epoch,
            task,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop the cycle. Idempotent; an in-flight fetch finishes but is not applied.
    pub fn stop(&self) {
        if !self.control.stopped.swap(true, Ordering::SeqCst) {
            self.control.stop.notify_one();
        }
    }

    /// Run the next cycle now instead of after the remaining delay.
    pub fn request_sync(&self) {
        self.control.nudge.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.control.is_stopped() && !self.task.is_finished()
    }

    pub(crate) fn abort(&self) {
        self.stop();
        self.task.abort();
    }
}

enum Cycle {
    Continue,
    Halt,
}

async fn run<A: ChatApi>(core: Arc<ClientCore<A>>, control: Arc<Control>, epoch: u64) {
    let interval = core.config.poll_interval;
    info!(epoch, interval_ms = interval.as_millis() as u64, "Synchronizer started");

    loop {
        if let Cycle::Halt = cycle(&core, &control, epoch).await {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = control.nudge.notified() => {
                debug!(epoch, "Immediate sync requested");
            }
            _ = control.stop.notified() => break,
        }
    }

    control.stopped.store(true, Ordering::SeqCst);
    core.events.emit(UiEvent::SyncStopped);
    info!(epoch, "Synchronizer stopped");
}

fn is_live<A: ChatApi>(core: &ClientCore<A>, control: &Control, epoch: u64) -> bool {
    !control.is_stopped() && core.is_current(epoch)
}

async fn cycle<A: ChatApi>(core: &ClientCore<A>, control: &Control, epoch: u64) -> Cycle {
    if !is_live(core, control, epoch) {
        return Cycle::Halt;
    }
    let Ok(_permit) = core.fetch_slot.acquire().await else {
        return Cycle::Halt;
    };
    if !is_live(core, control, epoch) {
        return Cycle::Halt;
    }
    let Some(token) = core.session.token() else {
        return Cycle::Halt;
    };

    let result = core.api.fetch_state(&token).await;

    if !is_live(core, control, epoch) {
        debug!(epoch, "Discarding room state fetched for a stopped synchronizer");
        return Cycle::Halt;
    }

    match result {
        Ok(room) => {
            debug!(
                users = room.users.len(),
                messages = room.messages.len(),
                "Room state fetched"
            );
            core.apply_room_state(room, epoch);
            Cycle::Continue
        }
        Err(ClientError::Unauthorized) => {
            control.stopped.store(true, Ordering::SeqCst);
            core.handle_unauthorized();
            Cycle::Halt
        }
        Err(e) => {
            warn!(error = %e, "Room state fetch failed, retrying at the next tick");
            core.set_chat_error(Some(e.to_string()));
            Cycle::Continue
        }
    }
}
