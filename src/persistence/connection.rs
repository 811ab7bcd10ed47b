//! Lifecycle of the single shared datastore connection.
//!
//! The connection is opened lazily on first use and kept warm while
//! traffic continues. Every [`ConnectionManager::ensure_connected`] call
//! re-arms a one-shot idle timer; when the timer fires the handle is
//! closed and discarded, and the next call reopens it transparently.
//!
//! There is no pooling. Callers must not keep the returned guard beyond
//! the operation at hand; they call `ensure_connected` each time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::error::StoreError;

/// Opens and closes datastore handles.
pub trait Connector: Send + Sync + 'static {
    /// The live connection type.
    type Handle: Send + 'static;

    /// Opens a new handle.
    fn open(&self) -> impl Future<Output = Result<Self::Handle, StoreError>> + Send;

    /// Closes a handle that is no longer needed.
    fn close(&self, handle: Self::Handle) -> impl Future<Output = ()> + Send;
}

struct Slot<H> {
    handle: Option<H>,
    idle_timer: Option<JoinHandle<()>>,
    /// Bumped on every re-arm so a timer that already woke can tell it
    /// has been superseded.
    generation: u64,
}

impl<H> std::fmt::Debug for Slot<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("connected", &self.handle.is_some())
            .field("timer_armed", &self.idle_timer.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Owner of the shared connection handle.
#[derive(Debug)]
pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    idle_window: Duration,
    slot: Arc<Mutex<Slot<C::Handle>>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a manager; nothing is opened until first use.
    #[must_use]
    pub fn new(connector: C, idle_window: Duration) -> Self {
        Self {
            connector: Arc::new(connector),
            idle_window,
            slot: Arc::new(Mutex::new(Slot {
                handle: None,
                idle_timer: None,
                generation: 0,
            })),
        }
    }

    /// Returns the idle window after which the handle is closed.
    #[must_use]
    pub const fn idle_window(&self) -> Duration {
        self.idle_window
    }

    /// Returns a usable handle, opening one if none is live.
    ///
    /// Either way the idle timer restarts. The guard serializes access to
    /// the handle; drop it as soon as the operation completes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the datastore is unreachable.
    pub async fn ensure_connected(&self) -> Result<MappedMutexGuard<'_, C::Handle>, StoreError> {
        let mut slot = self.slot.lock().await;
        if slot.handle.is_none() {
            let handle = self.connector.open().await?;
            slot.handle = Some(handle);
            tracing::debug!("datastore connection opened");
        }
        self.schedule_idle_close(&mut slot);

        MutexGuard::try_map(slot, |slot| slot.handle.as_mut())
            .map_err(|_| StoreError::Connection("connection handle vanished".to_string()))
    }

    /// Returns `true` while a handle is open.
    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.handle.is_some()
    }

    /// Cancels the idle timer and closes the handle now, if any.
    pub async fn close(&self) {
        let handle = {
            let mut slot = self.slot.lock().await;
            if let Some(timer) = slot.idle_timer.take() {
                timer.abort();
            }
            slot.generation = slot.generation.wrapping_add(1);
            slot.handle.take()
        };
        if let Some(handle) = handle {
            self.connector.close(handle).await;
            tracing::debug!("datastore connection closed");
        }
    }

    /// Replaces any pending idle timer with a fresh one-shot timer.
    fn schedule_idle_close(&self, slot: &mut Slot<C::Handle>) {
        if let Some(timer) = slot.idle_timer.take() {
            timer.abort();
        }
        slot.generation = slot.generation.wrapping_add(1);
        let armed_at = slot.generation;

        let connector = Arc::clone(&self.connector);
        let shared = Arc::clone(&self.slot);
        let idle_window = self.idle_window;
        slot.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(idle_window).await;
            let handle = {
                let mut slot = shared.lock().await;
                if slot.generation != armed_at {
                    return;
                }
                slot.idle_timer = None;
                slot.handle.take()
            };
            if let Some(handle) = handle {
                connector.close(handle).await;
                tracing::info!(
                    idle_secs = idle_window.as_secs(),
                    "datastore connection closed after inactivity"
                );
            }
        }));
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_lock()
            && let Some(timer) = slot.idle_timer.take()
        {
            timer.abort();
        }
    }
}
