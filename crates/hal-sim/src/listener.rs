//! Single-slot listener registration and device-list change notification
//!
//! At most one listener is installed at a time. A registration is identified
//! by its queue and address; the callback itself is never compared.

use hal_protocol::{HalError, PropertyAddress, PropertyListener, QueueHandle};
use tracing::debug;

/// An installed listener
#[derive(Clone)]
pub struct ListenerRegistration {
    queue: QueueHandle,
    listener: PropertyListener,
    address: PropertyAddress,
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("queue", &self.queue)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// A delivery captured while the directory state was locked
///
/// Submitting happens after the lock is released, so callbacks are free to
/// call back into the directory.
#[must_use = "a notification does nothing until it is submitted"]
pub struct PendingNotification(ListenerRegistration);

impl PendingNotification {
    /// Hand the callback to its queue
    pub fn submit(self) {
        let ListenerRegistration {
            queue,
            listener,
            address,
        } = self.0;
        debug!("Scheduling device list notification on {:?}", queue);
        queue.submit(Box::new(move || listener(1, &address)));
    }
}

/// Holds the current listener, if any
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: Option<ListenerRegistration>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a listener is installed
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Install a listener
    pub fn install(
        &mut self,
        queue: QueueHandle,
        listener: PropertyListener,
        address: PropertyAddress,
    ) -> Result<(), HalError> {
        if self.active.is_some() {
            return Err(HalError::ListenerAlreadyRegistered);
        }
        debug!("Installing property listener on {} via {:?}", address, queue);
        self.active = Some(ListenerRegistration {
            queue,
            listener,
            address,
        });
        Ok(())
    }

    /// Remove the listener installed with `queue` and `address`
    ///
    /// The removed registration is handed back so the caller can drop it
    /// after releasing any lock around the registry.
    pub fn uninstall(
        &mut self,
        queue: &QueueHandle,
        address: &PropertyAddress,
    ) -> Result<ListenerRegistration, HalError> {
        let current = self.active.as_ref().ok_or(HalError::NoListenerRegistered)?;
        if current.queue != *queue {
            return Err(HalError::QueueMismatch);
        }
        if current.address != *address {
            return Err(HalError::AddressMismatch(*address));
        }
        debug!("Removing property listener on {}", address);
        self.active.take().ok_or(HalError::NoListenerRegistered)
    }

    /// Take the listener out without any matching
    pub fn clear(&mut self) -> Option<ListenerRegistration> {
        self.active.take()
    }

    /// Capture a device-list notification for the installed listener
    pub fn devices_changed(&self) -> Option<PendingNotification> {
        self.active.clone().map(PendingNotification)
    }
}
