//! The property-directory request surface
//!
//! Client code is written against [`PropertyDirectory`] and handed either the
//! simulator or another implementation. Listener callbacks are delivered on a
//! caller-supplied [`TaskQueue`].

use std::fmt;
use std::sync::Arc;

use crate::address::{AudioObjectId, PropertyAddress};
use crate::error::HalError;
use crate::value::PropertyData;

/// A unit of work submitted to a task queue
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler capability used to deliver listener callbacks
///
/// Implementations run submitted tasks later, in submission order.
pub trait TaskQueue: Send + Sync {
    /// Schedule a task
    fn submit(&self, task: Task);
}

/// Shared handle to a task queue, compared by identity
#[derive(Clone)]
pub struct QueueHandle(Arc<dyn TaskQueue>);

impl QueueHandle {
    /// Wrap a queue
    pub fn new<Q: TaskQueue + 'static>(queue: Arc<Q>) -> Self {
        QueueHandle(queue)
    }

    /// Schedule a task on the underlying queue
    pub fn submit(&self, task: Task) {
        self.0.submit(task);
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for QueueHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for QueueHandle {}

impl fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueHandle({:p})", self.addr())
    }
}

/// Listener callback: number of changed properties and the registered address
pub type PropertyListener = Arc<dyn Fn(u32, &PropertyAddress) + Send + Sync>;

/// Request surface of an audio hardware property directory
///
/// `qualifier` is `None` when the caller passes no qualifier data. For
/// [`get_property_data`](Self::get_property_data), `io_data_size` carries the
/// caller's buffer capacity in and the bytes written out.
pub trait PropertyDirectory: Send + Sync {
    /// Install a listener on `address` of `object`
    fn add_property_listener(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        queue: Option<QueueHandle>,
        listener: PropertyListener,
    ) -> Result<(), HalError>;

    /// Remove the listener installed with the same object, address and queue
    fn remove_property_listener(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        queue: Option<QueueHandle>,
        listener: PropertyListener,
    ) -> Result<(), HalError>;

    /// Write a property value
    fn set_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
        data: &[u8],
    ) -> Result<(), HalError>;

    /// Size in bytes of a property value
    fn get_property_data_size(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
    ) -> Result<u32, HalError>;

    /// Read a property value
    fn get_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: Option<&[u8]>,
        io_data_size: &mut u32,
    ) -> Result<PropertyData, HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InlineQueue {
        ran: Mutex<u32>,
    }

    impl TaskQueue for InlineQueue {
        fn submit(&self, task: Task) {
            task();
            *self.ran.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_queue_handle_identity() {
        let q1 = Arc::new(InlineQueue::default());
        let q2 = Arc::new(InlineQueue::default());

        let h1 = QueueHandle::new(q1.clone());
        let h1_again = QueueHandle::new(q1);
        let h2 = QueueHandle::new(q2);

        assert_eq!(h1, h1.clone());
        assert_eq!(h1, h1_again);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_queue_handle_submit() {
        let q = Arc::new(InlineQueue::default());
        let handle = QueueHandle::new(q.clone());
        handle.submit(Box::new(|| {}));
        handle.submit(Box::new(|| {}));
        assert_eq!(*q.ran.lock().unwrap(), 2);
    }
}
