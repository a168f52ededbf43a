//! Capturing completion callbacks.

use docbridge_core::CoreResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects every outcome delivered to the callbacks it hands out.
///
/// ```
/// use docbridge_core::CoreResult;
/// use docbridge_testkit::CallbackCapture;
///
/// let capture = CallbackCapture::<u32>::new();
/// let callback = capture.callback();
/// callback(Ok(7));
/// assert_eq!(capture.take_single(), Ok(7));
/// ```
pub struct CallbackCapture<T> {
    deliveries: Arc<Mutex<Vec<CoreResult<T>>>>,
}

impl<T> Clone for CallbackCapture<T> {
    fn clone(&self) -> Self {
        Self {
            deliveries: Arc::clone(&self.deliveries),
        }
    }
}

impl<T> Default for CallbackCapture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CallbackCapture<T> {
    /// Creates a capture with no deliveries.
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback that records its outcome in this capture.
    pub fn callback(&self) -> impl FnOnce(CoreResult<T>) + Send + 'static
    where
        T: Send + 'static,
    {
        let deliveries = Arc::clone(&self.deliveries);
        move |outcome| deliveries.lock().push(outcome)
    }

    /// Number of outcomes delivered so far.
    pub fn deliveries(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// Removes and returns all delivered outcomes.
    pub fn take_all(&self) -> Vec<CoreResult<T>> {
        std::mem::take(&mut *self.deliveries.lock())
    }

    /// Removes and returns the only delivered outcome.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one outcome was delivered.
    pub fn take_single(&self) -> CoreResult<T> {
        let mut all = self.take_all();
        assert_eq!(all.len(), 1, "expected exactly one delivery, got {}", all.len());
        all.remove(0)
    }
}
