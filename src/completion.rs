/// Notification registered by a reader while a scan is in flight.
pub type PendingCallback = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of callbacks waiting for the current scan to finish.
#[derive(Default)]
pub struct CompletionQueue {
    callbacks: Vec<PendingCallback>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, callback: PendingCallback) {
        self.callbacks.push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Detach every queued callback, leaving the queue empty.
    ///
    /// Lets the owner release its lock before running them.
    pub fn take(&mut self) -> Vec<PendingCallback> {
        std::mem::take(&mut self.callbacks)
    }

    /// Run every queued callback once, in registration order, and clear.
    pub fn drain_and_invoke(&mut self) {
        for callback in self.take() {
            callback();
        }
    }
}

impl std::fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("pending", &self.callbacks.len())
            .finish()
    }
}
