//! Deferred destruction queue
//!
//! Collects teardown closures during resource creation and runs them in
//! reverse order on flush, so dependents are always destroyed before the
//! objects they depend on. Used for teardown whose order is decided at
//! runtime, such as retiring a replaced swapchain.

/// LIFO queue of destruction closures
#[derive(Default)]
pub struct DeletionQueue {
    deletors: Vec<Box<dyn FnOnce()>>,
}

impl DeletionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a destruction closure. Closures run in reverse push order.
    pub fn push(&mut self, deletor: impl FnOnce() + 'static) {
        self.deletors.push(Box::new(deletor));
    }

    /// Number of pending closures
    pub fn len(&self) -> usize {
        self.deletors.len()
    }

    /// Whether the queue holds no pending closures
    pub fn is_empty(&self) -> bool {
        self.deletors.is_empty()
    }

    /// Run every pending closure, newest first, leaving the queue empty
    pub fn flush(&mut self) {
        while let Some(deletor) = self.deletors.pop() {
            deletor();
        }
    }
}

impl Drop for DeletionQueue {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn flush_runs_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = DeletionQueue::new();

        for i in 0..4 {
            let log = Rc::clone(&log);
            queue.push(move || log.borrow_mut().push(i));
        }

        queue.flush();
        assert_eq!(*log.borrow(), vec![3, 2, 1, 0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn flush_on_empty_queue_is_a_no_op() {
        let mut queue = DeletionQueue::new();
        queue.flush();
        assert!(queue.is_empty());
    }

    #[test]
    fn drop_flushes_pending_closures() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut queue = DeletionQueue::new();
            let first = Rc::clone(&log);
            let second = Rc::clone(&log);
            queue.push(move || first.borrow_mut().push("first"));
            queue.push(move || second.borrow_mut().push("second"));
        }
        assert_eq!(*log.borrow(), vec!["second", "first"]);
    }
}
