use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender};

/// A bounded queue of frames crossing the host/runtime boundary: one
/// producer pushing input frames in, one consumer draining output frames
/// out. Named after the reference runtime's `queue::SPSC`, though the
/// underlying channel is MPMC-capable — `push`/`try_pop`/`close` are cheap
/// to clone and share (see [`crate::runtime::Handle`]), which the strict
/// single-producer-single-consumer discipline the name implies doesn't
/// require giving up.
#[derive(Clone)]
pub struct Spsc<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    closed: Arc<AtomicBool>,
}

impl<T> Spsc<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx, closed: Arc::new(AtomicBool::new(false)) }
    }

    /// Returns `false` if the queue is closed or full.
    pub fn push(&self, item: T) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.tx.try_send(item).is_ok()
    }

    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Blocks until an item arrives or `timeout` elapses.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trip() {
        let q = Spsc::new(4);
        assert!(q.push(1));
        assert!(q.push(2));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn closed_queue_rejects_pushes() {
        let q = Spsc::new(4);
        q.close();
        assert!(!q.push(1));
        assert!(q.is_closed());
    }

    #[test]
    fn full_queue_rejects_push() {
        let q = Spsc::new(1);
        assert!(q.push(1));
        assert!(!q.push(2));
    }

    #[test]
    fn clone_shares_the_same_queue() {
        let q = Spsc::new(4);
        let q2 = q.clone();
        q.push(7);
        assert_eq!(q2.try_pop(), Some(7));
    }
}
