// SPDX-License-Identifier: GPL-3.0-only
//! Hand-off queue between the observer thread and the reconciliation loop
//!
//! A `VecDeque` behind one mutex, plus a condvar so the consumer sleeps
//! instead of spinning. Every operation holds the lock only for the
//! queue mutation itself.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Logged each time the backlog grows by this many events
const BACKLOG_WARN_STEP: usize = 64;

/// Returned by [`HandoffQueue::push`] once the queue is closed.
/// Carries the event back so the producer can release it.
#[derive(Debug)]
pub struct QueueClosed<E>(pub E);

struct State<E> {
    items: VecDeque<E>,
    closed: bool,
}

pub struct HandoffQueue<E> {
    state: Mutex<State<E>>,
    ready: Condvar,
}

impl<E> HandoffQueue<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    // A panic while holding the lock cannot leave the VecDeque half-mutated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, State<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append at the tail. Fails only after [`close`](Self::close).
    pub fn push(&self, event: E) -> Result<(), QueueClosed<E>> {
        let len = {
            let mut state = self.lock();
            if state.closed {
                return Err(QueueClosed(event));
            }
            state.items.push_back(event);
            state.items.len()
        };
        self.ready.notify_one();

        if len % BACKLOG_WARN_STEP == 0 {
            warn!(pending = len, "hotplug queue backlog growing, consumer may be stalled");
        }
        Ok(())
    }

    /// Remove the head, or `None` when empty. Never blocks.
    pub fn pop(&self) -> Option<E> {
        self.lock().items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything currently queued, in FIFO order, without blocking
    pub fn drain(&self) -> Vec<E> {
        self.lock().items.drain(..).collect()
    }

    /// Block until at least one event is queued, then take all of them.
    ///
    /// Returns `None` once the queue is closed and empty. Events still
    /// queued at close are handed out before that.
    pub fn wait_drain(&self) -> Option<Vec<E>> {
        let mut state = self.lock();
        while state.items.is_empty() && !state.closed {
            state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.items.is_empty() {
            None
        } else {
            Some(state.items.drain(..).collect())
        }
    }

    /// Collect events arriving within `window`. Returns early on close.
    pub fn drain_for(&self, window: Duration) -> Vec<E> {
        let deadline = Instant::now() + window;
        let mut taken = Vec::new();
        let mut state = self.lock();
        loop {
            taken.extend(state.items.drain(..));
            if state.closed {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = self
                .ready
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        taken
    }

    /// Refuse further pushes and wake every waiter
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<E> Default for HandoffQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = HandoffQueue::new();
        for c in ["A", "B", "C"] {
            queue.push(c).unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some("A"));
        assert_eq!(queue.pop(), Some("B"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some("C"));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_across_threads() {
        let queue = Arc::new(HandoffQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    queue.push(i).unwrap();
                }
                queue.close();
            })
        };

        let mut received = Vec::new();
        while let Some(batch) = queue.wait_drain() {
            received.extend(batch);
        }
        producer.join().unwrap();

        assert_eq!(received, (0..10_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_push_pop_counts_balance() {
        let queue = Arc::new(HandoffQueue::new());
        let popped = Arc::new(AtomicUsize::new(0));
        let pushes_per_thread = 5_000;
        let producers = 4;

        let mut handles = Vec::new();
        for p in 0..producers {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..pushes_per_thread {
                    queue.push(p * pushes_per_thread + i).unwrap();
                }
            }));
        }
        for _ in 0..2 {
            let queue = Arc::clone(&queue);
            let popped = Arc::clone(&popped);
            handles.push(thread::spawn(move || {
                for _ in 0..5_000 {
                    if queue.pop().is_some() {
                        popped.fetch_add(1, Ordering::SeqCst);
                    }
                    let _ = queue.len();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let pushed = producers * pushes_per_thread;
        assert_eq!(queue.len(), pushed - popped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_push_after_close_returns_event() {
        let queue = HandoffQueue::new();
        queue.push(1).unwrap();
        queue.close();

        let QueueClosed(rejected) = queue.push(2).unwrap_err();
        assert_eq!(rejected, 2);
        // Events queued before close are still delivered
        assert_eq!(queue.wait_drain(), Some(vec![1]));
        assert_eq!(queue.wait_drain(), None);
    }

    #[test]
    fn test_close_wakes_waiter() {
        let queue = Arc::new(HandoffQueue::<u32>::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_drain())
        };
        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn test_drain_for_collects_late_arrivals() {
        let queue = Arc::new(HandoffQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(7).unwrap();
            })
        };
        let batch = queue.drain_for(Duration::from_millis(500));
        producer.join().unwrap();
        assert_eq!(batch, vec![7]);
    }

    #[test]
    fn test_drain_for_zero_window_takes_pending_only() {
        let queue = HandoffQueue::new();
        queue.push(1).unwrap();
        assert_eq!(queue.drain_for(Duration::ZERO), vec![1]);
        assert!(queue.drain_for(Duration::ZERO).is_empty());
    }
}
