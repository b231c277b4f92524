//! Frame Queue - Capture thread → engine thread hand-off
//!
//! Bounded FIFO. When full the oldest frame is dropped (the engine prefers
//! fresh frames over a backlog). Pushes must keep timestamp order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::logic::error::EngineError;
use crate::logic::landmarks::LandmarkFrame;

pub const DEFAULT_CAPACITY: usize = 256;

struct Inner {
    frames: VecDeque<LandmarkFrame>,
    last_pushed: Option<f64>,
    closed: bool,
}

pub struct FrameQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
    space: Condvar,
    capacity: usize,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity.max(1)),
                last_pushed: None,
                closed: false,
            }),
            ready: Condvar::new(),
            space: Condvar::new(),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a frame. Out-of-order and post-close pushes are refused.
    pub fn push(&self, frame: LandmarkFrame) -> Result<(), EngineError> {
        let inner = self.inner.lock();
        self.push_locked(inner, frame)
    }

    /// Enqueue without dropping: waits for room (replay sources)
    pub fn push_wait(&self, frame: LandmarkFrame) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        while inner.frames.len() >= self.capacity && !inner.closed {
            self.space.wait(&mut inner);
        }
        self.push_locked(inner, frame)
    }

    fn push_locked(&self, mut inner: MutexGuard<'_, Inner>, frame: LandmarkFrame) -> Result<(), EngineError> {
        if inner.closed {
            return Err(EngineError::Stopped);
        }
        if let Some(previous) = inner.last_pushed {
            if !(frame.timestamp > previous) {
                return Err(EngineError::ClockNonMonotonic {
                    previous,
                    received: frame.timestamp,
                });
            }
        }

        inner.last_pushed = Some(frame.timestamp);
        if inner.frames.len() >= self.capacity {
            inner.frames.pop_front();
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if total.is_power_of_two() {
                log::warn!("Frame queue full, {} frames dropped so far", total);
            }
        }
        inner.frames.push_back(frame);
        drop(inner);

        self.ready.notify_one();
        Ok(())
    }

    /// Block until a frame arrives. `None` once closed and drained.
    pub fn pop(&self) -> Option<LandmarkFrame> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(frame) = inner.frames.pop_front() {
                self.space.notify_one();
                return Some(frame);
            }
            if inner.closed {
                return None;
            }
            self.ready.wait(&mut inner);
        }
    }

    /// Like `pop`, giving up after `timeout`
    pub fn pop_timeout(&self, timeout: Duration) -> Option<LandmarkFrame> {
        let mut inner = self.inner.lock();
        if inner.frames.is_empty() && !inner.closed {
            self.ready.wait_for(&mut inner, timeout);
        }
        let frame = inner.frames.pop_front();
        if frame.is_some() {
            self.space.notify_one();
        }
        frame
    }

    /// Wake all waiters; queued frames can still be drained
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.ready.notify_all();
        self.space.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn frame(t: f64) -> LandmarkFrame {
        LandmarkFrame::no_face(t)
    }

    #[test]
    fn test_fifo_order() {
        let q = FrameQueue::new(8);
        for t in 1..=3 {
            q.push(frame(t as f64)).unwrap();
        }
        let got: Vec<f64> = (0..3).filter_map(|_| q.pop_timeout(Duration::from_millis(1))).map(|f| f.timestamp).collect();
        assert_eq!(got, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_drop_oldest_when_full() {
        let q = FrameQueue::new(3);
        for t in 1..=5 {
            q.push(frame(t as f64)).unwrap();
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.dropped(), 2);
        assert_eq!(q.pop().unwrap().timestamp, 3.0);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let q = FrameQueue::new(8);
        q.push(frame(2.0)).unwrap();
        assert!(matches!(q.push(frame(1.0)), Err(EngineError::ClockNonMonotonic { .. })));
        assert!(q.push(frame(2.0)).is_err());
        assert_eq!(q.len(), 1);
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn test_close_drains_then_ends() {
        let q = FrameQueue::new(8);
        q.push(frame(1.0)).unwrap();
        q.close();
        assert!(matches!(q.push(frame(2.0)), Err(EngineError::Stopped)));
        assert_eq!(q.pop().unwrap().timestamp, 1.0);
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_pop_timeout_empty() {
        let q = FrameQueue::new(8);
        assert!(q.pop_timeout(Duration::from_millis(5)).is_none());
    }

    #[test]
    fn test_cross_thread_handoff() {
        let q = Arc::new(FrameQueue::new(1024));
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 1..=500 {
                    q.push(frame(i as f64 * 0.1)).unwrap();
                }
                q.close();
            })
        };

        let mut last = 0.0;
        let mut count = 0;
        while let Some(f) = q.pop() {
            assert!(f.timestamp > last);
            last = f.timestamp;
            count += 1;
        }
        producer.join().unwrap();
        assert_eq!(count, 500);
    }

    #[test]
    fn test_push_wait_never_drops() {
        let q = Arc::new(FrameQueue::new(4));
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 1..=200 {
                    q.push_wait(frame(i as f64)).unwrap();
                }
                q.close();
            })
        };

        let mut count = 0;
        while q.pop().is_some() {
            count += 1;
        }
        producer.join().unwrap();
        assert_eq!(count, 200);
        assert_eq!(q.dropped(), 0);
    }
}
