//! Priority-ordered ready queue with a hard capacity.

use crate::error::{EngineError, EngineResult};
use crate::job::{JobId, JobPriority};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::Notify;

#[derive(Debug)]
struct QueueEntry {
    priority: JobPriority,
    seq: u64,
    job_id: JobId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first; FIFO (lower sequence) within a priority.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

/// Bounded ready queue: high > normal > low, FIFO within priority.
/// Exceeding the capacity fails submission with `Overloaded`.
pub struct ReadyQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
}

impl ReadyQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
            capacity,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a job; `Overloaded` at capacity.
    pub fn push(&self, job_id: JobId, priority: JobPriority) -> EngineResult<()> {
        {
            let mut state = self.state.lock();
            if state.heap.len() >= self.capacity {
                return Err(EngineError::Overloaded(format!(
                    "ready queue at capacity ({})",
                    self.capacity
                )));
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(QueueEntry {
                priority,
                seq,
                job_id,
            });
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Dequeue the next job, waiting when empty. Returns `None` once the
    /// queue is closed and drained.
    pub async fn pop(&self) -> Option<JobId> {
        loop {
            if let Some(entry) = self.state.lock().heap.pop() {
                return Some(entry.job_id);
            }
            if self.closed.load(AtomicOrdering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wake all waiting workers for shutdown.
    pub fn close(&self) {
        self.closed.store(true, AtomicOrdering::Release);
        self.notify.notify_waiters();
    }
}
