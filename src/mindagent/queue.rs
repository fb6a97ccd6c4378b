//! Time-ordered queue of pending agent executions.
//!
//! Entries pop earliest-due first. Entries due at the same instant pop in
//! descending agent priority, then in the order they were pushed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::time::Instant;

/// One pending execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub due: Instant,
    pub priority: i64,
    pub agent_id: String,
    seq: u64,
}

impl Ord for Scheduled {
    // Reversed so that `BinaryHeap` (a max-heap) yields the entry that should run first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct ExecutionQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, agent_id: impl Into<String>, due: Instant, priority: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            due,
            priority,
            agent_id: agent_id.into(),
            seq,
        });
    }

    /// When the next entry falls due, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.due)
    }

    pub fn pop(&mut self) -> Option<Scheduled> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
