//! Deferred work scheduled against simulation time.
//!
//! Anything that "waits" (finishing a meal, re-checking evolution after an
//! interaction) is a [`Continuation`] in a [`ContinuationQueue`]. The queue
//! is a min-heap ordered by `(deadline, sequence)`, so continuations due at
//! the same instant fire in the order they were scheduled. Continuations
//! can be cancelled by token or in bulk by agent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use menagerie_types::{AgentKey, ResourceId};

/// Work to run once its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Complete the consumption `agent` started on `resource`.
    FinishConsumption {
        /// The eating agent.
        agent: AgentKey,
        /// The resource being eaten.
        resource: ResourceId,
    },
    /// Arm the post-interaction evolution re-check for `agent`.
    ReevaluateEvolution {
        /// The agent to re-check.
        agent: AgentKey,
    },
}

impl Continuation {
    /// The agent the continuation belongs to.
    pub const fn agent(&self) -> AgentKey {
        match *self {
            Self::FinishConsumption { agent, .. } | Self::ReevaluateEvolution { agent } => agent,
        }
    }
}

/// Handle for cancelling a scheduled continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContinuationToken(u64);

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    deadline: f64,
    sequence: u64,
    continuation: Continuation,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so that `BinaryHeap` (a max-heap) pops the earliest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .total_cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-heap of pending continuations.
#[derive(Debug, Clone, Default)]
pub struct ContinuationQueue {
    heap: BinaryHeap<Scheduled>,
    next_sequence: u64,
}

impl ContinuationQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Schedule `continuation` to run at `deadline`.
    pub fn schedule(&mut self, deadline: f64, continuation: Continuation) -> ContinuationToken {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.heap.push(Scheduled {
            deadline,
            sequence,
            continuation,
        });
        ContinuationToken(sequence)
    }

    /// Remove every continuation due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<Continuation> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|s| s.deadline <= now) {
            if let Some(entry) = self.heap.pop() {
                due.push(entry.continuation);
            }
        }
        due
    }

    /// Cancel one continuation. Returns `false` if it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, token: ContinuationToken) -> bool {
        let before = self.heap.len();
        self.heap.retain(|s| s.sequence != token.0);
        self.heap.len() != before
    }

    /// Cancel every continuation matching `predicate`. Returns how many
    /// were removed.
    pub fn cancel_where(&mut self, predicate: impl Fn(&Continuation) -> bool) -> usize {
        let before = self.heap.len();
        self.heap.retain(|s| !predicate(&s.continuation));
        before.saturating_sub(self.heap.len())
    }

    /// Cancel every continuation belonging to `agent`.
    pub fn cancel_agent(&mut self, agent: AgentKey) -> usize {
        self.cancel_where(|c| c.agent() == agent)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<f64> {
        self.heap.peek().map(|s| s.deadline)
    }

    /// Number of pending continuations.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
