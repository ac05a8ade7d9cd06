//! Import queue with drain coalescing.
//!
//! Paths reported by the watcher pile up here until a drain takes a snapshot of
//! everything queued. A path already waiting is not queued twice. The queue
//! only tracks state; the owner decides when the settle window has elapsed.
//!
//! ```text
//!   Idle --enqueue--> Queuing --begin_drain--> Draining --finish_drain--> Idle
//!                        ^                                   |
//!                        +------- items left over -----------+
//! ```

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing queued, no drain pending
    Idle,
    /// Items queued, a drain is scheduled
    Queuing,
    /// A snapshot is being processed
    Draining,
}

/// Whether the owner needs to schedule a drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DrainRequest {
    Schedule,
    AlreadyPending,
}

#[derive(Debug)]
pub struct ImportQueue {
    pending: VecDeque<PathBuf>,
    queued: HashSet<PathBuf>,
    state: QueueState,
}

impl Default for ImportQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            queued: HashSet::new(),
            state: QueueState::Idle,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append a path and request a drain.
    ///
    /// Only the first request after Idle asks for a drain; requests while
    /// queuing or draining are absorbed. A path that is still pending keeps
    /// its original position.
    pub fn enqueue(&mut self, path: PathBuf) -> DrainRequest {
        if self.queued.insert(path.clone()) {
            self.pending.push_back(path);
        }

        match self.state {
            QueueState::Idle => {
                self.state = QueueState::Queuing;
                DrainRequest::Schedule
            }
            QueueState::Queuing | QueueState::Draining => DrainRequest::AlreadyPending,
        }
    }

    /// Take everything queued so far and enter Draining.
    ///
    /// Returns `None` unless a drain was scheduled.
    pub fn begin_drain(&mut self) -> Option<Vec<PathBuf>> {
        if self.state != QueueState::Queuing {
            return None;
        }
        self.state = QueueState::Draining;
        self.queued.clear();
        Some(self.pending.drain(..).collect())
    }

    /// Leave Draining; items that arrived meanwhile need another drain
    pub fn finish_drain(&mut self) -> DrainRequest {
        if self.pending.is_empty() {
            self.state = QueueState::Idle;
            DrainRequest::AlreadyPending
        } else {
            self.state = QueueState::Queuing;
            DrainRequest::Schedule
        }
    }
}
