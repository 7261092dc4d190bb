//! Ordered holding area for commands that arrive before the transport.
//!
//! The queue itself does no I/O. [`CommandQueue::submit`] tells the caller
//! whether to dispatch now or that the command was parked; when the
//! transport shows up, [`CommandQueue::on_ready`] hands back everything that
//! was parked, oldest first.

use std::collections::vec_deque::Drain;
use std::collections::VecDeque;

/// Whether the transport is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    NotReady,
    Ready,
}

/// What the caller should do with a submitted command.
#[derive(Debug, PartialEq, Eq)]
pub enum Submission<C> {
    /// Ready: dispatch it now.
    Dispatch(C),
    /// Not ready: parked at `position` (zero-based).
    Queued { position: usize },
    /// Not ready and the queue is at capacity. The command is handed back.
    Rejected(C),
}

/// FIFO command queue gated on transport readiness.
#[derive(Debug)]
pub struct CommandQueue<C> {
    state: QueueState,
    pending: VecDeque<C>,
    capacity: Option<usize>,
}

impl<C> CommandQueue<C> {
    /// An unbounded queue, initially not ready.
    pub fn new() -> Self {
        Self::with_capacity_limit(None)
    }

    /// A queue holding at most `limit` parked commands.
    pub fn with_capacity_limit(limit: Option<usize>) -> Self {
        Self {
            state: QueueState::NotReady,
            pending: VecDeque::new(),
            capacity: limit,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == QueueState::Ready
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn submit(&mut self, command: C) -> Submission<C> {
        match self.state {
            QueueState::Ready => Submission::Dispatch(command),
            QueueState::NotReady => {
                if self.capacity.is_some_and(|cap| self.pending.len() >= cap) {
                    return Submission::Rejected(command);
                }
                self.pending.push_back(command);
                Submission::Queued {
                    position: self.pending.len() - 1,
                }
            }
        }
    }

    /// Become ready and drain parked commands in arrival order.
    ///
    /// The state flips before the drain is consumed, so the caller must
    /// dispatch the drained commands before releasing whatever lock guards
    /// the queue; otherwise a newer command could overtake them.
    pub fn on_ready(&mut self) -> Drain<'_, C> {
        self.state = QueueState::Ready;
        self.pending.drain(..)
    }

    /// The transport went away; new commands park again.
    pub fn on_teardown(&mut self) {
        self.state = QueueState::NotReady;
    }

    /// Number of parked commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<C> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queues_until_ready() {
        let mut queue = CommandQueue::new();
        assert_eq!(queue.state(), QueueState::NotReady);
        assert_eq!(queue.submit("a"), Submission::Queued { position: 0 });
        assert_eq!(queue.submit("b"), Submission::Queued { position: 1 });
        assert_eq!(queue.len(), 2);

        let drained: Vec<_> = queue.on_ready().collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(queue.is_empty());
        assert!(queue.is_ready());
    }

    #[test]
    fn test_dispatches_when_ready() {
        let mut queue = CommandQueue::new();
        queue.on_ready().for_each(drop);
        assert_eq!(queue.submit(1), Submission::Dispatch(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ready_with_nothing_parked() {
        let mut queue: CommandQueue<u8> = CommandQueue::new();
        assert_eq!(queue.on_ready().count(), 0);
        assert!(queue.is_ready());
    }

    #[test]
    fn test_teardown_parks_again() {
        let mut queue = CommandQueue::new();
        queue.on_ready().for_each(drop);
        queue.on_teardown();
        assert_eq!(queue.submit("late"), Submission::Queued { position: 0 });
    }

    #[test]
    fn test_capacity_limit_rejects() {
        let mut queue = CommandQueue::with_capacity_limit(Some(1));
        assert_eq!(queue.submit(1), Submission::Queued { position: 0 });
        assert_eq!(queue.submit(2), Submission::Rejected(2));
        assert_eq!(queue.len(), 1);

        // The limit only applies while parked.
        queue.on_ready().for_each(drop);
        assert_eq!(queue.submit(3), Submission::Dispatch(3));
    }
}
