#![forbid(unsafe_code)]

//! Deterministic single-threaded event loop.
//!
//! Models the three queues the sync engine cares about:
//!
//! 1. **Microtasks**: watcher deliveries. Always drained first.
//! 2. **After-flush callbacks**: run once the current update flush is done,
//!    i.e. after the microtask queue is empty.
//! 3. **Tasks**: zero-delay deferred work. One task per turn, and only once
//!    both queues above are empty.
//!
//! Because a task can only start after every queued delivery has run, any
//! record produced by a write is observed before a task deferred by that
//! same write.
//!
//! # Invariants
//!
//! - Tasks queued while draining are picked up in the same drain call.
//! - [`EventLoop::run_until_idle`] stops after [`MAX_TURNS`] turns so a
//!   self-rescheduling task cannot hang a test.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Upper bound on turns executed by [`EventLoop::run_until_idle`].
pub const MAX_TURNS: usize = 10_000;

#[derive(Default)]
struct Queues {
    microtasks: VecDeque<Task>,
    after_flush: VecDeque<Task>,
    tasks: VecDeque<Task>,
}

/// Shared handle to a task queue set. Clones share the queues.
#[derive(Clone, Default)]
pub struct EventLoop {
    queues: Rc<RefCell<Queues>>,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queues = self.queues.borrow();
        f.debug_struct("EventLoop")
            .field("microtasks", &queues.microtasks.len())
            .field("after_flush", &queues.after_flush.len())
            .field("tasks", &queues.tasks.len())
            .finish()
    }
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_microtask(&self, task: Task) {
        self.queues.borrow_mut().microtasks.push_back(task);
    }

    pub fn queue_after_flush(&self, task: Task) {
        self.queues.borrow_mut().after_flush.push_back(task);
    }

    pub fn queue_task(&self, task: Task) {
        self.queues.borrow_mut().tasks.push_back(task);
    }

    /// Total queued work across all queues.
    #[must_use]
    pub fn pending(&self) -> usize {
        let queues = self.queues.borrow();
        queues.microtasks.len() + queues.after_flush.len() + queues.tasks.len()
    }

    /// Drain the microtask queue. Returns how many ran.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        // Borrow is released before each task runs; tasks may queue more.
        while let Some(task) = self.pop(|q| q.microtasks.pop_front()) {
            task();
            ran += 1;
        }
        ran
    }

    /// Finish the current update flush: drain microtasks, then run every
    /// after-flush callback, draining microtasks after each one.
    pub fn flush(&self) -> usize {
        let mut ran = self.run_microtasks();
        while let Some(task) = self.pop(|q| q.after_flush.pop_front()) {
            task();
            ran += 1 + self.run_microtasks();
        }
        ran
    }

    /// Complete the current flush, then run one deferred task (if any) and
    /// the microtasks it produced. Returns `false` when no task was queued.
    pub fn run_next_task(&self) -> bool {
        self.flush();
        match self.pop(|q| q.tasks.pop_front()) {
            Some(task) => {
                task();
                self.flush();
                true
            }
            None => false,
        }
    }

    /// Run turns until every queue is empty. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while turns < MAX_TURNS && self.run_next_task() {
            turns += 1;
        }
        if turns == MAX_TURNS {
            tracing::warn!(turns, "event loop stopped at turn limit");
        }
        turns
    }

    fn pop(&self, take: impl FnOnce(&mut Queues) -> Option<Task>) -> Option<Task> {
        take(&mut self.queues.borrow_mut())
    }
}
