//! Breadth-first work queue with in-flight tracking.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::models::CrawlTask;

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<CrawlTask>,
    in_flight: usize,
}

/// Pending crawl tasks.
///
/// The crawl is finished when the queue is empty and no popped task is still
/// being processed, since an in-flight task may push children.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<State>,
    notify: Notify,
    max_depth: usize,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            max_depth,
        }
    }

    /// Enqueue a task. Tasks deeper than `max_depth` are dropped and `false`
    /// is returned.
    pub fn push(&self, task: CrawlTask) -> bool {
        if task.depth > self.max_depth {
            return false;
        }
        self.state.lock().queue.push_back(task);
        self.notify.notify_one();
        true
    }

    /// Take the next task, waiting while the queue is empty but other tasks
    /// are in flight.
    ///
    /// Returns `None` once the frontier is drained or the run is cancelled.
    /// Every returned task must be followed by a call to [`Frontier::task_done`].
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<CrawlTask> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(task) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(task);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
            }
        }
    }

    /// Mark a popped task as finished.
    pub fn task_done(&self) {
        let drained = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0 && state.queue.is_empty()
        };
        if drained {
            self.notify.notify_waiters();
        }
    }

    /// Tasks waiting in the queue.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }
}
