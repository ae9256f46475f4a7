use super::types::{Scheduler, Task, TimerId};
use std::cell::{Cell, RefCell};
use std::time::Duration;

struct Pending {
    id: TimerId,
    due: Duration,
    task: Task,
}

/// Virtual-clock scheduler: time only moves when [`advance`](Self::advance) is called.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<Vec<Pending>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Timers scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Moves the clock forward, firing due timers in deadline order.
    ///
    /// Timers scheduled by a firing task run in the same call if they fall due
    /// before the new time. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;
        while let Some(pending) = self.pop_due(target) {
            self.now.set(pending.due.max(self.now.get()));
            (pending.task)();
            fired += 1;
        }
        self.now.set(target);
        fired
    }

    /// Fires everything, including timers scheduled along the way.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        loop {
            let next_due = self.queue.borrow().iter().map(|p| p.due).min();
            match next_due {
                Some(due) => fired += self.advance(due.saturating_sub(self.now.get())),
                None => return fired,
            }
        }
    }

    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut queue = self.queue.borrow_mut();
        // Earliest deadline first, then scheduling order.
        let idx = queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(idx, _)| idx)?;
        Some(queue.remove(idx))
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().push(Pending {
            id,
            due: self.now.get() + delay,
            task,
        });
        id
    }
}
