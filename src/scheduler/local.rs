use super::types::{Scheduler, Task, TimerId};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

/// Timers on a tokio [`LocalSet`].
///
/// Tasks are `!Send`, so they are spawned onto the set this scheduler holds
/// and fire while that set is driven, e.g. by [`LocalSet::run_until`].
/// Scheduling itself never needs to happen inside the set.
#[derive(Debug)]
pub struct LocalScheduler {
    local: Rc<LocalSet>,
    next_id: Cell<u64>,
}

impl LocalScheduler {
    pub fn new(local: Rc<LocalSet>) -> Self {
        Self {
            local,
            next_id: Cell::new(0),
        }
    }
}

impl Scheduler for LocalScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.local.spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        id
    }
}
