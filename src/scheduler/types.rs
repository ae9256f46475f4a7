use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

pub type Task = Box<dyn FnOnce()>;

/// One-shot timers on the host's single-threaded event loop.
pub trait Scheduler {
    /// Runs `task` once, no earlier than `delay` from now.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;
}
