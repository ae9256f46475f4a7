pub mod local;
pub mod manual;
pub mod types;

pub use self::local::LocalScheduler;
pub use self::manual::ManualScheduler;
pub use self::types::{Scheduler, Task, TimerId};
