//! Background loops for the lunch-train bot.
//!
//! - **Train scheduler** (`train`) - the daily cycle: wait for the open
//!   instant, post the participation prompt, wait for the close instant,
//!   resolve the vote, announce, reset, advance to the next enabled day
//! - **Cache refresher** (`refresher`) - keeps time-bounded configuration
//!   reads warm
//! - **Clock** (`clock`) - the time source seam that makes both loops
//!   testable
//!
//! Both loops are tokio tasks with the same cancellation discipline: a stop
//! flag observed at every poll point, and a `stop()` that returns only after
//! the task has terminated.

pub mod clock;
pub mod refresher;
pub mod train;

pub use clock::{Clock, ManualClock, SystemClock};
pub use refresher::CacheRefresher;
pub use train::{SharedWindow, TrainScheduler};
