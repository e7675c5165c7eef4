//! Poll-and-publish loop
//!
//! [`CycleRunner`] performs one inventory pass and updates the gauge
//! registry; [`Scheduler`] repeats it on a fixed interval.

mod cycle;
mod scheduler;


pub use cycle::{CycleRunner, CycleRunnerBuilder};
pub use scheduler::{Scheduler, DEFAULT_POLL_INTERVAL};
