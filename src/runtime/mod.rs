//! Scheduling primitives.
//!
//! Re-evaluation is driven cooperatively: an [`EventLoop`] owns the next-turn
//! queue and the timers, a [`Throttle`] rate-limits the resize handler on top
//! of it, and a [`Clock`] decides what "now" means.

/// Time sources.
pub mod clock;
/// Next-turn queue and timers.
pub mod event_loop;
/// Leading + trailing throttle.
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event_loop::{EventLoop, Task, TimerId};
pub use throttle::Throttle;
