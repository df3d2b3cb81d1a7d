//! `sig-schedule`: the discrete-event scheduling seam.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`scheduler`]   | `Scheduler<E>` trait (`now`, `schedule_at`, `schedule_after`) |
//! | [`event_queue`] | `EventQueue<E>` (`BTreeMap<SimTime, VecDeque<E>>`)    |
//! | [`error`]       | `ScheduleError`, `ScheduleResult<T>`                  |
//!
//! # Delivery model
//!
//! Events are typed payloads, not closures.  Whoever owns the queue pops the
//! next event and dispatches it:
//!
//! ```text
//! while let Some((time, event)) = queue.pop_next() {
//!     // queue.now() == time here
//!     owner.handle(event, &mut queue);
//! }
//! ```
//!
//! Times are delivered in non-decreasing order; events sharing a time are
//! delivered in the order they were scheduled.

pub mod error;
pub mod event_queue;
pub mod scheduler;


pub use error::{ScheduleError, ScheduleResult};
pub use event_queue::EventQueue;
pub use scheduler::Scheduler;
