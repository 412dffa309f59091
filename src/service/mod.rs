//! Service layer: rendering, delivery and the poll loop.
//!
//! [`PollLoop`] owns the cycle: it asks the [`crate::feed::Normalizer`]
//! for a snapshot, diffs it against the previous one, hands the delta to
//! the [`Dispatcher`] and publishes the result. [`render`] turns notices
//! and snapshots into chat text for both the dispatcher and the inbound
//! commands.

pub mod dispatcher;
pub mod poll_loop;
pub mod render;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use poll_loop::{CycleReport, PollLoop, PollState, ReportReceiver};
