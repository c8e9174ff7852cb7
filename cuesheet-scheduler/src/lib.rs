//! Cuesheet Scheduler - Playhead Scheduling
//!
//! Decides, as the playhead moves, which clips are due and how their
//! execution mode is applied; hands valid instructions to an
//! [`AgentExecutor`]; and drives clip status from agent results, approval
//! and rejection.
//!
//! The scheduler is single-threaded and tick-driven. Each tick works on a
//! snapshot of the [`ClipStore`]; edits and generated clips land in the
//! store and are seen on the next tick.

mod executor;
mod scheduler;
mod store;

pub use executor::{AgentExecutor, AgentResult, ChannelExecutor, RecordingExecutor};
pub use scheduler::{ApplyReport, Scheduler, TickReport};
pub use store::{ClipStore, InMemoryClipStore, StoreSnapshot, TRACK_PALETTE};
