//! The triage pipeline — per-cycle orchestration and the outer service loop.
//!
//! Two error boundaries, one per loop level:
//! - inside a cycle, a failure on one message is logged and the cycle moves
//!   on to the next message;
//! - outside, a failed cycle puts the service into an extended cooldown and
//!   is retried; the process does not exit.

pub mod cycle;
pub mod service;

pub use cycle::{CycleStats, MessageOutcome, TriageCycle};
pub use service::TriageService;
