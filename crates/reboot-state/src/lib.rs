//! Reboot coordination state, persisted as Node annotations.
//!
//! The node object itself is the ledger: no separate state store exists. Three
//! annotation keys encode where a node is in its reboot lifecycle, and this
//! crate is the only place that reads or writes them. Everything here is a pure
//! function over a `Node` (or a private copy of one); persistence is the
//! caller's problem.

mod availability;
mod state;

pub use availability::{count_unavailable, is_unavailable, ready_condition_is_false};
pub use state::{
    APPROVED_ANNOTATION, IN_PROGRESS_ANNOTATION, NEEDED_ANNOTATION, RebootState, approve,
    begin_reboot, finish_reboot,
};
