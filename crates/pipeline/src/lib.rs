//! Decorating workflow orchestration.
//!
//! [`Orchestrator`] drives a session's [`WorkflowState`] through the remote
//! generation calls: it applies a transition, releases the session lock,
//! awaits the remote call, then re-locks to apply the outcome. Outcomes
//! belonging to a superseded run are dropped by the state's epoch check.
//!
//! [`WorkflowState`]: decora_core::workflow::WorkflowState

pub mod orchestrator;
pub mod remote;

pub use orchestrator::{Orchestrator, Session};
pub use remote::RemoteGeneration;
