//! Decora domain model.
//!
//! Everything in this crate is synchronous and side-effect free: image
//! intake and encoding, the fixed style catalog and prompt texts, the
//! proposal types, and the workflow state machine whose transitions the
//! orchestrator applies around remote calls.

pub mod error;
pub mod image;
pub mod prompts;
pub mod proposal;
pub mod style;
pub mod types;
pub mod workflow;
