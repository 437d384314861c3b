//! # loopcraft-core
//!
//! The generate/reflect/refine loop: a bounded iterative improvement cycle
//! over a text artifact.
//!
//! The [`LoopRunner`] drives up to `max_iterations` passes. Each pass the
//! [`Generator`] drafts (or revises) the artifact from the task plus the
//! full accumulated history, the critic reviews it against a fixed
//! checklist, and the pair is committed to the history. The loop stops
//! early on approval and always returns the most recently generated
//! artifact.
//!
//! ## Key Types
//!
//! - [`LoopRunner`] - Drives the loop state machine
//! - [`LoopContext`] - Task, iteration counter and append-only history
//! - [`LoopOutcome`] - Approved / MaxIterationsReached / Interrupted
//! - [`Generator`] - The drafting role

mod context;
mod error;
mod generator;
mod loop_runner;
mod outcome;

pub use context::{IterationRecord, LoopContext, DEFAULT_MAX_ITERATIONS};
pub use error::{GenerationError, LoopError};
pub use generator::Generator;
pub use loop_runner::LoopRunner;
pub use outcome::LoopOutcome;
