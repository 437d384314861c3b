//! # loopcraft-critic
//!
//! The critic role of the refine loop: review an artifact against a fixed
//! checklist and answer with either the canonical approval phrase or an
//! itemized list of concrete issues.
//!
//! ## Key Types
//!
//! - [`Critic`] - Runs one review call against a [`ChatClient`]
//! - [`Verdict`] - Approved / Revise / Degraded classification
//! - [`CriticPrompts`] - Checklist prompt templates
//!
//! [`ChatClient`]: loopcraft_llm::ChatClient

mod critic;
mod prompts;
mod verdict;

pub use critic::Critic;
pub use prompts::CriticPrompts;
pub use verdict::{Verdict, APPROVAL_MARKER};
