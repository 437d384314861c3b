//! # loopcraft-patterns
//!
//! Thin call-orchestration patterns over the [`ChatClient`] contract:
//!
//! - [`PromptChain`] - sequential pipeline, each step consumes the previous
//!   step's output
//! - [`Extractor`] - per-field extraction with validation and a targeted
//!   re-extraction pass for missing fields
//! - [`Router`] - intent classification and dispatch to a handler prompt
//! - [`FanOut`] - parallel independent sub-tasks joined and merged by a
//!   [`Synthesizer`]
//! - [`ToolAgent`] - tool selection, local dispatch and answer composition
//!   over a registry of [`Tool`]s
//!
//! Each pattern is a handful of model calls with no machinery beyond what
//! the orchestration itself needs.
//!
//! [`ChatClient`]: loopcraft_llm::ChatClient

mod chain;
mod error;
mod extract;
mod fanout;
mod route;
mod tools;

pub use chain::{ChainOutput, ChainStep, PromptChain, StepRecord};
pub use error::PatternError;
pub use extract::{ExtractedField, ExtractionReport, Extractor, FieldSpec, FieldStatus};
pub use fanout::{BranchOutput, FanOut, FanOutResult, SubTask, Synthesizer};
pub use route::{Dispatch, Route, Router};
pub use tools::{Tool, ToolAgent, ToolAnswer, ToolInvocation};
