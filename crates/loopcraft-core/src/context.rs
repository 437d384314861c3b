use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use loopcraft_critic::Verdict;

/// Iteration bound used when the caller does not specify one.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// State owned by the loop controller for one refine run.
#[derive(Debug, Clone)]
pub struct LoopContext {
    /// Immutable task description, set once at loop start.
    pub task: String,
    /// Current iteration number, 1-based.
    pub iteration: usize,
    /// Append-only history of committed (artifact, verdict) pairs.
    pub history: Vec<IterationRecord>,
    /// Hard bound on passes; at least 1.
    pub max_iterations: usize,
    started_at: Instant,
}

/// One committed iteration: the artifact and the critique it received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub artifact: String,
    pub verdict: Verdict,
    pub generation_secs: f64,
    pub review_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl LoopContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            iteration: 1,
            history: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            started_at: Instant::now(),
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn push_record(&mut self, record: IterationRecord) {
        self.history.push(record);
    }

    pub fn advance(&mut self) {
        self.iteration += 1;
    }

    /// Most recently committed artifact, if any iteration completed.
    pub fn latest_artifact(&self) -> Option<&str> {
        self.history.last().map(|r| r.artifact.as_str())
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}
