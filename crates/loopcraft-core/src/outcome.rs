use serde::{Deserialize, Serialize};

use crate::context::{IterationRecord, LoopContext};

/// Final result of a refine run.
///
/// The artifact is always the most recently generated version, whether or
/// not the critic approved it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoopOutcome {
    /// Critic signalled approval.
    Approved {
        iterations: usize,
        artifact: String,
        history: Vec<IterationRecord>,
        total_duration_secs: f64,
    },
    /// Iteration bound hit without approval.
    MaxIterationsReached {
        iterations: usize,
        artifact: String,
        history: Vec<IterationRecord>,
        total_duration_secs: f64,
    },
    /// Cancellation observed between iterations; best artifact so far is
    /// preserved rather than discarded.
    Interrupted {
        iterations: usize,
        artifact: Option<String>,
        history: Vec<IterationRecord>,
        total_duration_secs: f64,
    },
}

impl LoopOutcome {
    pub(crate) fn approved(context: LoopContext) -> Self {
        let total_duration_secs = context.total_duration().as_secs_f64();
        Self::Approved {
            iterations: context.history.len(),
            artifact: context
                .latest_artifact()
                .unwrap_or_default()
                .to_string(),
            history: context.history,
            total_duration_secs,
        }
    }

    pub(crate) fn max_iterations_reached(context: LoopContext) -> Self {
        let total_duration_secs = context.total_duration().as_secs_f64();
        Self::MaxIterationsReached {
            iterations: context.history.len(),
            artifact: context
                .latest_artifact()
                .unwrap_or_default()
                .to_string(),
            history: context.history,
            total_duration_secs,
        }
    }

    pub(crate) fn interrupted(context: LoopContext) -> Self {
        let total_duration_secs = context.total_duration().as_secs_f64();
        Self::Interrupted {
            iterations: context.history.len(),
            artifact: context.latest_artifact().map(str::to_string),
            history: context.history,
            total_duration_secs,
        }
    }

    /// Number of completed generate+reflect passes.
    pub fn iterations(&self) -> usize {
        match self {
            Self::Approved { iterations, .. } => *iterations,
            Self::MaxIterationsReached { iterations, .. } => *iterations,
            Self::Interrupted { iterations, .. } => *iterations,
        }
    }

    /// Most recently generated artifact, if any pass completed.
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Self::Approved { artifact, .. } => Some(artifact),
            Self::MaxIterationsReached { artifact, .. } => Some(artifact),
            Self::Interrupted { artifact, .. } => artifact.as_deref(),
        }
    }

    pub fn history(&self) -> &[IterationRecord] {
        match self {
            Self::Approved { history, .. } => history,
            Self::MaxIterationsReached { history, .. } => history,
            Self::Interrupted { history, .. } => history,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Completion (approved or bound reached) exits 0; interruption uses
    /// the conventional SIGINT code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Approved { .. } | Self::MaxIterationsReached { .. } => 0,
            Self::Interrupted { .. } => 130,
        }
    }
}
