use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured lifecycle events for the refine loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    LoopStarted {
        task: String,
        max_iterations: usize,
    },
    GeneratorStarted {
        iteration: usize,
    },
    GeneratorCompleted {
        iteration: usize,
        artifact_chars: usize,
        duration_secs: f64,
    },
    CriticStarted {
        iteration: usize,
    },
    CriticVerdict {
        iteration: usize,
        verdict: String,
    },
    /// Critic output was unusable; the iteration proceeds without feedback.
    CritiqueDegraded {
        iteration: usize,
        reason: String,
    },
    LoopApproved {
        iterations: usize,
        duration_secs: f64,
    },
    MaxIterationsReached {
        iterations: usize,
    },
    GenerationFailed {
        iteration: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp when serializing to the audit file.
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines for machine consumption
    Json,
    /// Minimal single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Event logger writing to stderr, plus an optional JSON-lines audit file.
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Log to a file in addition to the console. The file always receives
    /// JSON lines regardless of the console format.
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let _ = writeln!(file, "{}", event.with_timestamp());
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::LoopStarted {
                task,
                max_iterations,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(stderr, "{}", "loopcraft refine".bold().bright_white());
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Task:".dimmed(),
                    truncate(task, 72).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Max iterations:".dimmed(),
                    max_iterations
                );
                let _ = writeln!(stderr);
            }
            LogEvent::GeneratorStarted { iteration } => {
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("── Iteration {} ──", iteration).bright_blue().bold()
                );
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "GENERATOR".bright_cyan().bold()
                );
            }
            LogEvent::GeneratorCompleted {
                artifact_chars,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} chars ({:.1}s)",
                    "✓".bright_green(),
                    artifact_chars,
                    duration_secs
                );
            }
            LogEvent::CriticStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "CRITIC".bright_magenta().bold()
                );
            }
            LogEvent::CriticVerdict { verdict, .. } => {
                let styled = if verdict.contains("APPROVED") {
                    format!("✓ Verdict: {}", verdict).bright_green().to_string()
                } else if verdict.contains("DEGRADED") {
                    format!("⚠ Verdict: {}", verdict).bright_yellow().to_string()
                } else {
                    format!("→ Verdict: {}", verdict).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                let _ = writeln!(stderr);
            }
            LogEvent::CritiqueDegraded { reason, .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} {}",
                    "⚠".bright_yellow(),
                    format!("Critique unusable: {}", reason).dimmed()
                );
            }
            LogEvent::LoopApproved {
                iterations,
                duration_secs,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} Approved after {} iteration(s) in {:.1}s",
                    "✓".bright_green(),
                    iterations,
                    duration_secs
                );
            }
            LogEvent::MaxIterationsReached { iterations } => {
                let _ = writeln!(
                    stderr,
                    "{} Maximum iterations reached ({})",
                    "⚠".bright_yellow(),
                    iterations
                );
            }
            LogEvent::GenerationFailed { iteration, error } => {
                let _ = writeln!(
                    stderr,
                    "{} Generation failed in iteration {}: {}",
                    "✗".bright_red(),
                    iteration,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::LoopStarted { max_iterations, .. } => {
                format!("[{}] loop:start max={}", timestamp, max_iterations)
            }
            LogEvent::GeneratorStarted { iteration } => {
                format!("[{}] generator:start:{}", timestamp, iteration)
            }
            LogEvent::GeneratorCompleted {
                iteration,
                artifact_chars,
                duration_secs,
            } => format!(
                "[{}] generator:done:{} {}ch {:.1}s",
                timestamp, iteration, artifact_chars, duration_secs
            ),
            LogEvent::CriticStarted { iteration } => {
                format!("[{}] critic:start:{}", timestamp, iteration)
            }
            LogEvent::CriticVerdict { iteration, verdict } => {
                format!("[{}] critic:done:{} {}", timestamp, iteration, verdict)
            }
            LogEvent::CritiqueDegraded { iteration, reason } => {
                format!("[{}] critic:degraded:{} {}", timestamp, iteration, reason)
            }
            LogEvent::LoopApproved {
                iterations,
                duration_secs,
            } => format!(
                "[{}] loop:approved:{} {:.1}s",
                timestamp, iterations, duration_secs
            ),
            LogEvent::MaxIterationsReached { iterations } => {
                format!("[{}] loop:limit:{}", timestamp, iterations)
            }
            LogEvent::GenerationFailed { iteration, error } => {
                format!("[{}] error:{}:{}", timestamp, iteration, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len - 3;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!(LogFormat::from_str("Pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
        assert!(LogFormat::from_str("verbose").is_err());
    }

    #[test]
    fn truncation_never_splits_a_character() {
        let task = "ü".repeat(50);
        let truncated = truncate(&task, 72);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().all(|c| c == 'ü' || c == '.'));

        assert_eq!(truncate("short", 72), "short");
    }

    #[test]
    fn events_serialize_with_event_tag() {
        let event = LogEvent::CriticVerdict {
            iteration: 2,
            verdict: "APPROVED".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "critic_verdict");
        assert_eq!(json["iteration"], 2);
    }

    #[test]
    fn file_logger_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::MaxIterationsReached { iterations: 3 });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["event"], "max_iterations_reached");
        assert!(line["timestamp"].is_string());
    }
}
