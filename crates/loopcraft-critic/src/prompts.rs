use loopcraft_llm::Message;

use crate::verdict::APPROVAL_MARKER;

/// Prompt templates for the critic role.
pub struct CriticPrompts;

impl CriticPrompts {
    /// System prompt fixing the checklist so revisions are judged against
    /// stable criteria on every iteration.
    pub fn system_prompt() -> String {
        format!(
            r#"You are a rigorous reviewer of generated artifacts. Review the artifact strictly against this checklist, in order:

1. Correctness: the logic does what the task asks.
2. Edge cases: invalid, boundary and degenerate inputs are handled.
3. Style and documentation: naming is clear and the artifact is documented.
4. Requirement coverage: every requirement in the task is addressed.

Apply the same checklist on every review.

Respond in exactly one of two ways:

- If nothing needs to change, reply with this exact phrase on a line of its own and nothing else:
{APPROVAL_MARKER}

- Otherwise, reply with a bullet list of concrete, actionable issues, one `- ` bullet per issue. Do not include praise or summaries, only the issues."#
        )
    }

    /// Transcript for one review call.
    pub fn review_messages(task: &str, artifact: &str, iteration: usize) -> Vec<Message> {
        let request = format!(
            r#"## Task
{task}

## Artifact (version {iteration})
```
{artifact}
```

Review the artifact against the checklist."#,
            task = task,
            artifact = truncate_at_line(artifact, 20_000),
            iteration = iteration,
        );

        vec![Message::system(Self::system_prompt()), Message::user(request)]
    }
}

/// Truncate long artifacts at a line boundary to keep review prompts bounded.
fn truncate_at_line(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    match text[..cut].rfind('\n') {
        Some(pos) => &text[..pos],
        None => &text[..cut],
    }
}
