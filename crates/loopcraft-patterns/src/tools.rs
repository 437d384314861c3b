//! Tool-using agent: one selection call picks a tool from the registry,
//! the tool runs locally, and a final call composes the answer from the
//! tool result.
//!
//! The selection protocol is plain text (`tool_name: input` or `none`)
//! so it works against any chat endpoint, not only function-calling ones.

use serde::Serialize;
use tracing::debug;

use loopcraft_llm::{ChatClient, Message};

use crate::error::PatternError;

/// A locally executed capability the agent can call. Handlers are
/// synchronous and infallible; a tool that finds nothing returns a
/// "nothing found" result rather than an error.
pub struct Tool {
    pub name: String,
    pub description: String,
    handler: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Box::new(handler),
        }
    }

    fn run(&self, input: &str) -> String {
        (self.handler)(input)
    }
}

/// Record of one executed tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: String,
    pub output: String,
}

/// Answer to one query, with the tool call that produced it (if any).
#[derive(Debug, Clone, Serialize)]
pub struct ToolAnswer {
    pub answer: String,
    pub invocation: Option<ToolInvocation>,
}

/// Agent that answers queries with the help of a tool registry.
///
/// Tool use is best-effort: a `none` selection, an unknown tool name, or
/// an unparsable selection all fall back to answering the query directly.
pub struct ToolAgent<'a> {
    client: &'a dyn ChatClient,
    tools: Vec<Tool>,
}

impl<'a> ToolAgent<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self {
            client,
            tools: Vec::new(),
        }
    }

    pub fn tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.tools.push(Tool::new(name, description, handler));
        self
    }

    pub async fn answer(&self, query: &str) -> Result<ToolAnswer, PatternError> {
        let selection = self
            .client
            .complete(&[Message::user(self.selection_prompt(query))])
            .await
            .map_err(PatternError::step("select_tool"))?;

        let Some((name, input)) = parse_selection(&selection) else {
            debug!("No tool selected; answering directly");
            return self.direct_answer(query).await;
        };

        let Some(tool) = self
            .tools
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&name))
        else {
            debug!(%name, "Unknown tool selected; answering directly");
            return self.direct_answer(query).await;
        };

        let input = if input.is_empty() {
            query.to_string()
        } else {
            input
        };
        debug!(tool = %tool.name, %input, "Running tool");
        let output = tool.run(&input);

        let answer = self
            .client
            .complete(&[Message::user(format!(
                "Query: {query}\n\n\
                 Result from the '{name}' tool:\n{output}\n\n\
                 Answer the query using the tool result.",
                name = tool.name,
            ))])
            .await
            .map_err(PatternError::step(&tool.name))?;

        Ok(ToolAnswer {
            answer,
            invocation: Some(ToolInvocation {
                tool: tool.name.clone(),
                input,
                output,
            }),
        })
    }

    async fn direct_answer(&self, query: &str) -> Result<ToolAnswer, PatternError> {
        let answer = self
            .client
            .complete(&[Message::user(format!(
                "Answer as helpfully as you can: {query}"
            ))])
            .await
            .map_err(PatternError::step("answer"))?;

        Ok(ToolAnswer {
            answer,
            invocation: None,
        })
    }

    fn selection_prompt(&self, query: &str) -> String {
        let mut listing = String::new();
        for tool in &self.tools {
            listing.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        format!(
            "You can call one of these tools to answer the query:\n\n{listing}\n\
             Query: {query}\n\n\
             If a tool helps, reply with exactly `tool_name: input` on one line. \
             If no tool is needed, reply with `none`."
        )
    }
}

/// Parse a `tool_name: input` selection. Returns `None` for `none` or
/// anything else that does not fit the protocol.
fn parse_selection(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim().trim_matches('`');
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return None;
    }
    let (name, input) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name.to_string(), input.trim().to_string()))
}
