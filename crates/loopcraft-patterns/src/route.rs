//! Intent-based routing: one classification call picks a handler, the
//! handler call answers the query.

use serde::Serialize;
use tracing::debug;

use loopcraft_llm::{ChatClient, Message};

use crate::error::PatternError;

/// A handler the router can dispatch to. The template's `{query}`
/// placeholder receives the user query.
#[derive(Debug, Clone)]
pub struct Route {
    pub intent: String,
    pub description: String,
    pub template: String,
}

impl Route {
    pub fn new(
        intent: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            intent: intent.into(),
            description: description.into(),
            template: template.into(),
        }
    }
}

/// Result of a dispatched query.
#[derive(Debug, Clone, Serialize)]
pub struct Dispatch {
    pub intent: String,
    pub answer: String,
}

pub struct Router<'a> {
    client: &'a dyn ChatClient,
    routes: Vec<Route>,
    fallback: Option<Route>,
}

impl<'a> Router<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self {
            client,
            routes: Vec::new(),
            fallback: None,
        }
    }

    pub fn route(
        mut self,
        intent: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.routes.push(Route::new(intent, description, template));
        self
    }

    /// Handler for queries that match no known intent.
    pub fn fallback(mut self, description: impl Into<String>, template: impl Into<String>) -> Self {
        self.fallback = Some(Route::new("fallback", description, template));
        self
    }

    /// Classify the query, then run the matching handler.
    pub async fn dispatch(&self, query: &str) -> Result<Dispatch, PatternError> {
        let label = self
            .client
            .complete(&[Message::user(self.classification_prompt(query))])
            .await
            .map_err(PatternError::step("classify"))?;
        let label = normalize_label(&label);

        debug!(%label, "Classified query");

        let route = self
            .routes
            .iter()
            .find(|r| r.intent.eq_ignore_ascii_case(&label))
            .or(self.fallback.as_ref())
            .ok_or_else(|| PatternError::UnknownIntent(label.clone()))?;

        let answer = self
            .client
            .complete(&[Message::user(route.template.replace("{query}", query))])
            .await
            .map_err(PatternError::step(&route.intent))?;

        Ok(Dispatch {
            intent: route.intent.clone(),
            answer,
        })
    }

    fn classification_prompt(&self, query: &str) -> String {
        let mut listing = String::new();
        for route in &self.routes {
            listing.push_str(&format!("- {}: {}\n", route.intent, route.description));
        }
        format!(
            "Classify the user query into exactly one of these intents:\n\n{listing}\n\
             Query: {query}\n\n\
             Reply with one intent label from the list and nothing else. \
             If none fits, reply with 'unknown'."
        )
    }
}

/// Models decorate labels with quotes, periods or casing; strip all of it.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
        .trim()
        .to_lowercase()
}
