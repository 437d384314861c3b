//! Built-in sample inputs so every subcommand runs without arguments.

use loopcraft_llm::ChatClient;
use loopcraft_patterns::{Extractor, FanOut, PromptChain, Router, ToolAgent};

/// Default task for `refine`.
pub const SAMPLE_TASK: &str =
    "Write a function that returns the factorial of a non-negative integer.";

/// Default input for `chain`.
pub const SAMPLE_SPEC_TEXT: &str = "The new laptop model features a 3.5 GHz octa-core processor, \
     16GB of RAM, and a 1TB NVMe SSD.";

/// Default document for `extract`.
pub const SAMPLE_DOCUMENT: &str = "Ginger (Zingiber officinale) has been used for digestive complaints \
     for centuries. Clinical trials report doses of 1-1.5 g of dried rhizome daily for nausea. \
     Its main bioactive constituents are gingerols and shogaols.";

/// Default query for `route`.
pub const SAMPLE_QUERY: &str = "What is the capital of France?";

/// Default topic for `fanout`.
pub const SAMPLE_TOPIC: &str = "The importance of reinforcement learning in AI";

/// Two-step chain: extract technical specifications, then shape them into
/// a fixed JSON object.
pub fn spec_chain(client: &dyn ChatClient) -> PromptChain<'_> {
    PromptChain::new(client)
        .step(
            "extract",
            "Extract the technical specifications from the following text:\n\n{input}",
        )
        .step(
            "transform",
            "Transform the following specifications into a JSON object with \
             'cpu', 'memory', and 'storage' as keys:\n\n{input}",
        )
}

/// Plan-then-write chain: outline first, then draft against the outline.
pub fn planning_chain(client: &dyn ChatClient) -> PromptChain<'_> {
    PromptChain::new(client)
        .step(
            "plan",
            "Create a bullet-point plan for a summary on the topic: {input}",
        )
        .step(
            "write",
            "Write a concise, well-structured summary of around 200 words \
             following this plan:\n\n{input}",
        )
}

/// Field set for the document extractor.
pub fn document_extractor(client: &dyn ChatClient) -> Extractor<'_> {
    Extractor::new(client)
        .field(
            "scientific_name",
            "Extract the scientific name of the plant mentioned in the following text. \
             If not available, respond with 'Not available':\n\n{text}",
        )
        .field(
            "medicinal_use",
            "Extract the medicinal uses mentioned in the following text. \
             If not available, respond with 'Not mentioned':\n\n{text}",
        )
        .field(
            "dose",
            "Extract the dose information from the following text. \
             If not available, respond with 'Not available':\n\n{text}",
        )
        .field(
            "phytochemicals",
            "Extract the bioactive constituents mentioned in the following text. \
             If not available, respond with 'Not mentioned':\n\n{text}",
        )
}

/// Intent routes for the query router.
pub fn query_router(client: &dyn ChatClient) -> Router<'_> {
    Router::new(client)
        .route(
            "weather",
            "questions about current or forecast weather",
            "Answer this weather question concisely: {query}",
        )
        .route(
            "facts",
            "general factual questions with a short answer",
            "Answer this factual question in one sentence: {query}",
        )
        .route(
            "math",
            "arithmetic or mathematical questions",
            "Solve this step by step, then state the final answer: {query}",
        )
        .fallback(
            "anything that fits no other intent",
            "Answer as helpfully as you can: {query}",
        )
}

/// Tool registry with a canned lookup tool, so `ask` runs offline apart
/// from the model calls.
pub fn search_agent(client: &dyn ChatClient) -> ToolAgent<'_> {
    ToolAgent::new(client).tool(
        "search_information",
        "Provides factual information on a given topic, e.g. \
         'capital of france' or 'weather in london'",
        |query| {
            const CANNED: [(&str, &str); 4] = [
                (
                    "weather in london",
                    "The weather in London is currently cloudy with a temperature of 15°C.",
                ),
                ("capital of france", "The capital of France is Paris."),
                (
                    "population of earth",
                    "The estimated population of Earth is around 8 billion people.",
                ),
                (
                    "tallest mountain",
                    "Mount Everest is the tallest mountain above sea level.",
                ),
            ];

            let key = query.trim().trim_end_matches(['?', '.']).to_lowercase();
            CANNED
                .iter()
                .find(|(topic, _)| key.contains(topic))
                .map(|(_, result)| result.to_string())
                .unwrap_or_else(|| {
                    format!("Simulated search result for '{query}': no specific information found.")
                })
        },
    )
}

/// Research fan-out: three independent angles merged into a brief.
pub fn research_fanout(client: &dyn ChatClient) -> FanOut<'_> {
    FanOut::new(client)
        .subtask(
            "key ideas",
            "List the 3 most important ideas about the topic: {task}",
        )
        .subtask(
            "applications",
            "List concrete real-world applications of: {task}",
        )
        .subtask(
            "open problems",
            "List the main open problems and limitations of: {task}",
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopcraft_llm::testing::ScriptedClient;

    #[tokio::test]
    async fn search_agent_serves_canned_lookups() {
        let client =
            ScriptedClient::replying(&["search_information: capital of france?", "Paris."]);

        let result = search_agent(&client)
            .answer("What is the capital of France?")
            .await
            .unwrap();

        let invocation = result.invocation.unwrap();
        assert_eq!(invocation.output, "The capital of France is Paris.");
    }

    #[tokio::test]
    async fn search_agent_falls_back_for_unknown_topics() {
        let client =
            ScriptedClient::replying(&["search_information: quantum computing", "Interesting."]);

        let result = search_agent(&client)
            .answer("Tell me about quantum computing.")
            .await
            .unwrap();

        let invocation = result.invocation.unwrap();
        assert!(invocation.output.contains("Simulated search result"));
    }

    #[tokio::test]
    async fn planning_chain_drafts_from_the_plan() {
        let client = ScriptedClient::replying(&["- point one\n- point two", "final summary"]);

        let result = planning_chain(&client).run(SAMPLE_TOPIC).await.unwrap();

        assert_eq!(result.output, "final summary");
        let calls = client.calls();
        assert!(calls[0][0].content.contains(SAMPLE_TOPIC));
        assert!(calls[1][0].content.contains("point one"));
    }
}
