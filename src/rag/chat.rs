//! Grounded chat completion.
//!
//! Wraps the chat endpoint with a fixed instruction set that forbids
//! answering outside the supplied grounding text. The request is
//! single-turn: conversation history is never sent.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Reply the model is instructed to give when nothing was retrieved.
pub const NOT_FOUND_REPLY: &str =
    "No information was found for your question. If there is anything else you are looking for, \
     please let me know.";

pub struct GroundedChat {
    provider: Arc<dyn LlmProvider>,
    deployment: String,
    temperature: f64,
}

impl GroundedChat {
    pub fn new(provider: Arc<dyn LlmProvider>, deployment: String, temperature: f64) -> Self {
        Self {
            provider,
            deployment,
            temperature,
        }
    }

    /// One constrained completion: the system instruction embeds the
    /// grounding text, the user text is the only other message.
    pub async fn complete(
        &self,
        user_text: &str,
        grounding_text: &str,
    ) -> Result<String, ApiError> {
        let request = ChatRequest::new(vec![
            ChatMessage {
                role: "system".to_string(),
                content: Self::system_instruction(grounding_text),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_text.to_string(),
            },
        ])
        .with_temperature(self.temperature);

        self.provider.chat(request, &self.deployment).await
    }

    fn system_instruction(grounding_text: &str) -> String {
        format!(
            "## Task\n\
             - Do not draw on the assistant's own knowledge; it invites hallucination.\n\
             - Answer the user's question strictly and only from the search results below.\n\
             - If the search results are empty, reply: \"{}\"\n\
             - If the search results contain nothing relevant, reply: \"If there is anything \
             else you are looking for, please let me know.\"\n\
             - When a close match exists, answer by stating where the information is found.\n\
             - Preserve any links verbatim in the output.\n\
             \n\
             ## Search results\n\
             \n{}",
            NOT_FOUND_REPLY, grounding_text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_grounding_and_not_found_template() {
        let instruction =
            GroundedChat::system_instruction("search result: ## question\nQ\n\n## answer\nA\n\n");

        assert!(instruction.contains("only from the search results"));
        assert!(instruction.contains(NOT_FOUND_REPLY));
        assert!(instruction.contains("search result: ## question"));
        assert!(instruction.contains("Preserve any links verbatim"));
    }

    #[test]
    fn empty_grounding_still_names_the_fixed_reply() {
        let instruction = GroundedChat::system_instruction("");
        assert!(instruction.contains(NOT_FOUND_REPLY));
        assert!(instruction.ends_with("## Search results\n\n"));
    }
}
