pub mod azure;
pub mod extractor;
pub mod provider;
pub mod types;

pub use azure::AzureOpenAiProvider;
pub use extractor::{KeywordExtractor, ToolCallKeywordExtractor};
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest, ToolCall};
