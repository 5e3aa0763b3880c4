// OpenAI Text Generator
//
// This crate provides an OpenAI-compatible text generator.
// It implements the TextGenerator trait from meetbrief-core, which the
// summarization service uses to write meeting summaries.

mod driver;
mod types;

#[cfg(test)]
mod tests;

pub use driver::{OpenAiTextGenerator, OPENAI_API_URL};
pub use types::{ChatMessage, ChatRequest, ChatResponse};

// Re-export core trait for convenience
pub use meetbrief_core::traits::TextGenerator;
