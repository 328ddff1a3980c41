//! Local LLM access (Ollama), the analysis prompt and the response parser.

pub mod client;
pub mod error;
pub mod parser;
pub mod prompt;

pub use client::{LlmStatus, OllamaClient, PullOutcome, PullStatus, DEFAULT_GENERATE_TIMEOUT};
pub use error::LlmError;
pub use parser::parse_analysis;
pub use prompt::render_prompt;
