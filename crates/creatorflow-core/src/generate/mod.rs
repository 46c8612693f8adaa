//! Schedule generation: prompt and schema construction, the completion
//! backend seam, and validation of the model's answer into candidate tasks.

pub mod backend;
pub mod client;
pub mod gemini;
pub mod prompt;

use thiserror::Error;

pub use backend::{CompletionBackend, CompletionRequest};
pub use client::{ScheduleGenerator, parse_candidates};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use prompt::{
    CANDIDATE_FIELDS, DEFAULT_FOCUS, EMPTY_INVENTORY_HINT, ScheduleRequest, Shift,
    ShiftParseError, build_inventory_block, build_prompt, response_schema,
};

/// Why a generation call produced no candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("no API key configured for backend {backend:?}")]
    MissingApiKey { backend: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model output is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("model output violates the task schema: {0}")]
    Schema(String),
}
