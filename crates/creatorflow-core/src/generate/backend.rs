//! The `CompletionBackend` trait -- the seam between schedule generation and
//! a hosted model.
//!
//! The trait is object-safe so a generator can hold `Arc<dyn CompletionBackend>`
//! and tests can substitute scripted backends.

use async_trait::async_trait;
use serde_json::Value;

use super::GenerationError;

/// One structured-output request: a prompt plus the JSON schema the answer
/// must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub response_schema: Value,
}

/// A hosted model that answers a prompt with raw JSON text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Human-readable name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send the request and return the model's text payload, unparsed.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

// Compile-time assertion: CompletionBackend must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn CompletionBackend) {}
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
            Ok(request.prompt.clone())
        }
    }

    #[tokio::test]
    async fn backend_is_usable_as_trait_object() {
        let backend: Box<dyn CompletionBackend> = Box::new(EchoBackend);
        assert_eq!(backend.name(), "echo");

        let request = CompletionRequest {
            prompt: "[]".to_owned(),
            response_schema: json!({ "type": "ARRAY" }),
        };
        assert_eq!(backend.complete(&request).await.unwrap(), "[]");
    }
}
