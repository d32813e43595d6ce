/// Completion client: hands a composed prompt to a text-generation backend.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::composer::PromptText;

/// N-gram size the backend must never repeat. Always applied.
pub const NO_REPEAT_NGRAM_SIZE: u32 = 2;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion backend unavailable: {0}")]
    Unavailable(String),
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion backend failed: {0}")]
    Backend(String),
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Decoding parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Maximum length of the whole output, prompt included.
    pub max_length: u32,
    pub temperature: f32,
    pub no_repeat_ngram_size: u32,
}

fn default_timeout_secs() -> u64 {
    60
}

/// Settings for the hosted HTTP backend. Always deserializable so config
/// files parse in builds without the `http` feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_token: Option<String>,
}

/// A text-generation capability: prompt in, text out.
///
/// Implementations make a single attempt per call. They may return either
/// the full text or only the continuation; `CompletionClient` restores the
/// prompt prefix in the latter case.
pub trait CompletionBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, params: &CompletionParams) -> Result<String, GenerationError>;
}

/// Returns the prompt unchanged. Used offline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoBackend;

impl CompletionBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    fn generate(&self, prompt: &str, _params: &CompletionParams) -> Result<String, GenerationError> {
        Ok(prompt.to_string())
    }
}

/// Generated story text, prompt included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText(pub String);

impl GeneratedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub struct CompletionClient {
    backend: Box<dyn CompletionBackend>,
}

impl CompletionClient {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn echo() -> Self {
        Self::new(Box::new(EchoBackend))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One synchronous backend call. Length bounds are the caller's job.
    pub fn complete(
        &self,
        prompt: &PromptText,
        max_length: u32,
        temperature: f32,
    ) -> Result<GeneratedText, GenerationError> {
        let params = CompletionParams {
            max_length,
            temperature,
            no_repeat_ngram_size: NO_REPEAT_NGRAM_SIZE,
        };
        debug!(
            "completion via {}: max_length={} temperature={} no_repeat_ngram_size={}",
            self.backend.name(),
            params.max_length,
            params.temperature,
            params.no_repeat_ngram_size
        );

        let started = Instant::now();
        let text = self.backend.generate(prompt.as_str(), &params)?;
        debug!("completion finished in {:?}", started.elapsed());

        if text.starts_with(prompt.as_str()) {
            Ok(GeneratedText(text))
        } else {
            warn!(
                "{} returned text without the prompt prefix; prepending it",
                self.backend.name()
            );
            Ok(GeneratedText(format!("{}{}", prompt.as_str(), text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<CompletionParams>>>;

    /// Records the parameters it was called with and answers from a script.
    #[derive(Debug)]
    struct ScriptedBackend {
        reply: Result<String, String>,
        calls: Calls,
    }

    impl ScriptedBackend {
        fn new(reply: Result<&str, &str>) -> (Self, Calls) {
            let calls = Calls::default();
            let backend = Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                calls: Arc::clone(&calls),
            };
            (backend, calls)
        }
    }

    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(&self, _prompt: &str, params: &CompletionParams) -> Result<String, GenerationError> {
            self.calls.lock().unwrap().push(*params);
            self.reply.clone().map_err(GenerationError::Unavailable)
        }
    }

    #[test]
    fn echo_returns_prompt_unchanged() {
        let client = CompletionClient::echo();
        let prompt = PromptText("Under a starlit sky, Alice...".to_string());
        let text = client.complete(&prompt, 300, 0.65).unwrap();
        assert_eq!(text.as_str(), prompt.as_str());
        assert_eq!(client.backend_name(), "echo");
    }

    #[test]
    fn anti_repetition_always_applied() {
        let (backend, calls) = ScriptedBackend::new(Ok("Once upon a time and then more."));
        let client = CompletionClient::new(Box::new(backend));
        client
            .complete(&PromptText("Once upon a time".to_string()), 120, 0.3)
            .unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].no_repeat_ngram_size, 2);
        assert_eq!(calls[0].max_length, 120);
        assert!((calls[0].temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn continuation_only_gets_prompt_prefix() {
        let (backend, _) = ScriptedBackend::new(Ok(" and the dragon woke."));
        let client = CompletionClient::new(Box::new(backend));
        let text = client
            .complete(&PromptText("The kingdom slept".to_string()), 200, 0.7)
            .unwrap();
        assert_eq!(text.as_str(), "The kingdom slept and the dragon woke.");
    }

    #[test]
    fn failure_propagates_after_one_attempt() {
        let (backend, calls) = ScriptedBackend::new(Err("model offline"));
        let client = CompletionClient::new(Box::new(backend));
        let err = client
            .complete(&PromptText("prompt".to_string()), 200, 0.7)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(msg) if msg == "model offline"));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
