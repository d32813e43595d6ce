/// Hosted text-generation backend over blocking HTTP.
///
/// Speaks the Hugging Face inference request shape:
/// `{"inputs": ..., "parameters": {...}}` in, `[{"generated_text": ...}]` out.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::core::completion::{
    CompletionBackend, CompletionParams, GenerationError, HttpBackendConfig,
};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_length: u32,
    temperature: f32,
    no_repeat_ngram_size: u32,
    return_full_text: bool,
    do_sample: bool,
}

#[derive(Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Batch(Vec<Generation>),
    Single(Generation),
    Error { error: String },
}

pub struct HttpBackend {
    endpoint: String,
    api_token: Option<String>,
    timeout: Duration,
    client: Client,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.api_token.is_some())
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self, GenerationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            timeout,
            client,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else if err.is_connect() {
            GenerationError::Unavailable(err.to_string())
        } else {
            GenerationError::Backend(err.to_string())
        }
    }
}

impl CompletionBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    fn generate(&self, prompt: &str, params: &CompletionParams) -> Result<String, GenerationError> {
        let body = request_body(prompt, params);
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().map_err(|e| self.transport_error(e))?;

        match status {
            s if s.is_success() => parse_response(&text),
            StatusCode::SERVICE_UNAVAILABLE => Err(GenerationError::Unavailable(text)),
            s => Err(GenerationError::Backend(format!("HTTP {s}: {text}"))),
        }
    }
}

fn request_body<'a>(prompt: &'a str, params: &CompletionParams) -> GenerateRequest<'a> {
    GenerateRequest {
        inputs: prompt,
        parameters: GenerateParameters {
            max_length: params.max_length,
            temperature: params.temperature,
            no_repeat_ngram_size: params.no_repeat_ngram_size,
            return_full_text: true,
            do_sample: true,
        },
    }
}

fn parse_response(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("{e}: {body}")))?;
    match parsed {
        GenerateResponse::Batch(generations) => generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| GenerationError::MalformedResponse("empty generation list".to_string())),
        GenerateResponse::Single(generation) => Ok(generation.generated_text),
        GenerateResponse::Error { error } => Err(GenerationError::Backend(error)),
    }
}
