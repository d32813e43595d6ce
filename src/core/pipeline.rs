/// The story pipeline: request → prompt → completion.
///
/// Wires together request validation, lexicon draws, template rendering
/// and the completion client.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::completion::{CompletionBackend, CompletionClient, GeneratedText, GenerationError};
use crate::core::composer::{self, ComposeError, PromptText, StoryComposer, StoryDraws};
use crate::core::grammar::GrammarError;
use crate::core::lexicon::{DataLoadError, LexiconSources, LexiconStore};
use crate::schema::request::{RequestError, StoryRequest};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lexicon error: {0}")]
    DataLoad(#[from] DataLoadError),
    #[error("template error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
    #[error("composition failed: {0}")]
    Compose(#[from] ComposeError),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("completion backend '{0}' is not compiled into this build")]
    BackendUnsupported(String),
}

/// A finished story and everything that went into it.
#[derive(Debug, Clone, Serialize)]
pub struct Story {
    pub prompt: PromptText,
    pub text: GeneratedText,
    pub draws: StoryDraws,
}

impl Story {
    /// The part the backend wrote after the prompt.
    pub fn continuation(&self) -> &str {
        self.text
            .as_str()
            .strip_prefix(self.prompt.as_str())
            .unwrap_or_default()
    }
}

/// The top-level story engine. Built via `StoryEngine::builder()`.
#[derive(Debug)]
pub struct StoryEngine {
    lexicon: LexiconStore,
    composer: StoryComposer,
    client: CompletionClient,
    seed: Option<u64>,
    generation_count: u64,
}

/// Builder for constructing a `StoryEngine`.
#[derive(Debug, Default)]
pub struct StoryEngineBuilder {
    lexicon_sources: Option<LexiconSources>,
    template_path: Option<PathBuf>,
    seed: Option<u64>,
    /// Directly provided lexicon (for testing without files).
    lexicon: Option<LexiconStore>,
    /// Directly provided composer (for custom templates held in memory).
    composer: Option<StoryComposer>,
    backend: Option<Box<dyn CompletionBackend>>,
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder::default()
    }

    /// Compose a prompt without calling the completion backend.
    pub fn compose_only(&mut self, request: &StoryRequest) -> Result<PromptText, EngineError> {
        request.validate()?;
        let mut rng = self.next_rng();
        let prompt = self.composer.compose(request, &self.lexicon, &mut rng)?;
        self.generation_count += 1;
        Ok(prompt)
    }

    /// Compose a prompt and have the backend complete it.
    pub fn generate(&mut self, request: &StoryRequest) -> Result<Story, EngineError> {
        request.validate()?;
        let mut rng = self.next_rng();

        // 1. Draw slot values
        let draws = composer::draw(request, &self.lexicon, &mut rng)?;

        // 2. Render the prefix
        let prompt = self.composer.render(request, &draws);
        self.generation_count += 1;
        debug!(
            "story #{} prompt ready ({} chars, {} genre)",
            self.generation_count,
            prompt.as_str().len(),
            request.genre
        );

        // 3. Complete
        let text = self
            .client
            .complete(&prompt, request.length, request.temperature)?;

        Ok(Story {
            prompt,
            text,
            draws,
        })
    }

    pub fn lexicon(&self) -> &LexiconStore {
        &self.lexicon
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Reseed; `None` switches to OS entropy. Resets the generation counter.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
        self.generation_count = 0;
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    pub fn backend_name(&self) -> &str {
        self.client.backend_name()
    }

    fn next_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.generation_count)),
            None => StdRng::from_entropy(),
        }
    }
}

impl StoryEngineBuilder {
    pub fn lexicon_sources(mut self, sources: LexiconSources) -> Self {
        self.lexicon_sources = Some(sources);
        self
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide the lexicon directly (for testing without files).
    pub fn with_lexicon(mut self, lexicon: LexiconStore) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn with_composer(mut self, composer: StoryComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let lexicon = match self.lexicon {
            Some(lexicon) => lexicon,
            None => LexiconStore::load(&self.lexicon_sources.unwrap_or_default())?,
        };

        let composer = match (self.composer, self.template_path) {
            (Some(composer), _) => composer,
            (None, Some(path)) => StoryComposer::from_template_file(&path)?,
            (None, None) => StoryComposer::new()?,
        };

        let client = match self.backend {
            Some(backend) => CompletionClient::new(backend),
            None => CompletionClient::echo(),
        };

        Ok(StoryEngine {
            lexicon,
            composer,
            client,
            seed: self.seed,
            generation_count: 0,
        })
    }
}
