//! WASM bindings for fairytale-box: composes prompts in the browser.
//!
//! Completion is left to the host page: `compose` returns the prompt and the
//! page sends it to whatever model it talks to.

use wasm_bindgen::prelude::*;

use fairytale_box::core::ledger::{InteractionLedger, OwnedInteraction};
use fairytale_box::core::lexicon::{
    parse_quote_sources, parse_string_list, LexiconStore, Vocabulary,
};
use fairytale_box::core::pipeline::StoryEngine;
use fairytale_box::schema::character::Pronouns;
use fairytale_box::schema::request::{Genre, StoryRequest};

// ---------------------------------------------------------------------------
// Embedded sample data: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const BOOKS: &str = include_str!("../../data/books.json");
    pub const CELEBRITIES: &str = include_str!("../../data/celebrities.json");
    pub const QUOTES: &str = include_str!("../../data/president_quote.json");
}

fn embedded_lexicon() -> Result<LexiconStore, String> {
    let vocabulary = Vocabulary::builtin().map_err(|e| e.to_string())?;
    let books = parse_string_list(data::BOOKS, "books").map_err(|e| e.to_string())?;
    let celebrities =
        parse_string_list(data::CELEBRITIES, "celebrities").map_err(|e| e.to_string())?;
    let quotes = parse_quote_sources(data::QUOTES).map_err(|e| e.to_string())?;
    LexiconStore::from_parts(vocabulary, books, celebrities, quotes).map_err(|e| e.to_string())
}

fn build_engine(seed: u64) -> Result<StoryEngine, String> {
    StoryEngine::builder()
        .seed(seed)
        .with_lexicon(embedded_lexicon()?)
        .build()
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// StoryBox: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryBox {
    engine: StoryEngine,
    ledger: InteractionLedger,
}

#[wasm_bindgen]
impl StoryBox {
    /// Create a story box over the embedded sample data.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<StoryBox, JsError> {
        let engine =
            build_engine(seed).map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(StoryBox {
            engine,
            ledger: InteractionLedger::new(),
        })
    }

    /// Compose a prompt for a request described by a JSON string.
    /// Missing fields take their defaults.
    ///
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "genre": "Fantasy",
    ///   "main_character": "Alice",
    ///   "secondary_character": "Eleanor",
    ///   "setting": "coffee shop",
    ///   "length": 300,
    ///   "temperature": 0.65,
    ///   "main_pronouns": "SheHer"
    /// }
    /// ```
    pub fn compose(&mut self, request_json: &str) -> Result<String, JsError> {
        let request = parse_request(request_json)?;
        self.engine
            .compose_only(&request)
            .map(|prompt| prompt.into_string())
            .map_err(|e| JsError::new(&format!("Composition error: {e}")))
    }

    /// Like `compose`, but returns `{ prompt, text, draws }` as JSON.
    pub fn compose_story(&mut self, request_json: &str) -> Result<String, JsError> {
        let request = parse_request(request_json)?;
        let story = self
            .engine
            .generate(&request)
            .map_err(|e| JsError::new(&format!("Composition error: {e}")))?;
        serde_json::to_string(&story)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Record `count` interactions from `source` to `target`. Returns the
    /// new total for the pair.
    pub fn add_interaction(
        &mut self,
        source: &str,
        target: &str,
        count: i32,
    ) -> Result<u32, JsError> {
        let total = self
            .ledger
            .add_interaction(source, target, i64::from(count))
            .map_err(|e| JsError::new(&format!("Ledger error: {e}")))?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }

    /// Return a JSON array of `{ source, target, count }`, sorted by pair.
    pub fn interactions(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.sorted_interactions())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Return JSON array of genre names accepted in requests.
    pub fn available_genres() -> String {
        let names: Vec<&str> = Genre::ALL.iter().map(|g| g.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of pronoun sets, as `[value, label]` pairs.
    pub fn pronoun_options() -> String {
        let pairs: Vec<(Pronouns, &str)> = [
            Pronouns::SheHer,
            Pronouns::HeHim,
            Pronouns::TheyThem,
            Pronouns::ItIts,
        ]
        .into_iter()
        .map(|p| (p, p.label()))
        .collect();
        serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
    }

    /// Reseed the engine. The ledger is kept.
    pub fn reset(&mut self, seed: u64) {
        self.engine.set_seed(Some(seed));
    }
}

// Private helpers
impl StoryBox {
    fn sorted_interactions(&self) -> Vec<OwnedInteraction> {
        let mut entries: Vec<OwnedInteraction> = self.ledger.iter().map(Into::into).collect();
        entries.sort();
        entries
    }
}

fn parse_request(request_json: &str) -> Result<StoryRequest, JsError> {
    serde_json::from_str(request_json)
        .map_err(|e| JsError::new(&format!("Invalid request JSON: {e}")))
}
