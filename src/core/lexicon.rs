/// Lexicon store: candidate pools for randomized slot filling.
///
/// The vocabulary (openings, personalities, occupations and genre profiles)
/// is RON and ships embedded in the crate. Books, celebrities and quotes are
/// JSON sources read once at startup.

use log::info;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::request::Genre;

/// Number of distinct values drawn from each genre keyword and style pool.
pub const PAIR_DRAW: usize = 2;

/// The vocabulary compiled into the crate.
pub const BUILTIN_VOCABULARY: &str = include_str!("../../genre_data/lexicon.ron");

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed {origin} source: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },
    #[error("malformed vocabulary: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no genre profile for {0}")]
    MissingGenre(Genre),
    #[error("genre profile for {0} is defined twice")]
    DuplicateGenre(Genre),
    #[error("{category} needs at least {needed} candidates, found {available}")]
    TooFewCandidates {
        category: Category,
        needed: usize,
        available: usize,
    },
    #[error("quote source '{0}' has no quotes")]
    EmptyQuoteSource(String),
}

/// Key of a candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Beginning,
    Personality,
    Occupation,
    Book,
    Celebrity,
    /// Names of the quote sources.
    QuoteSource,
    Keyword(Genre),
    Style(Genre),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginning => f.write_str("beginning"),
            Self::Personality => f.write_str("personality"),
            Self::Occupation => f.write_str("occupation"),
            Self::Book => f.write_str("book"),
            Self::Celebrity => f.write_str("celebrity"),
            Self::QuoteSource => f.write_str("quote source"),
            Self::Keyword(genre) => write!(f, "{genre} keyword"),
            Self::Style(genre) => write!(f, "{genre} style word"),
        }
    }
}

/// A named person and the quotes attributed to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSource {
    pub name: String,
    pub quotes: Vec<String>,
}

/// Keyword pool, style-word pool and tone for one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub genre: Genre,
    pub tone: String,
    pub keywords: Vec<String>,
    pub styles: Vec<String>,
}

/// The RON-backed part of the lexicon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub beginnings: Vec<String>,
    pub personalities: Vec<String>,
    pub occupations: Vec<String>,
    pub genres: Vec<GenreProfile>,
}

impl Vocabulary {
    /// The vocabulary embedded at compile time.
    pub fn builtin() -> Result<Vocabulary, DataLoadError> {
        Self::parse_ron(BUILTIN_VOCABULARY)
    }

    pub fn parse_ron(input: &str) -> Result<Vocabulary, DataLoadError> {
        Ok(ron::from_str(input)?)
    }

    pub fn load_from_ron(path: &Path) -> Result<Vocabulary, DataLoadError> {
        Self::parse_ron(&read_source(path)?)
    }
}

/// Where the lexicon sources live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconSources {
    /// RON vocabulary file. `None` uses the embedded vocabulary.
    pub vocabulary: Option<PathBuf>,
    pub books: PathBuf,
    pub celebrities: PathBuf,
    pub quotes: PathBuf,
}

impl Default for LexiconSources {
    fn default() -> Self {
        Self {
            vocabulary: None,
            books: PathBuf::from("data/books.json"),
            celebrities: PathBuf::from("data/celebrities.json"),
            quotes: PathBuf::from("data/president_quote.json"),
        }
    }
}

/// Validated, read-only candidate pools.
#[derive(Debug, Clone)]
pub struct LexiconStore {
    beginnings: Vec<String>,
    personalities: Vec<String>,
    occupations: Vec<String>,
    books: Vec<String>,
    celebrities: Vec<String>,
    quotes: Vec<QuoteSource>,
    quote_names: Vec<String>,
    /// One profile per genre, in `Genre::ALL` order.
    genres: Vec<GenreProfile>,
}

impl LexiconStore {
    /// Read and validate every source.
    pub fn load(sources: &LexiconSources) -> Result<LexiconStore, DataLoadError> {
        let vocabulary = match &sources.vocabulary {
            Some(path) => Vocabulary::load_from_ron(path)?,
            None => Vocabulary::builtin()?,
        };
        let books = parse_string_list(&read_source(&sources.books)?, "books")?;
        let celebrities = parse_string_list(&read_source(&sources.celebrities)?, "celebrities")?;
        let quotes = parse_quote_sources(&read_source(&sources.quotes)?)?;

        let store = Self::from_parts(vocabulary, books, celebrities, quotes)?;
        info!(
            "lexicon loaded: {} books, {} celebrities, {} quote sources, {} openings",
            store.books.len(),
            store.celebrities.len(),
            store.quotes.len(),
            store.beginnings.len()
        );
        Ok(store)
    }

    /// Build a store from already-parsed parts, applying the same checks as `load`.
    ///
    /// Pools drawn one value at a time may be empty here; compositions that
    /// need them fail later. Genre keyword and style pools must hold at least
    /// `PAIR_DRAW` candidates, and every quote source needs a quote.
    pub fn from_parts(
        vocabulary: Vocabulary,
        books: Vec<String>,
        celebrities: Vec<String>,
        quotes: Vec<QuoteSource>,
    ) -> Result<LexiconStore, DataLoadError> {
        let mut seen = FxHashSet::default();
        for profile in &vocabulary.genres {
            if !seen.insert(profile.genre) {
                return Err(DataLoadError::DuplicateGenre(profile.genre));
            }
            check_pool(Category::Keyword(profile.genre), &profile.keywords, PAIR_DRAW)?;
            check_pool(Category::Style(profile.genre), &profile.styles, PAIR_DRAW)?;
        }

        let mut genres = vocabulary.genres;
        if let Some(missing) = Genre::ALL.into_iter().find(|g| !seen.contains(g)) {
            return Err(DataLoadError::MissingGenre(missing));
        }
        genres.sort_by_key(|profile| profile.genre);

        if let Some(silent) = quotes.iter().find(|source| source.quotes.is_empty()) {
            return Err(DataLoadError::EmptyQuoteSource(silent.name.clone()));
        }

        let quote_names = quotes.iter().map(|source| source.name.clone()).collect();

        Ok(LexiconStore {
            beginnings: vocabulary.beginnings,
            personalities: vocabulary.personalities,
            occupations: vocabulary.occupations,
            books,
            celebrities,
            quotes,
            quote_names,
            genres,
        })
    }

    /// Candidates for a category.
    pub fn pool(&self, category: Category) -> &[String] {
        match category {
            Category::Beginning => &self.beginnings,
            Category::Personality => &self.personalities,
            Category::Occupation => &self.occupations,
            Category::Book => &self.books,
            Category::Celebrity => &self.celebrities,
            Category::QuoteSource => &self.quote_names,
            Category::Keyword(genre) => &self.genre(genre).keywords,
            Category::Style(genre) => &self.genre(genre).styles,
        }
    }

    pub fn quote_sources(&self) -> &[QuoteSource] {
        &self.quotes
    }

    pub fn genre(&self, genre: Genre) -> &GenreProfile {
        &self.genres[genre as usize]
    }
}

/// Parse a JSON flat list of strings. `origin` names the source in errors.
pub fn parse_string_list(input: &str, origin: &str) -> Result<Vec<String>, DataLoadError> {
    serde_json::from_str(input).map_err(|source| DataLoadError::Json {
        origin: origin.to_string(),
        source,
    })
}

/// Parse a JSON list of `{ "name": ..., "quotes": [...] }` records.
pub fn parse_quote_sources(input: &str) -> Result<Vec<QuoteSource>, DataLoadError> {
    serde_json::from_str(input).map_err(|source| DataLoadError::Json {
        origin: "quotes".to_string(),
        source,
    })
}

fn read_source(path: &Path) -> Result<String, DataLoadError> {
    std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_pool(category: Category, pool: &[String], needed: usize) -> Result<(), DataLoadError> {
    if pool.len() < needed {
        return Err(DataLoadError::TooFewCandidates {
            category,
            needed,
            available: pool.len(),
        });
    }
    Ok(())
}
