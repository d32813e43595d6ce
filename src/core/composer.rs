/// Template composer: randomized slot draws and prompt rendering.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::core::grammar::{GrammarError, Slot, Template};
use crate::core::lexicon::{Category, LexiconStore, QuoteSource, PAIR_DRAW};
use crate::schema::request::StoryRequest;

/// The story prefix. `{object}` and `{possessive}` follow the main
/// character's pronouns.
pub const BUILTIN_TEMPLATE: &str = concat!(
    "\n",
    "{opening}, {main}, a {main_trait} {main_occupation}, settled into a quiet nook with the book, '{main_book}', at the most {first_style} {setting} in town. \n",
    "Next to {object}, {secondary}, a {secondary_trait} {secondary_occupation}, was engrossed in '{secondary_book}' at the neighboring nook. \n",
    "Suddenly, a distinct voice in the distance began reciting \"{quote}\". \n",
    "\"Could that possibly be the President {quote_source}?\" {main} mused, {possessive} gaze still fixed on {possessive} page. \n",
    "As the voice drew nearer, {main} finally looked up to see none other than {celebrity} approaching! \n",
    "This story is all about {first_keyword} and {second_keyword}. \n",
    "Why was {celebrity} there, and what adventures await in this {second_style} {setting}?\n",
);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("{category} pool has {available} candidates, {needed} needed")]
    InsufficientCandidates {
        category: Category,
        needed: usize,
        available: usize,
    },
}

/// A composed story prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptText(pub String);

impl PromptText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PromptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every randomized value used by one composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDraws {
    pub opening: String,
    /// Two distinct genre keywords.
    pub keywords: [String; 2],
    /// Two distinct genre style words.
    pub styles: [String; 2],
    pub main_trait: String,
    pub main_occupation: String,
    pub secondary_trait: String,
    pub secondary_occupation: String,
    /// May repeat the same title twice.
    pub books: [String; 2],
    pub celebrity: String,
    pub quote: String,
    pub quote_source: String,
}

/// Renders story prompts from a template and random lexicon draws.
#[derive(Debug, Clone)]
pub struct StoryComposer {
    template: Template,
}

impl StoryComposer {
    /// Composer using the built-in story prefix.
    pub fn new() -> Result<StoryComposer, GrammarError> {
        Self::from_template_str(BUILTIN_TEMPLATE)
    }

    pub fn from_template_str(input: &str) -> Result<StoryComposer, GrammarError> {
        Ok(StoryComposer {
            template: Template::parse(input)?,
        })
    }

    pub fn from_template_file(path: &Path) -> Result<StoryComposer, GrammarError> {
        Ok(StoryComposer {
            template: Template::load_from_file(path)?,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Draw all slot values and render the prompt.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        request: &StoryRequest,
        lexicon: &LexiconStore,
        rng: &mut R,
    ) -> Result<PromptText, ComposeError> {
        let draws = draw(request, lexicon, rng)?;
        debug!(
            "composed {} prompt (tone: {}) with keywords {:?}",
            request.genre,
            lexicon.genre(request.genre).tone,
            draws.keywords
        );
        Ok(self.render(request, &draws))
    }

    /// Render the template from a request and a finished set of draws.
    pub fn render(&self, request: &StoryRequest, draws: &StoryDraws) -> PromptText {
        let text = self.template.render(
            |slot| match slot {
                Slot::Opening => draws.opening.as_str(),
                Slot::Main => request.main_character.as_str(),
                Slot::MainTrait => draws.main_trait.as_str(),
                Slot::MainOccupation => draws.main_occupation.as_str(),
                Slot::MainBook => draws.books[0].as_str(),
                Slot::Secondary => request.secondary_character.as_str(),
                Slot::SecondaryTrait => draws.secondary_trait.as_str(),
                Slot::SecondaryOccupation => draws.secondary_occupation.as_str(),
                Slot::SecondaryBook => draws.books[1].as_str(),
                Slot::Setting => request.setting.as_str(),
                Slot::FirstStyle => draws.styles[0].as_str(),
                Slot::SecondStyle => draws.styles[1].as_str(),
                Slot::FirstKeyword => draws.keywords[0].as_str(),
                Slot::SecondKeyword => draws.keywords[1].as_str(),
                Slot::Quote => draws.quote.as_str(),
                Slot::QuoteSource => draws.quote_source.as_str(),
                Slot::Celebrity => draws.celebrity.as_str(),
            },
            request.main_pronouns,
        );
        PromptText(text)
    }
}

/// Draw every slot value for a request.
///
/// Draw order is fixed so a seeded rng reproduces the same draws: opening,
/// keyword pair, style pair, main then secondary personality and occupation,
/// two books, celebrity, quote source, quote.
pub fn draw<R: Rng + ?Sized>(
    request: &StoryRequest,
    lexicon: &LexiconStore,
    rng: &mut R,
) -> Result<StoryDraws, ComposeError> {
    let genre = request.genre;

    let opening = pick(lexicon, Category::Beginning, rng)?;
    let keywords = pick_pair(lexicon, Category::Keyword(genre), rng)?;
    let styles = pick_pair(lexicon, Category::Style(genre), rng)?;

    let main_trait = pick(lexicon, Category::Personality, rng)?;
    let main_occupation = pick(lexicon, Category::Occupation, rng)?;
    let secondary_trait = pick(lexicon, Category::Personality, rng)?;
    let secondary_occupation = pick(lexicon, Category::Occupation, rng)?;

    let books = [
        pick(lexicon, Category::Book, rng)?,
        pick(lexicon, Category::Book, rng)?,
    ];
    let celebrity = pick(lexicon, Category::Celebrity, rng)?;

    let source = lexicon
        .quote_sources()
        .choose(rng)
        .ok_or(ComposeError::InsufficientCandidates {
            category: Category::QuoteSource,
            needed: 1,
            available: 0,
        })?;
    let quote = pick_quote(source, rng)?;

    Ok(StoryDraws {
        opening,
        keywords,
        styles,
        main_trait,
        main_occupation,
        secondary_trait,
        secondary_occupation,
        books,
        celebrity,
        quote,
        quote_source: source.name.clone(),
    })
}

/// One value, uniformly, with replacement.
fn pick<R: Rng + ?Sized>(
    lexicon: &LexiconStore,
    category: Category,
    rng: &mut R,
) -> Result<String, ComposeError> {
    lexicon
        .pool(category)
        .choose(rng)
        .cloned()
        .ok_or(ComposeError::InsufficientCandidates {
            category,
            needed: 1,
            available: 0,
        })
}

fn pick_quote<R: Rng + ?Sized>(source: &QuoteSource, rng: &mut R) -> Result<String, ComposeError> {
    source
        .quotes
        .choose(rng)
        .cloned()
        .ok_or(ComposeError::InsufficientCandidates {
            category: Category::QuoteSource,
            needed: 1,
            available: 0,
        })
}

/// Two distinct values, without replacement.
fn pick_pair<R: Rng + ?Sized>(
    lexicon: &LexiconStore,
    category: Category,
    rng: &mut R,
) -> Result<[String; 2], ComposeError> {
    let pool = lexicon.pool(category);
    let insufficient = ComposeError::InsufficientCandidates {
        category,
        needed: PAIR_DRAW,
        available: pool.len(),
    };
    if pool.len() < PAIR_DRAW {
        return Err(insufficient);
    }

    let mut picked = pool.choose_multiple(rng, PAIR_DRAW);
    match (picked.next(), picked.next()) {
        (Some(first), Some(second)) => Ok([first.clone(), second.clone()]),
        _ => Err(insufficient),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::Vocabulary;
    use crate::schema::character::Pronouns;
    use crate::schema::request::Genre;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_lexicon() -> LexiconStore {
        LexiconStore::from_parts(
            Vocabulary::builtin().unwrap(),
            vec!["The Hobbit".to_string(), "Dracula".to_string()],
            vec!["Dolly Parton".to_string()],
            vec![QuoteSource {
                name: "Abraham Lincoln".to_string(),
                quotes: vec!["Whatever you are, be a good one.".to_string()],
            }],
        )
        .unwrap()
    }

    fn fixed_draws() -> StoryDraws {
        StoryDraws {
            opening: "Under a starlit sky".to_string(),
            keywords: ["dragon".to_string(), "spell".to_string()],
            styles: ["magical".to_string(), "mystical".to_string()],
            main_trait: "curious and brave".to_string(),
            main_occupation: "librarian".to_string(),
            secondary_trait: "witty and sarcastic".to_string(),
            secondary_occupation: "sailor".to_string(),
            books: ["The Hobbit".to_string(), "Dracula".to_string()],
            celebrity: "Dolly Parton".to_string(),
            quote: "Whatever you are, be a good one.".to_string(),
            quote_source: "Abraham Lincoln".to_string(),
        }
    }

    #[test]
    fn builtin_template_parses() {
        let composer = StoryComposer::new().unwrap();
        assert!(composer.template().slots().count() >= Slot::ALL.len());
        for slot in Slot::ALL {
            assert!(
                composer.template().slots().any(|s| s == slot),
                "built-in template never uses {slot}"
            );
        }
    }

    #[test]
    fn render_builtin_template_exactly() {
        let composer = StoryComposer::new().unwrap();
        let prompt = composer.render(&StoryRequest::default(), &fixed_draws());
        let expected = concat!(
            "\nUnder a starlit sky, Alice, a curious and brave librarian, settled into a quiet nook with the book, 'The Hobbit', at the most magical coffee shop in town. \n",
            "Next to her, Eleanor, a witty and sarcastic sailor, was engrossed in 'Dracula' at the neighboring nook. \n",
            "Suddenly, a distinct voice in the distance began reciting \"Whatever you are, be a good one.\". \n",
            "\"Could that possibly be the President Abraham Lincoln?\" Alice mused, her gaze still fixed on her page. \n",
            "As the voice drew nearer, Alice finally looked up to see none other than Dolly Parton approaching! \n",
            "This story is all about dragon and spell. \n",
            "Why was Dolly Parton there, and what adventures await in this mystical coffee shop?\n",
        );
        assert_eq!(prompt.as_str(), expected);
    }

    #[test]
    fn render_follows_pronouns() {
        let composer = StoryComposer::new().unwrap();
        let request = StoryRequest::default().with_pronouns(Pronouns::TheyThem);
        let prompt = composer.render(&request, &fixed_draws());
        assert!(prompt.as_str().contains("Next to them,"));
        assert!(prompt.as_str().contains("their gaze still fixed on their page"));
    }

    #[test]
    fn draws_stay_inside_their_pools() {
        let lexicon = test_lexicon();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let draws = draw(&StoryRequest::new(Genre::Horror), &lexicon, &mut rng).unwrap();
            let keywords = lexicon.pool(Category::Keyword(Genre::Horror));
            assert!(draws.keywords.iter().all(|k| keywords.contains(k)));
            assert!(lexicon.pool(Category::Beginning).contains(&draws.opening));
            assert!(lexicon.pool(Category::Personality).contains(&draws.main_trait));
            assert!(lexicon.pool(Category::Occupation).contains(&draws.secondary_occupation));
            assert!(lexicon.pool(Category::Book).contains(&draws.books[1]));
            assert_eq!(draws.quote_source, "Abraham Lincoln");
        }
    }

    #[test]
    fn pair_draws_are_distinct() {
        let lexicon = test_lexicon();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let draws = draw(&StoryRequest::new(Genre::Romantic), &lexicon, &mut rng).unwrap();
            assert_ne!(draws.keywords[0], draws.keywords[1]);
            assert_ne!(draws.styles[0], draws.styles[1]);
        }
    }

    #[test]
    fn same_seed_same_prompt() {
        let lexicon = test_lexicon();
        let composer = StoryComposer::new().unwrap();
        let request = StoryRequest::default();
        let a = composer
            .compose(&request, &lexicon, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = composer
            .compose(&request, &lexicon, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_celebrity_pool_fails() {
        let lexicon = LexiconStore::from_parts(
            Vocabulary::builtin().unwrap(),
            vec!["Emma".to_string()],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let err = draw(&StoryRequest::default(), &lexicon, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::InsufficientCandidates {
                category: Category::Celebrity,
                needed: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn empty_quote_sources_fail() {
        let lexicon = LexiconStore::from_parts(
            Vocabulary::builtin().unwrap(),
            vec!["Emma".to_string()],
            vec!["Tom Hanks".to_string()],
            Vec::new(),
        )
        .unwrap();
        let err = draw(&StoryRequest::default(), &lexicon, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::InsufficientCandidates {
                category: Category::QuoteSource,
                ..
            }
        ));
    }

    #[test]
    fn empty_personality_pool_fails() {
        let mut vocabulary = Vocabulary::builtin().unwrap();
        vocabulary.personalities.clear();
        let lexicon = LexiconStore::from_parts(
            vocabulary,
            vec!["Emma".to_string()],
            vec!["Tom Hanks".to_string()],
            vec![QuoteSource {
                name: "Abraham Lincoln".to_string(),
                quotes: vec!["Whatever you are, be a good one.".to_string()],
            }],
        )
        .unwrap();
        let err = draw(&StoryRequest::default(), &lexicon, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::InsufficientCandidates {
                category: Category::Personality,
                needed: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn silent_quote_source_fails() {
        let silent = QuoteSource {
            name: "Calvin Coolidge".to_string(),
            quotes: Vec::new(),
        };
        assert_eq!(
            pick_quote(&silent, &mut StdRng::seed_from_u64(1)),
            Err(ComposeError::InsufficientCandidates {
                category: Category::QuoteSource,
                needed: 1,
                available: 0,
            })
        );
    }

    #[test]
    fn builtin_prompt_is_framed_by_newlines() {
        let composer = StoryComposer::new().unwrap();
        let prompt = composer.render(&StoryRequest::default(), &fixed_draws());
        assert!(prompt.as_str().starts_with("\nUnder a starlit sky,"));
        assert!(prompt.as_str().ends_with("coffee shop?\n"));
    }

    #[test]
    fn free_text_is_not_interpreted() {
        let lexicon = test_lexicon();
        let composer = StoryComposer::new().unwrap();
        let request = StoryRequest::default()
            .with_characters("{main}", "<script>")
            .with_setting("}} {{");
        let prompt = composer
            .compose(&request, &lexicon, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(prompt.as_str().contains(", {main}, a "));
        assert!(prompt.as_str().contains("<script>"));
        assert!(prompt.as_str().contains("}} {{ in town."));
    }

    #[test]
    fn custom_template() {
        let lexicon = test_lexicon();
        let composer = StoryComposer::from_template_str("{main} read '{main_book}'.").unwrap();
        let prompt = composer
            .compose(&StoryRequest::default(), &lexicon, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(prompt.as_str() == "Alice read 'The Hobbit'." || prompt.as_str() == "Alice read 'Dracula'.");
    }

    #[test]
    fn custom_template_with_unknown_slot_rejected() {
        assert!(matches!(
            StoryComposer::from_template_str("{main} met {villain}"),
            Err(GrammarError::UnknownSlot(_))
        ));
    }
}
