/// Lexicon loading integration tests against the fixture and sample data.

use fairytale_box::core::lexicon::{Category, DataLoadError, LexiconSources, LexiconStore};
use fairytale_box::schema::request::Genre;
use std::path::PathBuf;

fn fixture_sources() -> LexiconSources {
    LexiconSources {
        vocabulary: None,
        books: PathBuf::from("tests/fixtures/books.json"),
        celebrities: PathBuf::from("tests/fixtures/celebrities.json"),
        quotes: PathBuf::from("tests/fixtures/president_quote.json"),
    }
}

#[test]
fn sample_data_loads() {
    let lexicon = LexiconStore::load(&LexiconSources::default()).unwrap();
    assert_eq!(lexicon.pool(Category::Book).len(), 15);
    assert_eq!(lexicon.pool(Category::Celebrity).len(), 10);
    assert_eq!(lexicon.quote_sources().len(), 5);
    for genre in Genre::ALL {
        assert!(lexicon.pool(Category::Keyword(genre)).len() >= 2);
        assert!(lexicon.pool(Category::Style(genre)).len() >= 2);
    }
}

#[test]
fn fixture_data_loads_in_order() {
    let lexicon = LexiconStore::load(&fixture_sources()).unwrap();
    assert_eq!(
        lexicon.pool(Category::Book),
        ["The Hobbit", "Dracula", "Little Women"]
    );
    assert_eq!(
        lexicon.pool(Category::QuoteSource),
        ["Abraham Lincoln", "Thomas Jefferson"]
    );
    assert_eq!(lexicon.quote_sources()[1].quotes.len(), 2);
}

#[test]
fn empty_books_source_still_loads() {
    let sources = LexiconSources {
        books: PathBuf::from("tests/fixtures/empty_books.json"),
        ..fixture_sources()
    };
    let lexicon = LexiconStore::load(&sources).unwrap();
    assert!(lexicon.pool(Category::Book).is_empty());
}

#[test]
fn malformed_quotes_rejected() {
    let sources = LexiconSources {
        quotes: PathBuf::from("tests/fixtures/malformed_quotes.json"),
        ..fixture_sources()
    };
    match LexiconStore::load(&sources) {
        Err(DataLoadError::Json { origin, .. }) => assert_eq!(origin, "quotes"),
        other => panic!("expected Json error, got {other:?}"),
    }
}

#[test]
fn quote_source_without_quotes_rejected() {
    let sources = LexiconSources {
        quotes: PathBuf::from("tests/fixtures/silent_president.json"),
        ..fixture_sources()
    };
    match LexiconStore::load(&sources) {
        Err(DataLoadError::EmptyQuoteSource(name)) => assert_eq!(name, "Calvin Coolidge"),
        other => panic!("expected EmptyQuoteSource, got {other:?}"),
    }
}

#[test]
fn missing_file_reports_path() {
    let sources = LexiconSources {
        celebrities: PathBuf::from("tests/fixtures/no_such_file.json"),
        ..fixture_sources()
    };
    let err = LexiconStore::load(&sources).unwrap_err();
    assert!(matches!(err, DataLoadError::Io { .. }));
    assert!(err.to_string().contains("no_such_file.json"));
}

#[test]
fn vocabulary_file_overrides_builtin() {
    let sources = LexiconSources {
        vocabulary: Some(PathBuf::from("genre_data/lexicon.ron")),
        ..fixture_sources()
    };
    let lexicon = LexiconStore::load(&sources).unwrap();
    assert_eq!(lexicon.genre(Genre::Horror).tone, "dread");
    assert!(lexicon
        .pool(Category::Style(Genre::Fantasy))
        .contains(&"magical".to_string()));
}
