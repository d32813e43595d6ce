/// Lexicon Linter: validates lexicon sources and a story template.
///
/// Usage: lexicon_linter [--config <path>] [--template <path>]

use fairytale_box::config::{AppConfig, DEFAULT_CONFIG_PATH};
use fairytale_box::core::composer::BUILTIN_TEMPLATE;
use fairytale_box::core::grammar::{Slot, Template};
use fairytale_box::core::lexicon::{Category, LexiconStore};
use fairytale_box::schema::request::Genre;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::process;

/// Pools smaller than this make prompts repetitive.
const RECOMMENDED_GENRE_POOL: usize = 4;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: lexicon_linter [--config <path>] [--template <path>]");
        process::exit(0);
    }

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut template_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = PathBuf::from(&args[i]);
            }
            "--template" if i + 1 < args.len() => {
                i += 1;
                template_path = Some(PathBuf::from(&args[i]));
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    let template_path = template_path.or(config.template.clone());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match LexiconStore::load(&config.lexicon) {
        Ok(lexicon) => {
            println!(
                "Loaded lexicon from {}, {}, {}",
                config.lexicon.books.display(),
                config.lexicon.celebrities.display(),
                config.lexicon.quotes.display()
            );
            lint_lexicon(&lexicon, &mut warnings);
        }
        Err(e) => errors.push(format!("Lexicon failed to load: {}", e)),
    }

    match load_template(template_path.as_deref()) {
        Ok(template) => lint_template(&template, &mut warnings),
        Err(e) => errors.push(e),
    }

    // Print report
    println!("\n=== Lexicon Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_template(path: Option<&Path>) -> Result<Template, String> {
    match path {
        Some(path) => {
            println!("Template: {}", path.display());
            Template::load_from_file(path)
                .map_err(|e| format!("Template '{}' is invalid: {}", path.display(), e))
        }
        None => {
            println!("Template: built-in");
            Template::parse(BUILTIN_TEMPLATE).map_err(|e| format!("Built-in template is invalid: {}", e))
        }
    }
}

fn lint_lexicon(lexicon: &LexiconStore, warnings: &mut Vec<String>) {
    let single_draw = [
        Category::Beginning,
        Category::Personality,
        Category::Occupation,
        Category::Book,
        Category::Celebrity,
        Category::QuoteSource,
    ];

    for category in single_draw {
        let pool = lexicon.pool(category);
        if pool.is_empty() {
            warnings.push(format!(
                "The {} pool is empty; every composition will fail",
                category
            ));
        }
        warn_duplicates(category, pool, warnings);
    }

    for genre in Genre::ALL {
        for category in [Category::Keyword(genre), Category::Style(genre)] {
            let pool = lexicon.pool(category);
            if pool.len() < RECOMMENDED_GENRE_POOL {
                warnings.push(format!(
                    "The {} pool has only {} candidates (minimum {} recommended)",
                    category,
                    pool.len(),
                    RECOMMENDED_GENRE_POOL
                ));
            }
            warn_duplicates(category, pool, warnings);
        }
    }

    for source in lexicon.quote_sources() {
        let mut seen = FxHashSet::default();
        for quote in &source.quotes {
            if !seen.insert(quote.as_str()) {
                warnings.push(format!(
                    "Quote source '{}' lists \"{}\" more than once",
                    source.name, quote
                ));
            }
        }
    }
}

fn warn_duplicates(category: Category, pool: &[String], warnings: &mut Vec<String>) {
    let mut seen = FxHashSet::default();
    for candidate in pool {
        if !seen.insert(candidate.as_str()) {
            warnings.push(format!(
                "Duplicate {} candidate '{}' skews the draw",
                category, candidate
            ));
        }
    }
}

fn lint_template(template: &Template, warnings: &mut Vec<String>) {
    let used: FxHashSet<Slot> = template.slots().collect();

    for required in [Slot::Main, Slot::Secondary] {
        if !used.contains(&required) {
            warnings.push(format!(
                "Template never mentions {{{}}}; that character is ignored",
                required
            ));
        }
    }

    let genre_slots = [
        Slot::FirstKeyword,
        Slot::SecondKeyword,
        Slot::FirstStyle,
        Slot::SecondStyle,
    ];
    if !genre_slots.iter().any(|slot| used.contains(slot)) {
        warnings.push("Template has no keyword or style slot; genre has no effect".to_string());
    }
}
