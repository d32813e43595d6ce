/// Preview: interactive shell for composing and generating stories.
///
/// Usage: preview [--config <path>] [--seed <n>]
///
/// Commands:
///   show                     print the current request
///   genre <name>             fantasy, horror or romantic
///   main <name>              set the main character
///   secondary <name>         set the secondary character
///   setting <text>           set the setting
///   pronouns <p>             main character pronouns (she/her, he/him, ...)
///   length <n>               target length (100-500)
///   temperature <t>          sampling temperature (0-1]
///   seed <n|none>            set RNG seed
///   prompt                   compose a prompt only
///   generate                 compose and complete
///   bulk <n>                 compose n prompts with variety stats
///   interact <a> -> <b> <n>  record n interactions from a to b
///                            (`interact <a> <b> <n>` for one-word names)
///   interactions             list the ledger
///   help                     list commands
///   quit                     exit

use anyhow::{bail, Context};
use fairytale_box::config::{AppConfig, DEFAULT_CONFIG_PATH};
use fairytale_box::core::ledger::InteractionLedger;
use fairytale_box::core::lexicon::Category;
use fairytale_box::schema::character::Pronouns;
use fairytale_box::schema::request::{Genre, StoryRequest};
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut seed_override: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = PathBuf::from(&args[i]);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed_override = Some(
                    args[i]
                        .parse()
                        .with_context(|| format!("invalid seed '{}'", args[i]))?,
                );
            }
            other => {
                print_usage();
                bail!("unknown argument: {other}");
            }
        }
        i += 1;
    }

    let mut config = AppConfig::load(&config_path)?;
    if seed_override.is_some() {
        config.seed = seed_override;
    }
    let mut engine = config
        .engine_builder()?
        .build()
        .context("failed to build story engine")?;

    println!(
        "Loaded lexicon: {} books, {} celebrities, {} quote sources",
        engine.lexicon().pool(Category::Book).len(),
        engine.lexicon().pool(Category::Celebrity).len(),
        engine.lexicon().quote_sources().len()
    );
    println!("Backend: {}", engine.backend_name());
    match engine.seed() {
        Some(seed) => println!("Seed: {seed}"),
        None => println!("Seed: none (entropy)"),
    }
    println!("Type 'help' for commands.\n");

    // Session state
    let mut request = StoryRequest::default();
    let mut ledger = InteractionLedger::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let rest = line[parts[0].len()..].trim();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "show" => {
                print_request(&request);
            }
            "genre" => {
                if rest.is_empty() {
                    let names: Vec<&str> = Genre::ALL.iter().map(|g| g.name()).collect();
                    println!("Usage: genre <{}>", names.join("|"));
                    println!("  Current: {}", request.genre);
                    continue;
                }
                match rest.parse::<Genre>() {
                    Ok(genre) => {
                        request.genre = genre;
                        println!("Genre set to {genre}");
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "main" => {
                if rest.is_empty() {
                    println!("Usage: main <name>  (current: {})", request.main_character);
                    continue;
                }
                request.main_character = rest.to_string();
                println!("Main character set to '{rest}'");
            }
            "secondary" => {
                if rest.is_empty() {
                    println!(
                        "Usage: secondary <name>  (current: {})",
                        request.secondary_character
                    );
                    continue;
                }
                request.secondary_character = rest.to_string();
                println!("Secondary character set to '{rest}'");
            }
            "setting" => {
                if rest.is_empty() {
                    println!("Usage: setting <text>  (current: {})", request.setting);
                    continue;
                }
                request.setting = rest.to_string();
                println!("Setting set to '{rest}'");
            }
            "pronouns" => match rest.parse::<Pronouns>() {
                Ok(pronouns) => {
                    request.main_pronouns = pronouns;
                    println!("Pronouns set to {pronouns}");
                }
                Err(e) => println!("{e}"),
            },
            "length" => match rest.parse::<u32>() {
                Ok(length) => {
                    let candidate = request.clone().with_length(length);
                    match candidate.validate() {
                        Ok(()) => {
                            request = candidate;
                            println!("Length set to {length}");
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                Err(_) => println!("Invalid length: '{rest}'"),
            },
            "temperature" | "temp" => match rest.parse::<f32>() {
                Ok(temperature) => {
                    let candidate = request.clone().with_temperature(temperature);
                    match candidate.validate() {
                        Ok(()) => {
                            request = candidate;
                            println!("Temperature set to {temperature}");
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                Err(_) => println!("Invalid temperature: '{rest}'"),
            },
            "seed" => {
                if rest.is_empty() {
                    match engine.seed() {
                        Some(seed) => println!("Current seed: {seed}"),
                        None => println!("Current seed: none"),
                    }
                    continue;
                }
                if rest == "none" {
                    engine.set_seed(None);
                    println!("Seed cleared; drawing from entropy.");
                    continue;
                }
                match rest.parse::<u64>() {
                    Ok(seed) => {
                        engine.set_seed(Some(seed));
                        println!("Seed set to {seed}");
                    }
                    Err(_) => println!("Invalid seed: {rest}"),
                }
            }
            "prompt" => match engine.compose_only(&request) {
                Ok(prompt) => {
                    println!("\n--- Prompt ---");
                    println!("{prompt}");
                    println!("--- End ---\n");
                }
                Err(e) => println!("ERROR: {e}"),
            },
            "generate" | "gen" => match engine.generate(&request) {
                Ok(story) => {
                    println!("\n--- Story ---");
                    println!("{}", story.text);
                    println!("--- End ---\n");
                    println!(
                        "keywords: {} / {}   styles: {} / {}",
                        story.draws.keywords[0],
                        story.draws.keywords[1],
                        story.draws.styles[0],
                        story.draws.styles[1]
                    );
                    println!("continuation: {} chars\n", story.continuation().len());
                }
                Err(e) => println!("ERROR: {e}"),
            },
            "bulk" => {
                let count: usize = match rest.parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                let mut prompts = Vec::new();
                let mut errors = 0;
                for _ in 0..count {
                    match engine.compose_only(&request) {
                        Ok(prompt) => prompts.push(prompt),
                        Err(_) => errors += 1,
                    }
                }

                println!(
                    "\n=== Bulk Composition: {} prompts ({} errors) ===\n",
                    prompts.len(),
                    errors
                );
                let unique: FxHashSet<&str> = prompts.iter().map(|p| p.as_str()).collect();
                println!("Unique prompts: {} / {}", unique.len(), prompts.len());
                let openings: FxHashSet<&str> = prompts
                    .iter()
                    .map(|p| p.as_str().split(',').next().unwrap_or_default())
                    .collect();
                println!("Unique openings: {}", openings.len());
                let avg_len: f64 = if prompts.is_empty() {
                    0.0
                } else {
                    prompts.iter().map(|p| p.as_str().len() as f64).sum::<f64>()
                        / prompts.len() as f64
                };
                println!("Average length: {avg_len:.0} chars\n");
            }
            "interact" => {
                let Some((source, target, count)) = parse_interaction(rest) else {
                    println!("Usage: interact <source> -> <target> <count 1-100>");
                    continue;
                };
                let count: i64 = match count.parse() {
                    Ok(n) => n,
                    Err(_) => {
                        println!("Invalid count: {count}");
                        continue;
                    }
                };
                match ledger.add_interaction(source, target, count) {
                    Ok(total) => println!("{source} - {target}, {total} times"),
                    Err(e) => println!("ERROR: {e}"),
                }
            }
            "interactions" => {
                if ledger.is_empty() {
                    println!("No interactions recorded.");
                    continue;
                }
                let mut records: Vec<_> = ledger.iter().collect();
                records.sort_by(|a, b| (a.source, a.target).cmp(&(b.source, b.target)));
                for record in records {
                    println!("  {record}");
                }
            }
            _ => {
                println!("Unknown command: '{cmd}'. Type 'help' for available commands.");
            }
        }
    }

    Ok(())
}

fn print_request(request: &StoryRequest) {
    println!("  genre:        {}", request.genre);
    println!("  main:         {} ({})", request.main_character, request.main_pronouns);
    println!("  secondary:    {}", request.secondary_character);
    println!("  setting:      {}", request.setting);
    println!("  length:       {}", request.length);
    println!("  temperature:  {}", request.temperature);
}

fn print_usage() {
    println!("Preview: interactive shell for composing and generating stories.");
    println!();
    println!("Usage: preview [--config <path>] [--seed <n>]");
    println!();
    println!("  --config <path>  RON config file (default: {DEFAULT_CONFIG_PATH})");
    println!("  --seed <n>       Initial RNG seed, overriding the config");
    println!();
    println!("Set RUST_LOG=debug to see draws and backend timing.");
}

fn print_help() {
    println!("Commands:");
    println!("  show                   Print the current request");
    println!("  genre <name>           Set genre (fantasy, horror, romantic)");
    println!("  main <name>            Set the main character");
    println!("  secondary <name>       Set the secondary character");
    println!("  setting <text>         Set the setting");
    println!("  pronouns <p>           Set main character pronouns");
    println!("  length <n>             Set target length (100-500)");
    println!("  temperature <t>        Set temperature (0-1]");
    println!("  seed <n|none>          Set RNG seed");
    println!("  prompt                 Compose a prompt only");
    println!("  generate               Compose and complete a story");
    println!("  bulk <n>               Compose n prompts with variety statistics");
    println!("  interact <a> -> <b> <n>");
    println!("                         Record n interactions from a to b");
    println!("  interactions           List recorded interactions");
    println!("  help                   Show this help");
    println!("  quit                   Exit");
    println!();
}

/// Split `interact` arguments into source, target and count.
///
/// Names may contain spaces when separated by `->`; without the arrow each
/// name is a single word.
fn parse_interaction(rest: &str) -> Option<(&str, &str, &str)> {
    let (names, count) = rest.trim().rsplit_once(char::is_whitespace)?;
    let (source, target) = match names.split_once("->") {
        Some((source, target)) => (source.trim(), target.trim()),
        None => {
            let mut words = names.split_whitespace();
            let pair = (words.next()?, words.next()?);
            if words.next().is_some() {
                return None;
            }
            pair
        }
    };
    if source.is_empty() || target.is_empty() {
        return None;
    }
    Some((source, target, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_separates_multi_word_names() {
        assert_eq!(
            parse_interaction("Mary Ann -> Tom Sawyer 3"),
            Some(("Mary Ann", "Tom Sawyer", "3"))
        );
        assert_eq!(
            parse_interaction("Alice->Eleanor 12"),
            Some(("Alice", "Eleanor", "12"))
        );
    }

    #[test]
    fn single_word_names_without_arrow() {
        assert_eq!(
            parse_interaction("Alice Eleanor 5"),
            Some(("Alice", "Eleanor", "5"))
        );
    }

    #[test]
    fn incomplete_arguments_rejected() {
        assert_eq!(parse_interaction(""), None);
        assert_eq!(parse_interaction("Alice 5"), None);
        assert_eq!(parse_interaction("Mary Ann Tom 5"), None);
        assert_eq!(parse_interaction("-> Tom 5"), None);
        assert_eq!(parse_interaction("Alice ->   5"), None);
    }
}
