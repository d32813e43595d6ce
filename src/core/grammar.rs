/// Story templates: slot types, parsing, loading, and rendering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::schema::character::Pronouns;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("unknown slot '{0}'")]
    UnknownSlot(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named hole in a story template, filled from the request or from a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Opening,
    Main,
    MainTrait,
    MainOccupation,
    MainBook,
    Secondary,
    SecondaryTrait,
    SecondaryOccupation,
    SecondaryBook,
    Setting,
    FirstStyle,
    SecondStyle,
    FirstKeyword,
    SecondKeyword,
    Quote,
    QuoteSource,
    Celebrity,
}

impl Slot {
    pub const ALL: [Slot; 17] = [
        Slot::Opening,
        Slot::Main,
        Slot::MainTrait,
        Slot::MainOccupation,
        Slot::MainBook,
        Slot::Secondary,
        Slot::SecondaryTrait,
        Slot::SecondaryOccupation,
        Slot::SecondaryBook,
        Slot::Setting,
        Slot::FirstStyle,
        Slot::SecondStyle,
        Slot::FirstKeyword,
        Slot::SecondKeyword,
        Slot::Quote,
        Slot::QuoteSource,
        Slot::Celebrity,
    ];

    /// The name used between braces in template text.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Main => "main",
            Self::MainTrait => "main_trait",
            Self::MainOccupation => "main_occupation",
            Self::MainBook => "main_book",
            Self::Secondary => "secondary",
            Self::SecondaryTrait => "secondary_trait",
            Self::SecondaryOccupation => "secondary_occupation",
            Self::SecondaryBook => "secondary_book",
            Self::Setting => "setting",
            Self::FirstStyle => "first_style",
            Self::SecondStyle => "second_style",
            Self::FirstKeyword => "first_keyword",
            Self::SecondKeyword => "second_keyword",
            Self::Quote => "quote",
            Self::QuoteSource => "quote_source",
            Self::Celebrity => "celebrity",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slot {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.name() == s)
            .ok_or_else(|| GrammarError::UnknownSlot(s.to_string()))
    }
}

/// Grammatical role of a pronoun reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PronounRole {
    Subject,
    Object,
    Possessive,
}

impl PronounRole {
    fn resolve(&self, pronouns: Pronouns) -> &'static str {
        match self {
            Self::Subject => pronouns.subject(),
            Self::Object => pronouns.object(),
            Self::Possessive => pronouns.possessive(),
        }
    }
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A story slot: `{main_book}`.
    Slot(Slot),
    /// Pronoun of the main character: `{subject}`, `{object}`, `{possessive}`.
    PronounRef(PronounRole),
}

/// A parsed template: a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{slot_name}` → `Slot` (unknown names are an error)
    /// - `{subject}` / `{object}` / `{possessive}` → `PronounRef`
    /// - `{{` → literal `{`, `}}` → literal `}`
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, GrammarError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                while end < len && chars[end] != '}' {
                    if chars[end] == '{' {
                        return Err(GrammarError::TemplateParse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    end += 1;
                }

                if end == len {
                    return Err(GrammarError::TemplateParse("unclosed brace".to_string()));
                }

                let content: String = chars[start..end].iter().collect();
                let content = content.trim();
                if content.is_empty() {
                    return Err(GrammarError::TemplateParse("empty braces".to_string()));
                }

                segments.push(Self::parse_segment(content)?);
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(GrammarError::TemplateParse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    fn parse_segment(content: &str) -> Result<TemplateSegment, GrammarError> {
        let role = match content {
            "subject" => Some(PronounRole::Subject),
            "object" => Some(PronounRole::Object),
            "possessive" => Some(PronounRole::Possessive),
            _ => None,
        };
        if let Some(role) = role {
            return Ok(TemplateSegment::PronounRef(role));
        }
        Ok(TemplateSegment::Slot(content.parse()?))
    }

    /// Load a template from a plain-text file.
    pub fn load_from_file(path: &Path) -> Result<Template, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Slots referenced by this template, in order of appearance, with repeats.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Slot(slot) => Some(*slot),
            _ => None,
        })
    }

    /// Render the template. Slot values come from `lookup`; pronoun
    /// references use `pronouns`. Values are inserted verbatim.
    pub fn render<'a, F>(&self, lookup: F, pronouns: Pronouns) -> String
    where
        F: Fn(Slot) -> &'a str,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot(slot) => out.push_str(lookup(*slot)),
                TemplateSegment::PronounRef(role) => out.push_str(role.resolve(pronouns)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Hello, world.".to_string())]
        );
    }

    #[test]
    fn parse_slot() {
        let t = Template::parse("Start {main_book} end").unwrap();
        assert_eq!(t.segments.len(), 3);
        assert_eq!(t.segments[1], TemplateSegment::Slot(Slot::MainBook));
    }

    #[test]
    fn parse_pronoun_refs() {
        let t = Template::parse("{subject} looked at {object} with {possessive} eyes.").unwrap();
        assert_eq!(t.segments[0], TemplateSegment::PronounRef(PronounRole::Subject));
        assert_eq!(t.segments[2], TemplateSegment::PronounRef(PronounRole::Object));
        assert_eq!(t.segments[4], TemplateSegment::PronounRef(PronounRole::Possessive));
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_unknown_slot_error() {
        assert!(matches!(
            Template::parse("Hello {villain}"),
            Err(GrammarError::UnknownSlot(name)) if name == "villain"
        ));
    }

    #[test]
    fn parse_empty_braces_error() {
        assert!(Template::parse("Bad {} here").is_err());
    }

    #[test]
    fn parse_nested_braces_error() {
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
    }

    #[test]
    fn parse_unclosed_brace_error() {
        assert!(Template::parse("Bad {main here").is_err());
    }

    #[test]
    fn parse_unmatched_close_error() {
        assert!(Template::parse("Bad } here").is_err());
    }

    #[test]
    fn every_slot_name_round_trips() {
        for slot in Slot::ALL {
            assert_eq!(slot.name().parse::<Slot>().unwrap(), slot);
        }
    }

    #[test]
    fn slots_in_order() {
        let t = Template::parse("{main} and {secondary} at the {setting}, {main} again").unwrap();
        let slots: Vec<Slot> = t.slots().collect();
        assert_eq!(
            slots,
            vec![Slot::Main, Slot::Secondary, Slot::Setting, Slot::Main]
        );
    }

    #[test]
    fn render_fills_slots_and_pronouns() {
        let t = Template::parse("{main} closed {possessive} book at the {setting}.").unwrap();
        let text = t.render(
            |slot| match slot {
                Slot::Main => "Ravi",
                Slot::Setting => "harbour",
                _ => "?",
            },
            Pronouns::HeHim,
        );
        assert_eq!(text, "Ravi closed his book at the harbour.");
    }

    #[test]
    fn render_passes_values_verbatim() {
        let t = Template::parse("[{main}]").unwrap();
        let text = t.render(|_| "{setting} <i>", Pronouns::SheHer);
        assert_eq!(text, "[{setting} <i>]");
    }
}
