use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pronoun set for a story character, used by the template renderer
/// to resolve `{subject}`, `{object}` and `{possessive}` references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Pronouns {
    /// she/her/her
    #[default]
    SheHer,
    /// he/him/his
    HeHim,
    /// they/them/their
    TheyThem,
    /// it/it/its
    ItIts,
}

impl Pronouns {
    /// Nominative/subject form: "she", "he", "they", "it".
    pub fn subject(&self) -> &'static str {
        match self {
            Self::SheHer => "she",
            Self::HeHim => "he",
            Self::TheyThem => "they",
            Self::ItIts => "it",
        }
    }

    /// Accusative/object form: "her", "him", "them", "it".
    pub fn object(&self) -> &'static str {
        match self {
            Self::SheHer => "her",
            Self::HeHim => "him",
            Self::TheyThem => "them",
            Self::ItIts => "it",
        }
    }

    /// Possessive determiner: "her", "his", "their", "its".
    pub fn possessive(&self) -> &'static str {
        match self {
            Self::SheHer => "her",
            Self::HeHim => "his",
            Self::TheyThem => "their",
            Self::ItIts => "its",
        }
    }

    /// Short label such as "she/her".
    pub fn label(&self) -> &'static str {
        match self {
            Self::SheHer => "she/her",
            Self::HeHim => "he/him",
            Self::TheyThem => "they/them",
            Self::ItIts => "it/its",
        }
    }
}

impl fmt::Display for Pronouns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pronoun set '{0}' (expected she/her, he/him, they/them or it/its)")]
pub struct UnknownPronouns(pub String);

impl FromStr for Pronouns {
    type Err = UnknownPronouns;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "she/her" | "she" | "her" => Ok(Self::SheHer),
            "he/him" | "he" | "him" => Ok(Self::HeHim),
            "they/them" | "they" | "them" => Ok(Self::TheyThem),
            "it/its" | "it" => Ok(Self::ItIts),
            other => Err(UnknownPronouns(other.to_string())),
        }
    }
}
