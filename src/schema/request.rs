use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

use super::character::Pronouns;

/// Allowed target lengths, in tokens, for a generated story.
pub const LENGTH_RANGE: RangeInclusive<u32> = 100..=500;

/// Highest accepted creativity temperature. The lower bound is exclusive at 0.0.
pub const MAX_TEMPERATURE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("story length {0} is outside {min}..={max}", min = LENGTH_RANGE.start(), max = LENGTH_RANGE.end())]
    LengthOutOfRange(u32),
    #[error("temperature {0} is outside (0.0, {max}]", max = MAX_TEMPERATURE)]
    TemperatureOutOfRange(f32),
}

/// The three story genres. Each has its own keyword and style pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    Horror,
    Romantic,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::Fantasy, Genre::Horror, Genre::Romantic];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fantasy => "Fantasy",
            Self::Horror => "Horror",
            Self::Romantic => "Romantic",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown genre '{0}' (expected Fantasy, Horror or Romantic)")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

/// Everything the caller supplies for one story. Built fresh per generation.
///
/// Character names and setting are free text and are passed into the
/// prompt verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryRequest {
    pub genre: Genre,
    pub main_character: String,
    pub secondary_character: String,
    pub setting: String,
    /// Target length of the whole story, prompt included.
    pub length: u32,
    pub temperature: f32,
    pub main_pronouns: Pronouns,
}

impl Default for StoryRequest {
    fn default() -> Self {
        Self {
            genre: Genre::Fantasy,
            main_character: "Alice".to_string(),
            secondary_character: "Eleanor".to_string(),
            setting: "coffee shop".to_string(),
            length: 300,
            temperature: 0.65,
            main_pronouns: Pronouns::SheHer,
        }
    }
}

impl StoryRequest {
    pub fn new(genre: Genre) -> Self {
        Self {
            genre,
            ..Self::default()
        }
    }

    pub fn with_characters(mut self, main: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.main_character = main.into();
        self.secondary_character = secondary.into();
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_pronouns(mut self, pronouns: Pronouns) -> Self {
        self.main_pronouns = pronouns;
        self
    }

    /// Check the numeric bounds. Free-text fields are not inspected.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !LENGTH_RANGE.contains(&self.length) {
            return Err(RequestError::LengthOutOfRange(self.length));
        }
        // NaN fails both comparisons and is rejected here too.
        if !(self.temperature > 0.0 && self.temperature <= MAX_TEMPERATURE) {
            return Err(RequestError::TemperatureOutOfRange(self.temperature));
        }
        Ok(())
    }
}
