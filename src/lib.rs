//! Fairytale Box: short story seeding from templates and word lists.
//!
//! Composes a story opening by filling a prose template with randomly drawn
//! words (genre keywords, style words, traits, occupations, books, quotes),
//! then hands it to a pluggable text-completion backend. A small ledger
//! tracks how often characters interact.

pub mod config;
pub mod core;
pub mod schema;
