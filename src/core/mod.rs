pub mod completion;
pub mod composer;
pub mod grammar;
#[cfg(feature = "http")]
pub mod http_backend;
pub mod ledger;
pub mod lexicon;
pub mod pipeline;
