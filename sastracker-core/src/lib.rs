//! SASTRACKER Core - Rust business logic for the question bank feed
//!
//! This library implements the question feed controller of the SASTRACKER
//! previous-year-question bank: filter/keyword search state, group-by
//! dimension, pagination, URL synchronization and the single-entry result
//! cache, behind a dumb rendering layer.
//!
//! Types are exported via UniFFI proc-macros (#[derive(uniffi::Record/Enum)]).

pub mod backend;
pub mod cache;
mod feed;
pub mod interface;
pub mod models;
pub mod query;
pub mod urlstate;

pub use cache::FeedCache;
pub use feed::{academic_year_options, exam_type_options, QuestionFeed};
pub use interface::*;

uniffi::setup_scaffolding!("sastracker");
