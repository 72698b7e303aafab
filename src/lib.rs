#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unnecessary_wraps
)]

pub mod agent;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod providers;
pub mod retrieval;
pub mod sessions;
pub mod tools;

pub use agent::{Answer, Assistant, DecisionEngine, QueryOutcome};
pub use config::Config;
