// Suggestion pipeline: external producer and scorer seams, the per-scope
// state machine, and its HTTP handlers.

pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod prompts;
pub mod scorer;
pub mod upstream;

pub use pipeline::{PipelineError, SuggestionPipeline};
