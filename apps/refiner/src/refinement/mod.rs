// Refinement: relevance gate, keyword rule tables, extraction backends and renderers.
// Everything except `engine::LlmRefiner` and `handlers` is pure and synchronous.

pub mod deliverables;
pub mod domain;
pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod relevance;
pub mod render;
pub mod requirements;
pub mod rules;
pub mod scoring;
pub mod summary;
pub mod text;
