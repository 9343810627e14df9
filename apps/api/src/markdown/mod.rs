// Inline markup pipeline for AI-generated feedback.
// tokenizer -> renderer; both are pure, synchronous and total over all inputs.

pub mod handlers;
pub mod renderer;
pub mod tokenizer;

pub use renderer::{render, to_html, RenderNode};
pub use tokenizer::{tokenize, Segment};
