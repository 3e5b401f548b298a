//! Generative-AI assist for PillMatrix.
//!
//! This crate builds prompts and wire requests for the `generateContent`
//! API, turns model answers into [`pillmatrix_core::ParseResult`], and falls
//! back to the heuristic line parser and local chat replies when the model
//! is unavailable. HTTP transport is supplied by the host through
//! [`CompletionClient`].

pub mod assistant;
pub mod extraction;
pub mod generation;
pub mod prompts;

pub use assistant::*;
pub use extraction::*;
pub use generation::*;
pub use prompts::*;
