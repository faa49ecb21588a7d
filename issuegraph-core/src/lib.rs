//! Issuegraph core library — issue fetching, graph construction, and
//! streamed idea generation.
//!
//! The main entry points are [`pipeline::visualize`], which turns a
//! repository's open issues into a [`graph::IssueGraph`] for an external
//! force-directed renderer, and [`pipeline::generate_ideas`], which streams
//! idea cards decoded incrementally from a completion-service response.

pub mod config;
pub mod error;
pub mod github;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod stream;
