//! # belgraph
//!
//! Library half of the `belgraph` binary, so the command layer can be
//! driven from integration tests.

pub mod cli;
