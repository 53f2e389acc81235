// src/cli/mod.rs

//! Command-line surface: the clap command generated from a `CommandTree` and the
//! dispatcher that routes parsed arguments to the selected node.

pub mod app;
pub mod dispatcher;
