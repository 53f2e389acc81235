// src/core/mod.rs

pub mod assembler;
pub mod color;
pub mod commons;
pub mod config_loader;
pub mod interpolator;
pub mod invocation;
pub mod task_executor;
pub mod tree_builder;
