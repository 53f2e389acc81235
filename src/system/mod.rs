//! # System Interaction Layer
//!
//! The boundary between the command tree and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Writes an assembled script to a temporary file, runs it with the
//!   chosen shell (stdio inherited) and removes the file afterwards.
//! - **`shell`**: Decides which interpreter runs the generated scripts.

pub mod executor;
pub mod shell;
