// src/core/task_executor.rs

use crate::{
    core::{
        assembler::{self, AssembleOptions},
        invocation::Invocation,
    },
    dev_utils::BlockTimer,
    models::Action,
    system::executor,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Runs the invoked command.
///
/// A registered handler is called with the invocation. An inline script is
/// assembled from its fragments and executed under `shell`; nothing runs when a
/// placeholder cannot be resolved. A group has nothing to run.
pub fn execute(invocation: &Invocation<'_>, shell: &Path) -> Result<()> {
    let _timer = BlockTimer::new("task_executor::execute");
    let command = invocation.command();

    match &command.action {
        Action::Handler(handler) => {
            log::debug!("Calling handler for '{}'", command.name);
            handler(invocation).with_context(|| {
                format!(t!("dispatch.error.handler_failed"), name = command.name)
            })
        }
        Action::Script(fragments) => {
            let options = AssembleOptions::for_terminal(invocation.is_verbose());
            let script = assembler::assemble(fragments, invocation.args(), invocation, options)
                .with_context(|| {
                    format!(t!("dispatch.error.script_assembly"), name = command.name)
                })?;

            if script.trim().is_empty() {
                log::info!(
                    "{}",
                    format!(t!("dispatch.info.empty_script"), name = command.name)
                );
                return Ok(());
            }

            log::trace!("Assembled script for '{}':\n{}", command.name, script);
            executor::execute_script(&script, shell)?;
            Ok(())
        }
        Action::Group => {
            log::debug!("'{}' is a group; nothing to execute.", command.name);
            Ok(())
        }
    }
}
