// src/bin/cliff.rs

use anyhow::{Result, anyhow};
use cliff::{
    cli::dispatcher,
    constants::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILENAME, MOUNTS_ENV_VAR},
    core::{config_loader, tree_builder::TreeBuilder},
    dev_utils::BlockTimer,
    system::executor::ExecutionError,
    t,
};
use colored::*;
use std::{env, path::PathBuf, process};

/// The main entry point of the `cliff` application.
/// It sets up logging, loads the command tree, dispatches and performs centralized
/// error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        // clap prints help, version and usage errors itself and picks the exit code.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }

        // A failing script already reported on stderr; mirror its status.
        if let Some(ExecutionError::ScriptFailed { code }) = e.downcast_ref::<ExecutionError>() {
            process::exit(*code);
        }

        eprintln!("\n{}: {:#}", t!("error.prefix").red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let _timer = BlockTimer::new("main::run");

    let config_path = config_path();
    if !config_path.is_file() {
        return Err(anyhow!(
            t!("config.error.not_found"),
            path = config_path.display()
        ));
    }
    let document = config_loader::load_document(&config_path)?;

    let mut builder = TreeBuilder::new();
    for mount_path in mount_paths() {
        if !mount_path.is_file() {
            return Err(anyhow!(
                t!("config.error.mount_not_found"),
                path = mount_path.display()
            ));
        }
        builder = builder.mount(config_loader::load_document(&mount_path)?);
    }

    let tree = builder.build(document)?;
    dispatcher::dispatch(&tree, env::args_os())
}

/// `CLIFF_CONFIG` if set, otherwise `cli.yml` in the working directory.
fn config_path() -> PathBuf {
    let raw = env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILENAME.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Extra documents to attach under the root, from the path list in `CLIFF_MOUNTS`.
fn mount_paths() -> Vec<PathBuf> {
    env::var_os(MOUNTS_ENV_VAR)
        .map(|value| {
            env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}
