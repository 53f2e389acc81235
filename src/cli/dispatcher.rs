// src/cli/dispatcher.rs

use crate::{
    cli::app,
    constants::ARGS_ID,
    core::{
        invocation::{self, Invocation},
        task_executor,
        tree_builder::CommandTree,
    },
    dev_utils::BlockTimer,
    models::{CommandNode, FlagKind, FlagSpec, FlagValue},
    system::shell,
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use std::{collections::BTreeMap, ffi::OsString};

/// Parses `argv` against the tree and runs the selected command.
///
/// `argv[0]` is the program name. Parse failures, `--help` and `--version` come back
/// as a `clap::Error` inside the returned error so the caller decides how to exit.
/// Invoking a group on its own prints its help.
pub fn dispatch<I, T>(tree: &CommandTree, argv: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let _timer = BlockTimer::new("dispatcher::dispatch");
    let mut command = app::build_command(tree);
    let matches = command.try_get_matches_from_mut(argv)?;

    // Walk down the chosen subcommands, keeping the node chain from the root.
    let mut lineage: Vec<&CommandNode> = vec![tree.root()];
    let mut leaf_matches = &matches;
    while let Some((name, sub_matches)) = leaf_matches.subcommand() {
        let parent = lineage.last().copied().unwrap_or(tree.root());
        let node = parent
            .child(name)
            .ok_or_else(|| anyhow!(t!("dispatch.error.unknown_command"), name = name))?;
        lineage.push(node);
        leaf_matches = sub_matches;
    }
    let node = lineage.last().copied().unwrap_or(tree.root());
    log::debug!(
        "Dispatching to '{}'",
        lineage
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    );

    if node.is_group() {
        let mut help_target = &mut command;
        for ancestor in lineage.iter().skip(1) {
            help_target = help_target
                .find_subcommand_mut(&ancestor.name)
                .ok_or_else(|| anyhow!(t!("dispatch.error.unknown_command"), name = ancestor.name))?;
        }
        help_target.print_help()?;
        return Ok(());
    }

    let args: Vec<String> = leaf_matches
        .try_get_many::<String>(ARGS_ID)?
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut flags = BTreeMap::new();
    for spec in invocation::scoped_flags(&lineage) {
        flags.insert(spec.name.clone(), read_flag(leaf_matches, spec)?);
    }

    let invocation = Invocation::new(node, args, flags);
    let shell = shell::shell_for(tree.shell());
    task_executor::execute(&invocation, &shell)
}

/// The parsed value of a flag, or its declared default when it was not given.
fn read_flag(matches: &ArgMatches, spec: &FlagSpec) -> Result<FlagValue> {
    let id = spec.name.as_str();
    let value = match spec.kind {
        FlagKind::String => matches
            .try_get_one::<String>(id)?
            .cloned()
            .map(FlagValue::Text),
        FlagKind::Bool => matches.try_get_one::<bool>(id)?.copied().map(FlagValue::Bool),
        FlagKind::Int => matches.try_get_one::<i64>(id)?.copied().map(FlagValue::Int),
        FlagKind::Float => matches.try_get_one::<f64>(id)?.copied().map(FlagValue::Float),
    };
    Ok(value.unwrap_or_else(|| spec.default.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{config_loader::ConfigFormat, tree_builder::TreeBuilder};
    use crate::system::executor::ExecutionError;
    use serde_json::json;
    use std::{
        fs,
        path::Path,
        sync::{Arc, Mutex},
    };

    fn tree_from(config: serde_json::Value) -> CommandTree {
        let bytes = serde_json::to_vec(&config).unwrap();
        TreeBuilder::new()
            .build_from_slice(&bytes, ConfigFormat::Json)
            .unwrap()
    }

    fn write_to(out: &Path, text: &str) -> String {
        format!("printf '%s' \"{}\" > '{}'", text, out.display())
    }

    #[test]
    fn test_positional_args_reach_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let tree = tree_from(json!({
            "name": "tool",
            "shell": "/bin/sh",
            "commands": [
                { "name": "greet", "run": write_to(&out, "args[1] args[0]") }
            ]
        }));

        dispatch(&tree, ["tool", "greet", "world", "hello"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello world");
    }

    #[test]
    fn test_persistent_flag_is_visible_in_nested_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let tree = tree_from(json!({
            "name": "tool",
            "shell": "/bin/sh",
            "flags": [ { "name": "env", "default": "dev", "persistent": true } ],
            "commands": [{
                "name": "db",
                "commands": [
                    { "name": "migrate", "run": write_to(&out, "flags[\"env\"]") }
                ]
            }]
        }));

        dispatch(&tree, ["tool", "db", "migrate"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "dev");

        dispatch(&tree, ["tool", "db", "migrate", "--env", "prod"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "prod");

        dispatch(&tree, ["tool", "--env", "stage", "db", "migrate"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "stage");
    }

    #[test]
    fn test_typed_flags_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let tree = tree_from(json!({
            "name": "tool",
            "shell": "/bin/sh",
            "commands": [{
                "name": "scale",
                "aliases": ["sc"],
                "flags": [
                    { "name": "replicas", "type": "int", "default": 1, "short": "n" },
                    { "name": "force", "type": "bool" },
                    { "name": "cache", "type": "bool", "default": true }
                ],
                "run": write_to(&out, "flags[\"replicas\"] flags[\"force\"] flags[\"cache\"]")
            }]
        }));

        dispatch(&tree, ["tool", "sc"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "1 false true");

        dispatch(&tree, ["tool", "scale", "-n", "3", "--force", "--cache=false"]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "3 true false");
    }

    #[test]
    fn test_handler_gets_args_and_flags() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let config = json!({
            "name": "tool",
            "flags": [ { "name": "env", "default": "dev", "persistent": true } ],
            "commands": [ { "name": "release" } ]
        });
        let tree = TreeBuilder::new()
            .handler("release", move |inv: &Invocation<'_>| {
                let mut seen = recorder.lock().unwrap();
                seen.extend(inv.args().iter().cloned());
                seen.push(inv.flag_string("env").unwrap_or_default());
                seen.push(inv.is_verbose().to_string());
                Ok(())
            })
            .build_from_slice(&serde_json::to_vec(&config).unwrap(), ConfigFormat::Json)
            .unwrap();

        dispatch(&tree, ["tool", "release", "v1", "--env", "prod", "-v"]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["v1", "prod", "true"]);
    }

    #[test]
    fn test_failing_script_surfaces_exit_code() {
        let tree = tree_from(json!({
            "name": "tool",
            "shell": "/bin/sh",
            "commands": [ { "name": "fail", "run": "exit 4" } ]
        }));

        let err = dispatch(&tree, ["tool", "fail"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExecutionError>(),
            Some(ExecutionError::ScriptFailed { code: 4 })
        ));
    }

    #[test]
    fn test_unknown_flag_reference_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let tree = tree_from(json!({
            "name": "tool",
            "shell": "/bin/sh",
            "commands": [{
                "name": "broken",
                "run": [
                    { "execute": format!("touch '{}'", marker.display()) },
                    { "execute": "echo flags[\"nope\"]" }
                ]
            }]
        }));

        let err = dispatch(&tree, ["tool", "broken"]).unwrap_err();
        assert!(format!("{:#}", err).contains("nope"));
        assert!(!marker.exists());
    }

    #[test]
    fn test_group_alone_prints_help() {
        let tree = tree_from(json!({
            "name": "tool",
            "commands": [{
                "name": "db",
                "commands": [ { "name": "migrate", "run": "true" } ]
            }]
        }));
        assert!(dispatch(&tree, ["tool", "db"]).is_ok());
    }

    #[test]
    fn test_parse_errors_are_clap_errors() {
        let tree = tree_from(json!({
            "name": "tool",
            "commands": [ { "name": "hello", "run": "true" } ]
        }));

        let err = dispatch(&tree, ["tool", "hello", "--nope"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());

        let help = dispatch(&tree, ["tool", "--help"]).unwrap_err();
        let help = help.downcast_ref::<clap::Error>().unwrap();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
